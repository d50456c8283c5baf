// Entity panels: optimistic CRUD over an in-memory record list, with
// create/edit/delete dialogs routed through form submission controllers.

pub mod controller;
pub mod dialog;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use controller::EntityPanelController;
pub use dialog::{ActiveDialog, DialogSignals};

/// A persisted or to-be-persisted domain entity shown in a panel.
///
/// The id is assigned by the store and never changes afterwards; panels use
/// it as the only identity key.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> Option<Uuid>;

    /// `Some` for records carrying an exclusive "is default" flag.
    fn is_default(&self) -> Option<bool> {
        None
    }

    fn set_default(&mut self, _value: bool) {}
}

/// Result payload of a successful delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedRecord {
    pub id: Uuid,
}
