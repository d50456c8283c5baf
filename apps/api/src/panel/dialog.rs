use crate::panel::Record;

/// Which dialog a panel has open. Exactly one state at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum ActiveDialog<R> {
    None,
    Creating,
    Editing(R),
    Deleting(R),
}

impl<R> Default for ActiveDialog<R> {
    fn default() -> Self {
        ActiveDialog::None
    }
}

impl<R> ActiveDialog<R> {
    pub fn is_open(&self) -> bool {
        !matches!(self, ActiveDialog::None)
    }

    /// The record an edit or delete dialog targets.
    pub fn target(&self) -> Option<&R> {
        match self {
            ActiveDialog::Editing(r) | ActiveDialog::Deleting(r) => Some(r),
            ActiveDialog::None | ActiveDialog::Creating => None,
        }
    }

    pub fn accepts_save(&self) -> bool {
        matches!(self, ActiveDialog::Creating | ActiveDialog::Editing(_))
    }
}

/// Flags consumed by presentation components.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogSignals<'a, R> {
    pub create_open: bool,
    pub edit_open: bool,
    pub delete_open: bool,
    pub target: Option<&'a R>,
}

impl<'a, R: Record> From<&'a ActiveDialog<R>> for DialogSignals<'a, R> {
    fn from(dialog: &'a ActiveDialog<R>) -> Self {
        Self {
            create_open: matches!(dialog, ActiveDialog::Creating),
            edit_open: matches!(dialog, ActiveDialog::Editing(_)),
            delete_open: matches!(dialog, ActiveDialog::Deleting(_)),
            target: dialog.target(),
        }
    }
}
