//! Entity Panel Controller.
//!
//! Holds one page's record list and dialog state. Saves and deletes go
//! through their own [`FormSubmissionController`]; successful results are
//! folded back into the list optimistically:
//!
//! - create appends,
//! - edit replaces by id in place,
//! - delete removes by id without reordering the rest.
//!
//! The list is not re-synchronized with the store until the next full load.
//! Two tabs editing the same records, or a save that partially fails after
//! reporting success, leave it stale until then.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::forms::{
    FieldErrorSet, FormData, FormSubmissionController, MountHandle, SubmitError, SubmitOutcome,
};
use crate::panel::dialog::{ActiveDialog, DialogSignals};
use crate::panel::{DeletedRecord, Record};

pub struct EntityPanelController<R: Record> {
    records: Vec<R>,
    dialog: ActiveDialog<R>,
    save: FormSubmissionController<R>,
    delete: FormSubmissionController<DeletedRecord>,
    mount: MountHandle,
}

impl<R: Record> EntityPanelController<R> {
    /// Builds a panel over the initially loaded `records`. Both controllers
    /// are re-bound to the panel's mount handle.
    pub fn new(
        records: Vec<R>,
        save: FormSubmissionController<R>,
        delete: FormSubmissionController<DeletedRecord>,
    ) -> Self {
        let mount = MountHandle::new();
        Self {
            records,
            dialog: ActiveDialog::None,
            save: save.with_mount(mount.clone()),
            delete: delete.with_mount(mount.clone()),
            mount,
        }
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn dialog(&self) -> &ActiveDialog<R> {
        &self.dialog
    }

    pub fn signals(&self) -> DialogSignals<'_, R> {
        DialogSignals::from(&self.dialog)
    }

    pub fn save_errors(&self) -> Option<FieldErrorSet> {
        self.save.errors()
    }

    pub fn delete_errors(&self) -> Option<FieldErrorSet> {
        self.delete.errors()
    }

    pub fn is_saving(&self) -> bool {
        self.save.is_pending()
    }

    pub fn is_deleting(&self) -> bool {
        self.delete.is_pending()
    }

    pub fn mount_handle(&self) -> MountHandle {
        self.mount.clone()
    }

    /// Tears the panel down. Submissions still in flight settle as
    /// [`SubmitOutcome::Discarded`] and leave the list untouched.
    pub fn unmount(&self) {
        self.mount.unmount();
    }

    pub fn open_create(&mut self) {
        self.dialog = ActiveDialog::Creating;
    }

    pub fn open_edit(&mut self, record: R) {
        self.dialog = ActiveDialog::Editing(record);
    }

    pub fn open_delete(&mut self, record: R) {
        self.dialog = ActiveDialog::Deleting(record);
    }

    /// Closes whatever dialog is open, dropping unsaved input and any errors
    /// the dialog was showing.
    pub fn close_dialog(&mut self) {
        self.dialog = ActiveDialog::None;
        self.save.reset();
        self.delete.reset();
    }

    /// Submits the create/edit dialog. Ignored when neither is open.
    ///
    /// While editing, the target's id is added to the form when the form
    /// does not carry one.
    pub async fn submit_save(&mut self, mut form: FormData) -> Result<SubmitOutcome<R>, SubmitError> {
        if !self.dialog.accepts_save() {
            warn!("Save submitted with no create/edit dialog open; ignoring");
            return Ok(SubmitOutcome::Ignored);
        }
        if let ActiveDialog::Editing(target) = &self.dialog {
            attach_id(&mut form, target.id());
        }

        let outcome = self.save.submit(form).await?;
        if let SubmitOutcome::Succeeded(record) = &outcome {
            self.handle_save_result(record.clone());
        }
        Ok(outcome)
    }

    /// Submits the delete dialog. Ignored when it is not open.
    pub async fn submit_delete(
        &mut self,
        mut form: FormData,
    ) -> Result<SubmitOutcome<DeletedRecord>, SubmitError> {
        let Some(target_id) = (match &self.dialog {
            ActiveDialog::Deleting(target) => Some(target.id()),
            _ => None,
        }) else {
            warn!("Delete submitted with no delete dialog open; ignoring");
            return Ok(SubmitOutcome::Ignored);
        };
        attach_id(&mut form, target_id);

        let outcome = self.delete.submit(form).await?;
        if let SubmitOutcome::Succeeded(deleted) = &outcome {
            self.handle_delete_result(deleted.id);
        }
        Ok(outcome)
    }

    /// Folds a successful save into the list and closes the dialog.
    pub fn handle_save_result(&mut self, record: R) {
        if !self.mount.is_mounted() {
            return;
        }

        let placed = match &self.dialog {
            ActiveDialog::Creating => {
                self.records.push(record);
                Some(self.records.len() - 1)
            }
            ActiveDialog::Editing(_) => {
                let position = record
                    .id()
                    .and_then(|id| self.records.iter().position(|r| r.id() == Some(id)));
                match position {
                    Some(index) => {
                        self.records[index] = record;
                        Some(index)
                    }
                    None => {
                        warn!("Saved record {:?} is not in the panel; dropping it", record.id());
                        None
                    }
                }
            }
            ActiveDialog::None | ActiveDialog::Deleting(_) => {
                warn!("Save result arrived with no create/edit dialog open; dropping it");
                None
            }
        };

        if let Some(index) = placed {
            self.enforce_single_default(index);
            debug!("Panel now holds {} record(s)", self.records.len());
        }
        self.close_dialog();
    }

    /// Removes the record with `id` and closes the dialog.
    pub fn handle_delete_result(&mut self, id: Uuid) {
        if !self.mount.is_mounted() {
            return;
        }
        match self.records.iter().position(|r| r.id() == Some(id)) {
            Some(index) => {
                self.records.remove(index);
                info!("Removed record {id} from panel");
            }
            None => warn!("Deleted record {id} was not in the panel"),
        }
        self.close_dialog();
    }

    /// Clears the default flag on every record except the one at `keep`
    /// when that record is flagged.
    fn enforce_single_default(&mut self, keep: usize) {
        if self.records[keep].is_default() != Some(true) {
            return;
        }
        for (index, record) in self.records.iter_mut().enumerate() {
            if index != keep && record.is_default() == Some(true) {
                record.set_default(false);
            }
        }
    }
}

fn attach_id(form: &mut FormData, id: Option<Uuid>) {
    if form.get("id").is_some() {
        return;
    }
    if let Some(id) = id {
        form.append("id", id.to_string());
    }
}
