//! Modal protocol for creating, editing and deleting tasks.
//!
//! At most one dialog is open at a time. Closing a dialog never performs a
//! mutation; only [`EditFlow::submit`] and [`EditFlow::confirm_delete`] do.

use crate::error::FlowError;
use crate::sync::TaskSync;
use futures_signals::signal::{Mutable, Signal};
use tasklane_types::{Task, TaskDraft, TaskId};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum EditState {
    #[default]
    Idle,
    Creating,
    /// Edit form pre-populated from this task
    Editing(Task),
    ConfirmingDelete(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    CancelButton,
    Backdrop,
    Escape,
}

#[derive(Default)]
pub struct EditFlow {
    state: Mutable<EditState>,
    submitting: Mutable<bool>,
}

impl EditFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state.get_cloned()
    }

    pub fn signal(&self) -> impl Signal<Item = EditState> + use<> {
        self.state.signal_cloned()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.get()
    }

    fn open(&self, next: EditState) -> Result<(), FlowError> {
        let mut state = self.state.lock_mut();
        if *state != EditState::Idle {
            return Err(FlowError::NotIdle);
        }
        debug!(?next, "Opening dialog");
        *state = next;
        Ok(())
    }

    pub fn open_create(&self) -> Result<(), FlowError> {
        self.open(EditState::Creating)
    }

    pub fn open_edit(&self, task: Task) -> Result<(), FlowError> {
        self.open(EditState::Editing(task))
    }

    pub fn request_delete(&self, id: TaskId) -> Result<(), FlowError> {
        self.open(EditState::ConfirmingDelete(id))
    }

    /// Close whatever dialog is open without side effects.
    pub fn cancel(&self, reason: CloseReason) {
        debug!(?reason, "Dialog closed");
        self.state.set(EditState::Idle);
    }

    /// Initial form contents for the open dialog.
    pub fn draft(&self) -> Option<TaskDraft> {
        match &*self.state.lock_ref() {
            EditState::Creating => Some(TaskDraft::default()),
            EditState::Editing(task) => Some(TaskDraft::from(task)),
            _ => None,
        }
    }

    fn begin_submit(&self) -> Result<(), FlowError> {
        let mut submitting = self.submitting.lock_mut();
        if *submitting {
            return Err(FlowError::AlreadySubmitting);
        }
        *submitting = true;
        Ok(())
    }

    /// Close the dialog if it is still the one the action started from.
    fn finish(&self, from: &EditState) {
        let mut state = self.state.lock_mut();
        if *state == *from {
            *state = EditState::Idle;
        }
    }

    /// Submit the open create or edit form.
    ///
    /// On failure the dialog stays open so the user can correct and retry.
    pub async fn submit(&self, draft: TaskDraft, sync: &TaskSync) -> Result<Task, FlowError> {
        let from = self.state.get_cloned();
        if !matches!(from, EditState::Creating | EditState::Editing(_)) {
            return Err(FlowError::WrongState);
        }
        draft.validate()?;
        self.begin_submit()?;

        let result = match &from {
            EditState::Editing(task) => sync.update(task.id, &draft).await,
            _ => sync.create(&draft).await,
        };
        self.submitting.set(false);

        let task = result?;
        self.finish(&from);
        Ok(task)
    }

    /// Perform the delete awaiting confirmation.
    pub async fn confirm_delete(&self, sync: &TaskSync) -> Result<(), FlowError> {
        let from = self.state.get_cloned();
        let EditState::ConfirmingDelete(id) = from else {
            return Err(FlowError::WrongState);
        };
        self.begin_submit()?;

        let result = sync.delete(id).await;
        self.submitting.set(false);

        result?;
        self.finish(&from);
        Ok(())
    }
}
