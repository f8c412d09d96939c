//! The single modal slot of the users screen.
//!
//! Edit and delete are mutually exclusive: opening either one requires the
//! slot to be `Closed`. Command results come back through `resolve_edit` /
//! `resolve_delete`, which only touch the flow that started the call; if the
//! user cancelled in the meantime the result is ignored here (the list is
//! still reconciled by the command).

use std::any::Any;

use log::{debug, info};
use thiserror::Error;
use userdesk_states::{SnapshotClone, State};

use super::delete::DeleteFlow;
use super::edit::{DraftField, EditFlow};
use super::model::{User, UserId, UserPatch};

/// Misuse of a flow or a draft rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("Another dialog is already open")]
    AlreadyOpen,

    #[error("No matching dialog is open")]
    NotOpen,

    #[error("A request is already in progress")]
    Submitting,

    #[error("User {0} is not in the current list")]
    UnknownUser(UserId),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UserModal {
    #[default]
    Closed,
    Edit(EditFlow),
    Delete(DeleteFlow),
}

impl UserModal {
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn edit(&self) -> Option<&EditFlow> {
        match self {
            Self::Edit(flow) => Some(flow),
            _ => None,
        }
    }

    pub fn delete(&self) -> Option<&DeleteFlow> {
        match self {
            Self::Delete(flow) => Some(flow),
            _ => None,
        }
    }

    /// `Closed -> Edit`, with the draft copied from `user`.
    pub fn open_edit(&mut self, user: &User) -> Result<(), FlowError> {
        if !self.is_closed() {
            return Err(FlowError::AlreadyOpen);
        }
        info!("UserModal: editing user {}", user.id);
        *self = Self::Edit(EditFlow::open(user));
        Ok(())
    }

    /// `Closed -> Delete` (confirming) for `id`.
    pub fn request_delete(&mut self, id: UserId) -> Result<(), FlowError> {
        if !self.is_closed() {
            return Err(FlowError::AlreadyOpen);
        }
        info!("UserModal: confirming deletion of user {id}");
        *self = Self::Delete(DeleteFlow::new(id));
        Ok(())
    }

    pub fn set_draft_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), FlowError> {
        match self {
            Self::Edit(flow) => flow.set_field(field, value),
            _ => Err(FlowError::NotOpen),
        }
    }

    /// Validate the edit draft and mark it submitting. Returns what to send.
    pub fn begin_edit_submit(&mut self) -> Result<(UserId, UserPatch), FlowError> {
        match self {
            Self::Edit(flow) => flow.begin_submit().map(|patch| (flow.user().id, patch)),
            _ => Err(FlowError::NotOpen),
        }
    }

    /// Mark the delete confirmation submitting. Returns the id to delete.
    pub fn begin_delete_confirm(&mut self) -> Result<UserId, FlowError> {
        match self {
            Self::Delete(flow) => flow.begin_confirm(),
            _ => Err(FlowError::NotOpen),
        }
    }

    /// Close whatever is open, discarding drafts. No network call.
    pub fn cancel(&mut self) {
        if !self.is_closed() {
            debug!("UserModal: cancelled");
        }
        *self = Self::Closed;
    }

    /// Apply the outcome of an update call for `id`.
    pub fn resolve_edit(&mut self, id: UserId, outcome: Result<(), String>) {
        let Self::Edit(flow) = self else {
            debug!("UserModal: edit result for user {id} arrived after the dialog closed");
            return;
        };
        if flow.user().id != id || !flow.is_submitting() {
            debug!("UserModal: edit result for user {id} does not match the open dialog");
            return;
        }
        match outcome {
            Ok(()) => *self = Self::Closed,
            Err(message) => flow.fail(message),
        }
    }

    /// Apply the outcome of a delete call for `id`.
    pub fn resolve_delete(&mut self, id: UserId, outcome: Result<(), String>) {
        let Self::Delete(flow) = self else {
            debug!("UserModal: delete result for user {id} arrived after the dialog closed");
            return;
        };
        if flow.user_id() != id || !flow.is_submitting() {
            debug!("UserModal: delete result for user {id} does not match the open dialog");
            return;
        }
        match outcome {
            Ok(()) => *self = Self::Closed,
            Err(message) => flow.fail(message),
        }
    }
}

impl SnapshotClone for UserModal {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for UserModal {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
