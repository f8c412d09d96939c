//! Edit flow: one user, a draft of its three mutable fields, one update call.

use log::{info, warn};
use tokio_util::sync::CancellationToken;
use userdesk_states::{Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater};

use super::api::UsersApiHandle;
use super::modal::{FlowError, UserModal};
use super::model::{User, UserId, UserPatch};
use super::state::UsersListState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    FirstName,
    LastName,
    Email,
}

impl DraftField {
    pub fn label(self) -> &'static str {
        match self {
            Self::FirstName => "First name",
            Self::LastName => "Last name",
            Self::Email => "Email",
        }
    }
}

/// Uncommitted copy of a user's editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserDraft {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::FirstName => &self.first_name,
            DraftField::LastName => &self.last_name,
            DraftField::Email => &self.email,
        }
    }

    fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::FirstName => &mut self.first_name,
            DraftField::LastName => &mut self.last_name,
            DraftField::Email => &mut self.email,
        }
    }

    /// Check requiredness and email shape, producing the trimmed update body.
    pub fn to_patch(&self) -> Result<UserPatch, FlowError> {
        let required = |field: DraftField| {
            let value = self.field(field).trim();
            if value.is_empty() {
                Err(FlowError::MissingField(field.label()))
            } else {
                Ok(value.to_owned())
            }
        };

        let first_name = required(DraftField::FirstName)?;
        let last_name = required(DraftField::LastName)?;
        let email = required(DraftField::Email)?;
        if !looks_like_email(&email) {
            return Err(FlowError::InvalidEmail(email));
        }

        Ok(UserPatch {
            first_name: Some(first_name),
            last_name: Some(last_name),
            email: Some(email),
        })
    }
}

/// `local@domain` with both sides non-empty and no whitespace.
fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Open edit dialog state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFlow {
    user: User,
    draft: UserDraft,
    /// The body in flight, present exactly while submitting.
    submitted: Option<UserPatch>,
    error: Option<String>,
}

impl EditFlow {
    pub fn open(user: &User) -> Self {
        Self {
            user: user.clone(),
            draft: UserDraft::from_user(user),
            submitted: None,
            error: None,
        }
    }

    /// The record as it was when the dialog opened. Never modified by edits.
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn draft(&self) -> &UserDraft {
        &self.draft
    }

    pub fn is_submitting(&self) -> bool {
        self.submitted.is_some()
    }

    pub fn submitted(&self) -> Option<&UserPatch> {
        self.submitted.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_field(
        &mut self,
        field: DraftField,
        value: impl Into<String>,
    ) -> Result<(), FlowError> {
        if self.is_submitting() {
            return Err(FlowError::Submitting);
        }
        *self.draft.field_mut(field) = value.into();
        Ok(())
    }

    /// Validate the draft and enter `submitting`.
    ///
    /// A validation failure is also stored as the flow's error message; the
    /// flow stays open either way.
    pub fn begin_submit(&mut self) -> Result<UserPatch, FlowError> {
        if self.is_submitting() {
            return Err(FlowError::Submitting);
        }
        match self.draft.to_patch() {
            Ok(patch) => {
                self.submitted = Some(patch.clone());
                self.error = None;
                Ok(patch)
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.submitted = None;
        self.error = Some(message);
    }
}

/// Send the submitting edit draft to the server.
///
/// On success the list merges the fields that were sent and the dialog
/// closes; on any failure the dialog stays open with the error message.
#[derive(Debug, Default)]
pub struct SubmitEditCommand;

impl Command for SubmitEditCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let pending = snap.state::<UserModal>().ok().and_then(submitting_edit);
        let api = snap.state::<UsersApiHandle>().map(UsersApiHandle::api);

        Box::pin(async move {
            let Some((id, patch)) = pending else {
                warn!("SubmitEditCommand: no edit is waiting to be submitted");
                return;
            };
            let api = match api {
                Ok(api) => api,
                Err(err) => {
                    let message = err.to_string();
                    updater.update::<UserModal>(move |modal| modal.resolve_edit(id, Err(message)));
                    return;
                }
            };

            match api.update_user(id, &patch).await {
                Ok(echo) => {
                    info!(
                        "SubmitEditCommand: user {id} updated at {}",
                        echo.updated_at.as_deref().unwrap_or("unknown time")
                    );
                    updater.update::<UsersListState>(move |list| {
                        list.apply_update(id, &patch);
                    });
                    updater.update::<UserModal>(move |modal| modal.resolve_edit(id, Ok(())));
                }
                Err(err) => {
                    warn!("SubmitEditCommand: updating user {id} failed: {err}");
                    let message = format!("Failed to update user: {err}");
                    updater.update::<UserModal>(move |modal| {
                        modal.resolve_edit(id, Err(message));
                    });
                }
            }
        })
    }
}

fn submitting_edit(modal: &UserModal) -> Option<(UserId, UserPatch)> {
    let flow = modal.edit()?;
    let patch = flow.submitted()?.clone();
    Some((flow.user().id, patch))
}
