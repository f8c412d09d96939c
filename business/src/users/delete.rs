//! Delete confirmation flow.

use log::{info, warn};
use tokio_util::sync::CancellationToken;
use userdesk_states::{Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater};

use super::api::UsersApiHandle;
use super::modal::{FlowError, UserModal};
use super::model::UserId;
use super::state::UsersListState;

/// A pending deletion awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFlow {
    user_id: UserId,
    submitting: bool,
    error: Option<String>,
}

impl DeleteFlow {
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            submitting: false,
            error: None,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn begin_confirm(&mut self) -> Result<UserId, FlowError> {
        if self.submitting {
            return Err(FlowError::Submitting);
        }
        self.submitting = true;
        self.error = None;
        Ok(self.user_id)
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.submitting = false;
        self.error = Some(message);
    }
}

/// Delete the confirmed user.
///
/// The list drops the user and the dialog closes on success. A user the
/// server no longer knows counts as deleted.
#[derive(Debug, Default)]
pub struct ConfirmDeleteCommand;

impl Command for ConfirmDeleteCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let pending = snap
            .state::<UserModal>()
            .ok()
            .and_then(UserModal::delete)
            .filter(|flow| flow.is_submitting())
            .map(DeleteFlow::user_id);
        let api = snap.state::<UsersApiHandle>().map(UsersApiHandle::api);

        Box::pin(async move {
            let Some(id) = pending else {
                warn!("ConfirmDeleteCommand: no deletion is waiting to be confirmed");
                return;
            };
            let api = match api {
                Ok(api) => api,
                Err(err) => {
                    let message = err.to_string();
                    updater.update::<UserModal>(move |modal| {
                        modal.resolve_delete(id, Err(message));
                    });
                    return;
                }
            };

            match api.delete_user(id).await {
                Ok(()) => {
                    info!("ConfirmDeleteCommand: user {id} deleted");
                    updater.update::<UsersListState>(move |list| {
                        list.apply_delete(id);
                    });
                    updater.update::<UserModal>(move |modal| modal.resolve_delete(id, Ok(())));
                }
                Err(err) => {
                    warn!("ConfirmDeleteCommand: deleting user {id} failed: {err}");
                    let message = format!("Failed to delete user: {err}");
                    updater.update::<UserModal>(move |modal| {
                        modal.resolve_delete(id, Err(message));
                    });
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_enters_submitting_once() {
        let mut flow = DeleteFlow::new(5);
        assert_eq!(flow.begin_confirm(), Ok(5));
        assert!(flow.is_submitting());
        assert_eq!(flow.begin_confirm(), Err(FlowError::Submitting));
    }

    #[test]
    fn test_failure_allows_retry() {
        let mut flow = DeleteFlow::new(5);
        flow.begin_confirm().unwrap();
        flow.fail("Failed to delete user: Network error: offline".to_owned());

        assert!(!flow.is_submitting());
        assert!(flow.error().unwrap().contains("offline"));
        assert_eq!(flow.begin_confirm(), Ok(5));
        assert!(flow.error().is_none());
    }
}
