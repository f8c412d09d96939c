//! Page fetch command.
//!
//! The page to load is whatever `UsersListState::pending()` holds when the
//! command is flushed; callers set it with `UsersListState::begin_fetch` and
//! then dispatch `FetchUsersPageCommand`.

use chrono::Utc;
use log::{debug, error};
use tokio_util::sync::CancellationToken;
use userdesk_states::{Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater};

use super::api::UsersApiHandle;
use super::state::UsersListState;
use crate::error::ApiError;

/// Fetch the pending page and resolve it into `UsersListState`.
///
/// Flushing this command again cancels the previous fetch; a cancelled or
/// superseded fetch never writes.
#[derive(Debug, Default)]
pub struct FetchUsersPageCommand;

impl Command for FetchUsersPageCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let request = snap.state::<UsersListState>().map(UsersListState::pending);
        let api = snap.state::<UsersApiHandle>().map(UsersApiHandle::api);

        Box::pin(async move {
            let (request, api) = match (request, api) {
                (Ok(Some(request)), Ok(api)) => (request, api),
                (Ok(None), _) => {
                    debug!("FetchUsersPageCommand: no pending page, nothing to do");
                    return;
                }
                (Ok(Some(request)), Err(err)) => {
                    // Settle the pending request so the list does not stay loading.
                    error!("FetchUsersPageCommand: {err}");
                    let outcome = Err(ApiError::Internal(err.to_string()));
                    updater.update::<UsersListState>(move |state| {
                        state.resolve_fetch(request, outcome, Utc::now());
                    });
                    return;
                }
                (Err(err), _) => {
                    error!("FetchUsersPageCommand: {err}");
                    return;
                }
            };

            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("FetchUsersPageCommand: fetch of page {} cancelled", request.page);
                    return;
                }
                outcome = api.list_users(request.page) => outcome,
            };

            updater.update::<UsersListState>(move |state| {
                state.resolve_fetch(request, outcome, Utc::now());
            });
        })
    }

    fn supersedes_previous(&self) -> bool {
        true
    }
}
