//! State context initialization and task management utilities.

use std::sync::Arc;

use userdesk_states::StateCtx;

use crate::login_state::{AuthCompute, LoginCommand, LoginInput, LogoutCommand};
use crate::token::{TokenProvider, TokenStore};
use crate::users::{
    ConfirmDeleteCommand, FetchUsersPageCommand, HttpUsersApi, SubmitEditCommand, UserModal,
    UsersApi, UsersApiHandle, UsersListState,
};
use crate::{BusinessConfig, Route};

/// Initialize `StateCtx` with the HTTP users API built from `config`.
pub fn build_state_ctx(config: BusinessConfig, tokens: Arc<dyn TokenProvider>) -> StateCtx {
    let api = HttpUsersApi::new(config.api_url(), Arc::clone(&tokens));
    build_state_ctx_with_api(config, tokens, Arc::new(api))
}

/// Initialize `StateCtx` with all states and commands, using `api` for user calls.
pub fn build_state_ctx_with_api(
    config: BusinessConfig,
    tokens: Arc<dyn TokenProvider>,
    api: Arc<dyn UsersApi>,
) -> StateCtx {
    let mut ctx = StateCtx::new();

    // Business config
    ctx.add_state(config);

    // Auth states
    let tokens = TokenStore::new(tokens);
    let route = Route::resolve(Route::Users, tokens.is_authenticated());
    ctx.add_state(AuthCompute::from_token_store(&tokens));
    ctx.add_state(tokens);
    ctx.add_state(LoginInput::default());
    ctx.add_state(route);

    // Users screen states
    ctx.add_state(UsersApiHandle::new(api));
    ctx.add_state(UsersListState::default());
    ctx.add_state(UserModal::default());

    // Commands
    ctx.record_command(LoginCommand);
    ctx.record_command(LogoutCommand);
    ctx.record_command(FetchUsersPageCommand);
    ctx.record_command(SubmitEditCommand);
    ctx.record_command(ConfirmDeleteCommand);

    ctx
}

/// Await all pending tasks in the `JoinSet`, syncing states as each one ends.
pub async fn await_pending_tasks(ctx: &mut StateCtx) {
    while ctx.task_count() > 0 {
        if ctx.task_set_mut().join_next().await.is_some() {
            ctx.sync_states();
        }
    }
}

/// Flush commands and await all spawned tasks.
pub async fn flush_and_await(ctx: &mut StateCtx) {
    ctx.sync_states();
    ctx.flush_commands();
    await_pending_tasks(ctx).await;
    ctx.sync_states();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::MemoryTokenStore;

    #[test]
    fn test_context_registers_everything() {
        let mut ctx = build_state_ctx(
            BusinessConfig::default(),
            Arc::new(MemoryTokenStore::new()),
        );

        assert!(ctx.state::<UsersListState>().unwrap().is_initial_load());
        assert!(ctx.state::<UserModal>().unwrap().is_closed());
        assert!(!ctx.state::<AuthCompute>().unwrap().is_authenticated());
        assert_eq!(*ctx.state::<Route>().unwrap(), Route::Login);

        assert!(ctx.enqueue_command::<FetchUsersPageCommand>().is_ok());
        assert!(ctx.enqueue_command::<SubmitEditCommand>().is_ok());
        assert!(ctx.enqueue_command::<ConfirmDeleteCommand>().is_ok());
        assert!(ctx.enqueue_command::<LoginCommand>().is_ok());
        assert!(ctx.enqueue_command::<LogoutCommand>().is_ok());
    }

    #[test]
    fn test_stored_token_starts_on_users_page() {
        let ctx = build_state_ctx(
            BusinessConfig::default(),
            Arc::new(MemoryTokenStore::with_token("QpwL5tke4Pnpja7X4")),
        );

        assert_eq!(*ctx.state::<Route>().unwrap(), Route::Users);
        assert!(ctx.state::<AuthCompute>().unwrap().is_authenticated());
    }
}
