//! Login, logout and route gating over a `StateCtx`.

use userdesk_states::StateCtx;

use crate::login_state::{LoginCommand, LoginInput, LogoutCommand};
use crate::route::Route;
use crate::token::TokenStore;
use crate::users::{UserModal, UsersListState};

/// Store the credentials and dispatch `LoginCommand`.
pub fn login(
    ctx: &mut StateCtx,
    email: impl Into<String>,
    password: impl Into<String>,
) -> Result<(), userdesk_states::Error> {
    ctx.add_state(LoginInput {
        email: email.into(),
        password: password.into(),
    });
    ctx.dispatch::<LoginCommand>()
}

/// Cancel any login in flight, dispatch `LogoutCommand` and drop everything
/// the users screen held.
pub fn logout(ctx: &mut StateCtx) -> Result<(), userdesk_states::Error> {
    ctx.cancel_command::<LoginCommand>();
    ctx.add_state(LoginInput::default());
    ctx.add_state(UsersListState::default());
    ctx.add_state(UserModal::default());
    ctx.add_state(Route::Login);
    ctx.dispatch::<LogoutCommand>()
}

/// Resolve `requested` against the stored token and make it the current route.
pub fn navigate(ctx: &mut StateCtx, requested: Route) -> Result<Route, userdesk_states::Error> {
    let is_authenticated = ctx.state::<TokenStore>()?.is_authenticated();
    let route = Route::resolve(requested, is_authenticated);
    ctx.add_state(route);
    Ok(route)
}
