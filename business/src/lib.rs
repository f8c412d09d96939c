//! Client core of the user management screen: API client, paginated list
//! controller, edit and delete flows, login and route gating.

mod config;
mod context;
mod error;
pub mod http;
mod login_state;
mod route;
mod session;
mod token;
pub mod users;

pub use config::{BusinessConfig, DEFAULT_API_BASE_URL};
pub use context::{await_pending_tasks, build_state_ctx, build_state_ctx_with_api, flush_and_await};
pub use error::{ApiError, ApiResult};
pub use login_state::{
    AuthApi, AuthCompute, AuthStatus, LoginCommand, LoginInput, LoginRequest, LoginResponse,
    LogoutCommand,
};
pub use route::Route;
pub use session::{login, logout, navigate};
pub use token::{MemoryTokenStore, TokenProvider, TokenStore};
