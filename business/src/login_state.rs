//! Login state and authentication management.
//!
//! This module tracks:
//! - Email/password input
//! - Authentication status
//!
//! The session token itself lives in the injected `TokenProvider` (see
//! `TokenStore`); login writes it there and logout clears it, so the API
//! client picks it up on the next request.

use std::any::Any;

use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use userdesk_states::{
    Command, CommandFuture, CommandSnapshot, LatestOnlyUpdater, SnapshotClone, State,
};
use ustr::Ustr;

use crate::error::{ApiError, ApiResult};
use crate::http::Client;
use crate::route::Route;
use crate::token::TokenStore;
use crate::BusinessConfig;

/// Request payload for `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response from `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Client for the login endpoint.
#[derive(Debug, Clone)]
pub struct AuthApi {
    base_url: Ustr,
    client: Client,
}

impl AuthApi {
    pub fn new(base_url: Ustr) -> Self {
        Self {
            base_url,
            client: Client::new(),
        }
    }

    /// Exchange credentials for a session token.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<String> {
        let request = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .map_err(|e| ApiError::Validation(format!("Failed to serialize request: {e}")))?;
        let response = request.send().await?;

        if !response.is_success() {
            return Err(ApiError::from_response(&response, "login"));
        }

        let body = response
            .json::<LoginResponse>()
            .map_err(|e| ApiError::decode("LoginResponse", &e))?;
        if body.token.trim().is_empty() {
            return Err(ApiError::Decode("login returned an empty token".to_owned()));
        }
        Ok(body.token)
    }
}

/// Input state for the login form.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl SnapshotClone for LoginInput {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for LoginInput {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Result/status of authentication.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthStatus {
    #[default]
    NotAuthenticated,
    Authenticating,
    Authenticated {
        /// `None` when the session was restored from a stored token.
        email: Option<String>,
    },
    Failed(String),
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Authenticated { email } => email.as_deref(),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Authentication status as a registered state, written by the login commands.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct AuthCompute {
    pub status: AuthStatus,
}

impl AuthCompute {
    /// Status implied by an already stored token.
    pub fn from_token_store(tokens: &TokenStore) -> Self {
        let status = if tokens.is_authenticated() {
            AuthStatus::Authenticated { email: None }
        } else {
            AuthStatus::NotAuthenticated
        };
        Self { status }
    }

    pub fn is_authenticated(&self) -> bool {
        self.status.is_authenticated()
    }
}

impl SnapshotClone for AuthCompute {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for AuthCompute {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn failed(message: impl Into<String>) -> AuthCompute {
    AuthCompute {
        status: AuthStatus::Failed(message.into()),
    }
}

/// Manual-only command that handles login.
///
/// ## Flow
///
/// 1. Validates that email and password are non-empty
/// 2. Sets status to `Authenticating`
/// 3. POSTs `{ email, password }` to `/login`
/// 4. On success, stores the token and sets status to `Authenticated`
/// 5. On failure, sets status to `Failed` with the error message
///
/// Dispatch explicitly via `ctx.dispatch::<LoginCommand>()`.
#[derive(Default, Debug)]
pub struct LoginCommand;

impl Command for LoginCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        cancel: CancellationToken,
    ) -> CommandFuture {
        let input = snap.state::<LoginInput>().cloned();
        let config = snap.state::<BusinessConfig>().map(BusinessConfig::api_url);
        let tokens = snap.state::<TokenStore>().map(TokenStore::provider);

        Box::pin(async move {
            let (input, base_url, tokens) = match (input, config, tokens) {
                (Ok(input), Ok(base_url), Ok(tokens)) => (input, base_url, tokens),
                (Err(err), _, _) | (_, Err(err), _) | (_, _, Err(err)) => {
                    error!("LoginCommand: {err}");
                    updater.set(failed(format!("Internal error: {err}")));
                    return;
                }
            };

            let email = input.email.trim().to_owned();
            if email.is_empty() {
                info!("LoginCommand: email is empty");
                updater.set(failed("Email is required"));
                return;
            }
            if input.password.is_empty() {
                info!("LoginCommand: password is empty");
                updater.set(failed("Password is required"));
                return;
            }

            info!("LoginCommand: signing in '{email}'");
            updater.set(AuthCompute {
                status: AuthStatus::Authenticating,
            });

            let api = AuthApi::new(base_url);
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return,
                outcome = api.login(&email, &input.password) => outcome,
            };

            match outcome {
                Ok(token) => {
                    // A logout that raced the request retires this run.
                    if cancel.is_cancelled() || !updater.is_current() {
                        info!("LoginCommand: '{email}' signed out before login completed");
                        return;
                    }
                    info!("LoginCommand: signed in '{email}'");
                    tokens.set_token(token);
                    updater.set(AuthCompute {
                        status: AuthStatus::Authenticated { email: Some(email) },
                    });
                    updater.set(Route::Users);
                }
                Err(err) => {
                    error!("LoginCommand: login failed: {err}");
                    let message = match err {
                        ApiError::Validation(message) => message,
                        other => other.to_string(),
                    };
                    updater.set(failed(message));
                }
            }
        })
    }

    fn supersedes_previous(&self) -> bool {
        true
    }
}

/// Manual-only command that handles logout: clears the stored token and the
/// authentication status.
///
/// Dispatch explicitly via `ctx.dispatch::<LogoutCommand>()`.
#[derive(Default, Debug)]
pub struct LogoutCommand;

impl Command for LogoutCommand {
    fn run(
        &self,
        snap: CommandSnapshot,
        updater: LatestOnlyUpdater,
        _cancel: CancellationToken,
    ) -> CommandFuture {
        let tokens = snap.state::<TokenStore>().map(TokenStore::provider);

        Box::pin(async move {
            match tokens {
                Ok(tokens) => tokens.clear_token(),
                Err(err) => error!("LogoutCommand: {err}"),
            }
            info!("LogoutCommand: user logged out");
            updater.set(AuthCompute::default());
        })
    }
}
