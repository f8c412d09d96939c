//! Route state for page navigation.
//!
//! The users screen is gated on a stored token; everything else goes to login.

use std::any::Any;

use log::debug;
use serde::{Deserialize, Serialize};
use userdesk_states::{SnapshotClone, State};

/// Represents the current page/route of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Login page - shown when user is not authenticated
    #[default]
    Login,
    /// User management page - requires a token
    Users,
}

impl Route {
    /// Map a location path to a route. The root path goes to the users page.
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" | "/users" => Some(Self::Users),
            "/login" => Some(Self::Login),
            _ => None,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Users => "/users",
        }
    }

    /// The route to actually show for `requested`.
    pub fn resolve(requested: Self, is_authenticated: bool) -> Self {
        let resolved = match (requested, is_authenticated) {
            (Self::Users, false) => Self::Login,
            (Self::Login, true) => Self::Users,
            (route, _) => route,
        };
        if resolved != requested {
            debug!("Route: redirecting {} to {}", requested.path(), resolved.path());
        }
        resolved
    }
}

impl SnapshotClone for Route {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(*self))
    }
}

impl State for Route {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
