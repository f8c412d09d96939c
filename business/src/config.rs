use std::any::Any;

use log::info;
use serde::Deserialize;
use userdesk_states::{SnapshotClone, State};
use ustr::Ustr;

pub const DEFAULT_API_BASE_URL: &str = "https://reqres.in/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessConfig {
    /// Root of the REST API, e.g. `https://reqres.in/api`.
    pub api_base_url: String,
}

/// Environment variables read by `BusinessConfig::from_env`.
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    userdesk_api_base_url: Option<String>,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
        }
    }

    /// Read `USERDESK_API_BASE_URL`, falling back to the default when unset or blank.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> anyhow::Result<Self> {
        let raw: RawConfig = serde_env::from_iter(vars)?;
        let config = match raw.userdesk_api_base_url {
            Some(url) if !url.trim().is_empty() => {
                info!("Using provided USERDESK_API_BASE_URL: {url}");
                Self::new(url.trim())
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    /// The base URL without a trailing slash.
    pub fn api_url(&self) -> Ustr {
        Ustr::from(self.api_base_url.trim().trim_end_matches('/'))
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

impl SnapshotClone for BusinessConfig {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for BusinessConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
