//! Access token for gated Hugging Face models

use crate::{Result, TalkbackError};
use std::fmt;
use tracing::{info, warn};

/// Environment variable read when nothing else is configured
pub const DEFAULT_TOKEN_ENV: &str = "HUGGING_FACE_TOKEN";

/// A Hugging Face access token
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Read the token from `var`
    ///
    /// A missing or blank variable is `CredentialMissing`.
    pub fn from_env(var: &str) -> Result<Self> {
        Self::from_lookup(var, |name| std::env::var(name).ok())
    }

    /// Resolve through an arbitrary lookup (the environment in production)
    pub fn from_lookup<F>(var: &str, lookup: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(var) {
            Some(value) if !value.trim().is_empty() => {
                info!("Hugging Face token found in {}", var);
                Ok(Self::new(value.trim()))
            }
            _ => {
                warn!("{} is not set; gated models will not be loaded", var);
                Err(TalkbackError::CredentialMissing(var.to_string()))
            }
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("token", &"<redacted>").finish()
    }
}
