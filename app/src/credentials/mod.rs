//! Credential acquisition
//!
//! The store only needs a bearer token. How it is obtained (popup, redirect,
//! command line flag) stays behind `CredentialSource::acquire`, a single
//! suspension point.

use std::fmt;

use async_trait::async_trait;
use tracing::debug;

use crate::types::error::Result;

/// Environment variable read by `EnvCredential::default`
pub const TOKEN_ENV_VAR: &str = "SVE_GMAIL_TOKEN";

/// Bearer token for the messaging API
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Source of a credential; `Ok(None)` means the user is not signed in
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn acquire(&self) -> Result<Option<Credential>>;
}

/// A credential known up front (e.g. passed on the command line)
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.trim().is_empty()).map(Credential::new))
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn acquire(&self) -> Result<Option<Credential>> {
        Ok(self.0.clone())
    }
}

/// A credential read from an environment variable at acquisition time
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredential {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

#[async_trait]
impl CredentialSource for EnvCredential {
    async fn acquire(&self) -> Result<Option<Credential>> {
        let token = std::env::var(&self.var)
            .ok()
            .filter(|t| !t.trim().is_empty());
        debug!("Credential from {}: {}", self.var, token.is_some());
        Ok(token.map(Credential::new))
    }
}

/// Tries each source in order; the first credential wins
pub struct ChainedCredential {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl ChainedCredential {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl CredentialSource for ChainedCredential {
    async fn acquire(&self) -> Result<Option<Credential>> {
        for source in &self.sources {
            if let Some(credential) = source.acquire().await? {
                return Ok(Some(credential));
            }
        }
        Ok(None)
    }
}
