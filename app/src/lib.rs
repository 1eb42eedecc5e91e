//! Mailbox-backed document store for the social-via-email client
//!
//! Folders are mailbox labels, documents are messages addressed by subject.

pub mod adapters;
pub mod config;
pub mod credentials;
pub mod oauth;
pub mod services;
pub mod types;

use tracing_subscriber::EnvFilter;

pub use adapters::gmail::{ApiError, GmailClient, MessagingApi};
pub use config::{load_config, AppConfig};
pub use credentials::{Credential, CredentialSource};
pub use services::{Bootstrap, BootstrapReport, DocumentStore, LabelDirectory, Session};
pub use types::error::{Result, StoreError};
pub use types::{AppState, Person};

/// Install the global tracing subscriber; `RUST_LOG` overrides the default
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            // Debug build: show debug logs for our crate, info for others
            EnvFilter::new("social_via_email_lib=debug,info")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Store bound to a fresh Gmail client for `credential`
pub fn connect(config: &AppConfig, credential: &Credential) -> Result<DocumentStore<GmailClient>> {
    let client = GmailClient::new(config, credential.clone())
        .map_err(|e| StoreError::StoreUnavailable(e.to_string()))?;
    Ok(DocumentStore::new(client))
}
