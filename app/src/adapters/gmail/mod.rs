//! Gmail REST API boundary
//!
//! `MessagingApi` is the subset of the provider API the document store needs.
//! `GmailClient` implements it over HTTPS; tests use an in-memory mailbox.

mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

pub use client::GmailClient;
pub use types::{Label, LabelListResult, MessageListPage, MessageRef, MessageResource};

/// Errors from the messaging API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Network(String),

    #[error("Credential rejected by provider")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// One page request of a message search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub label_id: String,
    pub q: String,
    pub max_results: u32,
    pub page_token: Option<String>,
}

impl MessageQuery {
    pub fn new(label_id: impl Into<String>, q: impl Into<String>, max_results: u32) -> Self {
        Self {
            label_id: label_id.into(),
            q: q.into(),
            max_results,
            page_token: None,
        }
    }

    pub fn with_page_token(mut self, page_token: Option<String>) -> Self {
        self.page_token = page_token;
        self
    }
}

/// Exact-subject search expression for `name`.
///
/// Backslashes and double quotes are escaped so the name stays one quoted
/// phrase. The provider's phrase tokenization still applies, so names with
/// punctuation may match more loosely than byte equality.
pub fn subject_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("subject:\"{}\"", escaped)
}

/// Messaging operations used by the label directory and document store
#[async_trait]
pub trait MessagingApi: Send + Sync {
    async fn list_labels(&self) -> Result<Vec<Label>, ApiError>;

    async fn create_label(&self, name: &str) -> Result<Label, ApiError>;

    async fn list_messages(&self, query: &MessageQuery) -> Result<MessageListPage, ApiError>;

    async fn get_message(&self, id: &str) -> Result<MessageResource, ApiError>;

    async fn delete_message(&self, id: &str) -> Result<(), ApiError>;

    /// Insert a raw transport-encoded message tagged with `label_id`
    async fn insert_message(&self, raw: &str, label_id: &str) -> Result<MessageRef, ApiError>;
}

#[async_trait]
impl<T: MessagingApi + ?Sized> MessagingApi for Arc<T> {
    async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        (**self).list_labels().await
    }

    async fn create_label(&self, name: &str) -> Result<Label, ApiError> {
        (**self).create_label(name).await
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<MessageListPage, ApiError> {
        (**self).list_messages(query).await
    }

    async fn get_message(&self, id: &str) -> Result<MessageResource, ApiError> {
        (**self).get_message(id).await
    }

    async fn delete_message(&self, id: &str) -> Result<(), ApiError> {
        (**self).delete_message(id).await
    }

    async fn insert_message(&self, raw: &str, label_id: &str) -> Result<MessageRef, ApiError> {
        (**self).insert_message(raw, label_id).await
    }
}
