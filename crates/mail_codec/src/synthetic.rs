//! Synthetic message builder.
//!
//! A document version is stored as a bare `text/plain` message whose subject
//! is the document name and whose body is the document content.

use chrono::{DateTime, Utc};

use crate::codec;

/// An assembled message, before transport encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticMessage {
    pub subject: String,
    pub raw: String,
}

impl SyntheticMessage {
    /// Assemble the message text for `subject` and `body`, addressed to the
    /// storage placeholder of `folder`
    pub fn new(folder: &str, subject: &str, body: &str, date: DateTime<Utc>) -> Self {
        let subject = sanitize_subject(subject);
        let address = storage_address(folder);

        let headers = [
            format!("From: {}", address),
            format!("To: {}", address),
            format!("Subject: {}", subject),
            format!("Date: {}", date.format("%a, %d %b %Y %H:%M:%S +0000")),
            "Content-Type: text/plain; charset=utf-8".to_string(),
            "MIME-Version: 1.0".to_string(),
        ];

        let raw = format!("{}\r\n\r\n{}", headers.join("\r\n"), body);
        Self { subject, raw }
    }

    /// Transport token for the provider's raw message field
    pub fn encode(&self) -> String {
        codec::encode(&self.raw)
    }
}

/// Replace line breaks in a subject so it stays a single header line
pub fn sanitize_subject(subject: &str) -> String {
    subject.replace("\r\n", " ").replace(['\r', '\n'], " ")
}

fn storage_address(folder: &str) -> String {
    format!("storage@{}.local", folder)
}

/// Build and encode a message dated now
pub fn build(folder: &str, subject: &str, body: &str) -> String {
    build_at(folder, subject, body, Utc::now())
}

/// Build and encode a message with an explicit date
pub fn build_at(folder: &str, subject: &str, body: &str, date: DateTime<Utc>) -> String {
    SyntheticMessage::new(folder, subject, body, date).encode()
}
