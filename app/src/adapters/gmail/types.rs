//! Wire shapes of the Gmail API, validated on receipt
//!
//! Raw JSON is deserialized into private `Raw*` structs and converted into
//! the public types; a response missing a required field fails with
//! `ApiError::InvalidResponse` instead of surfacing empty values.

use serde::{Deserialize, Serialize};

use mail_codec::Part;

use super::ApiError;
use crate::types::Person;

/// A mailbox label (folder)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// Response of `GET /labels`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelListResult {
    #[serde(default)]
    pub labels: Vec<RawLabel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLabel {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl LabelListResult {
    pub fn into_labels(self) -> Result<Vec<Label>, ApiError> {
        self.labels.into_iter().map(RawLabel::into_label).collect()
    }
}

impl RawLabel {
    pub fn into_label(self) -> Result<Label, ApiError> {
        match (self.id, self.name) {
            (Some(id), Some(name)) if !id.is_empty() => Ok(Label { id, name }),
            _ => Err(ApiError::InvalidResponse(
                "label without id or name".to_string(),
            )),
        }
    }
}

/// A message id as returned by listings and inserts
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// One page of `GET /messages`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListPage {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub result_size_estimate: Option<u32>,
}

impl MessageListPage {
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.messages.iter().any(|m| m.id.is_empty()) {
            return Err(ApiError::InvalidResponse(
                "message listing contains an empty id".to_string(),
            ));
        }
        Ok(self)
    }

    /// Continuation token, treating an empty token as the last page
    pub fn next_page(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// A fetched message reduced to what the store reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageResource {
    pub id: String,
    pub subject: Option<String>,
    pub payload: Part,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    payload: Option<RawPart>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    #[serde(default)]
    headers: Vec<RawHeader>,
    #[serde(default)]
    body: Option<RawBody>,
    #[serde(default)]
    parts: Vec<RawPart>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawHeader {
    name: String,
    value: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawBody {
    #[serde(default)]
    data: Option<String>,
}

impl RawPart {
    /// A node with body data is a leaf even if it also lists children
    fn into_part(self) -> Part {
        let data = self.body.and_then(|b| b.data).unwrap_or_default();
        if !data.is_empty() || self.parts.is_empty() {
            Part::Leaf(data)
        } else {
            Part::Container(self.parts.into_iter().map(RawPart::into_part).collect())
        }
    }

    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.clone())
    }
}

impl TryFrom<RawMessage> for MessageResource {
    type Error = ApiError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("message without id".to_string()))?;
        let payload = raw
            .payload
            .ok_or_else(|| ApiError::InvalidResponse(format!("message {} has no payload", id)))?;

        let subject = payload.header("Subject");
        Ok(MessageResource {
            id,
            subject,
            payload: payload.into_part(),
        })
    }
}

/// Shown for a message without a subject header
pub const NO_SUBJECT: &str = "(No subject)";

/// Shown for a message whose metadata could not be fetched
pub const UNABLE_TO_LOAD: &str = "(Unable to load)";

impl RawMessage {
    /// Subject header of a `format=metadata` fetch, or `NO_SUBJECT`
    pub fn subject_or_default(&self) -> String {
        self.payload
            .as_ref()
            .and_then(|p| p.header("Subject"))
            .unwrap_or_else(|| NO_SUBJECT.to_string())
    }
}

/// Response of `GET /profile`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub email_address: String,
    #[serde(default)]
    pub messages_total: Option<u64>,
}

/// Response of the OAuth userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl UserInfo {
    /// The signed-in person; the name falls back to the email when blank
    pub fn into_person(self) -> Result<Person, ApiError> {
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ApiError::InvalidResponse("userinfo without email".to_string()))?;
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| email.clone());
        Ok(Person::new(name, email))
    }
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Message for an unsuccessful response, preferring the API's own text
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.message)
        .unwrap_or_else(|| {
            let body = body.trim();
            if body.is_empty() {
                format!("status {}", status)
            } else {
                body.to_string()
            }
        })
}
