//! In-memory mailbox for tests
//!
//! Mimics the parts of Gmail the store relies on: labels, label-scoped subject
//! search with paginated results (newest first), raw message insert, delete.

use std::sync::Mutex;

use async_trait::async_trait;

use mail_codec::Part;

use super::{ApiError, Label, MessageListPage, MessageQuery, MessageRef, MessageResource, MessagingApi};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_labels: usize,
    pub create_label: usize,
    pub list_messages: usize,
    pub get_message: usize,
    pub delete_message: usize,
    pub insert_message: usize,
}

#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub id: String,
    pub label_id: String,
    pub subject: String,
    pub body: String,
    /// Served instead of `body` when set
    pub payload: Option<Part>,
}

#[derive(Default)]
struct State {
    labels: Vec<Label>,
    messages: Vec<StoredMessage>,
    next_id: u64,
    calls: CallCounts,
    fail_list_labels: bool,
    fail_list_messages: bool,
    fail_inserts: bool,
    fail_creates: bool,
    /// Status returned by every `get_message` while set
    get_failure: Option<u16>,
    /// Deletes succeed this many times, then fail
    deletes_before_failure: Option<usize>,
    /// Label created by someone else between our listing and our create
    conflict_on_create: bool,
}

pub struct FakeMailbox {
    page_size: usize,
    state: Mutex<State>,
}

impl FakeMailbox {
    pub fn new() -> Self {
        Self::with_page_size(500)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            state: Mutex::new(State::default()),
        }
    }

    pub fn add_label(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("Label_{}", state.next_id);
        state.labels.push(Label {
            id: id.clone(),
            name: name.to_string(),
        });
        id
    }

    /// Store a message directly, bypassing the raw encoding
    pub fn seed_message(&self, label_id: &str, subject: &str, body: &str) -> String {
        let mut state = self.state.lock().unwrap();
        push_message(&mut state, label_id, subject, body)
    }

    /// Store a message with a hand-built part tree
    pub fn seed_payload(&self, label_id: &str, subject: &str, payload: Part) -> String {
        let mut state = self.state.lock().unwrap();
        let id = push_message(&mut state, label_id, subject, "");
        if let Some(message) = state.messages.iter_mut().find(|m| m.id == id) {
            message.payload = Some(payload);
        }
        id
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.state.lock().unwrap().labels.clone()
    }

    pub fn messages_with_subject(&self, label_id: &str, subject: &str) -> Vec<StoredMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| m.label_id == label_id && m.subject == subject)
            .cloned()
            .collect()
    }

    pub fn fail_list_labels(&self) {
        self.state.lock().unwrap().fail_list_labels = true;
    }

    pub fn fail_list_messages(&self) {
        self.state.lock().unwrap().fail_list_messages = true;
    }

    pub fn fail_inserts(&self) {
        self.state.lock().unwrap().fail_inserts = true;
    }

    pub fn fail_creates(&self) {
        self.state.lock().unwrap().fail_creates = true;
    }

    /// Listed messages are gone by the time they are fetched
    pub fn vanish_on_get(&self) {
        self.state.lock().unwrap().get_failure = Some(404);
    }

    pub fn fail_gets(&self) {
        self.state.lock().unwrap().get_failure = Some(500);
    }

    pub fn fail_deletes_after(&self, successes: usize) {
        self.state.lock().unwrap().deletes_before_failure = Some(successes);
    }

    pub fn conflict_on_create(&self) {
        self.state.lock().unwrap().conflict_on_create = true;
    }
}

fn push_message(state: &mut State, label_id: &str, subject: &str, body: &str) -> String {
    state.next_id += 1;
    let id = format!("msg{:04}", state.next_id);
    state.messages.push(StoredMessage {
        id: id.clone(),
        label_id: label_id.to_string(),
        subject: subject.to_string(),
        body: body.to_string(),
        payload: None,
    });
    id
}

/// Inverse of `subject_query`
fn parse_subject_query(q: &str) -> Option<String> {
    let inner = q.strip_prefix("subject:\"")?.strip_suffix('"')?;
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Split a raw RFC 822 text into its subject and body
fn parse_raw(raw: &str) -> Result<(String, String), ApiError> {
    let (headers, body) = raw
        .split_once("\r\n\r\n")
        .ok_or_else(|| ApiError::Status {
            status: 400,
            message: "Invalid raw message".to_string(),
        })?;
    let subject = headers
        .split("\r\n")
        .find_map(|line| line.strip_prefix("Subject: "))
        .unwrap_or_default()
        .to_string();
    Ok((subject, body.to_string()))
}

#[async_trait]
impl MessagingApi for FakeMailbox {
    async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_labels += 1;
        if state.fail_list_labels {
            return Err(ApiError::Network("connection reset".to_string()));
        }
        Ok(state.labels.clone())
    }

    async fn create_label(&self, name: &str) -> Result<Label, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_label += 1;
        if state.fail_creates {
            return Err(ApiError::Status {
                status: 403,
                message: "Insufficient Permission".to_string(),
            });
        }

        if state.conflict_on_create {
            state.conflict_on_create = false;
            state.next_id += 1;
            let id = format!("Label_{}", state.next_id);
            state.labels.push(Label {
                id,
                name: name.to_string(),
            });
            return Err(ApiError::Conflict("Label name exists or conflicts".to_string()));
        }
        if state.labels.iter().any(|l| l.name == name) {
            return Err(ApiError::Conflict("Label name exists or conflicts".to_string()));
        }

        state.next_id += 1;
        let label = Label {
            id: format!("Label_{}", state.next_id),
            name: name.to_string(),
        };
        state.labels.push(label.clone());
        Ok(label)
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<MessageListPage, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_messages += 1;
        if state.fail_list_messages {
            return Err(ApiError::Status {
                status: 503,
                message: "Backend Error".to_string(),
            });
        }

        let subject = parse_subject_query(&query.q).ok_or_else(|| ApiError::Status {
            status: 400,
            message: format!("Unsupported query {}", query.q),
        })?;

        let matching: Vec<&StoredMessage> = state
            .messages
            .iter()
            .rev()
            .filter(|m| m.label_id == query.label_id && m.subject == subject)
            .collect();

        let offset: usize = match &query.page_token {
            Some(token) => token.parse().map_err(|_| ApiError::Status {
                status: 400,
                message: "Invalid pageToken".to_string(),
            })?,
            None => 0,
        };
        let limit = self.page_size.min(query.max_results.max(1) as usize);
        let end = (offset + limit).min(matching.len());

        let messages = matching[offset.min(end)..end]
            .iter()
            .map(|m| MessageRef {
                id: m.id.clone(),
                thread_id: Some(m.id.clone()),
            })
            .collect();
        let next_page_token = (end < matching.len()).then(|| end.to_string());

        Ok(MessageListPage {
            messages,
            next_page_token,
            result_size_estimate: Some(matching.len() as u32),
        })
    }

    async fn get_message(&self, id: &str) -> Result<MessageResource, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_message += 1;
        if let Some(status) = state.get_failure {
            let message = match status {
                404 => "Requested entity was not found.",
                _ => "Internal error",
            };
            return Err(ApiError::Status {
                status,
                message: message.to_string(),
            });
        }
        let message = state
            .messages
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            })?;

        Ok(MessageResource {
            id: message.id.clone(),
            subject: Some(message.subject.clone()),
            payload: message
                .payload
                .clone()
                .unwrap_or_else(|| Part::Leaf(mail_codec::encode(&message.body))),
        })
    }

    async fn delete_message(&self, id: &str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_message += 1;

        if let Some(remaining) = state.deletes_before_failure {
            if remaining == 0 {
                return Err(ApiError::Status {
                    status: 500,
                    message: "Internal error".to_string(),
                });
            }
            state.deletes_before_failure = Some(remaining - 1);
        }

        let before = state.messages.len();
        state.messages.retain(|m| m.id != id);
        if state.messages.len() == before {
            return Err(ApiError::Status {
                status: 404,
                message: "Requested entity was not found.".to_string(),
            });
        }
        Ok(())
    }

    async fn insert_message(&self, raw: &str, label_id: &str) -> Result<MessageRef, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.insert_message += 1;
        if state.fail_inserts {
            return Err(ApiError::Status {
                status: 500,
                message: "Internal error".to_string(),
            });
        }

        let text = mail_codec::decode(raw).map_err(|e| ApiError::Status {
            status: 400,
            message: e.to_string(),
        })?;
        let (subject, body) = parse_raw(&text)?;
        let id = push_message(&mut state, label_id, &subject, &body);
        Ok(MessageRef {
            thread_id: Some(id.clone()),
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gmail::subject_query;

    #[test]
    fn test_parse_subject_query_inverse() {
        for name in ["posts", "say \"hi\"", "back\\slash"] {
            assert_eq!(parse_subject_query(&subject_query(name)).as_deref(), Some(name));
        }
    }

    #[tokio::test]
    async fn test_pagination() {
        let fake = FakeMailbox::with_page_size(2);
        let label = fake.add_label("f");
        for i in 0..5 {
            fake.seed_message(&label, "n", &i.to_string());
        }

        let first = fake
            .list_messages(&MessageQuery::new(&label, subject_query("n"), 500))
            .await
            .unwrap();
        assert_eq!(first.messages.len(), 2);
        assert_eq!(first.next_page_token.as_deref(), Some("2"));

        let last = fake
            .list_messages(
                &MessageQuery::new(&label, subject_query("n"), 500)
                    .with_page_token(Some("4".to_string())),
            )
            .await
            .unwrap();
        assert_eq!(last.messages.len(), 1);
        assert_eq!(last.next_page_token, None);
    }
}
