pub mod error;
pub mod state;

use serde::{Deserialize, Serialize};

use crate::types::error::{Result, StoreError};

pub use state::AppState;

/// A signed-in person or a post author. The email is the identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Same person, compared by email only
    pub fn is(&self, email: &str) -> bool {
        self.email.eq_ignore_ascii_case(email)
    }
}

/// A single post in a post tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub uuid: String,
    /// Direct parent; `None` for top-level posts
    #[serde(default)]
    pub parent_uuid: Option<String>,
    /// Root of the thread; `None` for top-level posts
    #[serde(default)]
    pub root_uuid: Option<String>,
    #[serde(default)]
    pub child_uuid_list: Vec<String>,
    pub author_email: String,
    #[serde(default)]
    pub author_name: String,
    /// Creation time in milliseconds since the epoch
    pub timestamp: i64,
    pub content: String,
}

impl Post {
    /// Create a top-level post written now
    pub fn new_root(author: &Person, content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(StoreError::InvalidInput(
                "Post content must not be empty".to_string(),
            ));
        }

        Ok(Self {
            uuid: uuid::Uuid::new_v4().to_string(),
            parent_uuid: None,
            root_uuid: None,
            child_uuid_list: Vec::new(),
            author_email: author.email.clone(),
            author_name: author.name.clone(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            content,
        })
    }

    pub fn is_root(&self) -> bool {
        self.parent_uuid.is_none()
    }
}

/// A root post and the people subscribed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub root_post: Post,
    #[serde(default)]
    pub subscriber_email_list: Vec<String>,
}

impl Thread {
    pub fn new(root_post: Post) -> Self {
        let subscriber_email_list = vec![root_post.author_email.clone()];
        Self {
            root_post,
            subscriber_email_list,
        }
    }

    pub fn author_email(&self) -> &str {
        &self.root_post.author_email
    }
}
