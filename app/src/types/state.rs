//! Persisted application state
//!
//! The snapshot that is written to the repository document. Session data is
//! never part of it.

use serde::{Deserialize, Serialize};

use crate::types::error::Result;
use crate::types::{Person, Thread};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Threads from the people the signed-in person follows
    #[serde(default)]
    pub others_timeline: Vec<Thread>,
    /// Threads started by the signed-in person
    #[serde(default)]
    pub my_timeline: Vec<Thread>,
    #[serde(default)]
    pub following: Vec<Person>,
    #[serde(default)]
    pub followers: Vec<Person>,
}

impl AppState {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn thread_count(&self) -> usize {
        self.my_timeline.len() + self.others_timeline.len()
    }

    pub fn people_count(&self) -> usize {
        self.following.len() + self.followers.len()
    }

    pub fn is_following(&self, email: &str) -> bool {
        self.following.iter().any(|p| p.is(email))
    }

    /// Threads rooted by `email`, across both timelines
    pub fn threads_by<'a>(&'a self, email: &'a str) -> impl Iterator<Item = &'a Thread> + 'a {
        self.my_timeline
            .iter()
            .chain(self.others_timeline.iter())
            .filter(move |t| t.author_email().eq_ignore_ascii_case(email))
    }

    /// Add `person` to the following list; returns false if already followed
    pub fn follow(&mut self, person: Person) -> bool {
        if self.is_following(&person.email) {
            return false;
        }
        self.following.push(person);
        true
    }

    /// Remove `email` from the following list; returns false if not followed
    pub fn unfollow(&mut self, email: &str) -> bool {
        let before = self.following.len();
        self.following.retain(|p| !p.is(email));
        self.following.len() != before
    }
}
