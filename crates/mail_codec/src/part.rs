//! Message part tree.
//!
//! Providers return a message as nested parts where any node may carry an
//! encoded body. The tree here keeps only what body lookup needs.

use crate::codec::{self, DecodeError};

/// A node of a message's MIME structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// Transport-encoded body data (may be empty)
    Leaf(String),
    /// Nested parts, in message order
    Container(Vec<Part>),
}

impl Part {
    /// First leaf with non-empty data, depth-first in message order
    pub fn first_body(&self) -> Option<&str> {
        match self {
            Part::Leaf(data) if !data.is_empty() => Some(data.as_str()),
            Part::Leaf(_) => None,
            Part::Container(children) => children.iter().find_map(Part::first_body),
        }
    }

    /// Decode the first body as text. A tree without any body data is an
    /// empty document.
    pub fn body_text(&self) -> Result<String, DecodeError> {
        match self.first_body() {
            Some(data) => codec::decode(data),
            None => Ok(String::new()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Part::Leaf(_) => 1,
            Part::Container(children) => children.iter().map(Part::leaf_count).sum(),
        }
    }
}
