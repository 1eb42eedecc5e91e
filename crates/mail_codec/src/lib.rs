//! Transport encoding for mailbox-backed documents.
//!
//! - `codec`: URL-safe, unpadded base64 over UTF-8 text
//! - `synthetic`: minimal RFC 822 message carrying one document version
//! - `part`: message part tree and body lookup

pub mod codec;
pub mod part;
pub mod synthetic;

pub use codec::{decode, decode_bytes, encode, encode_bytes, DecodeError};
pub use part::Part;
pub use synthetic::{build, build_at, sanitize_subject, SyntheticMessage};
