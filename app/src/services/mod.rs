//! Store and session services
//!
//! Provider-agnostic logic built on `MessagingApi`, usable from the command
//! line and from tests alike.
//!
//! Services should:
//! - Take the messaging API and session explicitly, never from globals
//! - Use StoreError for error handling
//! - Be easily testable against an in-memory mailbox

mod bootstrap;
mod document_store;
mod label_directory;
mod session;

pub use bootstrap::*;
pub use document_store::*;
pub use label_directory::*;
pub use session::*;
