pub mod backend;
pub mod console_session;
pub mod dto;
pub mod retry_session;
pub mod urls;

pub use backend::{ConsoleBackend, Download};
pub use console_session::ConsoleSession;
pub use dto::{LookupTable, SessionIdentity};
