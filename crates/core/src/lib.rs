//! Stockroom core types and utilities

pub mod error;
pub mod session;
pub mod settings;
pub mod state_dir;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use session::{FileSessionStore, MemorySessionStore, SavedCookies, Session, SessionStore};
pub use settings::{ApiSettings, LoggingSettings, Settings};
pub use state_dir::StateDir;
