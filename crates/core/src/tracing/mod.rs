//! Tracing setup shared by the Stockroom binaries
//!
//! Library crates only emit events through the `tracing` macros; installing a
//! subscriber is left to whoever owns the process.

pub mod config;
pub mod init;

pub use config::{InstrumentationConfig, LogFileConfig};
pub use init::init_tracing;
