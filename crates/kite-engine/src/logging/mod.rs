//! Logger setup for binaries and tools built on the engine.
//!
//! Library code only talks to the `log` facade; installing a backend is left
//! to the executable.

mod init;

pub use init::{LoggingConfig, init_logging};
