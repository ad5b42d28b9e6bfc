//! # Contracts
//!
//! Frozen interface contracts shared by the sink crates: log records, session
//! credentials, flush policy, the configuration model and the
//! `SessionTransport` trait.
//! Business crates depend on this crate only; reverse dependencies are prohibited.

mod config;
mod error;
mod policy;
mod record;
mod session;
mod transport;

pub use config::*;
pub use error::*;
pub use policy::FlushPolicy;
pub use record::{LogRecord, Severity};
pub use session::{Credentials, DebugConfig, TransportVerbosity, DEFAULT_PORT, DEFAULT_RESOURCE};
pub use transport::{AuthResponse, SendStatus, SessionTransport};
