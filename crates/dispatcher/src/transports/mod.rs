//! Transport implementations
//!
//! Contains LogTransport and MockTransport. A real XMPP client plugs in by
//! implementing `contracts::SessionTransport`.

mod log;
mod mock;

pub use self::log::LogTransport;
pub use self::mock::{MockConfig, MockHandle, MockTransport, TransportCall};
