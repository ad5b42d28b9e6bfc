//! Command implementations.

mod info;
mod send;
mod validate;

pub use info::run_info;
pub use send::run_send;
pub use validate::run_validate;

use contracts::FlushPolicy;

/// Human-readable flush policy
pub(crate) fn describe_policy(policy: &FlushPolicy) -> String {
    match policy {
        FlushPolicy::Immediate => "immediate (one flush per record)".to_string(),
        FlushPolicy::Count { threshold } => format!("count (flush every {threshold} records)"),
        FlushPolicy::Manual => "manual (flush at exit)".to_string(),
    }
}
