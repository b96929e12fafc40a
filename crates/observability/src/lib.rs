//! Process-wide tracing setup shared by the binaries.

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings};

/// Initialize tracing from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    self::tracing::init(&LogSettings::from_env());
}
