//! Infrastructure layer: user persistence and reset-notification adapters.

pub mod notify;
pub mod users;


pub use notify::{OutboxNotifier, ResetMessage, TracingNotifier};
pub use users::{InMemoryUserStore, PostgresUserStore};
