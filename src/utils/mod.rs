//! Small shared helpers that don't belong to any one component.

pub mod retry;
pub mod time;

pub use retry::retry_with_backoff;
