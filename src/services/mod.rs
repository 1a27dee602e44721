//! Support services: error classification, retry, skill-file loading

pub mod contest_errors;
pub mod retry;
pub mod skills;

pub use contest_errors::ContestError;
pub use retry::{with_linear_retry, RetryPolicy};
pub use skills::load_skill_text;
