pub mod rate_limiter;
pub mod retry;

pub use rate_limiter::{RateLimitedPlatform, RateLimiter};
pub use retry::{with_quota_retry, RetryPolicy};
