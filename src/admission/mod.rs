//! Request admission control: every request passes the rate limiter,
//! then authentication, then (for generation-heavy routes) the
//! concurrency limiter, before any handler runs.

pub mod auth;
pub mod concurrency;
pub mod rate_limit;

pub use auth::Principal;
