//! The daemon's HTTP surface: health, rules, history, and the webhook
//! catch-all, behind a per-route token-bucket rate limiter.

mod error;
mod rate_limit;
mod routes;
mod server;
mod state;

pub use error::HttpError;
pub use rate_limit::RateLimiter;
pub use server::{build_router, serve};
pub use state::AppState;
