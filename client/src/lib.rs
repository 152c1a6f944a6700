//! Session lifecycle library for realty front ends.
//!
//! A [`Session`] wires together the pieces a front end needs to stay signed
//! in: the [`TokenStore`] holding token and profile, the [`CookieBridge`]
//! mirroring them into the app origin's cookies, the [`ApiClient`] that
//! authenticates, throttles and retries calls, and the [`AuthContext`] state
//! machine that turns all of it into a status and navigation decisions.

pub mod config;
pub mod context;
pub mod cookies;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod retry;
pub mod session;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::ClientConfig;
pub use context::{AuthContext, AuthStatus, Navigation, unix_now};
pub use cookies::CookieBridge;
pub use error::ClientError;
pub use http::{ApiClient, Auth};
pub use session::Session;
pub use store::{SessionSnapshot, TokenStore};
