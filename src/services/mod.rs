//! Domain services used by HTTP routes and middleware.
//!
//! ARCHITECTURE
//! ============
//! Service modules own persistence, hashing, and token cryptography so route
//! handlers can stay focused on protocol translation and cookie plumbing.

pub mod accounts;
pub mod github;
pub mod password;
pub mod token;
