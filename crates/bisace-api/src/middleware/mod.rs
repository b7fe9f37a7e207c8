//! # Middleware Modules
//!
//! Tower middleware layers for the API service. Session login/logout lives
//! in [`crate::session`].

pub mod api_log;
