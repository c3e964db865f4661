//! remusic admin web server.
//!
//! This crate wires the access gate in front of the exported admin site:
//! every request goes through [`auth::gate_requests`] before it reaches a
//! route or the static site.

pub mod app;
pub mod auth;
pub mod config;
