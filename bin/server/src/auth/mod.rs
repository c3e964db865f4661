//! Authentication module for the remusic admin server.
//!
//! This module provides:
//! - The request gating middleware that runs the access gate on every request
//! - The logout route
//!
//! # Authorization Model
//!
//! Sessions belong to Supabase Auth and live in the `@supabase/ssr` auth
//! cookie. Roles live in the Supabase `users` table. Both are read fresh on
//! every gated request; nothing is cached between requests, so a role change
//! takes effect on the next navigation.

pub mod middleware;
pub mod routes;

use remusic_admin_access::AccessGate;

pub use middleware::{CurrentUser, gate_requests, request_cookies, with_cookies};
pub use routes::logout;

/// Shared application state.
pub struct AppState {
    /// Access gate over the session verifier and role store.
    pub gate: AccessGate,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(gate: AccessGate) -> Self {
        Self { gate }
    }
}
