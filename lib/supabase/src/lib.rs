//! Supabase collaborators for the remusic admin gate.
//!
//! - [`SupabaseAuth`] verifies sessions stored in the `@supabase/ssr` auth
//!   cookie, refreshing and rotating them when they are about to expire.
//! - [`SupabaseRoleStore`] reads roles from the `users` table through
//!   PostgREST.

mod auth;
mod config;
mod error;
pub mod session_cookie;
mod store;
#[cfg(test)]
mod test_server;

pub use auth::SupabaseAuth;
pub use config::SupabaseConfig;
pub use error::CookieError;
pub use session_cookie::StoredSession;
pub use store::SupabaseRoleStore;
