//! Supabase crate error types.

use std::fmt;

/// Errors decoding or encoding the auth cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieError {
    /// The `base64-` payload is not valid base64url or UTF-8.
    Encoding {
        /// Error details.
        reason: String,
    },
    /// The payload is not a session object.
    Json {
        /// Error details.
        reason: String,
    },
}

impl fmt::Display for CookieError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoding { reason } => {
                write!(f, "invalid auth cookie encoding: {}", reason)
            }
            Self::Json { reason } => {
                write!(f, "invalid auth cookie payload: {}", reason)
            }
        }
    }
}

impl std::error::Error for CookieError {}
