//! Error types for the access crate.
//!
//! Collaborators report failures as `rootcause::Report`s over these enums.
//! The gate never propagates them: a session failure makes the request
//! anonymous and a store failure denies the protected route.

use std::fmt;

/// Errors from session verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The auth provider could not be reached.
    Unavailable { reason: String },
    /// The auth provider answered with an unexpected status.
    UnexpectedStatus { status: u16, body: String },
    /// The auth provider's response could not be understood.
    InvalidResponse { reason: String },
    /// The verifier is not configured correctly.
    Misconfigured { reason: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "auth provider unavailable: {reason}")
            }
            Self::UnexpectedStatus { status, body } => {
                write!(f, "auth provider returned status {status}: {body}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid auth provider response: {reason}")
            }
            Self::Misconfigured { reason } => {
                write!(f, "session verifier misconfigured: {reason}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Errors from the user-record store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleStoreError {
    /// The store could not be reached.
    Unavailable { reason: String },
    /// The store answered with an unexpected status.
    UnexpectedStatus { status: u16, body: String },
    /// The store's response could not be decoded.
    InvalidResponse { reason: String },
}

impl fmt::Display for RoleStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => {
                write!(f, "user store unavailable: {reason}")
            }
            Self::UnexpectedStatus { status, body } => {
                write!(f, "user store returned status {status}: {body}")
            }
            Self::InvalidResponse { reason } => {
                write!(f, "invalid user store response: {reason}")
            }
        }
    }
}

impl std::error::Error for RoleStoreError {}
