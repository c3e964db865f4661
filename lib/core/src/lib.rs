//! Core types shared by the remusic admin backend crates.
//!
//! This crate provides the `Result` alias used across the workspace and the
//! identifier type for users issued by the external auth provider.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::UserId;
