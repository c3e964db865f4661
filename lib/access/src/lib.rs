//! Request gating for the remusic admin applications.
//!
//! This crate provides:
//! - Route classification (`RouteTable`, `RouteClass`)
//! - Authorization roles (`Role`, `RoleLookup`)
//! - Resolved identities and the cookie mutations that accompany them
//! - The access decision (`decide`, `RouteDecision`)
//! - The `AccessGate`, which drives the external collaborators
//!   (`SessionVerifier`, `RoleStore`) and produces a `GateOutcome`
//!
//! # Access Model
//!
//! The hub (`/`) requires a session. The login page bounces signed-in users
//! back to the hub. Protected admin applications additionally require a role
//! from the allowed set; anything else, including lookup failures, is sent to
//! the not-found page.
//!
//! # Example
//!
//! ```
//! use remusic_admin_access::{decide, RouteClass, RouteDecision, RouteTable, RoleLookup, Role};
//!
//! let routes = RouteTable::default();
//! let path = "/remusic/dashboard";
//! let class = routes.classify(path);
//! assert_eq!(class, RouteClass::ProtectedApp);
//!
//! let anonymous = decide(&routes, class, path, false, None);
//! assert_eq!(anonymous, RouteDecision::RedirectTo("/login".to_string()));
//!
//! let viewer = RoleLookup::Found(Role::from("viewer"));
//! let denied = decide(&routes, class, path, true, Some(&viewer));
//! assert_eq!(denied, RouteDecision::Block("/not-found".to_string()));
//! ```

pub mod cookie;
pub mod decision;
pub mod error;
pub mod gate;
pub mod identity;
pub mod role;
pub mod route;

// Re-export main types at crate root
pub use cookie::{CookieMutation, CookieOptions, RequestCookies, SameSite};
pub use decision::{RouteDecision, decide};
pub use error::{RoleStoreError, SessionError};
pub use gate::{AccessGate, GateOutcome, GateTimeouts, RoleStore, SessionVerifier};
pub use identity::{Identity, SessionResolution};
pub use role::{Role, RoleLookup};
pub use route::{RouteClass, RouteTable, normalize_path};
