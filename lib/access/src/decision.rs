//! The access decision.
//!
//! `decide` is a pure function of the route class, whether the request has
//! an identity, and (for protected applications) the role lookup. The gate
//! performs the I/O; everything here is deterministic.

use crate::role::RoleLookup;
use crate::route::{RouteClass, RouteTable};

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Let the request through.
    Continue,
    /// Send the client to another page (login or hub).
    RedirectTo(String),
    /// Deny access by sending the client to the not-found page.
    Block(String),
}

impl RouteDecision {
    /// Returns the redirect target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Continue => None,
            Self::RedirectTo(path) | Self::Block(path) => Some(path),
        }
    }

    /// Returns true if the request is let through.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// Decides the fate of a request.
///
/// `role` is only consulted for [`RouteClass::ProtectedApp`] with an
/// identity; a missing lookup there is a denial. A redirect back to the
/// path being served is turned into `Continue`.
#[must_use]
pub fn decide(
    routes: &RouteTable,
    class: RouteClass,
    path: &str,
    authenticated: bool,
    role: Option<&RoleLookup>,
) -> RouteDecision {
    let decision = match class {
        RouteClass::PassThrough | RouteClass::Other => RouteDecision::Continue,
        RouteClass::Hub if !authenticated => RouteDecision::RedirectTo(routes.login_path().into()),
        RouteClass::Hub => RouteDecision::Continue,
        RouteClass::LoginPage if authenticated => {
            RouteDecision::RedirectTo(routes.hub_path().into())
        }
        RouteClass::LoginPage => RouteDecision::Continue,
        RouteClass::ProtectedApp if !authenticated => {
            RouteDecision::RedirectTo(routes.login_path().into())
        }
        RouteClass::ProtectedApp => {
            if role.is_some_and(RoleLookup::grants_access) {
                RouteDecision::Continue
            } else {
                RouteDecision::Block(routes.not_found_path().into())
            }
        }
    };

    match decision.target() {
        Some(target) if target == path => RouteDecision::Continue,
        _ => decision,
    }
}
