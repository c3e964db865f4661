//! The access gate: drives the collaborators and produces the outcome.
//!
//! For every request the gate classifies the path, resolves the session
//! (exactly once, unless the path passes through), looks up the role for
//! protected applications, and returns the decision together with every
//! cookie mutation the session verifier emitted.
//!
//! Both collaborator calls are bounded by [`GateTimeouts`]. Failures and
//! timeouts never surface as errors: a failed session check makes the
//! request anonymous and a failed role lookup denies the protected route.

use async_trait::async_trait;
use remusic_admin_core::{Result, UserId};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::cookie::{CookieMutation, RequestCookies};
use crate::decision::{RouteDecision, decide};
use crate::error::{RoleStoreError, SessionError};
use crate::identity::{Identity, SessionResolution};
use crate::role::{Role, RoleLookup};
use crate::route::{RouteClass, RouteTable, normalize_path};

/// Verifies sessions against the external auth provider.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// Resolves the identity behind the request cookies.
    ///
    /// Implementations may rotate or clear the session cookies; those
    /// changes are returned in the resolution and must not be dropped.
    async fn resolve(&self, cookies: &RequestCookies) -> Result<SessionResolution, SessionError>;

    /// Ends the session behind the request cookies.
    ///
    /// Returns the cookie mutations that clear the session on the client.
    async fn end_session(
        &self,
        _cookies: &RequestCookies,
    ) -> Result<Vec<CookieMutation>, SessionError> {
        Ok(Vec::new())
    }
}

/// Reads authorization roles from the user-record store.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Fetches the role of the user record keyed by `user_id`.
    ///
    /// Returns `Ok(None)` when no record exists.
    async fn role_for(&self, user_id: &UserId) -> Result<Option<Role>, RoleStoreError>;
}

/// Upper bounds on the collaborator calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateTimeouts {
    /// Bound on session verification (including any token refresh).
    pub session: Duration,
    /// Bound on the role lookup.
    pub role: Duration,
}

impl Default for GateTimeouts {
    fn default() -> Self {
        Self {
            session: Duration::from_secs(3),
            role: Duration::from_secs(3),
        }
    }
}

/// Result of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// What to do with the request.
    pub decision: RouteDecision,
    /// The identity resolved for the request, if any.
    pub identity: Option<Identity>,
    /// Cookie mutations to apply to the final response, whatever it is.
    pub cookies: Vec<CookieMutation>,
}

impl GateOutcome {
    fn pass_through() -> Self {
        Self {
            decision: RouteDecision::Continue,
            identity: None,
            cookies: Vec::new(),
        }
    }
}

/// Gates requests to the admin applications.
#[derive(Clone)]
pub struct AccessGate {
    sessions: Arc<dyn SessionVerifier>,
    roles: Arc<dyn RoleStore>,
    routes: RouteTable,
    timeouts: GateTimeouts,
}

impl AccessGate {
    /// Creates a gate over the given collaborators.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionVerifier>,
        roles: Arc<dyn RoleStore>,
        routes: RouteTable,
        timeouts: GateTimeouts,
    ) -> Self {
        Self {
            sessions,
            roles,
            routes,
            timeouts,
        }
    }

    /// Returns the route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Evaluates a request for the raw URI `path` carrying `cookies`.
    ///
    /// The path is normalized the way the file server resolves it before
    /// classification. A path that does not decode to UTF-8 is blocked.
    #[instrument(skip(self, cookies))]
    pub async fn evaluate(&self, path: &str, cookies: &RequestCookies) -> GateOutcome {
        let Some(normalized) = normalize_path(path) else {
            warn!("undecodable request path");
            return GateOutcome {
                decision: RouteDecision::Block(self.routes.not_found_path().to_string()),
                identity: None,
                cookies: Vec::new(),
            };
        };
        let path = normalized.as_str();

        let class = self.routes.classify(path);
        if class == RouteClass::PassThrough {
            return GateOutcome::pass_through();
        }

        let SessionResolution {
            identity,
            cookies: mutations,
        } = self.resolve_session(cookies).await;

        let role = match (class, &identity) {
            (RouteClass::ProtectedApp, Some(identity)) => Some(self.lookup_role(identity).await),
            _ => None,
        };

        let decision = decide(&self.routes, class, path, identity.is_some(), role.as_ref());

        if let (RouteDecision::Block(_), Some(identity), Some(role)) = (&decision, &identity, &role)
        {
            warn!(
                user = identity.contact(),
                user_id = %identity.id(),
                role = role.role().map(Role::as_str),
                lookup = %role,
                "denied access to protected route"
            );
        }

        debug!(?class, ?decision, cookies = mutations.len(), "gate decision");

        GateOutcome {
            decision,
            identity,
            cookies: mutations,
        }
    }

    /// Ends the session behind `cookies`, returning the clearing mutations.
    ///
    /// Provider failures are logged; whatever mutations were produced are
    /// still returned so the client-side session is dropped.
    pub async fn sign_out(&self, cookies: &RequestCookies) -> Vec<CookieMutation> {
        match tokio::time::timeout(self.timeouts.session, self.sessions.end_session(cookies)).await
        {
            Ok(Ok(mutations)) => mutations,
            Ok(Err(report)) => {
                warn!(error = %report, "failed to end session with auth provider");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeouts.session.as_millis(),
                    "ending session timed out"
                );
                Vec::new()
            }
        }
    }

    async fn resolve_session(&self, cookies: &RequestCookies) -> SessionResolution {
        match tokio::time::timeout(self.timeouts.session, self.sessions.resolve(cookies)).await {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(report)) => {
                warn!(error = %report, "session verification failed, treating request as anonymous");
                SessionResolution::anonymous()
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.timeouts.session.as_millis(),
                    "session verification timed out, treating request as anonymous"
                );
                SessionResolution::anonymous()
            }
        }
    }

    async fn lookup_role(&self, identity: &Identity) -> RoleLookup {
        match tokio::time::timeout(self.timeouts.role, self.roles.role_for(identity.id())).await {
            Ok(Ok(Some(role))) => RoleLookup::Found(role),
            Ok(Ok(None)) => RoleLookup::NotFound,
            Ok(Err(report)) => RoleLookup::StoreError(report.to_string()),
            Err(_) => RoleLookup::TimedOut,
        }
    }
}
