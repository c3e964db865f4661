//! Identities resolved from request cookies.
//!
//! An identity is rebuilt on every request by the session verifier and is
//! never persisted here. Resolution may also rotate the session cookies,
//! which is why it returns the cookie mutations alongside the identity.

use remusic_admin_core::UserId;

use crate::cookie::CookieMutation;

/// The authenticated principal behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    id: UserId,
    email: Option<String>,
}

impl Identity {
    /// Creates an identity with no contact address.
    #[must_use]
    pub fn new(id: UserId) -> Self {
        Self { id, email: None }
    }

    /// Sets the identity's email address.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email.filter(|e| !e.is_empty());
        self
    }

    /// Returns the user ID.
    #[must_use]
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Returns the email address, if the provider supplied one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the reference used in audit logs: the email, else the ID.
    #[must_use]
    pub fn contact(&self) -> &str {
        self.email().unwrap_or_else(|| self.id.as_str())
    }
}

/// Output of session verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionResolution {
    /// The resolved identity, or `None` for an anonymous request.
    pub identity: Option<Identity>,
    /// Cookie changes that must reach the response.
    pub cookies: Vec<CookieMutation>,
}

impl SessionResolution {
    /// A resolution with no identity and no cookie changes.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A resolution for a signed-in identity.
    #[must_use]
    pub fn authenticated(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            cookies: Vec::new(),
        }
    }

    /// Attaches cookie mutations to this resolution.
    #[must_use]
    pub fn with_cookies(mut self, cookies: Vec<CookieMutation>) -> Self {
        self.cookies.extend(cookies);
        self
    }
}
