//! Cookie values read from requests and mutations written to responses.
//!
//! Session resolution may rotate or clear the auth cookies. Those changes
//! are returned as plain `CookieMutation` values so the response builder can
//! apply them to whichever response is finally sent.

/// SameSite attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    /// Sent on top-level navigations and same-site requests.
    #[default]
    Lax,
    /// Sent on same-site requests only.
    Strict,
    /// Sent on all requests; requires `secure`.
    None,
}

/// Attributes of a cookie being set or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Path scope. Default: "/".
    pub path: Option<String>,
    /// Domain scope. Default: host-only.
    pub domain: Option<String>,
    /// Lifetime in seconds. `Some(0)` expires the cookie immediately.
    pub max_age_secs: Option<i64>,
    /// Hide the cookie from scripts.
    pub http_only: bool,
    /// Only send over HTTPS.
    pub secure: bool,
    /// SameSite attribute.
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age_secs: None,
            http_only: false,
            secure: true,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    /// Returns a copy of these options with the given lifetime.
    #[must_use]
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age_secs = Some(seconds);
        self
    }
}

/// A cookie to set on (or remove from) the outgoing response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieMutation {
    /// Cookie name.
    pub name: String,
    /// Cookie value. Empty for removals.
    pub value: String,
    /// Cookie attributes.
    pub options: CookieOptions,
}

impl CookieMutation {
    /// Creates a mutation that sets a cookie.
    #[must_use]
    pub fn set(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            options,
        }
    }

    /// Creates a mutation that removes a cookie.
    ///
    /// The scope attributes of `options` are kept so the browser matches the
    /// original cookie; the value is emptied and the lifetime set to zero.
    #[must_use]
    pub fn remove(name: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            name: name.into(),
            value: String::new(),
            options: options.with_max_age(0),
        }
    }

    /// Returns true if this mutation removes the cookie.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        self.options.max_age_secs == Some(0)
    }
}

/// Cookies sent with an inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestCookies {
    cookies: Vec<(String, String)>,
}

impl RequestCookies {
    /// Creates an empty cookie set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of the named cookie, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if the named cookie is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates over `(name, value)` pairs in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns true if the request carried no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for RequestCookies {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            cookies: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
