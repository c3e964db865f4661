//! Route classification.
//!
//! Every inbound path falls into exactly one `RouteClass`. Matching is
//! case-sensitive prefix or equality matching against a small configured
//! table; no pattern language is involved.

use serde::{Deserialize, Serialize};

/// Default login page path.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default hub (application root) path.
pub const DEFAULT_HUB_PATH: &str = "/";

/// Default not-found page path.
pub const DEFAULT_NOT_FOUND_PATH: &str = "/not-found";

/// Default protected application prefixes.
pub const DEFAULT_PROTECTED_PREFIXES: &[&str] = &["/remusic", "/hiyorinime"];

/// Infrastructure prefixes that bypass the gate, matched right after the
/// leading slash: build-tool internals, the API namespace, static files,
/// the favicon and the not-found page.
const PASS_THROUGH_PREFIXES: &[&str] = &["_next", "api", "static", "favicon.ico", "not-found"];

/// Category of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Static asset, API namespace or excluded path; no checks run.
    PassThrough,
    /// The application root.
    Hub,
    /// The login entry point.
    LoginPage,
    /// Inside one of the protected admin applications.
    ProtectedApp,
    /// Anything else.
    Other,
}

/// The configured paths the gate classifies against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    login_path: String,
    hub_path: String,
    not_found_path: String,
    protected_prefixes: Vec<String>,
}

impl RouteTable {
    /// Creates a route table.
    #[must_use]
    pub fn new(
        login_path: impl Into<String>,
        hub_path: impl Into<String>,
        not_found_path: impl Into<String>,
        protected_prefixes: Vec<String>,
    ) -> Self {
        Self {
            login_path: login_path.into(),
            hub_path: hub_path.into(),
            not_found_path: not_found_path.into(),
            protected_prefixes: protected_prefixes
                .into_iter()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Returns the login page path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Returns the hub path.
    #[must_use]
    pub fn hub_path(&self) -> &str {
        &self.hub_path
    }

    /// Returns the not-found page path.
    #[must_use]
    pub fn not_found_path(&self) -> &str {
        &self.not_found_path
    }

    /// Returns the protected application prefixes.
    #[must_use]
    pub fn protected_prefixes(&self) -> &[String] {
        &self.protected_prefixes
    }

    /// Classifies a request path. First match wins.
    #[must_use]
    pub fn classify(&self, path: &str) -> RouteClass {
        if is_pass_through(path) || path == self.not_found_path {
            RouteClass::PassThrough
        } else if path == self.hub_path {
            RouteClass::Hub
        } else if path == self.login_path {
            RouteClass::LoginPage
        } else if self
            .protected_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
        {
            RouteClass::ProtectedApp
        } else {
            RouteClass::Other
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(
            DEFAULT_LOGIN_PATH,
            DEFAULT_HUB_PATH,
            DEFAULT_NOT_FOUND_PATH,
            DEFAULT_PROTECTED_PREFIXES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        )
    }
}

/// Reduces a raw request path to the path the file server resolves.
///
/// Percent escapes are decoded, empty and `.` segments are dropped and `..`
/// removes the preceding segment. The result always starts with `/` and has
/// no trailing slash (except for the root itself).
///
/// Returns `None` if the decoded path is not valid UTF-8.
#[must_use]
pub fn normalize_path(raw: &str) -> Option<String> {
    let decoded = urlencoding::decode(raw).ok()?;
    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    Some(format!("/{}", segments.join("/")))
}

/// Returns true for paths the gate never inspects.
///
/// Any dot in the path marks a file, which covers the image suffixes
/// (`.svg`, `.png`, `.jpg`, `.jpeg`, `.gif`, `.webp`) as well.
fn is_pass_through(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    path.contains('.')
        || PASS_THROUGH_PREFIXES
            .iter()
            .any(|prefix| rest.starts_with(prefix))
}
