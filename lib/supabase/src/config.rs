//! Supabase project configuration.

use remusic_admin_access::{CookieOptions, SameSite};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifetime of the auth cookie, matching the Supabase SSR client (400 days).
const AUTH_COOKIE_MAX_AGE_SECS: i64 = 400 * 24 * 60 * 60;

/// Configuration for the Supabase project backing the admin applications.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct SupabaseConfig {
    /// Project URL (e.g., "https://abcdefgh.supabase.co").
    url: String,
    /// Public anon key, sent as `apikey` on auth requests.
    anon_key: String,
    /// Service-role key used for user-record lookups.
    service_key: String,
    /// Table holding user records keyed by auth user ID.
    /// Default: "users"
    #[serde(default = "default_users_table")]
    users_table: String,
    /// Auth cookie name. Default: `sb-<project-ref>-auth-token`.
    #[serde(default)]
    cookie_name: Option<String>,
    /// Cookie domain. Default: host-only.
    #[serde(default)]
    cookie_domain: Option<String>,
    /// Whether to set the Secure flag on cookies (requires HTTPS).
    /// Set to false for local HTTP development.
    #[serde(default = "default_secure_cookies")]
    secure_cookies: bool,
}

fn default_users_table() -> String {
    "users".to_string()
}

fn default_secure_cookies() -> bool {
    true
}

impl SupabaseConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(url: String, anon_key: String, service_key: String) -> Self {
        Self {
            url,
            anon_key,
            service_key,
            users_table: default_users_table(),
            cookie_name: None,
            cookie_domain: None,
            secure_cookies: default_secure_cookies(),
        }
    }

    /// Returns the project URL without a trailing slash.
    #[must_use]
    pub fn url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Returns the anon key.
    #[must_use]
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Returns the service-role key.
    #[must_use]
    pub fn service_key(&self) -> &str {
        &self.service_key
    }

    /// Returns the user-record table name.
    #[must_use]
    pub fn users_table(&self) -> &str {
        &self.users_table
    }

    /// Returns whether cookies carry the Secure flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }

    /// Returns the auth cookie name, explicit or derived from the project ref.
    ///
    /// Returns `None` when no name is configured and the URL has no host.
    #[must_use]
    pub fn cookie_name(&self) -> Option<String> {
        if let Some(name) = self.cookie_name.as_ref().filter(|n| !n.is_empty()) {
            return Some(name.clone());
        }
        let url = reqwest::Url::parse(self.url()).ok()?;
        let project_ref = url.host_str()?.split('.').next()?;
        Some(format!("sb-{project_ref}-auth-token"))
    }

    /// Returns the attributes used when writing the auth cookie.
    #[must_use]
    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: Some("/".to_string()),
            domain: self.cookie_domain.clone(),
            max_age_secs: Some(AUTH_COOKIE_MAX_AGE_SECS),
            // The browser client reads the session from this cookie.
            http_only: false,
            secure: self.secure_cookies,
            same_site: Some(SameSite::Lax),
        }
    }

    /// Sets an explicit auth cookie name.
    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Some(name.into());
        self
    }

    /// Sets the Secure flag for cookies.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("anon_key", &"[redacted]")
            .field("service_key", &"[redacted]")
            .field("users_table", &self.users_table)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_domain", &self.cookie_domain)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SupabaseConfig {
        SupabaseConfig::new(
            "https://abcdefgh.supabase.co/".to_string(),
            "anon".to_string(),
            "service".to_string(),
        )
    }

    #[test]
    fn defaults() {
        let config = config();
        assert_eq!(config.url(), "https://abcdefgh.supabase.co");
        assert_eq!(config.users_table(), "users");
        assert!(config.secure_cookies());
    }

    #[test]
    fn cookie_name_derives_from_project_ref() {
        assert_eq!(
            config().cookie_name().as_deref(),
            Some("sb-abcdefgh-auth-token")
        );
    }

    #[test]
    fn explicit_cookie_name_wins() {
        let config = config().with_cookie_name("sb-local-auth-token");
        assert_eq!(config.cookie_name().as_deref(), Some("sb-local-auth-token"));
    }

    #[test]
    fn unparseable_url_has_no_cookie_name() {
        let config = SupabaseConfig::new("not a url".to_string(), String::new(), String::new());
        assert_eq!(config.cookie_name(), None);
    }

    #[test]
    fn cookie_options_follow_config() {
        let options = config().with_secure_cookies(false).cookie_options();
        assert!(!options.secure);
        assert!(!options.http_only);
        assert_eq!(options.max_age_secs, Some(34_560_000));
    }

    #[test]
    fn debug_redacts_keys() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("service\""));
        assert!(rendered.contains("[redacted]"));
    }
}
