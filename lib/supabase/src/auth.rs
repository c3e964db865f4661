//! Session verification against Supabase Auth.

use async_trait::async_trait;
use chrono::Utc;
use remusic_admin_access::{
    CookieMutation, CookieOptions, Identity, RequestCookies, SessionError, SessionResolution,
    SessionVerifier,
};
use remusic_admin_core::UserId;
use reqwest::StatusCode;
use rootcause::prelude::Report;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::SupabaseConfig;
use crate::session_cookie::{
    StoredSession, clear_session_cookie, read_session_cookie, write_session_cookie,
};

/// Refresh the session when the access token expires within this window.
const REFRESH_MARGIN_SECS: i64 = 60;

/// User object returned by `GET /auth/v1/user`.
#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl UserResponse {
    fn into_identity(self) -> Result<Identity, Report<SessionError>> {
        let id: UserId = self.id.parse().map_err(|e| SessionError::InvalidResponse {
            reason: format!("user id: {e}"),
        })?;
        Ok(Identity::new(id).with_email(self.email))
    }
}

/// Supabase Auth client implementing [`SessionVerifier`].
///
/// The session lives in the `@supabase/ssr` auth cookie. Resolution refreshes
/// sessions that are about to expire (rotating the cookie) and verifies the
/// access token with the auth server; rejected sessions have their cookies
/// cleared.
#[derive(Clone)]
pub struct SupabaseAuth {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    cookie_name: String,
    cookie_options: CookieOptions,
}

impl SupabaseAuth {
    /// Creates a new auth client.
    ///
    /// # Errors
    ///
    /// Returns an error if no cookie name can be determined or the HTTP
    /// client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, Report<SessionError>> {
        let cookie_name = config
            .cookie_name()
            .ok_or_else(|| SessionError::Misconfigured {
                reason: format!("cannot derive auth cookie name from '{}'", config.url()),
            })?;

        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| SessionError::Misconfigured {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.url().to_string(),
            anon_key: config.anon_key().to_string(),
            cookie_name,
            cookie_options: config.cookie_options(),
        })
    }

    /// Returns the name of the auth cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    fn clear(&self, cookies: &RequestCookies) -> Vec<CookieMutation> {
        clear_session_cookie(&self.cookie_name, cookies, &self.cookie_options)
    }

    /// Fetches the user behind an access token.
    ///
    /// Returns `Ok(None)` when the auth server rejects the token.
    #[instrument(skip_all)]
    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, Report<SessionError>> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SessionError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!(%status, "access token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let user: UserResponse =
            response
                .json()
                .await
                .map_err(|e| SessionError::InvalidResponse {
                    reason: e.to_string(),
                })?;
        user.into_identity().map(Some)
    }

    /// Exchanges a refresh token for a new session.
    ///
    /// Returns `Ok(None)` when the refresh token is rejected (used, revoked
    /// or expired).
    #[instrument(skip_all)]
    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<Option<StoredSession>, Report<SessionError>> {
        let response = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=refresh_token",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| SessionError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if status.is_client_error() {
            debug!(%status, "refresh token rejected");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let session: StoredSession =
            response
                .json()
                .await
                .map_err(|e| SessionError::InvalidResponse {
                    reason: e.to_string(),
                })?;
        debug!("session refreshed");
        Ok(Some(session))
    }

    /// Revokes the session behind an access token.
    #[instrument(skip_all)]
    async fn revoke(&self, access_token: &str) -> Result<(), Report<SessionError>> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout?scope=local", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SessionError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        // An unknown or expired token has nothing left to revoke.
        if status.is_success()
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::NOT_FOUND
        {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SessionError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        }
        .into())
    }
}

#[async_trait]
impl SessionVerifier for SupabaseAuth {
    async fn resolve(
        &self,
        cookies: &RequestCookies,
    ) -> Result<SessionResolution, Report<SessionError>> {
        let stored = match read_session_cookie(cookies, &self.cookie_name) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Ok(SessionResolution::anonymous()),
            Err(e) => {
                debug!(error = %e, "discarding undecodable auth cookie");
                return Ok(SessionResolution::anonymous().with_cookies(self.clear(cookies)));
            }
        };

        if !stored.expires_within(Utc::now().timestamp(), REFRESH_MARGIN_SECS) {
            return match self.fetch_user(&stored.access_token).await? {
                Some(identity) => Ok(SessionResolution::authenticated(identity)),
                None => Ok(SessionResolution::anonymous().with_cookies(self.clear(cookies))),
            };
        }

        let Some(fresh) = self.refresh(&stored.refresh_token).await? else {
            return Ok(SessionResolution::anonymous().with_cookies(self.clear(cookies)));
        };

        let rotation =
            write_session_cookie(&self.cookie_name, &fresh, cookies, &self.cookie_options)
                .map_err(|e| SessionError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        // The token endpoint has just verified the session; it returns the
        // user alongside the new tokens. The old refresh token is spent, so
        // the rotation must reach the client even if verification fails.
        let identity = match fresh.identity() {
            Some(identity) => Some(identity),
            None => match self.fetch_user(&fresh.access_token).await {
                Ok(identity) => identity,
                Err(report) => {
                    warn!(
                        error = %report,
                        "failed to verify refreshed session, keeping rotated tokens"
                    );
                    return Ok(SessionResolution::anonymous().with_cookies(rotation));
                }
            },
        };

        Ok(match identity {
            Some(identity) => SessionResolution::authenticated(identity).with_cookies(rotation),
            None => SessionResolution::anonymous().with_cookies(self.clear(cookies)),
        })
    }

    async fn end_session(
        &self,
        cookies: &RequestCookies,
    ) -> Result<Vec<CookieMutation>, Report<SessionError>> {
        if let Ok(Some(stored)) = read_session_cookie(cookies, &self.cookie_name) {
            if let Err(report) = self.revoke(&stored.access_token).await {
                warn!(error = %report, "failed to revoke session, clearing cookies anyway");
            }
        }
        Ok(self.clear(cookies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::TestServer;
    use serde_json::Map;

    const COOKIE: &str = "sb-proj-auth-token";
    const USER: &str = r#"{"id":"user-1","email":"a@remusic.dev"}"#;

    fn auth() -> SupabaseAuth {
        // Nothing listens here; tests below must not reach the network.
        let config = SupabaseConfig::new(
            "http://proj.localhost:9".to_string(),
            "anon".to_string(),
            "service".to_string(),
        );
        SupabaseAuth::new(&config).expect("client")
    }

    #[test]
    fn cookie_name_is_derived() {
        assert_eq!(auth().cookie_name(), "sb-proj-auth-token");
    }

    #[test]
    fn misconfigured_url_is_rejected() {
        let config = SupabaseConfig::new("nope".to_string(), String::new(), String::new());
        assert!(SupabaseAuth::new(&config).is_err());
    }

    #[test]
    fn user_response_maps_to_identity() {
        let user: UserResponse =
            serde_json::from_str(r#"{"id":"user-9","email":"z@remusic.dev","aud":"authenticated"}"#)
                .expect("parse");
        let identity = user.into_identity().expect("identity");
        assert_eq!(identity.id().as_str(), "user-9");
        assert_eq!(identity.email(), Some("z@remusic.dev"));
    }

    #[test]
    fn user_response_with_blank_id_is_invalid() {
        let user: UserResponse = serde_json::from_str(r#"{"id":" "}"#).expect("parse");
        assert!(user.into_identity().is_err());
    }

    #[tokio::test]
    async fn no_cookie_is_anonymous_without_network() {
        let resolution = auth()
            .resolve(&RequestCookies::new())
            .await
            .expect("resolve");
        assert_eq!(resolution, SessionResolution::anonymous());
    }

    #[tokio::test]
    async fn undecodable_cookie_is_cleared() {
        let cookies: RequestCookies = [
            ("sb-proj-auth-token.0", "base64-%%%"),
            ("sb-proj-auth-token.1", "more"),
        ]
        .into_iter()
        .collect();

        let resolution = auth().resolve(&cookies).await.expect("resolve");

        assert!(resolution.identity.is_none());
        let cleared: Vec<&str> = resolution.cookies.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(cleared, vec!["sb-proj-auth-token.0", "sb-proj-auth-token.1"]);
        assert!(resolution.cookies.iter().all(CookieMutation::is_removal));
    }

    fn auth_at(server: &TestServer) -> SupabaseAuth {
        let config = SupabaseConfig::new(
            server.url().to_string(),
            "anon".to_string(),
            "service".to_string(),
        )
        .with_cookie_name(COOKIE);
        SupabaseAuth::new(&config).expect("client")
    }

    /// A stored session whose access token expires `expires_in` seconds from now.
    fn session_cookies(expires_in: i64) -> RequestCookies {
        let session = StoredSession {
            access_token: "access-old".to_string(),
            refresh_token: "refresh-old".to_string(),
            expires_at: Some(Utc::now().timestamp() + expires_in),
            extra: Map::new(),
        };
        write_session_cookie(COOKIE, &session, &RequestCookies::new(), &CookieOptions::default())
            .expect("write")
            .into_iter()
            .map(|m| (m.name, m.value))
            .collect()
    }

    fn refreshed_tokens(with_user: bool) -> String {
        let mut body = serde_json::json!({
            "access_token": "access-new",
            "refresh_token": "refresh-new",
            "token_type": "bearer",
            "expires_at": Utc::now().timestamp() + 3600,
        });
        if with_user {
            body["user"] = serde_json::from_str(USER).expect("user json");
        }
        body.to_string()
    }

    fn rotated_session(mutations: &[CookieMutation]) -> Option<StoredSession> {
        let written: RequestCookies = mutations
            .iter()
            .filter(|m| !m.is_removal())
            .map(|m| (m.name.clone(), m.value.clone()))
            .collect();
        read_session_cookie(&written, COOKIE).expect("decode rotated cookie")
    }

    #[tokio::test]
    async fn fresh_session_is_verified_with_user_endpoint() {
        let server = TestServer::start(&[("/auth/v1/user", 200, USER)]);

        let resolution = auth_at(&server)
            .resolve(&session_cookies(3600))
            .await
            .expect("resolve");

        let identity = resolution.identity.expect("identity");
        assert_eq!(identity.id().as_str(), "user-1");
        assert_eq!(identity.email(), Some("a@remusic.dev"));
        assert!(resolution.cookies.is_empty());

        let requests = server.requests_to("/auth/v1/user");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].header("authorization"), Some("Bearer access-old"));
        assert_eq!(requests[0].header("apikey"), Some("anon"));
        assert!(server.requests_to("/auth/v1/token").is_empty());
    }

    #[tokio::test]
    async fn rejected_access_token_clears_cookies() {
        for status in [401, 403] {
            let server = TestServer::start(&[("/auth/v1/user", status, "{}")]);

            let resolution = auth_at(&server)
                .resolve(&session_cookies(3600))
                .await
                .expect("resolve");

            assert!(resolution.identity.is_none(), "status {status}");
            let cleared: Vec<&str> = resolution.cookies.iter().map(|m| m.name.as_str()).collect();
            assert_eq!(cleared, vec![COOKIE], "status {status}");
            assert!(resolution.cookies.iter().all(CookieMutation::is_removal));
        }
    }

    #[tokio::test]
    async fn user_endpoint_outage_is_an_error() {
        let server = TestServer::start(&[("/auth/v1/user", 503, r#"{"msg":"down"}"#)]);

        let result = auth_at(&server).resolve(&session_cookies(3600)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn expiring_session_is_refreshed_and_rotated() {
        let tokens = refreshed_tokens(true);
        let server = TestServer::start(&[("/auth/v1/token", 200, tokens.as_str())]);

        let resolution = auth_at(&server)
            .resolve(&session_cookies(30))
            .await
            .expect("resolve");

        assert_eq!(
            resolution.identity.as_ref().map(|i| i.id().as_str()),
            Some("user-1")
        );
        let rotated = rotated_session(&resolution.cookies).expect("rotated cookie");
        assert_eq!(rotated.access_token, "access-new");
        assert_eq!(rotated.refresh_token, "refresh-new");

        let requests = server.requests_to("/auth/v1/token");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].query, "grant_type=refresh_token");
        assert!(requests[0].body.contains("refresh-old"));
        assert!(server.requests_to("/auth/v1/user").is_empty());
    }

    #[tokio::test]
    async fn rejected_refresh_clears_cookies() {
        let server = TestServer::start(&[(
            "/auth/v1/token",
            400,
            r#"{"error":"invalid_grant"}"#,
        )]);

        let resolution = auth_at(&server)
            .resolve(&session_cookies(30))
            .await
            .expect("resolve");

        assert!(resolution.identity.is_none());
        assert!(!resolution.cookies.is_empty());
        assert!(resolution.cookies.iter().all(CookieMutation::is_removal));
    }

    #[tokio::test]
    async fn refresh_outage_is_an_error() {
        let server = TestServer::start(&[("/auth/v1/token", 502, "{}")]);

        let result = auth_at(&server).resolve(&session_cookies(30)).await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rotated_tokens_survive_failed_verification() {
        let tokens = refreshed_tokens(false);
        let server = TestServer::start(&[
            ("/auth/v1/token", 200, tokens.as_str()),
            ("/auth/v1/user", 503, "{}"),
        ]);

        let resolution = auth_at(&server)
            .resolve(&session_cookies(30))
            .await
            .expect("resolve");

        assert!(resolution.identity.is_none());
        assert!(resolution.cookies.iter().all(|m| !m.is_removal()));
        let rotated = rotated_session(&resolution.cookies).expect("rotated cookie");
        assert_eq!(rotated.refresh_token, "refresh-new");
        assert_eq!(server.requests_to("/auth/v1/user").len(), 1);
    }

    #[tokio::test]
    async fn refreshed_session_without_user_is_verified() {
        let tokens = refreshed_tokens(false);
        let server = TestServer::start(&[
            ("/auth/v1/token", 200, tokens.as_str()),
            ("/auth/v1/user", 200, USER),
        ]);

        let resolution = auth_at(&server)
            .resolve(&session_cookies(30))
            .await
            .expect("resolve");

        assert!(resolution.identity.is_some());
        let requests = server.requests_to("/auth/v1/user");
        assert_eq!(requests[0].header("authorization"), Some("Bearer access-new"));
        assert!(rotated_session(&resolution.cookies).is_some());
    }

    #[tokio::test]
    async fn end_session_revokes_and_clears() {
        let server = TestServer::start(&[("/auth/v1/logout", 200, "")]);

        let cleared = auth_at(&server)
            .end_session(&session_cookies(3600))
            .await
            .expect("end session");

        let requests = server.requests_to("/auth/v1/logout");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].query, "scope=local");
        assert_eq!(requests[0].header("authorization"), Some("Bearer access-old"));
        assert_eq!(cleared.len(), 1);
        assert!(cleared[0].is_removal());
    }

    #[tokio::test]
    async fn end_session_clears_even_when_revocation_fails() {
        let server = TestServer::start(&[("/auth/v1/logout", 500, "{}")]);

        let cleared = auth_at(&server)
            .end_session(&session_cookies(3600))
            .await
            .expect("end session");

        assert_eq!(cleared.len(), 1);
        assert!(cleared[0].is_removal());
    }
}
