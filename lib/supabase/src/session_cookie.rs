//! Codec for the `@supabase/ssr` auth cookie.
//!
//! The session is stored as JSON, written as `base64-` followed by
//! unpadded base64url. When the encoded value exceeds [`MAX_CHUNK_SIZE`] it
//! is split across `<name>.0`, `<name>.1`, ... Readers also accept the raw
//! JSON form written by older clients.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use remusic_admin_access::{CookieMutation, CookieOptions, Identity, RequestCookies};
use remusic_admin_core::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CookieError;

/// Largest value written to a single cookie.
pub const MAX_CHUNK_SIZE: usize = 3180;

const BASE64_PREFIX: &str = "base64-";

const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Session tokens as stored in the auth cookie.
///
/// Fields not needed by the gate (token type, provider tokens, the user
/// object) are kept in `extra` so a rewritten cookie loses nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Bearer token for the auth API.
    pub access_token: String,
    /// Single-use token for obtaining a new session.
    pub refresh_token: String,
    /// Expiry of the access token, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    /// Every other field of the session object.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredSession {
    /// Returns true if the access token expires within `margin_secs` of `now`.
    ///
    /// Sessions without an expiry are never considered expiring.
    #[must_use]
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at
            .is_some_and(|at| at <= now.saturating_add(margin_secs))
    }

    /// Returns the identity embedded in the session's `user` object, if any.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        let user = self.extra.get("user")?.as_object()?;
        let id: UserId = user.get("id")?.as_str()?.parse().ok()?;
        let email = user
            .get("email")
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(Identity::new(id).with_email(email))
    }
}

/// Reads the session stored under `name`, joining chunks when needed.
///
/// Returns `Ok(None)` when neither the cookie nor its first chunk is present.
///
/// # Errors
///
/// Returns an error if the stored value cannot be decoded.
pub fn read_session_cookie(
    cookies: &RequestCookies,
    name: &str,
) -> Result<Option<StoredSession>, CookieError> {
    match combined_value(cookies, name) {
        Some(raw) => decode(&raw).map(Some),
        None => Ok(None),
    }
}

/// Writes `session` under `name`, chunking when needed.
///
/// Every cookie or chunk currently present under `name` that is not
/// rewritten is removed, so no stale chunk outlives a shorter session.
///
/// # Errors
///
/// Returns an error if the session cannot be serialized.
pub fn write_session_cookie(
    name: &str,
    session: &StoredSession,
    existing: &RequestCookies,
    options: &CookieOptions,
) -> Result<Vec<CookieMutation>, CookieError> {
    let value = encode(session)?;
    let chunks = split_chunks(&value);

    let mut mutations = if chunks.len() == 1 {
        vec![CookieMutation::set(name, value, options.clone())]
    } else {
        chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| CookieMutation::set(format!("{name}.{i}"), chunk, options.clone()))
            .collect()
    };

    let stale: Vec<CookieMutation> = present_names(existing, name)
        .filter(|present| !mutations.iter().any(|m| m.name == *present))
        .map(|present| CookieMutation::remove(present, options.clone()))
        .collect();
    mutations.extend(stale);

    Ok(mutations)
}

/// Removes every cookie or chunk present under `name`.
#[must_use]
pub fn clear_session_cookie(
    name: &str,
    existing: &RequestCookies,
    options: &CookieOptions,
) -> Vec<CookieMutation> {
    present_names(existing, name)
        .map(|present| CookieMutation::remove(present, options.clone()))
        .collect()
}

fn combined_value(cookies: &RequestCookies, name: &str) -> Option<String> {
    if let Some(value) = cookies.get(name) {
        return Some(value.to_string());
    }

    let mut combined = String::new();
    for index in 0.. {
        match cookies.get(&format!("{name}.{index}")) {
            Some(chunk) => combined.push_str(chunk),
            None => break,
        }
    }
    (!combined.is_empty()).then_some(combined)
}

fn present_names<'a>(cookies: &'a RequestCookies, name: &'a str) -> impl Iterator<Item = &'a str> {
    cookies
        .iter()
        .map(|(n, _)| n)
        .filter(move |n| *n == name || is_chunk_of(n, name))
}

fn is_chunk_of(candidate: &str, name: &str) -> bool {
    candidate
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|index| !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()))
}

fn decode(raw: &str) -> Result<StoredSession, CookieError> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = URL_SAFE_LENIENT
                .decode(encoded)
                .map_err(|e| CookieError::Encoding {
                    reason: e.to_string(),
                })?;
            String::from_utf8(bytes).map_err(|e| CookieError::Encoding {
                reason: e.to_string(),
            })?
        }
        None => raw.to_string(),
    };

    serde_json::from_str(&json).map_err(|e| CookieError::Json {
        reason: e.to_string(),
    })
}

fn encode(session: &StoredSession) -> Result<String, CookieError> {
    let json = serde_json::to_string(session).map_err(|e| CookieError::Json {
        reason: e.to_string(),
    })?;
    Ok(format!("{BASE64_PREFIX}{}", URL_SAFE_LENIENT.encode(json)))
}

fn split_chunks(value: &str) -> Vec<String> {
    let chars: Vec<char> = value.chars().collect();
    chars
        .chunks(MAX_CHUNK_SIZE)
        .map(|chunk| chunk.iter().collect())
        .collect()
}
