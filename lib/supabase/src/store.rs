//! Role lookups against the Supabase user-record table.

use async_trait::async_trait;
use remusic_admin_access::{Role, RoleStore, RoleStoreError};
use remusic_admin_core::UserId;
use rootcause::prelude::Report;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::SupabaseConfig;

/// One row of `select=role` on the user table.
#[derive(Debug, Deserialize)]
struct RoleRow {
    #[serde(default)]
    role: Option<String>,
}

/// PostgREST client implementing [`RoleStore`].
///
/// Reads with the service-role key so row-level security on the user
/// table does not hide records from the gate.
#[derive(Clone)]
pub struct SupabaseRoleStore {
    http: reqwest::Client,
    table_url: String,
    service_key: String,
}

impl SupabaseRoleStore {
    /// Creates a new role store client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SupabaseConfig) -> Result<Self, Report<RoleStoreError>> {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| RoleStoreError::Unavailable {
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            table_url: format!("{}/rest/v1/{}", config.url(), config.users_table()),
            service_key: config.service_key().to_string(),
        })
    }
}

#[async_trait]
impl RoleStore for SupabaseRoleStore {
    #[instrument(skip_all, fields(user_id = %user_id))]
    async fn role_for(&self, user_id: &UserId) -> Result<Option<Role>, Report<RoleStoreError>> {
        let response = self
            .http
            .get(&self.table_url)
            .query(&[
                ("select", "role".to_string()),
                ("id", format!("eq.{user_id}")),
                ("limit", "1".to_string()),
            ])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| RoleStoreError::Unavailable {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoleStoreError::Unavailable {
                reason: e.to_string(),
            })?;
        if !status.is_success() {
            return Err(RoleStoreError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let role = parse_role_rows(&body)?;
        debug!(role = role.as_ref().map(Role::as_str), "role lookup result");
        Ok(role)
    }
}

/// Extracts the role from a PostgREST array response.
///
/// An empty array means no record. A record with a null role yields an
/// empty `Unknown` role, which never grants access.
fn parse_role_rows(body: &str) -> Result<Option<Role>, RoleStoreError> {
    let rows: Vec<RoleRow> =
        serde_json::from_str(body).map_err(|e| RoleStoreError::InvalidResponse {
            reason: e.to_string(),
        })?;
    Ok(rows
        .into_iter()
        .next()
        .map(|row| Role::from(row.role.unwrap_or_default())))
}
