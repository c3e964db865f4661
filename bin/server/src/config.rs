//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the server,
//! loaded via the `config` crate from environment variables.
//!
//! See [`SupabaseConfig`](remusic_admin_supabase::SupabaseConfig) for the
//! auth provider and user-store settings.

use remusic_admin_access::{GateTimeouts, RouteTable, route};
use remusic_admin_supabase::SupabaseConfig;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory holding the exported admin site.
    #[serde(default = "default_site_root")]
    pub site_root: String,

    /// Directory served under `/static`.
    #[serde(default = "default_static_root")]
    pub static_root: String,

    /// Request gating configuration.
    #[serde(default)]
    pub gate: GateConfig,

    /// Supabase project configuration.
    pub supabase: SupabaseConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_site_root() -> String {
    "site".to_string()
}

fn default_static_root() -> String {
    "static".to_string()
}

/// Request gating configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GateConfig {
    /// Login page path.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Hub (application root) path.
    #[serde(default = "default_hub_path")]
    pub hub_path: String,

    /// Not-found page path; role denials are sent here.
    #[serde(default = "default_not_found_path")]
    pub not_found_path: String,

    /// Protected application prefixes as a comma-separated string.
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: String,

    /// Upper bound on session verification, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub session_timeout_ms: u64,

    /// Upper bound on the role lookup, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub role_timeout_ms: u64,
}

fn default_login_path() -> String {
    route::DEFAULT_LOGIN_PATH.to_string()
}

fn default_hub_path() -> String {
    route::DEFAULT_HUB_PATH.to_string()
}

fn default_not_found_path() -> String {
    route::DEFAULT_NOT_FOUND_PATH.to_string()
}

fn default_protected_prefixes() -> String {
    route::DEFAULT_PROTECTED_PREFIXES.join(",")
}

fn default_timeout_ms() -> u64 {
    3000
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            hub_path: default_hub_path(),
            not_found_path: default_not_found_path(),
            protected_prefixes: default_protected_prefixes(),
            session_timeout_ms: default_timeout_ms(),
            role_timeout_ms: default_timeout_ms(),
        }
    }
}

impl GateConfig {
    /// Builds the route table.
    #[must_use]
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(
            self.login_path.clone(),
            self.hub_path.clone(),
            self.not_found_path.clone(),
            self.protected_prefixes
                .split(',')
                .map(str::to_string)
                .collect(),
        )
    }

    /// Returns the collaborator timeouts.
    #[must_use]
    pub fn timeouts(&self) -> GateTimeouts {
        GateTimeouts {
            session: Duration::from_millis(self.session_timeout_ms),
            role: Duration::from_millis(self.role_timeout_ms),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
