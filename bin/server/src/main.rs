use remusic_admin_access::AccessGate;
use remusic_admin_server::{app, auth::AppState, config::ServerConfig};
use remusic_admin_supabase::{SupabaseAuth, SupabaseRoleStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let sessions =
        SupabaseAuth::new(&config.supabase).expect("failed to create Supabase auth client");
    let roles =
        SupabaseRoleStore::new(&config.supabase).expect("failed to create Supabase role store");
    tracing::info!(cookie = sessions.cookie_name(), "Using Supabase session cookie");

    let gate = AccessGate::new(
        Arc::new(sessions),
        Arc::new(roles),
        config.gate.route_table(),
        config.gate.timeouts(),
    );
    let app_state = Arc::new(AppState::new(gate));

    let app = app::router(app_state, &config.site_root, &config.static_root);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
