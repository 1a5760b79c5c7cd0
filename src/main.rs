use axum::{Router, routing::get};
use chrono::{Duration, Utc};
use rusqlite::Connection;
use ssot::{
    config::Config,
    db::{OpusRepo, init_database},
    handlers::{ApiState, api_routes},
};
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Lifetime of the session created from `SSOT_BOOTSTRAP_TOKEN`.
const BOOTSTRAP_SESSION_DAYS: i64 = 3650;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ssot=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting SSOT server v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {:?}", config.database_path);
    info!("Git sync branch: {}", config.git_branch);

    let conn = match Connection::open(&config.database_path) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_database(&conn) {
        error!("Failed to initialize database: {}", e);
        std::process::exit(1);
    }

    let repo = Arc::new(OpusRepo::new(conn));

    // Refuse to serve a vocabulary the browser cannot render
    match repo.list_type_configs() {
        Ok(configs) => info!("Loaded {} opus types", configs.len()),
        Err(e) => {
            error!("Invalid opus type configuration: {}", e);
            std::process::exit(1);
        }
    }

    if let Some(bootstrap) = &config.bootstrap {
        let expires_at = Utc::now() + Duration::days(BOOTSTRAP_SESSION_DAYS);
        if let Err(e) = repo.insert_session(
            &bootstrap.token,
            "bootstrap",
            bootstrap.name.as_deref(),
            bootstrap.email.as_deref(),
            expires_at,
        ) {
            error!("Failed to create bootstrap session: {}", e);
            std::process::exit(1);
        }
        info!("Bootstrap session ready");
    }

    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_routes(ApiState::new(repo.clone(), &config)))
        .layer(TraceLayer::new_for_http());

    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    info!("Server listening on http://{}", addr);

    let cleanup_repo = repo.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match cleanup_repo.cleanup_expired_sessions() {
                Ok(n) if n > 0 => info!("Cleaned up {} expired sessions", n),
                Ok(_) => {}
                Err(e) => error!("Session cleanup failed: {}", e),
            }
        }
    });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Server shut down gracefully");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
