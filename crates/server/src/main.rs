//! followgraph server entry point.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use axum::{Router, middleware};
use followgraph_api::{AppState, auth_middleware, router as api_router};
use followgraph_common::{Config, config::ServerConfig};
use followgraph_db::SocialStore;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "followgraph=debug,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(filter)
        .init();
}

fn build_app(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;
    init_tracing(config.logging.json);

    info!("Starting followgraph server...");

    // Connect to database
    let db = followgraph_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    followgraph_db::migrate(&db).await?;
    info!("Migrations completed");

    let store = SocialStore::new(Arc::new(db));
    let state = AppState::new(store, config.feed.clone());

    let app = build_app(state, &config.server);

    // Start server with graceful shutdown
    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server.host: {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use followgraph_common::config::FeedConfig;
    use followgraph_db::test_utils::TestDatabase;
    use tower::ServiceExt;

    async fn app(max_body_bytes: usize) -> (TestDatabase, Router) {
        let db = TestDatabase::in_memory().await.unwrap();
        db.seed_user("alice", "alice").await.unwrap();
        db.seed_user("bob", "bob").await.unwrap();

        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            max_body_bytes,
        };
        let state = AppState::new(db.store(), FeedConfig::default());
        (db, build_app(state, &server))
    }

    fn send_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/following/requests/send")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, body.len())
            .header(header::AUTHORIZATION, "Bearer token-alice")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let (_db, app) = app(64).await;

        let padding = "x".repeat(128);
        let body = format!(r#"{{"userId":"bob","padding":"{padding}"}}"#);
        let response = app.oneshot(send_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_body_within_limit_reaches_the_api() {
        let (_db, app) = app(64).await;

        let response = app
            .oneshot(send_request(r#"{"userId":"bob"}"#.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
