use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{Request, Response};
use axum::routing::get;
use axum::Router;
use smithlink_config::{AccessList, ServerConfig};
use smithlink_server::{handlers, router, AppState, TokenAuthenticator};
use smithlink_service::LangSmithIntegrationService;
use smithlink_store::SettingsStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = ServerConfig::from_env().context("invalid server configuration")?;
    let state = Arc::new(init_state(&config)?);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %uuid::Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let app = Router::new()
        .nest("/langsmith", router(state).layer(trace_layer))
        .route("/health", get(handlers::health))
        .layer(cors);

    info!("Starting server on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_state(config: &ServerConfig) -> Result<AppState> {
    let store = SettingsStore::new(&config.db_path)
        .with_context(|| format!("failed to open settings database {}", config.db_path))?;

    let mut http = reqwest::Client::builder();
    if let Some(timeout) = config.http_timeout {
        http = http.timeout(timeout);
    }
    let http = http.build().context("failed to build HTTP client")?;

    let service = LangSmithIntegrationService::new(Arc::new(store), http)
        .with_default_api_url(config.default_api_url.clone());

    let access = AccessList::load(Path::new(&config.access_file))
        .with_context(|| format!("failed to load access file {}", config.access_file))?;
    if access.is_empty() {
        warn!("Access file has no entries; every request will be rejected");
    }

    Ok(
        AppState::new(Arc::new(service), Arc::new(TokenAuthenticator::new(&access)))
            .with_default_api_url(config.default_api_url.clone()),
    )
}
