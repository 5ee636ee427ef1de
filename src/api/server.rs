use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use axum::middleware;
use axum::{Router, extract::Request, response::Response};
use http::{HeaderValue, header};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use super::routes;
use crate::api::state::AppState;
use crate::core::AppConfig;
use crate::notify::{PushService, WebPushSender};
use crate::store::JsonFileStore;

async fn set_static_cache_control(request: Request, next: middleware::Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

pub fn app(shared_state: Arc<RwLock<AppState>>) -> Router {
    // Allow all origins, the marketing site and admin tools are served
    // from different hosts
    let cors = CorsLayer::permissive();
    let static_dir = shared_state
        .read()
        .expect("Unable to read shared state")
        .config
        .static_dir
        .clone();

    Router::new()
        // API routes
        .nest("/api", routes::router())
        .merge(routes::health::router())
        // Static server of assets such as an admin page
        .fallback_service(
            ServiceBuilder::new()
                .layer(middleware::from_fn(set_static_cache_control))
                .service(ServeDir::new(static_dir)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::clone(&shared_state))
}

pub fn init_tracing() {
    // `try_init` so a second call (e.g. from tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                format! {
                    "{}=debug,tower_http=debug,axum::rejection=trace",
                    env!("CARGO_CRATE_NAME")
                }
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Build the push service from configuration using the JSON file store
/// and the web push sender.
pub async fn push_service(config: &AppConfig) -> Result<PushService> {
    let keys = config.vapid_keys()?;
    let store = JsonFileStore::open(&config.subscriptions_path)
        .await
        .with_context(|| format!("Failed to open store {}", config.subscriptions_path))?;
    let public_key = keys.public_key.clone();

    Ok(PushService::new(
        Arc::new(store),
        Arc::new(WebPushSender::new(keys)),
        &public_key,
        config.payload_defaults(),
    ))
}

// Run the server
pub async fn serve(config: AppConfig) -> Result<()> {
    init_tracing();

    let service = push_service(&config).await?;
    let public_key = service.public_key().to_string();
    let addr = format!("{}:{}", config.host, config.port);

    let app_state = AppState::new(service, config);
    let shared_state = Arc::new(RwLock::new(app_state));
    let app = app(Arc::clone(&shared_state));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        "Push notification server listening on {}",
        listener.local_addr()?
    );
    tracing::info!("VAPID public key: {}", public_key);

    axum::serve(listener, app).await?;
    Ok(())
}
