//! Documentation of the follooow influencer directory backend.
//!
//!
//!
//! # Endpoints
//!
//! | Method | Path                                  | Purpose                                  |
//! |--------|---------------------------------------|------------------------------------------|
//! | GET    | `/influencers`                        | filtered, paginated list plus total      |
//! | GET    | `/influencers/quick-find?ids=a,b,c`   | up to 20 summaries                       |
//! | GET    | `/influencers/{influencer_id}`        | one record, counts a visit               |
//! | POST   | `/influencer`                         | create from a JSON body                  |
//! | PUT    | `/influencer/{influencer_id}`         | replace every writable field             |
//!
//! List takes `search` (case-insensitive name substring), `label` (comma separated,
//! any overlap matches), `gender` (`m` or `f`, anything else is ignored), `limit`
//! (default 6) and `page` (1-based, default 1).
//!
//! Every body, success or not, is `{status, message, data}`.
//!
//!
//!
//! # Notes
//!
//! ## Visits
//! A lookup bumps `visits` atomically and hands back the record as it was just
//! before the bump. Concurrent lookups each count.
//!
//! ## Updates
//! Not a merge. A field missing from the PUT body is cleared.
//!
//! ## Quick find
//! Without `ids` this returns the first 20 records unfiltered.
//!
//! ## Deadlines
//! Each request gets `REQUEST_TIMEOUT_SECS` (10s default), then fails with a 500.
//! Store calls are never retried.
//!
//!
//!
//! # Setup
//!
//! ```sh
//! MONGO_URI=mongodb://localhost:27017 RUST_LOG=info cargo run -p follooow
//! ```
//!
//! Environment:
//! - `RUST_PORT` (1111)
//! - `MONGO_URI`, also read from `/run/secrets/MONGO_URI`
//! - `MONGO_DATABASE` (follooow)
//! - `MONGO_COLLECTION` (influencers)
//! - `REQUEST_TIMEOUT_SECS` (10)
use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    middleware::from_fn_with_state,
    routing::{get, post, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod filters;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

use routes::{
    create_handler, detail_handler, enforce_deadline, list_handler, quick_find_handler,
    update_handler,
};
use state::AppState;

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");

    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("Server running on {address}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    state.store.close().await;
    info!("Server shut down");

    served.context("server error")
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/influencers", get(list_handler))
        .route("/influencers/quick-find", get(quick_find_handler))
        .route("/influencers/{influencer_id}", get(detail_handler))
        .route("/influencer", post(create_handler))
        .route("/influencer/{influencer_id}", put(update_handler))
        .layer(from_fn_with_state(state.clone(), enforce_deadline))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
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
}
