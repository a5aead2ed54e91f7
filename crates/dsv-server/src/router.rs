use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::config::ServerConfig;
use crate::handler::{self, AppState};

/// Build the axum router with all dataset endpoints.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;
    let prefix = config.normalized_prefix();

    let api = Router::new()
        .route(endpoints::PING, get(handler::ping_handler))
        .route(
            endpoints::STORE_METADATA,
            post(handler::store_metadata_handler),
        )
        .route(endpoints::UPLOAD_FILE, post(handler::upload_file_handler))
        .route(endpoints::METADATA, get(handler::get_metadata_handler))
        .route(endpoints::FILE, get(handler::get_file_handler))
        .route(endpoints::VERSIONS, get(handler::versions_handler))
        .route(
            endpoints::DATASETS,
            axum::routing::delete(handler::delete_dataset_handler),
        );

    let root = Router::new().route(endpoints::HEALTH, get(handler::health_handler));
    let app = if prefix.is_empty() {
        root.merge(api)
    } else {
        root.nest(&prefix, api)
    };

    let layers = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    app.layer(layers).with_state(state)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}
