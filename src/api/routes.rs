//! Router assembly for the HTTP surface.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::{compat, discovery, language, observability, translation, AppState};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Enhanced namespace
        .route(
            "/translate",
            get(translation::translate_get).post(translation::translate_post),
        )
        // Strict-EasyNMT namespace
        .route(
            "/compat/translate",
            get(compat::translate_get).post(compat::translate_post),
        )
        // Language metadata and detection
        .route("/lang_pairs", get(language::lang_pairs))
        .route("/get_languages", get(language::get_languages))
        .route(
            "/language_detection",
            get(language::detect_get).post(language::detect_post),
        )
        // Discovery
        .route("/discover/all", get(discovery::discover_all))
        .route("/discover/clear-cache", post(discovery::clear_cache))
        .route("/discover/:family", get(discovery::discover_family))
        // Observability
        .route("/model_name", get(observability::model_name))
        .route("/healthz", get(observability::healthz))
        .route("/readyz", get(observability::readyz))
        .route("/cache", get(observability::cache_status))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
