//! Model discovery endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::api::error::ApiError;
use crate::api::types::{AllDiscoveryResponse, DiscoveryParams, DiscoveryResponse, FamilyPairs};
use crate::api::AppState;
use crate::common::error::NmtError;
use crate::models::ModelFamily;

fn to_wire(pairs: Vec<(String, String)>) -> Vec<[String; 2]> {
    pairs.into_iter().map(|(src, tgt)| [src, tgt]).collect()
}

pub async fn discover_family(
    State(state): State<Arc<AppState>>,
    Path(family): Path<String>,
    Query(params): Query<DiscoveryParams>,
) -> Result<Json<DiscoveryResponse>, ApiError> {
    let family: ModelFamily = family
        .parse()
        .map_err(|_| NmtError::ValueError(format!("Unknown model family: {family}")))?;

    let pairs = to_wire(state.discovery.pairs(family, params.force_refresh).await);
    Ok(Json(DiscoveryResponse {
        model_family: family.as_str().to_string(),
        pair_count: pairs.len(),
        language_pairs: pairs,
    }))
}

pub async fn discover_all(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoveryParams>,
) -> Json<AllDiscoveryResponse> {
    let all = state.discovery.all_pairs(params.force_refresh).await;
    let mut models = HashMap::new();
    for (family, pairs) in all {
        let pairs = to_wire(pairs);
        models.insert(
            family.as_str().to_string(),
            FamilyPairs {
                pair_count: pairs.len(),
                language_pairs: pairs,
            },
        );
    }
    Json(AllDiscoveryResponse { models })
}

pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<Value> {
    state.discovery.clear_cache();
    Json(json!({"status": "ok", "message": "Discovery cache cleared"}))
}
