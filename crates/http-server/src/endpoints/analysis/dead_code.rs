use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{PathPrefixQueryRequest, non_empty};
use axum::extract::{Query, State};
use axum::response::Json;
use querying::dead_code::DeadCodeEntry;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct DeadCodeResponses {
    #[serde(rename = "200")]
    pub ok: Vec<DeadCodeEntry>,
}

pub struct DeadCodeEndpointConfig;

impl EndpointConfigTypes for DeadCodeEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = PathPrefixQueryRequest;
    type Response = DeadCodeResponses;
}

define_endpoint! {
    DeadCodeEndpoint,
    DeadCodeEndpointDef,
    Get,
    "/analysis/dead-code",
    ts_path_type = "\"/api/analysis/dead-code\"",
    config = DeadCodeEndpointConfig
}

/// Liveness of every method, including the live ones
pub async fn dead_code_handler(
    State(state): State<AppState>,
    Query(query_params): Query<PathPrefixQueryRequest>,
) -> Json<Vec<DeadCodeEntry>> {
    Json(state.querying.dead_code(non_empty(query_params.path.as_deref())))
}
