use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, bad_request};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use database::graph::CodeNode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SearchQueryRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct SearchResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<CodeNode>>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
}

pub struct SearchEndpointConfig;

impl EndpointConfigTypes for SearchEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = SearchQueryRequest;
    type Response = SearchResponses;
}

define_endpoint! {
    SearchEndpoint,
    SearchEndpointDef,
    Get,
    "/knowledge-graph/search",
    ts_path_type = "\"/api/knowledge-graph/search\"",
    config = SearchEndpointConfig
}

/// Case-insensitive substring match on node names
pub async fn search_handler(
    State(state): State<AppState>,
    Query(query_params): Query<SearchQueryRequest>,
) -> Response {
    let name = query_params.name.trim();
    if name.is_empty() {
        return bad_request("empty_search_term");
    }

    (StatusCode::OK, Json(state.querying.search(name))).into_response()
}
