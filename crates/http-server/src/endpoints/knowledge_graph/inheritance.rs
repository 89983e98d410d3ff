use super::calls::{NodeListEndpointConfig, node_list_response};
use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{NodeIdPathRequest, StatusResponse, parse_node_id, query_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::hierarchy::TypeHierarchy;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

define_endpoint! {
    InheritsEndpoint,
    InheritsEndpointDef,
    Get,
    "/knowledge-graph/inherits/{id}",
    ts_path_type = "`/api/knowledge-graph/inherits/${number}`",
    config = NodeListEndpointConfig
}

define_endpoint! {
    SubclassesEndpoint,
    SubclassesEndpointDef,
    Get,
    "/knowledge-graph/subclasses/{id}",
    ts_path_type = "`/api/knowledge-graph/subclasses/${number}`",
    config = NodeListEndpointConfig
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct HierarchyResponses {
    #[serde(rename = "200")]
    pub ok: Option<TypeHierarchy>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct HierarchyEndpointConfig;

impl EndpointConfigTypes for HierarchyEndpointConfig {
    type PathRequest = NodeIdPathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = HierarchyResponses;
}

define_endpoint! {
    HierarchyEndpoint,
    HierarchyEndpointDef,
    Get,
    "/knowledge-graph/hierarchy/{id}",
    ts_path_type = "`/api/knowledge-graph/hierarchy/${number}`",
    config = HierarchyEndpointConfig
}

/// Direct supertypes over INHERITS and IMPLEMENTS
pub async fn inherits_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    node_list_response(&path_params.id, |id| state.querying.supertypes(id))
}

/// Direct subtypes over INHERITS and IMPLEMENTS
pub async fn subclasses_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    node_list_response(&path_params.id, |id| state.querying.subtypes(id))
}

pub async fn hierarchy_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    let id = match parse_node_id(&path_params.id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.querying.hierarchy(id) {
        Ok(hierarchy) => (StatusCode::OK, Json(hierarchy)).into_response(),
        Err(e) => query_error_response(&e),
    }
}
