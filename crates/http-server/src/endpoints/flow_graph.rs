use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, bad_request, query_error_response};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::flow_graph::FlowGraph;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct FlowGraphResponses {
    #[serde(rename = "200")]
    pub ok: Option<FlowGraph>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct FlowAnalyzeEndpointConfig;

impl EndpointConfigTypes for FlowAnalyzeEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = FlowGraphResponses;
}

define_endpoint! {
    FlowAnalyzeEndpoint,
    FlowAnalyzeEndpointDef,
    Get,
    "/flow-graph/analyze",
    ts_path_type = "\"/api/flow-graph/analyze\"",
    config = FlowAnalyzeEndpointConfig
}

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct FlowTraceQueryRequest {
    /// Name of the type the trace starts from
    #[serde(default)]
    pub from: String,
    /// Defaults to 3, at most 10
    pub depth: Option<usize>,
}

pub struct FlowTraceEndpointConfig;

impl EndpointConfigTypes for FlowTraceEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = FlowTraceQueryRequest;
    type Response = FlowGraphResponses;
}

define_endpoint! {
    FlowTraceEndpoint,
    FlowTraceEndpointDef,
    Get,
    "/flow-graph/trace",
    ts_path_type = "\"/api/flow-graph/trace\"",
    config = FlowTraceEndpointConfig
}

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct FlowComponentPathRequest {
    pub name: String,
}

pub struct FlowComponentEndpointConfig;

impl EndpointConfigTypes for FlowComponentEndpointConfig {
    type PathRequest = FlowComponentPathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = FlowGraphResponses;
}

define_endpoint! {
    FlowComponentEndpoint,
    FlowComponentEndpointDef,
    Get,
    "/flow-graph/component/{name}",
    ts_path_type = "`/api/flow-graph/component/${string}`",
    config = FlowComponentEndpointConfig
}

/// Type-level flow graph of the whole project with a layer per type
pub async fn flow_analyze_handler(State(state): State<AppState>) -> Json<FlowGraph> {
    let flow = state.querying.flow_graph();
    info!(
        "Built flow graph with {} nodes and {} edges",
        flow.metadata.node_count, flow.metadata.edge_count
    );
    Json(flow)
}

/// Types reachable downstream of `from` within `depth` flow edges
pub async fn flow_trace_handler(
    State(state): State<AppState>,
    Query(query_params): Query<FlowTraceQueryRequest>,
) -> Response {
    let from = query_params.from.trim();
    if from.is_empty() {
        return bad_request("empty_from");
    }

    match state.querying.trace_flow(from, query_params.depth) {
        Ok(flow) => (StatusCode::OK, Json(flow)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

/// A type together with its direct flow neighbours in both directions
pub async fn flow_component_handler(
    State(state): State<AppState>,
    Path(path_params): Path<FlowComponentPathRequest>,
) -> Response {
    match state.querying.flow_component(path_params.name.trim()) {
        Ok(flow) => (StatusCode::OK, Json(flow)).into_response(),
        Err(e) => query_error_response(&e),
    }
}
