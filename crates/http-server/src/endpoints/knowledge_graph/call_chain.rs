use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{
    StatusResponse, non_empty, parse_node_id, query_error_response,
};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use database::graph::NodeId;
use querying::QueryError;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

/// Raw query parameters, parsed by the handler
#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "api.ts")]
pub struct CallChainQueryRequest {
    #[serde(default)]
    #[ts(type = "number")]
    pub source: String,
    #[serde(default)]
    #[ts(type = "number")]
    pub target: String,
    /// Defaults to 5, at most 10
    #[ts(type = "number | null")]
    pub max_depth: Option<String>,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct CallChainResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<Vec<NodeId>>>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct CallChainEndpointConfig;

impl EndpointConfigTypes for CallChainEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = CallChainQueryRequest;
    type Response = CallChainResponses;
}

define_endpoint! {
    CallChainEndpoint,
    CallChainEndpointDef,
    Get,
    "/knowledge-graph/call-chain",
    ts_path_type = "\"/api/knowledge-graph/call-chain\"",
    config = CallChainEndpointConfig
}

/// All shortest CALLS paths from `source` to `target` within `maxDepth` hops
pub async fn call_chain_handler(
    State(state): State<AppState>,
    Query(query_params): Query<CallChainQueryRequest>,
) -> Response {
    debug!(
        "Call chain request source={} target={} max_depth={:?}",
        query_params.source, query_params.target, query_params.max_depth
    );

    let source = match parse_node_id(&query_params.source) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let target = match parse_node_id(&query_params.target) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let max_depth = match non_empty(query_params.max_depth.as_deref()) {
        None => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(depth) => Some(depth),
            Err(_) => {
                return query_error_response(&QueryError::invalid(
                    format!("maxDepth={raw}"),
                    "maxDepth must be a number",
                ));
            }
        },
    };

    match state.querying.call_chain(source, target, max_depth) {
        Ok(paths) => (StatusCode::OK, Json(paths)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node_id, shop_app_state, test_server};

    #[tokio::test]
    async fn test_call_chain_respects_max_depth() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let place = node_id(&state, "OrderController#place()");
        let create = node_id(&state, "OrderService#create()");
        let save = node_id(&state, "OrderRepository#save()");

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", place)
            .add_query_param("target", save)
            .await;
        response.assert_status_ok();
        let paths: Vec<Vec<NodeId>> = response.json();
        assert_eq!(paths, vec![vec![place, create, save]]);

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", place)
            .add_query_param("target", save)
            .add_query_param("maxDepth", 1)
            .await;
        response.assert_status_ok();
        assert!(response.json::<Vec<Vec<NodeId>>>().is_empty());
    }

    #[tokio::test]
    async fn test_call_chain_rejects_out_of_range_depth() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", 0)
            .add_query_param("target", 1)
            .add_query_param("maxDepth", 11)
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_query");
        assert!(body.detail.unwrap().contains("maxDepth=11"));
    }

    #[tokio::test]
    async fn test_call_chain_malformed_parameters_get_status_body() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let place = node_id(&state, "OrderController#place()");

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", place)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_node_id");

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", "abc")
            .add_query_param("target", place)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_node_id");
        assert!(body.detail.unwrap().contains("'abc'"));

        let response = server
            .get("/api/knowledge-graph/call-chain")
            .add_query_param("source", place)
            .add_query_param("target", place)
            .add_query_param("maxDepth", "deep")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_query");
        assert!(body.detail.unwrap().contains("maxDepth=deep"));
    }
}
