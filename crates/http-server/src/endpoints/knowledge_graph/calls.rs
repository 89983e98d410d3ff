use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{NodeIdPathRequest, StatusResponse, parse_node_id, query_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use database::graph::CodeNode;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Shared by every endpoint answering with a list of nodes for one node id
#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct NodeListResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<CodeNode>>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct NodeListEndpointConfig;

impl EndpointConfigTypes for NodeListEndpointConfig {
    type PathRequest = NodeIdPathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = NodeListResponses;
}

define_endpoint! {
    CalleesEndpoint,
    CalleesEndpointDef,
    Get,
    "/knowledge-graph/calls/{id}",
    ts_path_type = "`/api/knowledge-graph/calls/${number}`",
    config = NodeListEndpointConfig
}

define_endpoint! {
    CallersEndpoint,
    CallersEndpointDef,
    Get,
    "/knowledge-graph/callers/{id}",
    ts_path_type = "`/api/knowledge-graph/callers/${number}`",
    config = NodeListEndpointConfig
}

pub(crate) fn node_list_response(
    raw_id: &str,
    lookup: impl FnOnce(database::graph::NodeId) -> querying::Result<Vec<CodeNode>>,
) -> Response {
    let id = match parse_node_id(raw_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match lookup(id) {
        Ok(nodes) => (StatusCode::OK, Json(nodes)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

/// Distinct methods the node calls
pub async fn callees_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    node_list_response(&path_params.id, |id| state.querying.callees(id))
}

/// Distinct methods calling the node
pub async fn callers_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    node_list_response(&path_params.id, |id| state.querying.callers(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node_id, shop_app_state, test_server};

    fn names(nodes: &[CodeNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_callees_and_callers() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let create = node_id(&state, "OrderService#create()");

        let response = server.get(&format!("/api/knowledge-graph/calls/{create}")).await;
        response.assert_status_ok();
        let callees: Vec<CodeNode> = response.json();
        assert_eq!(names(&callees), vec!["save"]);
        assert_eq!(callees[0].key, "OrderRepository#save()");

        let response = server.get(&format!("/api/knowledge-graph/callers/{create}")).await;
        response.assert_status_ok();
        let callers: Vec<CodeNode> = response.json();
        assert_eq!(names(&callers), vec!["place"]);
    }

    #[tokio::test]
    async fn test_uncalled_method_has_no_callers() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let cancel = node_id(&state, "OrderService#cancel()");

        let response = server.get(&format!("/api/knowledge-graph/callers/{cancel}")).await;
        response.assert_status_ok();
        assert!(response.json::<Vec<CodeNode>>().is_empty());

        server
            .get("/api/knowledge-graph/calls/424242")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
