use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{NodeIdPathRequest, StatusResponse, parse_node_id, query_error_response};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::NodeWithRelationships;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct NodeResponses {
    #[serde(rename = "200")]
    pub ok: Option<NodeWithRelationships>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct NodeEndpointConfig;

impl EndpointConfigTypes for NodeEndpointConfig {
    type PathRequest = NodeIdPathRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = EmptyRequest;
    type Response = NodeResponses;
}

define_endpoint! {
    NodeEndpoint,
    NodeEndpointDef,
    Get,
    "/knowledge-graph/node/{id}",
    ts_path_type = "`/api/knowledge-graph/node/${number}`",
    config = NodeEndpointConfig
}

/// A node with every edge touching it, each naming the node on the other end
pub async fn node_handler(
    State(state): State<AppState>,
    Path(path_params): Path<NodeIdPathRequest>,
) -> Response {
    let id = match parse_node_id(&path_params.id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.querying.node(id) {
        Ok(node) => (StatusCode::OK, Json(node)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{node_id, shop_app_state, test_server};
    use database::graph::{NodeType, RelationshipType};

    #[tokio::test]
    async fn test_node_with_relationships() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let create = node_id(&state, "OrderService#create()");

        let response = server.get(&format!("/api/knowledge-graph/node/{create}")).await;

        response.assert_status_ok();
        let body: NodeWithRelationships = response.json();
        assert_eq!(body.node.name, "create");
        assert!(body.incoming_relationships.iter().any(|r| {
            r.relationship_type == RelationshipType::Calls && r.related_node_name == "place"
        }));
        assert!(body.incoming_relationships.iter().any(|r| {
            r.relationship_type == RelationshipType::Contains
                && r.related_node_name == "OrderService"
        }));
        assert!(body.outgoing_relationships.iter().any(|r| {
            r.relationship_type == RelationshipType::Calls
                && r.related_node_name == "save"
                && r.related_node_type == NodeType::Method
        }));
    }

    #[tokio::test]
    async fn test_node_body_is_flat() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);
        let create = node_id(&state, "OrderService#create()");

        let body: serde_json::Value = server
            .get(&format!("/api/knowledge-graph/node/{create}"))
            .await
            .json();

        assert_eq!(body["id"], create);
        assert_eq!(body["name"], "create");
        assert!(body.get("node").is_none());
        let outgoing = body["outgoingRelationships"].as_array().unwrap();
        assert!(outgoing.iter().any(|edge| edge["relatedNodeName"] == "save"));
        assert!(outgoing.iter().all(|edge| edge.get("relationshipId").is_some()));
    }

    #[tokio::test]
    async fn test_node_errors() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server.get("/api/knowledge-graph/node/999999").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "node_not_found");

        let response = server.get("/api/knowledge-graph/node/abc").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_node_id");
    }
}
