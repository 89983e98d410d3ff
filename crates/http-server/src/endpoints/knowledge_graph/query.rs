use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, query_error_response};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::QueryResult;
use serde::{Deserialize, Serialize};
use tracing::info;
use ts_rs::TS;

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct GraphQueryRequest {
    /// e.g. `type:CLASS public:true` or `from:place to:save depth:4`
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct QueryResponses {
    #[serde(rename = "200")]
    pub ok: Option<QueryResult>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
}

pub struct QueryEndpointConfig;

impl EndpointConfigTypes for QueryEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = GraphQueryRequest;
    type Response = QueryResponses;
}

define_endpoint! {
    QueryEndpoint,
    QueryEndpointDef,
    Get,
    "/knowledge-graph/query",
    ts_path_type = "\"/api/knowledge-graph/query\"",
    config = QueryEndpointConfig
}

pub async fn query_handler(
    State(state): State<AppState>,
    Query(query_params): Query<GraphQueryRequest>,
) -> Response {
    info!("Executing graph query \"{}\"", query_params.q);

    match state.querying.query(&query_params.q) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{shop_app_state, test_server};

    #[tokio::test]
    async fn test_filter_query_sorted_by_name() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server
            .get("/api/knowledge-graph/query")
            .add_query_param("q", "type:CLASS public:true")
            .await;

        response.assert_status_ok();
        let result: QueryResult = response.json();
        let names: Vec<&str> = result.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["JpaOrderRepository", "OrderController", "OrderService"]);
        assert_eq!(result.total_results, 3);
        assert_eq!(result.query, "type:CLASS public:true");
    }

    #[tokio::test]
    async fn test_invalid_query_reports_token() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server
            .get("/api/knowledge-graph/query")
            .add_query_param("q", "type:GADGET")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "invalid_query");
        assert!(body.detail.unwrap().contains("type:GADGET"));

        server
            .get("/api/knowledge-graph/query")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
