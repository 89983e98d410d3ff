use crate::AppState;
use crate::contract::{EmptyRequest, EndpointConfigTypes};
use crate::define_endpoint;
use crate::endpoints::shared::{StatusResponse, bad_request, non_empty, query_error_response};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use querying::calls::CallerInfo;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Deserialize, Serialize, TS, Default, Clone, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct AnalysisCallersQueryRequest {
    #[serde(default)]
    pub method: String,
    /// Restrict to methods declared in this type
    pub class: Option<String>,
    /// Restrict to methods declared in this file
    pub file: Option<String>,
}

#[derive(Serialize, Deserialize, TS, Default, Debug)]
#[ts(export, export_to = "api.ts")]
pub struct AnalysisCallersResponses {
    #[serde(rename = "200")]
    pub ok: Option<Vec<CallerInfo>>,
    #[serde(rename = "400")]
    pub bad_request: Option<StatusResponse>,
    #[serde(rename = "404")]
    pub not_found: Option<StatusResponse>,
}

pub struct AnalysisCallersEndpointConfig;

impl EndpointConfigTypes for AnalysisCallersEndpointConfig {
    type PathRequest = EmptyRequest;
    type BodyRequest = EmptyRequest;
    type QueryRequest = AnalysisCallersQueryRequest;
    type Response = AnalysisCallersResponses;
}

define_endpoint! {
    AnalysisCallersEndpoint,
    AnalysisCallersEndpointDef,
    Get,
    "/analysis/callers",
    ts_path_type = "\"/api/analysis/callers\"",
    config = AnalysisCallersEndpointConfig
}

/// Callers of every method matching the name, with call counts and call-site lines
pub async fn analysis_callers_handler(
    State(state): State<AppState>,
    Query(query_params): Query<AnalysisCallersQueryRequest>,
) -> Response {
    let method = query_params.method.trim();
    if method.is_empty() {
        return bad_request("empty_method");
    }

    match state.querying.caller_info(
        method,
        non_empty(query_params.class.as_deref()),
        non_empty(query_params.file.as_deref()),
    ) {
        Ok(callers) => (StatusCode::OK, Json(callers)).into_response(),
        Err(e) => query_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{shop_app_state, test_server};

    #[tokio::test]
    async fn test_callers_with_counts() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server
            .get("/api/analysis/callers")
            .add_query_param("method", "create")
            .add_query_param("class", "OrderService")
            .await;

        response.assert_status_ok();
        let callers: Vec<CallerInfo> = response.json();
        assert_eq!(callers.len(), 1);
        assert_eq!(callers[0].method_name, "place");
        assert_eq!(callers[0].class_name.as_deref(), Some("OrderController"));
        assert_eq!(callers[0].call_count, 1);
        assert_eq!(callers[0].line, 6);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let (state, _project) = shop_app_state();
        let server = test_server(&state);

        let response = server
            .get("/api/analysis/callers")
            .add_query_param("method", "refund")
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: StatusResponse = response.json();
        assert_eq!(body.status, "method_not_found");

        server
            .get("/api/analysis/callers")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
