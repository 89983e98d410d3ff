//! # Typed endpoint contracts
//!
//! Every REST endpoint declares its method, path and request/response types once through
//! [`define_endpoint!`]. The macro emits a marker type implementing [`EndpointContract`],
//! used when mounting the route, and a `...Def` struct exported to TypeScript so the
//! front end shares the exact request and response shapes.
//!
//! Requests are split into three parts:
//! - **Path request**: dynamic segments such as the node id in `/knowledge-graph/node/{id}`
//! - **Body request**: the JSON body of `POST` and `PUT` endpoints
//! - **Query request**: query-string parameters such as `?maxDepth=4`
//!
//! Use [`EmptyRequest`] for any part an endpoint does not take.
//!
//! ```rust,ignore
//! pub struct SliceExpandEndpointConfig;
//!
//! impl EndpointConfigTypes for SliceExpandEndpointConfig {
//!     type PathRequest = SlicePathRequest;    // /slices/{id}/expand
//!     type BodyRequest = ExpandOptions;       // {"depth": 2, "includeCallers": false}
//!     type QueryRequest = EmptyRequest;
//!     type Response = SliceResponses;
//! }
//!
//! define_endpoint! {
//!     SliceExpandEndpoint,
//!     SliceExpandEndpointDef,
//!     Post,
//!     "/slices/{id}/expand",
//!     ts_path_type = "`/api/slices/${string}/expand`",
//!     config = SliceExpandEndpointConfig
//! }
//! ```
//!
//! Response types list one optional field per status code the endpoint can answer with:
//!
//! ```rust,ignore
//! #[derive(Serialize, TS, Default)]
//! pub struct SliceResponses {
//!     #[serde(rename = "200")]
//!     pub ok: Option<FeatureSlice>,
//!     #[serde(rename = "404")]
//!     pub not_found: Option<StatusResponse>,
//! }
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Serialize, Deserialize, TS, Clone, Debug, PartialEq)]
#[ts(export, export_to = "api.ts")]
pub enum HttpMethod {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "POST")]
    Post,
    #[serde(rename = "PUT")]
    Put,
    #[serde(rename = "DELETE")]
    Delete,
}

pub trait ApiRequest:
    Serialize + for<'de> Deserialize<'de> + TS + Default + Send + Sync + 'static
{
}
impl<T> ApiRequest for T where
    T: Serialize + for<'de> Deserialize<'de> + TS + Default + Send + Sync + 'static
{
}

#[derive(Serialize, Deserialize, TS, Default, Debug, Clone, PartialEq)]
#[ts(export, export_to = "api.ts")]
pub struct EmptyRequest;

pub trait ApiResponse: Serialize + TS + Default + Send + Sync + 'static {}
impl<T> ApiResponse for T where T: Serialize + TS + Default + Send + Sync + 'static {}

pub trait EndpointContract {
    const METHOD: HttpMethod;
    const PATH: &'static str;

    type PathRequest: ApiRequest;
    type BodyRequest: ApiRequest;
    type QueryRequest: ApiRequest;
    type Response: ApiResponse;
}

/// Trait for endpoint configuration - implement this for your config struct
pub trait EndpointConfigTypes {
    type PathRequest: ApiRequest;
    type BodyRequest: ApiRequest;
    type QueryRequest: ApiRequest;
    type Response: ApiResponse;
}

#[macro_export]
macro_rules! define_endpoint {
    (
        $endpoint_name:ident,
        $def_name:ident,
        $method:ident,
        $path:literal,
        ts_path_type = $ts_path_type:literal,
        config = $config_type:ty
    ) => {
        $crate::define_endpoint! {
            $endpoint_name,
            $def_name,
            $method,
            $path,
            ts_path_type = $ts_path_type,
            config = $config_type,
            export_to = "api.ts"
        }
    };
    (
        $endpoint_name:ident,
        $def_name:ident,
        $method:ident,
        $path:literal,
        ts_path_type = $ts_path_type:literal,
        config = $config_type:ty,
        export_to = $export_path:literal
    ) => {
        pub struct $endpoint_name;

        impl $crate::contract::EndpointContract for $endpoint_name {
            const METHOD: $crate::contract::HttpMethod = $crate::contract::HttpMethod::$method;
            const PATH: &'static str = $path;
            type PathRequest = <$config_type as $crate::contract::EndpointConfigTypes>::PathRequest;
            type BodyRequest = <$config_type as $crate::contract::EndpointConfigTypes>::BodyRequest;
            type QueryRequest = <$config_type as $crate::contract::EndpointConfigTypes>::QueryRequest;
            type Response = <$config_type as $crate::contract::EndpointConfigTypes>::Response;
        }

        #[derive(serde::Serialize, ts_rs::TS)]
        #[ts(export, export_to = $export_path)]
        pub struct $def_name {
            pub method: $crate::contract::HttpMethod,
            #[ts(type = $ts_path_type)]
            pub path: String,
            pub path_request: <$config_type as $crate::contract::EndpointConfigTypes>::PathRequest,
            pub body_request: <$config_type as $crate::contract::EndpointConfigTypes>::BodyRequest,
            pub query_request: <$config_type as $crate::contract::EndpointConfigTypes>::QueryRequest,
            pub responses: <$config_type as $crate::contract::EndpointConfigTypes>::Response,
        }

        impl Default for $def_name {
            fn default() -> Self {
                Self {
                    method: $crate::contract::HttpMethod::$method,
                    path: $path.to_string(),
                    path_request: <<$config_type as $crate::contract::EndpointConfigTypes>::PathRequest>::default(),
                    body_request: <<$config_type as $crate::contract::EndpointConfigTypes>::BodyRequest>::default(),
                    query_request: <<$config_type as $crate::contract::EndpointConfigTypes>::QueryRequest>::default(),
                    responses: <<$config_type as $crate::contract::EndpointConfigTypes>::Response>::default(),
                }
            }
        }
    };
}
