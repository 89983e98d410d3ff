pub mod calls;
pub mod complexity;
pub mod dead_code;
pub mod errors;
pub mod flow_graph;
pub mod hierarchy;
pub mod layers;
pub mod query;
pub mod service;
pub mod state_machine;
pub mod types;

pub use errors::{QueryError, Result};
pub use service::*;
pub use types::*;
