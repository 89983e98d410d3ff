//! Persistent, named subsets of the knowledge graph.
//!
//! A slice stores the keys of its member nodes so it survives rebuilds; every read
//! resolves those keys against the graph snapshot current at the time of the call.

pub mod data_directory;
pub mod errors;
pub mod manager;
pub mod repository;
pub mod slice;

pub use data_directory::{DataDirectory, DataDirectoryInfo};
pub use errors::{RepositoryError, Result, SliceError};
pub use manager::{MAX_EXPANSION_DEPTH, SliceManager, expand_node_set};
pub use repository::{InMemoryRepository, JsonFileRepository, SliceRepository};
pub use slice::{
    CreateSliceRequest, ExpandOptions, FeatureSlice, SliceRecord, SliceStatistics,
    UpdateSliceRequest,
};
