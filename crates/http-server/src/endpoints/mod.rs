pub mod analysis;
pub mod flow_graph;
pub mod info;
pub mod knowledge_graph;
pub mod shared;
pub mod slices;
pub mod state_machines;
