pub mod builder;
pub mod test_detection;

pub use builder::{BuildOutput, BuildReport, GraphBuilder};
