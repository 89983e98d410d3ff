pub mod analysis;
pub mod errors;
pub mod execution;
pub mod parsing;
pub mod project;
pub mod runner;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
