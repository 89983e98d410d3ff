pub mod errors;
pub mod graph;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
