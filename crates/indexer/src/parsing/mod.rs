pub mod metrics;
pub mod parser;
pub mod processor;
pub mod tree;
