pub mod config;
pub mod executor;
