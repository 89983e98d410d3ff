pub mod callers;
pub mod complexity;
pub mod dead_code;
