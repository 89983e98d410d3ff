pub mod call_chain;
pub mod calls;
pub mod inheritance;
pub mod node;
pub mod query;
pub mod rebuild;
pub mod search;
