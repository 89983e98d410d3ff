pub mod crud;
pub mod expand;
pub mod reports;
