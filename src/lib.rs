pub mod error;
pub mod filter;
pub mod models;
pub mod money;
pub mod pdf;
pub mod report;
pub mod store;
pub mod summary;
