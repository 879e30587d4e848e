pub mod config;
pub mod enrichment;
pub mod error;
pub mod form;
pub mod models;
pub mod sync;
