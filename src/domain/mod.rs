//! Core domain types and logic.

pub mod dataset;
pub mod cleaning;
pub mod ingest;
pub mod resolver;
pub mod trade;
pub mod batch;
pub mod events;
pub mod store;
pub mod statistics;
pub mod config_validation;
pub mod error;
