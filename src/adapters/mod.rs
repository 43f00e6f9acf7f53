//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_price_source;
pub mod file_config_adapter;
