//! Concrete adapter implementations for ports.

pub mod csv_cache_adapter;
pub mod evaluation_report;
pub mod file_config_adapter;
pub mod forest_model;
pub mod yahoo_adapter;
