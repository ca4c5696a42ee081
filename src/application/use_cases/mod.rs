pub mod aggregator;
pub mod anomaly_detector;
pub mod auth;
pub mod cleaner;
pub mod exporter;
pub mod loader;
pub mod sales_pipeline;
pub mod session_store;
