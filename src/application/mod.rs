pub mod use_cases;

pub use use_cases::anomaly_detector::AnomalyDetector;
pub use use_cases::auth::AuthUseCase;
pub use use_cases::cleaner::{Cleaner, CleaningStats};
pub use use_cases::exporter::{Exporter, DEFAULT_PART_ROWS};
pub use use_cases::loader::Loader;
pub use use_cases::sales_pipeline::{SalesPipeline, UploadOutcome};
pub use use_cases::session_store::SessionStore;
