//! External column names of the sales-order export.
//!
//! Names are matched exactly: `ship-state`, not `ShipState`.

pub const DATE: &str = "Date";
pub const STATUS: &str = "Status";
pub const CATEGORY: &str = "Category";
pub const AMOUNT: &str = "Amount";
pub const QTY: &str = "Qty";
pub const SHIP_STATE: &str = "ship-state";

/// Label column appended by anomaly detection.
pub const ANOMALY: &str = "anomaly";

/// Columns every cleaned row must carry a value for.
pub const REQUIRED: [&str; 3] = [AMOUNT, DATE, QTY];
