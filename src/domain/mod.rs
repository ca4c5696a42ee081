pub mod error;
pub mod session;
pub mod user;

// Sales pipeline types
pub mod sales;
