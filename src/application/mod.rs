// Application layer: the ledger handle and the read-side reports built on it.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use reporting::{CategoryFilter, CategoryReport, CategorySummary, MonthSummary, TypeTotal};
pub use service::*;
