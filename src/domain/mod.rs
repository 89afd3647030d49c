//! Core domain types and logic.

pub mod batch;
pub mod condition;
pub mod config_validation;
pub mod error;
pub mod indicator;
pub mod instrument;
pub mod ohlcv;
pub mod report;
pub mod snapshot;
pub mod universe;
