// src/analyze/mod.rs
//! Oracle-backed analysis: alert model, oracle adapter, extraction.

pub mod ai_adapter;
pub mod alert;
pub mod extract;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{DynOracle, GroqOracle, Oracle, OracleSource, StaticOracle};
pub use crate::analyze::alert::{Alert, AlertType, Severity};
pub use crate::analyze::extract::{AlertExtractor, MAX_ALERTS};
