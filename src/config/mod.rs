// src/config/mod.rs
pub mod radar;

pub use radar::{OracleConfig, RadarConfig};
