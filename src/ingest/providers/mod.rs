// src/ingest/providers/mod.rs
pub mod feed;
pub mod html;
