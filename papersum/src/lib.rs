//! Papersum turns the URL of a paper or article into a plain-language
//! title, summary, methodology and list of key takeaways.
//!
//! Two ways to run it share one analysis pipeline:
//! - a persistent job queue (`POST /api/v1/jobs`) drained by a worker
//! - a synchronous endpoint (`POST /api/v1/analyze`) with an in-memory cache

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod models;
pub mod processing;
pub mod services;
