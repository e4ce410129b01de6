//! UPGRADER: profit-per-hour upgrade investment optimizer
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod api;
pub mod config;
pub mod engine;
pub mod optimizer;
pub mod planner;
pub mod storage;
pub mod types;
