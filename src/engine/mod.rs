//! Core engine: the scan → plan → buy cycle.

pub mod executor;
pub mod report;
pub mod scanner;
