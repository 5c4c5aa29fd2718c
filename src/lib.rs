//! SLATE: scores candidate legs and assembles them into tiered parlays.
//!
//! The binary runs one generation pass; integration tests drive the same
//! modules through the library.

pub mod config;
pub mod types;
pub mod data;
pub mod strategy;
pub mod engine;
pub mod storage;
