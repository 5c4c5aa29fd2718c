//! Integration tests for SLATE.
//!
//! Drive full generation runs against a mock sink and both real storage
//! backends, checking tier invariants and rerun behaviour.

mod fixtures;
mod generation;
mod mock_sink;
