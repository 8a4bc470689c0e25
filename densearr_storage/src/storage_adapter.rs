//! Storage adapters.
//!
//! Storage adapters can be layered on storage engines.

pub mod performance_metrics;
