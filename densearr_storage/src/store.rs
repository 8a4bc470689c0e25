//! Storage engine implementations.

mod fragment;
mod memory_engine;

pub use memory_engine::{MemoryEngine, MemoryEngineOptions};
