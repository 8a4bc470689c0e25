//! Array context.
//!
//! A [`Context`] is passed by value into array creation and open.
//! There is no global configuration.

use crate::storage::{EngineConfig, Timestamp};

/// The context of an array operation.
///
/// Holds an optional pinned timestamp and the engine configuration forwarded to the storage engine on open.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Context {
    timestamp: Option<Timestamp>,
    engine_config: EngineConfig,
}

impl Context {
    /// Create a new context with no pinned timestamp and a default engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the context to `timestamp`.
    ///
    /// Arrays created or opened with this context are bound to `timestamp` unless an explicit timestamp is given on open.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn with_engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = engine_config;
        self
    }

    /// Return the pinned timestamp, if any.
    #[must_use]
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.timestamp
    }

    /// Return the engine configuration.
    #[must_use]
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine_config
    }
}
