use std::collections::BTreeMap;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

use crate::StorageError;

/// Engine tuning parameters.
///
/// A string key/value map forwarded to the engine when an object is opened.
/// Keys an engine does not recognise are ignored.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EngineConfig(BTreeMap<String, String>);

impl EngineConfig {
    /// The byte budget of a single read pass.
    pub const READ_BUFFER_BYTES: &'static str = "read_buffer_bytes";

    /// Create an empty engine configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set `key` to `value`, returning the updated configuration.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Return the value of `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Return the [`READ_BUFFER_BYTES`](Self::READ_BUFFER_BYTES) setting, if set.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidConfig`] if the value is not a positive integer.
    pub fn read_buffer_bytes(&self) -> Result<Option<NonZeroU64>, StorageError> {
        self.get(Self::READ_BUFFER_BYTES)
            .map(|value| {
                value
                    .trim()
                    .parse::<NonZeroU64>()
                    .map_err(|err| {
                        StorageError::InvalidConfig(format!(
                            "error parsing {}: '{value}' ({err})",
                            Self::READ_BUFFER_BYTES
                        ))
                    })
            })
            .transpose()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EngineConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Per-dimension creation hints.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlatformDimensionConfig {
    /// The requested tile extent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tile: Option<NonZeroU64>,
}

/// Creation hints.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlatformCreateConfig {
    /// Hints keyed by dimension name.
    #[serde(default)]
    pub dims: BTreeMap<String, PlatformDimensionConfig>,
}

/// Platform-specific hints forwarded verbatim to the engine when an object is created.
///
/// ### Example
/// ```rust
/// # use densearr_storage::PlatformConfig;
/// let config: PlatformConfig = serde_json::from_str(
///     r#"{"create": {"dims": {"dim_0": {"tile": 2048}}}}"#,
/// )?;
/// assert_eq!(config.tile_hint("dim_0").map(|t| t.get()), Some(2048));
/// assert_eq!(config.tile_hint("dim_1"), None);
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Hints applied at creation.
    #[serde(default)]
    pub create: PlatformCreateConfig,
}

impl PlatformConfig {
    /// Set the tile extent hint for the dimension `name`.
    #[must_use]
    pub fn with_tile(mut self, name: impl Into<String>, tile: NonZeroU64) -> Self {
        self.create.dims.entry(name.into()).or_default().tile = Some(tile);
        self
    }

    /// Return the tile extent hint for the dimension `name`.
    #[must_use]
    pub fn tile_hint(&self, name: &str) -> Option<NonZeroU64> {
        self.create.dims.get(name).and_then(|dim| dim.tile)
    }
}
