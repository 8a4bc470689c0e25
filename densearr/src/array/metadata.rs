use super::{ArrayError, DenseArray};
use crate::storage::{MetadataValue, OpenMode, StorageEngine, Timestamp};

/// The key/value metadata of a [`DenseArray`].
///
/// Metadata is versioned by the same timestamps as the array data.
/// Reads observe the newest value committed at or before the array timestamp, and [`set`](MetadataStore::set) commits at the array timestamp.
#[derive(Debug)]
pub struct MetadataStore<'a, TEngine: ?Sized + StorageEngine> {
    array: &'a DenseArray<TEngine>,
}

impl<'a, TEngine: ?Sized + StorageEngine> MetadataStore<'a, TEngine> {
    pub(super) fn new(array: &'a DenseArray<TEngine>) -> Self {
        Self { array }
    }

    /// Return the keys visible as of the array timestamp, in sorted order.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is closed, or [`ArrayError::Engine`] on a storage error.
    pub fn keys(&self) -> Result<Vec<String>, ArrayError> {
        self.array.check_open()?;
        Ok(self.array.engine().metadata_keys(self.array.handle())?)
    }

    /// Returns true if `key` is visible as of the array timestamp.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is closed, or [`ArrayError::Engine`] on a storage error.
    pub fn contains(&self, key: &str) -> Result<bool, ArrayError> {
        self.array.check_open()?;
        Ok(self
            .array
            .engine()
            .get_metadata(self.array.handle(), key)?
            .is_some())
    }

    /// Return the value of `key` as of the array timestamp.
    ///
    /// # Errors
    /// Returns [`ArrayError::KeyNotFound`] if `key` is not set as of the array timestamp,
    /// [`ArrayError::Lifecycle`] if the array is closed, or [`ArrayError::Engine`] on a storage error.
    pub fn get(&self, key: &str) -> Result<MetadataValue, ArrayError> {
        self.array.check_open()?;
        self.array
            .engine()
            .get_metadata(self.array.handle(), key)?
            .ok_or_else(|| ArrayError::KeyNotFound(key.to_string()))
    }

    /// Return the value of `key` as of an earlier `timestamp`.
    ///
    /// # Errors
    /// Returns [`ArrayError::Value`] if `timestamp` is later than the array timestamp,
    /// [`ArrayError::KeyNotFound`] if `key` is not set as of `timestamp`,
    /// [`ArrayError::Lifecycle`] if the array is closed, or [`ArrayError::Engine`] on a storage error.
    pub fn get_at(&self, key: &str, timestamp: Timestamp) -> Result<MetadataValue, ArrayError> {
        self.array.check_open()?;
        if timestamp > self.array.timestamp() {
            return Err(ArrayError::Value(format!(
                "metadata timestamp {timestamp} is later than the array timestamp {}",
                self.array.timestamp()
            )));
        }
        self.array
            .engine()
            .get_metadata_at(self.array.handle(), key, timestamp)?
            .ok_or_else(|| ArrayError::KeyNotFound(key.to_string()))
    }

    /// Set `key` to `value`, committed at the array timestamp.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is closed or not open for writing, or [`ArrayError::Engine`] on a storage error.
    pub fn set(&self, key: &str, value: impl Into<MetadataValue>) -> Result<(), ArrayError> {
        self.array.check_mode(OpenMode::Write)?;
        let value = value.into();
        log::debug!(
            "setting metadata {key} of {} at timestamp {}",
            self.array.uri(),
            self.array.timestamp()
        );
        self.array
            .engine()
            .set_metadata(self.array.handle(), key, value)?;
        Ok(())
    }
}
