use auto_impl::auto_impl;

use crate::{
    Bytes, CellRange, EngineConfig, EngineHandle, MetadataValue, ObjectDescriptor, ObjectLayout,
    OpenMode, PlatformConfig, ReadChunks, StorageError, Timestamp,
};

/// The storage engine traits.
///
/// Every method is atomic with respect to other calls on the same engine.
/// Engines may be shared across threads, so all methods take `&self`.
#[auto_impl(Arc)]
pub trait StorageEngine: Send + Sync {
    /// Create a new object at `uri` committed at `timestamp`.
    ///
    /// `platform_config` is forwarded verbatim from the caller, engines apply the hints they recognise.
    ///
    /// # Errors
    /// Returns [`StorageError::AlreadyExists`] if an object already exists at `uri`, or another [`StorageError`] if the layout is rejected.
    fn create_object(
        &self,
        uri: &str,
        layout: ObjectLayout,
        platform_config: &PlatformConfig,
        timestamp: Timestamp,
    ) -> Result<ObjectDescriptor, StorageError>;

    /// Describe the object at `uri`.
    ///
    /// Returns [`None`] if no object exists at `uri`.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if there is an underlying storage error.
    fn describe_object(&self, uri: &str) -> Result<Option<ObjectDescriptor>, StorageError>;

    /// Open the object at `uri` in `mode` bound to `timestamp`.
    ///
    /// # Errors
    /// Returns [`StorageError::NotFound`] if no object exists at `uri`, [`StorageError::WriterConflict`] if opening for write while another writer is open, or [`StorageError::InvalidConfig`] if `config` is invalid.
    fn open_object(
        &self,
        uri: &str,
        mode: OpenMode,
        timestamp: Timestamp,
        config: &EngineConfig,
    ) -> Result<EngineHandle, StorageError>;

    /// Close an open handle.
    ///
    /// # Errors
    /// Returns [`StorageError::HandleClosed`] if the handle is not open.
    fn close_object(&self, handle: &EngineHandle) -> Result<(), StorageError>;

    /// Read `region` as of the handle timestamp.
    ///
    /// The cells of the region are returned in row-major order, in one or more chunks.
    /// Cells never written as of the timestamp read as zero bytes.
    ///
    /// # Errors
    /// Returns [`StorageError::OutOfDomain`] if the region lies outside the domain, or another [`StorageError`] if the handle is not open for read.
    fn range_read<'a>(
        &'a self,
        handle: &EngineHandle,
        region: &[CellRange],
    ) -> Result<ReadChunks<'a>, StorageError>;

    /// Write `bytes` to `region` committed at the handle timestamp.
    ///
    /// `bytes` holds the cells of the region in row-major order.
    ///
    /// # Errors
    /// Returns [`StorageError::OutOfDomain`] if the region lies outside the domain, [`StorageError::InvalidWriteSize`] if `bytes` does not match the region, or another [`StorageError`] if the handle is not open for write.
    fn range_write(
        &self,
        handle: &EngineHandle,
        region: &[CellRange],
        bytes: Bytes,
    ) -> Result<(), StorageError>;

    /// Return the value of the metadata `key` as of the handle timestamp.
    ///
    /// Returns [`None`] if the key was not set at or before the timestamp.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the handle is not open.
    fn get_metadata(
        &self,
        handle: &EngineHandle,
        key: &str,
    ) -> Result<Option<MetadataValue>, StorageError> {
        self.get_metadata_at(handle, key, handle.timestamp())
    }

    /// Return the value of the metadata `key` as of `timestamp`.
    ///
    /// `timestamp` must not be later than the handle timestamp.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the handle is not open or `timestamp` is later than the handle timestamp.
    fn get_metadata_at(
        &self,
        handle: &EngineHandle,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Option<MetadataValue>, StorageError>;

    /// Set the metadata `key` to `value` committed at the handle timestamp.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the handle is not open for write.
    fn set_metadata(
        &self,
        handle: &EngineHandle,
        key: &str,
        value: MetadataValue,
    ) -> Result<(), StorageError>;

    /// Return the metadata keys visible as of the handle timestamp, in sorted order.
    ///
    /// # Errors
    /// Returns a [`StorageError`] if the handle is not open.
    fn metadata_keys(&self, handle: &EngineHandle) -> Result<Vec<String>, StorageError>;

    /// Return the current engine timestamp.
    fn now(&self) -> Timestamp;

    /// Returns true if the engine supports dimensions created without a size.
    fn supports_growable_domains(&self) -> bool {
        false
    }
}
