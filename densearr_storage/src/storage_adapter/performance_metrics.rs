//! A storage adapter which records performance metrics.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    Bytes, CellRange, EngineConfig, EngineHandle, MetadataValue, ObjectDescriptor, ObjectLayout,
    OpenMode, PlatformConfig, ReadChunks, StorageEngine, StorageError, Timestamp,
};

/// The performance metrics storage adapter. Accumulates metrics, such as bytes read and written.
///
/// It is intended to aid in testing by allowing the application to validate that metrics (e.g., read passes, bytes read/written, total read/write operations) match expected values for specific operations.
///
/// ### Example
/// ```rust
/// # use std::sync::Arc;
/// # use densearr_storage::store::MemoryEngine;
/// # use densearr_storage::storage_adapter::performance_metrics::PerformanceMetricsStorageAdapter;
/// let engine = Arc::new(MemoryEngine::new());
/// let engine = Arc::new(PerformanceMetricsStorageAdapter::new(engine));
/// // do some engine operations...
/// // assert_eq!(engine.bytes_read(), ...);
/// // assert_eq!(engine.bytes_written(), ...);
/// // assert_eq!(engine.reads(), ...);
/// // assert_eq!(engine.read_passes(), ...);
/// // assert_eq!(engine.writes(), ...);
/// ```
#[derive(Debug)]
pub struct PerformanceMetricsStorageAdapter<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    bytes_read: Arc<AtomicUsize>,
    bytes_written: AtomicUsize,
    reads: AtomicUsize,
    read_passes: Arc<AtomicUsize>,
    writes: AtomicUsize,
    opens: AtomicUsize,
    closes: AtomicUsize,
}

impl<TStorage: ?Sized> PerformanceMetricsStorageAdapter<TStorage> {
    /// Create a new performance metrics storage adapter.
    #[must_use]
    pub fn new(storage: Arc<TStorage>) -> Self {
        Self {
            storage,
            bytes_read: Arc::default(),
            bytes_written: AtomicUsize::default(),
            reads: AtomicUsize::default(),
            read_passes: Arc::default(),
            writes: AtomicUsize::default(),
            opens: AtomicUsize::default(),
            closes: AtomicUsize::default(),
        }
    }

    /// Reset the performance metrics.
    pub fn reset(&self) {
        self.bytes_read.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        self.read_passes.store(0, Ordering::Relaxed);
        self.writes.store(0, Ordering::Relaxed);
        self.opens.store(0, Ordering::Relaxed);
        self.closes.store(0, Ordering::Relaxed);
    }

    /// Returns the number of bytes read.
    pub fn bytes_read(&self) -> usize {
        self.bytes_read.load(Ordering::Relaxed)
    }

    /// Returns the number of bytes written.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of range read requests.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of chunks delivered by range reads.
    pub fn read_passes(&self) -> usize {
        self.read_passes.load(Ordering::Relaxed)
    }

    /// Returns the number of range write requests.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of successful open requests.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }

    /// Returns the number of successful close requests.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::Relaxed)
    }
}

impl<TStorage: ?Sized + StorageEngine> StorageEngine for PerformanceMetricsStorageAdapter<TStorage> {
    fn create_object(
        &self,
        uri: &str,
        layout: ObjectLayout,
        platform_config: &PlatformConfig,
        timestamp: Timestamp,
    ) -> Result<ObjectDescriptor, StorageError> {
        self.storage
            .create_object(uri, layout, platform_config, timestamp)
    }

    fn describe_object(&self, uri: &str) -> Result<Option<ObjectDescriptor>, StorageError> {
        self.storage.describe_object(uri)
    }

    fn open_object(
        &self,
        uri: &str,
        mode: OpenMode,
        timestamp: Timestamp,
        config: &EngineConfig,
    ) -> Result<EngineHandle, StorageError> {
        let handle = self.storage.open_object(uri, mode, timestamp, config)?;
        self.opens.fetch_add(1, Ordering::Relaxed);
        Ok(handle)
    }

    fn close_object(&self, handle: &EngineHandle) -> Result<(), StorageError> {
        self.storage.close_object(handle)?;
        self.closes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn range_read<'a>(
        &'a self,
        handle: &EngineHandle,
        region: &[CellRange],
    ) -> Result<ReadChunks<'a>, StorageError> {
        let chunks = self.storage.range_read(handle, region)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        let bytes_read = self.bytes_read.clone();
        let read_passes = self.read_passes.clone();
        Ok(Box::new(chunks.inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                bytes_read.fetch_add(chunk.len(), Ordering::Relaxed);
                read_passes.fetch_add(1, Ordering::Relaxed);
            }
        })))
    }

    fn range_write(
        &self,
        handle: &EngineHandle,
        region: &[CellRange],
        bytes: Bytes,
    ) -> Result<(), StorageError> {
        let len = bytes.len();
        self.storage.range_write(handle, region, bytes)?;
        self.bytes_written.fetch_add(len, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get_metadata_at(
        &self,
        handle: &EngineHandle,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Option<MetadataValue>, StorageError> {
        self.storage.get_metadata_at(handle, key, timestamp)
    }

    fn set_metadata(
        &self,
        handle: &EngineHandle,
        key: &str,
        value: MetadataValue,
    ) -> Result<(), StorageError> {
        self.storage.set_metadata(handle, key, value)
    }

    fn metadata_keys(&self, handle: &EngineHandle) -> Result<Vec<String>, StorageError> {
        self.storage.metadata_keys(handle)
    }

    fn now(&self) -> Timestamp {
        self.storage.now()
    }

    fn supports_growable_domains(&self) -> bool {
        self.storage.supports_growable_domains()
    }
}
