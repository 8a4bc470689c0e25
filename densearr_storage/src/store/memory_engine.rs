//! A thread-safe in-memory storage engine.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::BytesMut;
use itertools::Itertools;
use parking_lot::RwLock;

use super::fragment::{Fragment, overlay, region_num_cells};
use crate::{
    Bytes, CellRange, DimensionDescriptor, EngineConfig, EngineHandle, MetadataValue,
    ObjectDescriptor, ObjectKind, ObjectLayout, OpenMode, PlatformConfig, ReadChunks,
    StorageError, Timestamp, VersionChain, wall_clock_timestamp,
};

/// Options for a [`MemoryEngine`].
#[derive(Clone, Debug)]
pub struct MemoryEngineOptions {
    /// The byte budget of a single read pass when [`EngineConfig::READ_BUFFER_BYTES`] is not set.
    pub read_buffer_bytes: u64,
    /// The tile extent of a dimension without a tile hint.
    pub default_tile: u64,
    /// Whether dimensions may be created without a size.
    pub growable_domains: bool,
}

impl Default for MemoryEngineOptions {
    fn default() -> Self {
        Self {
            read_buffer_bytes: 64 * 1024 * 1024,
            default_tile: 2048,
            growable_domains: false,
        }
    }
}

#[derive(Debug)]
struct MemoryObject {
    descriptor: ObjectDescriptor,
    fragments: VersionChain<Fragment>,
    metadata: BTreeMap<String, VersionChain<MetadataValue>>,
    writer: Option<u64>,
}

#[derive(Debug, Default)]
struct MemoryEngineState {
    objects: HashMap<String, MemoryObject>,
    handles: HashMap<u64, (String, OpenMode)>,
}

/// A thread-safe in-memory storage engine.
///
/// Writes are stored as immutable fragments, so reads at any past timestamp remain reproducible.
#[derive(Debug)]
pub struct MemoryEngine {
    options: MemoryEngineOptions,
    state: RwLock<MemoryEngineState>,
    next_handle: AtomicU64,
    last_now: AtomicU64,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Create a new memory engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_options(MemoryEngineOptions::default())
    }

    /// Create a new memory engine with non-default options.
    #[must_use]
    pub fn new_with_options(options: MemoryEngineOptions) -> Self {
        Self {
            options,
            state: RwLock::default(),
            next_handle: AtomicU64::new(1),
            last_now: AtomicU64::new(0),
        }
    }

    /// Return the number of open handles.
    #[must_use]
    pub fn open_handles(&self) -> usize {
        self.state.read().handles.len()
    }

    /// Return the number of fragments written to the object at `uri`.
    #[must_use]
    pub fn fragments(&self, uri: &str) -> usize {
        self.state
            .read()
            .objects
            .get(uri)
            .map_or(0, |object| object.fragments.len())
    }

    fn tile_extent(&self, name: &str, size: u64, platform_config: &PlatformConfig) -> u64 {
        let hint = platform_config
            .tile_hint(name)
            .map_or(self.options.default_tile, std::num::NonZeroU64::get);
        if hint > size {
            if platform_config.tile_hint(name).is_some() {
                log::warn!("tile extent {hint} of dimension {name} clamped to its size {size}");
            }
            size
        } else {
            hint
        }
    }
}

/// Check that `handle` is open, returning its object.
fn check_handle<'a>(
    state: &'a MemoryEngineState,
    handle: &EngineHandle,
) -> Result<&'a MemoryObject, StorageError> {
    let (uri, _mode) = state
        .handles
        .get(&handle.id())
        .ok_or(StorageError::HandleClosed(handle.id()))?;
    state
        .objects
        .get(uri)
        .ok_or_else(|| StorageError::NotFound(uri.clone()))
}

fn check_mode(handle: &EngineHandle, expected: OpenMode) -> Result<(), StorageError> {
    if handle.mode() == expected {
        Ok(())
    } else {
        Err(StorageError::InvalidMode {
            expected,
            actual: handle.mode(),
        })
    }
}

fn check_region(descriptor: &ObjectDescriptor, region: &[CellRange]) -> Result<(), StorageError> {
    if region.len() != descriptor.dimensions.len() {
        return Err(StorageError::IncompatibleDimensionality(
            region.len(),
            descriptor.dimensions.len(),
        ));
    }
    for (range, dimension) in region.iter().zip(&descriptor.dimensions) {
        let (lo, hi) = (*range.start(), *range.end());
        let max = dimension.max_coordinate();
        if lo < 0 || hi < 0 || lo > max || hi > max {
            return Err(StorageError::OutOfDomain {
                dimension: dimension.name.clone(),
                lo,
                hi,
                max,
            });
        }
        if lo > hi {
            return Err(StorageError::Other(format!(
                "empty range {lo}..={hi} for dimension {}",
                dimension.name
            )));
        }
    }
    Ok(())
}

impl crate::StorageEngine for MemoryEngine {
    fn create_object(
        &self,
        uri: &str,
        layout: ObjectLayout,
        platform_config: &PlatformConfig,
        timestamp: Timestamp,
    ) -> Result<ObjectDescriptor, StorageError> {
        let mut state = self.state.write();
        if let Some(existing) = state.objects.get(uri) {
            return Err(StorageError::AlreadyExists(
                uri.to_string(),
                existing.descriptor.kind,
            ));
        }
        if layout.cell_size == 0 && layout.kind != ObjectKind::Collection {
            return Err(StorageError::Other(format!(
                "cell size of {uri} must be non-zero"
            )));
        }
        let dimensions = layout
            .dimensions
            .into_iter()
            .map(|dimension| {
                if dimension.size == 0 {
                    return Err(StorageError::Other(format!(
                        "dimension {} of {uri} has size zero",
                        dimension.name
                    )));
                }
                let tile = self.tile_extent(&dimension.name, dimension.size, platform_config);
                Ok(DimensionDescriptor {
                    name: dimension.name,
                    size: dimension.size,
                    tile,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        if !dimensions.iter().map(|dimension| &dimension.name).all_unique() {
            return Err(StorageError::Other(format!(
                "dimension names of {uri} are not unique"
            )));
        }
        let descriptor = ObjectDescriptor {
            kind: layout.kind,
            dimensions,
            cell_size: layout.cell_size,
            document: layout.document,
            created_at: timestamp,
        };
        log::debug!(
            "created {} at {uri} with timestamp {timestamp}",
            descriptor.kind
        );
        state.objects.insert(
            uri.to_string(),
            MemoryObject {
                descriptor: descriptor.clone(),
                fragments: VersionChain::new(),
                metadata: BTreeMap::new(),
                writer: None,
            },
        );
        Ok(descriptor)
    }

    fn describe_object(&self, uri: &str) -> Result<Option<ObjectDescriptor>, StorageError> {
        Ok(self
            .state
            .read()
            .objects
            .get(uri)
            .map(|object| object.descriptor.clone()))
    }

    fn open_object(
        &self,
        uri: &str,
        mode: OpenMode,
        timestamp: Timestamp,
        config: &EngineConfig,
    ) -> Result<EngineHandle, StorageError> {
        let read_buffer_bytes = config
            .read_buffer_bytes()?
            .map_or(self.options.read_buffer_bytes, std::num::NonZeroU64::get);
        let mut state = self.state.write();
        let object = state
            .objects
            .get_mut(uri)
            .ok_or_else(|| StorageError::NotFound(uri.to_string()))?;
        let id = self.next_handle.fetch_add(1, Ordering::Relaxed);
        if mode == OpenMode::Write {
            if object.writer.is_some() {
                return Err(StorageError::WriterConflict(uri.to_string()));
            }
            object.writer = Some(id);
        }
        state.handles.insert(id, (uri.to_string(), mode));
        log::debug!("opened {uri} in {mode} mode at timestamp {timestamp} (handle {id})");
        Ok(EngineHandle::new(
            id,
            uri.to_string(),
            mode,
            timestamp,
            read_buffer_bytes,
        ))
    }

    fn close_object(&self, handle: &EngineHandle) -> Result<(), StorageError> {
        let mut state = self.state.write();
        let (uri, mode) = state
            .handles
            .remove(&handle.id())
            .ok_or(StorageError::HandleClosed(handle.id()))?;
        if mode == OpenMode::Write {
            if let Some(object) = state.objects.get_mut(&uri) {
                if object.writer == Some(handle.id()) {
                    object.writer = None;
                }
            }
        }
        log::debug!("closed {uri} (handle {})", handle.id());
        Ok(())
    }

    fn range_read<'a>(
        &'a self,
        handle: &EngineHandle,
        region: &[CellRange],
    ) -> Result<ReadChunks<'a>, StorageError> {
        check_mode(handle, OpenMode::Read)?;
        let state = self.state.read();
        let object = check_handle(&state, handle)?;
        check_region(&object.descriptor, region)?;

        let cell_size = object.descriptor.cell_size;
        let num_cells = region_num_cells(region)
            .ok_or_else(|| StorageError::Other("region is too large".to_string()))?;
        let cells_per_chunk = (handle.read_buffer_bytes() / cell_size as u64).max(1);
        // Snapshot the visible fragments so the read is unaffected by later writes.
        let fragments = object
            .fragments
            .iter_at(handle.timestamp())
            .map(|(_, fragment)| fragment.clone())
            .collect::<Vec<_>>();
        drop(state);

        log::debug!(
            "reading {region:?} of {} at timestamp {} in {} passes",
            handle.uri(),
            handle.timestamp(),
            num_cells.div_ceil(cells_per_chunk)
        );
        let region = region.to_vec();
        let chunks = (0..num_cells)
            .step_by(usize::try_from(cells_per_chunk).unwrap_or(usize::MAX))
            .map(move |start| {
                let end = (start + cells_per_chunk).min(num_cells);
                let len = usize::try_from(end - start)
                    .ok()
                    .and_then(|cells| cells.checked_mul(cell_size))
                    .ok_or_else(|| StorageError::Other("read pass is too large".to_string()))?;
                let mut out = BytesMut::zeroed(len);
                for fragment in &fragments {
                    overlay(fragment, &region, start..end, cell_size, &mut out);
                }
                Ok(out.freeze())
            });
        Ok(Box::new(chunks))
    }

    fn range_write(
        &self,
        handle: &EngineHandle,
        region: &[CellRange],
        bytes: Bytes,
    ) -> Result<(), StorageError> {
        check_mode(handle, OpenMode::Write)?;
        let mut state = self.state.write();
        check_handle(&state, handle)?;
        let object = state
            .objects
            .get_mut(handle.uri())
            .ok_or_else(|| StorageError::NotFound(handle.uri().to_string()))?;
        check_region(&object.descriptor, region)?;
        let expected = region_num_cells(region)
            .and_then(|cells| cells.checked_mul(object.descriptor.cell_size as u64))
            .ok_or_else(|| StorageError::Other("region is too large".to_string()))?;
        if bytes.len() as u64 != expected {
            return Err(StorageError::InvalidWriteSize(bytes.len(), expected));
        }
        log::debug!(
            "writing {region:?} of {} at timestamp {}",
            handle.uri(),
            handle.timestamp()
        );
        object
            .fragments
            .push(handle.timestamp(), Fragment::new(region.to_vec(), bytes));
        Ok(())
    }

    fn get_metadata_at(
        &self,
        handle: &EngineHandle,
        key: &str,
        timestamp: Timestamp,
    ) -> Result<Option<MetadataValue>, StorageError> {
        if timestamp > handle.timestamp() {
            return Err(StorageError::Other(format!(
                "timestamp {timestamp} is later than the handle timestamp {}",
                handle.timestamp()
            )));
        }
        let state = self.state.read();
        let object = check_handle(&state, handle)?;
        Ok(object
            .metadata
            .get(key)
            .and_then(|chain| chain.get_at(timestamp))
            .cloned())
    }

    fn set_metadata(
        &self,
        handle: &EngineHandle,
        key: &str,
        value: MetadataValue,
    ) -> Result<(), StorageError> {
        check_mode(handle, OpenMode::Write)?;
        let mut state = self.state.write();
        check_handle(&state, handle)?;
        let object = state
            .objects
            .get_mut(handle.uri())
            .ok_or_else(|| StorageError::NotFound(handle.uri().to_string()))?;
        object
            .metadata
            .entry(key.to_string())
            .or_default()
            .push(handle.timestamp(), value);
        Ok(())
    }

    fn metadata_keys(&self, handle: &EngineHandle) -> Result<Vec<String>, StorageError> {
        let state = self.state.read();
        let object = check_handle(&state, handle)?;
        Ok(object
            .metadata
            .iter()
            .filter(|(_, chain)| chain.get_at(handle.timestamp()).is_some())
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn now(&self) -> Timestamp {
        // Never go backwards, even if the wall clock does.
        let now = wall_clock_timestamp();
        let last = self.last_now.fetch_max(now, Ordering::Relaxed);
        now.max(last)
    }

    fn supports_growable_domains(&self) -> bool {
        self.options.growable_domains
    }
}
