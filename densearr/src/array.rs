//! Dense arrays.
//!
//! A [`DenseArray`] is a handle to a dense array object of a [`StorageEngine`], bound to one logical timestamp.
//!
//! Create arrays with a [`DenseArrayBuilder`] (or [`DenseArray::create`] with a derived [`ArraySchema`]) and open existing arrays with [`DenseArray::open`].
//! A handle opened in [`OpenMode::Read`] reads the cells as of its timestamp.
//! A handle opened in [`OpenMode::Write`] commits writes and metadata at its timestamp.
//!
//! A single handle must not be used by multiple callers at once. Independent handles to the same array may be used concurrently.

mod array_builder;
mod array_errors;
pub mod codec;
pub mod data_type;
mod element;
mod metadata;
mod shape_schema;
mod tensor;

use std::sync::Arc;

pub use self::{
    array_builder::{ArrayBuilderDataType, DenseArrayBuilder},
    array_errors::ArrayError,
    data_type::{DataType, DataTypeError},
    element::{
        Element, ElementError, ElementOwned, convert_from_bytes_slice, transmute_to_bytes_vec,
    },
    metadata::MetadataStore,
    shape_schema::{
        ArraySchema, ArrayShapeRequest, DATA_FIELD_NAME, SchemaField, dimension_field_name,
    },
    tensor::{ArrayValues, MemoryOrder, Tensor, TensorError},
};

use crate::array_subset::{Selector, resolve};
use crate::context::Context;
use crate::storage::{
    DimensionLayout, EngineHandle, ObjectKind, ObjectLayout, OpenMode, PlatformConfig,
    StorageEngine, StorageError, Timestamp,
};

/// A dense array.
///
/// The handle is open from creation until [`close`](DenseArray::close) is called.
/// Every data and metadata operation on a closed handle fails with [`ArrayError::Lifecycle`].
/// A handle dropped while open is closed implicitly.
#[derive(Debug)]
pub struct DenseArray<TEngine: ?Sized + StorageEngine> {
    engine: Arc<TEngine>,
    uri: String,
    schema: ArraySchema,
    handle: EngineHandle,
    is_open: bool,
}

impl<TEngine: ?Sized + StorageEngine> DenseArray<TEngine> {
    /// Create a dense array with `schema` at `uri` and open it for writing.
    ///
    /// The array is created at the context timestamp, or the current engine timestamp if unset.
    /// `platform_config` is forwarded verbatim to the storage engine.
    ///
    /// # Errors
    /// Returns [`ArrayError::Value`] if an object of another kind exists at `uri`,
    /// [`ArrayError::Engine`] if a dense array already exists at `uri` or the engine rejects the creation,
    /// or [`ArrayError::Configuration`] if the context engine configuration is invalid.
    pub fn create(
        engine: Arc<TEngine>,
        uri: &str,
        schema: ArraySchema,
        context: &Context,
        platform_config: &PlatformConfig,
    ) -> Result<Self, ArrayError> {
        if let Some(existing) = engine.describe_object(uri)? {
            if existing.kind != ObjectKind::DenseArray {
                return Err(ArrayError::Value(format!(
                    "a {} already exists at {uri}",
                    existing.kind
                )));
            }
        }
        // Reject an invalid engine configuration before anything is allocated.
        context.engine_config().read_buffer_bytes()?;
        let timestamp = context.timestamp().unwrap_or_else(|| engine.now());
        let document = serde_json::to_value(&schema)
            .map_err(|err| StorageError::InvalidMetadata(uri.to_string(), err.to_string()))?;
        let layout = ObjectLayout {
            kind: ObjectKind::DenseArray,
            dimensions: schema
                .fields()
                .iter()
                .filter_map(|field| {
                    field.dimension_size().map(|size| DimensionLayout {
                        name: field.name().to_string(),
                        size,
                    })
                })
                .collect(),
            cell_size: schema.data_type().size(),
            document,
        };
        engine.create_object(uri, layout, platform_config, timestamp)?;
        log::debug!("created dense array {uri} at timestamp {timestamp}");

        let handle =
            engine.open_object(uri, OpenMode::Write, timestamp, context.engine_config())?;
        Ok(Self {
            engine,
            uri: uri.to_string(),
            schema,
            handle,
            is_open: true,
        })
    }

    /// Open the dense array at `uri` in `mode`.
    ///
    /// The array is bound to the context timestamp, or the current engine timestamp if unset.
    ///
    /// # Errors
    /// Returns [`ArrayError::NotFound`] if no object exists at `uri`, [`ArrayError::KindMismatch`] if the object is not a dense array,
    /// [`ArrayError::Configuration`] if the engine configuration is invalid, or [`ArrayError::Engine`] if the engine rejects the open.
    pub fn open(
        engine: Arc<TEngine>,
        uri: &str,
        mode: OpenMode,
        context: &Context,
    ) -> Result<Self, ArrayError> {
        Self::open_impl(engine, uri, mode, None, context)
    }

    /// Open the dense array at `uri` in `mode` bound to an explicit `timestamp`.
    ///
    /// `timestamp` overrides the context timestamp, but must not be lower than it.
    ///
    /// # Errors
    /// Returns [`ArrayError::Configuration`] if `timestamp` is lower than the context timestamp, otherwise see [`open`](DenseArray::open).
    pub fn open_with_timestamp(
        engine: Arc<TEngine>,
        uri: &str,
        mode: OpenMode,
        timestamp: Timestamp,
        context: &Context,
    ) -> Result<Self, ArrayError> {
        Self::open_impl(engine, uri, mode, Some(timestamp), context)
    }

    fn open_impl(
        engine: Arc<TEngine>,
        uri: &str,
        mode: OpenMode,
        timestamp: Option<Timestamp>,
        context: &Context,
    ) -> Result<Self, ArrayError> {
        let timestamp = match (timestamp, context.timestamp()) {
            (Some(timestamp), Some(pinned)) if timestamp < pinned => {
                return Err(ArrayError::Configuration(format!(
                    "open timestamp {timestamp} is lower than the context timestamp {pinned}"
                )));
            }
            (Some(timestamp), _) | (None, Some(timestamp)) => timestamp,
            (None, None) => engine.now(),
        };

        let descriptor = engine
            .describe_object(uri)?
            .ok_or_else(|| ArrayError::NotFound(uri.to_string()))?;
        if descriptor.kind != ObjectKind::DenseArray {
            return Err(ArrayError::KindMismatch {
                uri: uri.to_string(),
                expected: ObjectKind::DenseArray,
                actual: descriptor.kind,
            });
        }
        let schema: ArraySchema = serde_json::from_value(descriptor.document)
            .map_err(|err| StorageError::InvalidMetadata(uri.to_string(), err.to_string()))?;
        schema
            .validate()
            .map_err(|err| StorageError::InvalidMetadata(uri.to_string(), err))?;

        let handle = engine.open_object(uri, mode, timestamp, context.engine_config())?;
        Ok(Self {
            engine,
            uri: uri.to_string(),
            schema,
            handle,
            is_open: true,
        })
    }

    /// Returns true if a dense array exists at `uri`.
    ///
    /// Objects of other kinds are reported as absent.
    ///
    /// # Errors
    /// Returns [`ArrayError::Engine`] if there is an underlying storage error.
    pub fn exists(engine: &TEngine, uri: &str) -> Result<bool, ArrayError> {
        Ok(engine
            .describe_object(uri)?
            .is_some_and(|descriptor| descriptor.kind == ObjectKind::DenseArray))
    }

    /// Read the cells selected by `selectors` as of the array timestamp.
    ///
    /// An empty selector sequence reads the whole array, and dimensions without a selector are fully selected.
    /// With [`MemoryOrder::ColumnMajor`] the result is the transpose of the row-major result.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is closed or not open for reading, [`ArrayError::Value`] if the selectors are invalid,
    /// or [`ArrayError::Engine`] if the storage engine rejects the region (e.g. an out of domain point).
    pub fn read(&self, selectors: &[Selector], order: MemoryOrder) -> Result<Tensor, ArrayError> {
        self.check_mode(OpenMode::Read)?;
        let subset = resolve(&self.shape(), selectors)?;
        log::debug!(
            "reading {subset} of {} at timestamp {}",
            self.uri,
            self.handle.timestamp()
        );
        let chunks = self.engine.range_read(&self.handle, &subset.to_ranges())?;
        codec::decode(chunks, &self.data_type(), &subset, order)
    }

    /// Write `values` to the cells selected by `selectors`, committed at the array timestamp.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is closed or not open for writing, [`ArrayError::Value`] if the selectors are invalid
    /// or the tensor shape does not match the selected region, [`ArrayError::Type`] if `values` is not a tensor of the array data type,
    /// or [`ArrayError::Engine`] if the storage engine rejects the write.
    pub fn write(
        &self,
        selectors: &[Selector],
        values: impl Into<ArrayValues>,
    ) -> Result<(), ArrayError> {
        self.check_mode(OpenMode::Write)?;
        let subset = resolve(&self.shape(), selectors)?;
        let bytes = codec::encode(values.into(), &self.data_type(), &subset)?;
        log::debug!(
            "writing {subset} of {} at timestamp {}",
            self.uri,
            self.handle.timestamp()
        );
        self.engine
            .range_write(&self.handle, &subset.to_ranges(), bytes)?;
        Ok(())
    }

    /// Reshape the array.
    ///
    /// # Errors
    /// Always returns [`ArrayError::NotImplemented`]: array shapes are fixed at creation.
    pub fn reshape(&self, _shape: impl Into<ArrayShapeRequest>) -> Result<(), ArrayError> {
        Err(ArrayError::NotImplemented("reshape"))
    }

    /// Close the array.
    ///
    /// # Errors
    /// Returns [`ArrayError::Lifecycle`] if the array is already closed, or [`ArrayError::Engine`] if the storage engine fails to release the handle.
    pub fn close(&mut self) -> Result<(), ArrayError> {
        self.check_open()?;
        self.is_open = false;
        self.engine.close_object(&self.handle)?;
        log::debug!("closed {} (handle {})", self.uri, self.handle.id());
        Ok(())
    }

    /// Return the metadata store of the array.
    #[must_use]
    pub fn metadata(&self) -> MetadataStore<'_, TEngine> {
        MetadataStore::new(self)
    }

    /// Return the URI.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Return the schema.
    #[must_use]
    pub fn schema(&self) -> &ArraySchema {
        &self.schema
    }

    /// Return the dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.schema.dimensionality()
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        self.schema.shape()
    }

    /// Return the element data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.schema.data_type()
    }

    /// Returns false: a dense array is never sparse.
    #[must_use]
    pub const fn is_sparse(&self) -> bool {
        false
    }

    /// Return the open mode.
    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.handle.mode()
    }

    /// Return the bound timestamp.
    #[must_use]
    pub fn timestamp(&self) -> Timestamp {
        self.handle.timestamp()
    }

    /// Returns true if the array has not been closed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    fn check_open(&self) -> Result<(), ArrayError> {
        if self.is_open {
            Ok(())
        } else {
            Err(ArrayError::Lifecycle(format!("{} is closed", self.uri)))
        }
    }

    fn check_mode(&self, mode: OpenMode) -> Result<(), ArrayError> {
        self.check_open()?;
        if self.handle.mode() == mode {
            Ok(())
        } else {
            Err(ArrayError::Lifecycle(format!(
                "{} is open in {} mode, the operation requires {mode} mode",
                self.uri,
                self.handle.mode()
            )))
        }
    }

    pub(crate) fn engine(&self) -> &TEngine {
        &self.engine
    }

    pub(crate) fn handle(&self) -> &EngineHandle {
        &self.handle
    }
}

impl<TEngine: ?Sized + StorageEngine> Drop for DenseArray<TEngine> {
    fn drop(&mut self) {
        if self.is_open {
            self.is_open = false;
            if let Err(err) = self.engine.close_object(&self.handle) {
                log::warn!("failed to close {} on drop: {err}", self.uri);
            }
        }
    }
}
