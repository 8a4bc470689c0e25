use std::sync::Arc;

use super::{ArrayError, ArraySchema, ArrayShapeRequest, DataType, DenseArray};
use crate::context::Context;
use crate::storage::{PlatformConfig, StorageEngine};

/// An input that can be mapped to a data type.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ArrayBuilderDataType(ArrayBuilderDataTypeImpl);

#[derive(Debug, PartialEq, Eq, Clone)]
enum ArrayBuilderDataTypeImpl {
    DataType(DataType),
    Name(String),
}

impl ArrayBuilderDataType {
    /// Return the data type.
    ///
    /// # Errors
    /// Returns [`ArrayError::Type`] if the data type name is unknown or names a non-primitive type.
    pub fn to_data_type(&self) -> Result<DataType, ArrayError> {
        match &self.0 {
            ArrayBuilderDataTypeImpl::DataType(data_type) => Ok(*data_type),
            ArrayBuilderDataTypeImpl::Name(name) => name
                .parse()
                .map_err(|err: super::DataTypeError| ArrayError::Type(err.to_string())),
        }
    }
}

impl From<DataType> for ArrayBuilderDataType {
    fn from(value: DataType) -> Self {
        Self(ArrayBuilderDataTypeImpl::DataType(value))
    }
}

impl From<String> for ArrayBuilderDataType {
    fn from(value: String) -> Self {
        Self(ArrayBuilderDataTypeImpl::Name(value))
    }
}

impl From<&str> for ArrayBuilderDataType {
    fn from(value: &str) -> Self {
        Self(ArrayBuilderDataTypeImpl::Name(value.to_string()))
    }
}

/// A [`DenseArray`] builder.
///
/// [`DenseArrayBuilder`] is initialised from an array shape and data type.
/// The context and platform configuration are empty by default.
///
/// [`create`](DenseArrayBuilder::create) derives the [`ArraySchema`], creates the array in the storage engine, and returns it open for writing.
///
/// ### Example
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # use std::sync::Arc;
/// use densearr::array::DenseArrayBuilder;
/// use densearr::context::Context;
/// use densearr::storage::PlatformConfig;
/// # let engine = Arc::new(densearr::storage::store::MemoryEngine::new());
/// let array = DenseArrayBuilder::new(vec![100, 100], "float32")
///     .context(Context::new().with_timestamp(10))
///     .platform_config(serde_json::from_str::<PlatformConfig>(
///         r#"{"create": {"dims": {"dim_0": {"tile": 16}}}}"#,
///     )?)
///     .create(engine.clone(), "mem://matrix")?;
/// assert_eq!(array.shape(), vec![100, 100]);
/// assert_eq!(array.timestamp(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DenseArrayBuilder {
    /// Array shape.
    pub shape: ArrayShapeRequest,
    /// Data type.
    pub data_type: ArrayBuilderDataType,
    /// Context.
    pub context: Context,
    /// Creation hints forwarded to the storage engine.
    pub platform_config: PlatformConfig,
}

impl DenseArrayBuilder {
    /// Create a new dense array builder.
    #[must_use]
    pub fn new(
        shape: impl Into<ArrayShapeRequest>,
        data_type: impl Into<ArrayBuilderDataType>,
    ) -> Self {
        Self {
            shape: shape.into(),
            data_type: data_type.into(),
            context: Context::default(),
            platform_config: PlatformConfig::default(),
        }
    }

    /// Set the context.
    pub fn context(&mut self, context: Context) -> &mut Self {
        self.context = context;
        self
    }

    /// Set the platform configuration.
    pub fn platform_config(&mut self, platform_config: PlatformConfig) -> &mut Self {
        self.platform_config = platform_config;
        self
    }

    /// Derive the schema.
    ///
    /// # Errors
    /// Returns [`ArrayError::Type`] if the data type is not primitive, or [`ArrayError::Value`] if the shape is invalid.
    pub fn build_schema(&self, growable_domains: bool) -> Result<ArraySchema, ArrayError> {
        let data_type = self.data_type.to_data_type()?;
        ArraySchema::derive(&self.shape, data_type, growable_domains)
    }

    /// Create the array at `uri` and open it for writing.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the schema is invalid or the array cannot be created, see [`DenseArray::create`].
    pub fn create<TEngine: ?Sized + StorageEngine>(
        &self,
        engine: Arc<TEngine>,
        uri: &str,
    ) -> Result<DenseArray<TEngine>, ArrayError> {
        let schema = self.build_schema(engine.supports_growable_domains())?;
        DenseArray::create(engine, uri, schema, &self.context, &self.platform_config)
    }
}
