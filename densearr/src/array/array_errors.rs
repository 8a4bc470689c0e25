use thiserror::Error;

use super::{ElementError, TensorError};
use crate::array_subset::SelectorError;
use crate::storage::{ObjectKind, StorageError};

/// Array errors.
///
/// Validation errors are raised before any storage engine call.
/// Failures only the storage engine can detect are surfaced verbatim as [`ArrayError::Engine`].
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ArrayError {
    /// Malformed configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A value or element type where a typed tensor or a primitive type was required.
    #[error("type error: {0}")]
    Type(String),
    /// A selector out of domain, a malformed range, a shape mismatch, or an invalid shape.
    #[error("value error: {0}")]
    Value(String),
    /// No object exists at the URI.
    #[error("no object exists at {0}")]
    NotFound(String),
    /// The object at the URI is not a dense array.
    #[error("{uri} is a {actual}, not a {expected}")]
    KindMismatch {
        /// The URI.
        uri: String,
        /// The expected kind.
        expected: ObjectKind,
        /// The kind found.
        actual: ObjectKind,
    },
    /// An unsupported operation.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
    /// An operation on a closed array.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),
    /// A storage engine error.
    #[error(transparent)]
    Engine(StorageError),
    /// A missing metadata key.
    #[error("metadata key {0:?} not found")]
    KeyNotFound(String),
}

impl From<StorageError> for ArrayError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(uri) => Self::NotFound(uri),
            StorageError::InvalidConfig(msg) => Self::Configuration(msg),
            err => Self::Engine(err),
        }
    }
}

impl From<SelectorError> for ArrayError {
    fn from(err: SelectorError) -> Self {
        Self::Value(err.to_string())
    }
}

impl From<ElementError> for ArrayError {
    fn from(err: ElementError) -> Self {
        Self::Type(err.to_string())
    }
}

impl From<TensorError> for ArrayError {
    fn from(err: TensorError) -> Self {
        match err {
            TensorError::InvalidLength { .. } | TensorError::InvalidShape(_) => {
                Self::Value(err.to_string())
            }
            TensorError::ZeroSizedDataType(_) => Self::Type(err.to_string()),
            TensorError::Element(err) => err.into(),
        }
    }
}
