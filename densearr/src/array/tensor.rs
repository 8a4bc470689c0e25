use derive_more::{Display, From};
use thiserror::Error;

use super::{DataType, Element, ElementError, ElementOwned};
use crate::storage::Bytes;

/// Errors related to [`Tensor`] operations.
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum TensorError {
    /// The number of bytes does not match the shape and data type.
    #[error("got {actual} bytes, expected {expected} bytes for the shape and data type")]
    InvalidLength {
        /// The expected number of bytes.
        expected: usize,
        /// The actual number of bytes.
        actual: usize,
    },
    /// The shape cannot be represented.
    #[error("invalid tensor shape {0:?}")]
    InvalidShape(Vec<u64>),
    /// The data type has no size.
    #[error("data type {0} has a size of zero bytes")]
    ZeroSizedDataType(DataType),
    /// An element error.
    #[error(transparent)]
    Element(#[from] ElementError),
}

/// The memory order of a decoded tensor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display)]
pub enum MemoryOrder {
    /// C order: the last dimension varies fastest.
    #[default]
    #[display("row-major")]
    RowMajor,
    /// Fortran order: the first dimension varies fastest.
    #[display("column-major")]
    ColumnMajor,
}

/// A tensor holding raw bytes with data type and shape metadata.
///
/// This represents a multidimensional array of fixed-size elements in C-contiguous (row-major) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tensor {
    bytes: Bytes,
    data_type: DataType,
    shape: Vec<u64>,
}

fn expected_len(data_type: &DataType, shape: &[u64]) -> Result<usize, TensorError> {
    if data_type.size() == 0 {
        return Err(TensorError::ZeroSizedDataType(*data_type));
    }
    shape
        .iter()
        .try_fold(data_type.size(), |len, &size| {
            usize::try_from(size).ok().and_then(|size| len.checked_mul(size))
        })
        .ok_or_else(|| TensorError::InvalidShape(shape.to_vec()))
}

impl Tensor {
    /// Create a new [`Tensor`].
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidLength`] if the length of `bytes` does not match `shape` and `data_type`,
    /// or [`TensorError::ZeroSizedDataType`] if `data_type` has no size.
    pub fn new(
        bytes: impl Into<Bytes>,
        data_type: DataType,
        shape: Vec<u64>,
    ) -> Result<Self, TensorError> {
        let bytes = bytes.into();
        let expected = expected_len(&data_type, &shape)?;
        if bytes.len() == expected {
            Ok(Self {
                bytes,
                data_type,
                shape,
            })
        } else {
            Err(TensorError::InvalidLength {
                expected,
                actual: bytes.len(),
            })
        }
    }

    /// Create a new [`Tensor`] from a vector of elements in row-major order.
    ///
    /// # Errors
    /// Returns [`TensorError::InvalidLength`] if the number of elements does not match `shape`.
    pub fn from_elements<T: Element>(elements: Vec<T>, shape: Vec<u64>) -> Result<Self, TensorError> {
        Self::new(T::into_bytes_vec(elements), T::data_type(), shape)
    }

    /// Create a new [`Tensor`] from an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns a [`TensorError`] if the array shape cannot be represented.
    pub fn from_ndarray<T: Element>(array: ndarray::ArrayD<T>) -> Result<Self, TensorError> {
        let shape = array.shape().iter().map(|&size| size as u64).collect();
        let len = array.len();
        let elements = if array.is_standard_layout() {
            // A sliced array keeps its parent allocation, the elements start at the offset.
            let (mut elements, offset) = array.into_raw_vec_and_offset();
            let offset = offset.unwrap_or_default();
            elements.truncate(offset + len);
            elements.drain(..offset);
            elements
        } else {
            array.iter().cloned().collect()
        };
        Self::from_elements(elements, shape)
    }

    /// Get the raw bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get the data type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Get the number of elements.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Convert the tensor elements to a [`Vec`] in row-major order.
    ///
    /// # Errors
    /// Returns an [`ElementError`] if `T` is incompatible with the data type of the tensor.
    pub fn to_vec<T: ElementOwned>(&self) -> Result<Vec<T>, ElementError> {
        T::from_bytes(&self.data_type, &self.bytes)
    }

    /// Convert the tensor to an [`ndarray::ArrayD`].
    ///
    /// # Errors
    /// Returns a [`TensorError`] if `T` is incompatible with the data type of the tensor.
    pub fn to_ndarray<T: ElementOwned>(&self) -> Result<ndarray::ArrayD<T>, TensorError> {
        let shape = self
            .shape
            .iter()
            .map(|&size| usize::try_from(size))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| TensorError::InvalidShape(self.shape.clone()))?;
        let elements = self.to_vec::<T>()?;
        ndarray::ArrayD::from_shape_vec(shape, elements)
            .map_err(|_| TensorError::InvalidShape(self.shape.clone()))
    }

    /// Consume self and return the parts.
    #[must_use]
    pub fn into_parts(self) -> (Bytes, DataType, Vec<u64>) {
        (self.bytes, self.data_type, self.shape)
    }
}

/// Values passed to a write.
///
/// Only typed tensors can be written, untyped bytes are always rejected.
#[derive(Clone, Debug, From)]
pub enum ArrayValues {
    /// A typed tensor.
    Tensor(Tensor),
    /// Untyped bytes.
    Untyped(Bytes),
}

impl From<Vec<u8>> for ArrayValues {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Untyped(bytes.into())
    }
}

impl From<&[u8]> for ArrayValues {
    fn from(bytes: &[u8]) -> Self {
        Self::Untyped(Bytes::copy_from_slice(bytes))
    }
}
