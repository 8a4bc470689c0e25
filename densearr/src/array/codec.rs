//! Conversion between storage engine buffers and tensors.
//!
//! The storage engine exchanges the cells of a region as a flat row-major byte stream, possibly split over several read passes.
//! [`decode`] stitches the passes into one tensor in the requested [`MemoryOrder`], [`encode`] validates a tensor against a region for writing.

use bytes::BytesMut;

use super::{ArrayError, ArrayValues, DataType, MemoryOrder, Tensor};
use crate::array_subset::ArraySubset;
use crate::storage::{Bytes, ReadChunks, StorageError};

/// Encode `values` for a write of `subset` of an array with `data_type`.
///
/// # Errors
/// Returns [`ArrayError::Type`] if `values` is untyped or its data type differs from `data_type`,
/// or [`ArrayError::Value`] if the tensor shape does not match the shape of `subset`.
pub fn encode(
    values: ArrayValues,
    data_type: &DataType,
    subset: &ArraySubset,
) -> Result<Bytes, ArrayError> {
    let tensor = match values {
        ArrayValues::Tensor(tensor) => tensor,
        ArrayValues::Untyped(_) => {
            return Err(ArrayError::Type(
                "untyped bytes cannot be written, pass a typed tensor".to_string(),
            ));
        }
    };
    if tensor.data_type() != data_type {
        return Err(ArrayError::Type(format!(
            "tensor data type {} does not match array data type {data_type}",
            tensor.data_type()
        )));
    }
    let subset_shape = subset.shape();
    if tensor.shape() != subset_shape.as_slice() {
        return Err(ArrayError::Value(format!(
            "tensor shape {:?} does not match the selected region {subset} with shape {subset_shape:?}",
            tensor.shape()
        )));
    }
    Ok(tensor.into_parts().0)
}

/// Decode the read passes `chunks` of `subset` of an array with `data_type` into a tensor.
///
/// With [`MemoryOrder::ColumnMajor`] the result is the transpose of the row-major result:
/// its shape is reversed and element `[j, i]` holds cell `[i, j]`.
///
/// # Errors
/// Returns [`ArrayError::Engine`] if a read pass fails or the passes do not hold exactly the cells of `subset`.
pub fn decode(
    chunks: ReadChunks<'_>,
    data_type: &DataType,
    subset: &ArraySubset,
    order: MemoryOrder,
) -> Result<Tensor, ArrayError> {
    let shape = subset.shape();
    let expected = subset
        .num_elements()
        .and_then(|n| usize::try_from(n).ok())
        .and_then(|n| n.checked_mul(data_type.size()))
        .ok_or_else(|| ArrayError::Value(format!("region {subset} is too large to read")))?;

    let mut bytes = BytesMut::with_capacity(expected);
    let mut passes = 0usize;
    for chunk in chunks {
        bytes.extend_from_slice(&chunk?);
        passes += 1;
    }
    log::debug!("decoded region {subset} from {passes} read passes");
    if bytes.len() != expected {
        return Err(ArrayError::Engine(StorageError::Other(format!(
            "got {} bytes for region {subset}, expected {expected}",
            bytes.len()
        ))));
    }

    match order {
        MemoryOrder::ColumnMajor if shape.len() > 1 => {
            let transposed = transpose(&shape, data_type.size(), &bytes)?;
            let shape = shape.into_iter().rev().collect();
            Ok(Tensor::new(transposed, *data_type, shape)?)
        }
        _ => Ok(Tensor::new(bytes.freeze(), *data_type, shape)?),
    }
}

/// Reverse the axes of the row-major `data` of `shape`.
fn transpose(shape: &[u64], bytes_per_element: usize, data: &[u8]) -> Result<Vec<u8>, ArrayError> {
    let shape_error = || ArrayError::Value(format!("cannot transpose shape {shape:?}"));

    let mut shape_n = Vec::with_capacity(shape.len() + 1);
    for size in shape {
        shape_n.push(usize::try_from(*size).map_err(|_| shape_error())?);
    }
    shape_n.push(bytes_per_element);
    let array = ndarray::ArrayViewD::<u8>::from_shape(shape_n, data).map_err(|_| shape_error())?;

    // Reverse the element axes, keeping the element bytes last.
    let mut order = (0..shape.len()).rev().collect::<Vec<_>>();
    order.push(shape.len());
    let array_transposed = array.permuted_axes(order);
    Ok(array_transposed
        .as_standard_layout()
        .into_owned()
        .into_raw_vec_and_offset()
        .0)
}
