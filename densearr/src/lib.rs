//! `densearr` is a Rust library for dense N-dimensional arrays with timestamp-versioned reads and writes.
//!
//! An array has a fixed shape and a single primitive element type.
//! Its schema is derived once at creation: one 64-bit signed coordinate field per dimension plus one data field.
//!
//! Every open array is bound to a logical timestamp.
//! Writes commit as of that timestamp, and reads observe exactly the writes committed at or before it.
//!
//! Regions are selected per dimension with [`Selector`](array_subset::Selector)s.
//! **Ranges are inclusive on both ends**: selecting `2..=4` of `0..10` yields `[2, 3, 4]`.
//!
//! Physical storage is delegated to a [`StorageEngine`](storage::StorageEngine).
//! The [`densearr_storage`] crate (re-exported as [`storage`]) includes an in-memory engine.
//!
//! ## Example
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//! use densearr::array::{DataType, DenseArray, DenseArrayBuilder, MemoryOrder, Tensor};
//! use densearr::array_subset::Selector;
//! use densearr::context::Context;
//! use densearr::storage::{OpenMode, store::MemoryEngine};
//!
//! let engine = Arc::new(MemoryEngine::new());
//!
//! // Create at timestamp 1 and write the full array
//! let mut array = DenseArrayBuilder::new(vec![4, 6], DataType::Int64)
//!     .context(Context::new().with_timestamp(1))
//!     .create(engine.clone(), "mem://array")?;
//! let values: Vec<i64> = (0..4).flat_map(|i| (0..6).map(move |j| 100 * i + j)).collect();
//! array.write(&[], Tensor::from_elements(values, vec![4, 6])?)?;
//! array.close()?;
//!
//! // Read a region: rows 0..=1, columns 5..=5
//! let array = DenseArray::open(engine.clone(), "mem://array", OpenMode::Read, &Context::new())?;
//! let tensor = array.read(&[Selector::range(..=1), Selector::range(5..)], MemoryOrder::RowMajor)?;
//! assert_eq!(tensor.shape(), &[2, 1]);
//! assert_eq!(tensor.to_vec::<i64>()?, vec![5, 105]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Licence
//! `densearr` is licensed under either of
//! - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//! - the MIT license <http://opensource.org/licenses/MIT>, at your option.

pub mod array;
pub mod array_subset;
pub mod context;

pub use densearr_storage as storage;
