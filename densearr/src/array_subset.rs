//! Array subsets.
//!
//! An [`ArraySubset`] is a rectilinear region of an array: one inclusive coordinate range per dimension.
//! Array subsets are usually produced by [`resolve`]-ing a sequence of [`Selector`]s against an array shape.

mod selector;

use std::fmt::{Debug, Display};
use std::ops::RangeInclusive;

use itertools::izip;

use crate::storage::CellRange;

pub use selector::{Selector, SelectorError, SliceRange, resolve};

/// An array subset.
///
/// Coordinates are signed: a point selector is forwarded to the storage engine without validation,
/// so a subset may hold coordinates that the engine rejects.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct ArraySubset {
    /// The start of the array subset.
    start: Vec<i64>,
    /// The end (inclusive) of the array subset.
    end_inc: Vec<i64>,
}

impl Display for ArraySubset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_ranges().fmt(f)
    }
}

/// An incompatible start/end indices error.
#[derive(Clone, Debug, thiserror::Error)]
#[error("incompatible start {0:?} and end {1:?}")]
pub struct IncompatibleStartEndIndicesError(Vec<i64>, Vec<i64>);

impl ArraySubset {
    /// Create a new array subset covering all of `shape`.
    #[must_use]
    pub fn new_with_shape(shape: &[u64]) -> Self {
        let start = vec![0; shape.len()];
        let end_inc = shape
            .iter()
            .map(|&size| i64::try_from(size).map_or(i64::MAX, |size| size - 1))
            .collect();
        Self { start, end_inc }
    }

    /// Create a new array subset from a start and end (inclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleStartEndIndicesError`] if `start` and `end_inc` differ in length or any element of `end_inc` is less than `start`.
    pub fn new_with_start_end_inc(
        start: Vec<i64>,
        end_inc: Vec<i64>,
    ) -> Result<Self, IncompatibleStartEndIndicesError> {
        if start.len() != end_inc.len()
            || std::iter::zip(&start, &end_inc).any(|(start, end)| end < start)
        {
            Err(IncompatibleStartEndIndicesError(start, end_inc))
        } else {
            Ok(Self { start, end_inc })
        }
    }

    /// Create a new array subset from inclusive ranges.
    ///
    /// # Errors
    /// Returns [`IncompatibleStartEndIndicesError`] if the end of any range is less than its start.
    pub fn new_with_ranges(
        ranges: &[RangeInclusive<i64>],
    ) -> Result<Self, IncompatibleStartEndIndicesError> {
        let (start, end_inc) = ranges
            .iter()
            .map(|range| (*range.start(), *range.end()))
            .unzip();
        Self::new_with_start_end_inc(start, end_inc)
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[i64] {
        &self.start
    }

    /// Return the end (inclusive) of the array subset.
    #[must_use]
    pub fn end_inc(&self) -> &[i64] {
        &self.end_inc
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the shape of the array subset: `end_inc - start + 1` per dimension.
    #[must_use]
    pub fn shape(&self) -> Vec<u64> {
        izip!(&self.start, &self.end_inc)
            .map(|(start, end)| end.abs_diff(*start) + 1)
            .collect()
    }

    /// Return the number of elements of the array subset, or [`None`] on overflow.
    #[must_use]
    pub fn num_elements(&self) -> Option<u64> {
        self.shape().into_iter().try_fold(1u64, u64::checked_mul)
    }

    /// Return the array subset as inclusive ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<CellRange> {
        izip!(&self.start, &self.end_inc)
            .map(|(&start, &end)| start..=end)
            .collect()
    }
}
