use std::ops::{RangeFrom, RangeFull, RangeInclusive, RangeToInclusive};

use thiserror::Error;

use super::ArraySubset;

/// A range with optional inclusive bounds and an optional step.
///
/// Both bounds are **inclusive**: `SliceRange::new(Some(2), Some(4))` selects `2, 3, 4`.
/// An unset bound extends to the edge of the dimension.
/// The only supported step is 1, other steps are rejected at resolution.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct SliceRange {
    /// The first selected coordinate.
    pub start: Option<i64>,
    /// The last selected coordinate (inclusive).
    pub stop: Option<i64>,
    /// The step.
    pub step: Option<i64>,
}

impl SliceRange {
    /// Create a new slice range with inclusive bounds and no step.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>) -> Self {
        Self {
            start,
            stop,
            step: None,
        }
    }

    /// Set the step.
    #[must_use]
    pub const fn with_step(mut self, step: i64) -> Self {
        self.step = Some(step);
        self
    }
}

impl From<RangeInclusive<i64>> for SliceRange {
    fn from(range: RangeInclusive<i64>) -> Self {
        Self::new(Some(*range.start()), Some(*range.end()))
    }
}

impl From<RangeFrom<i64>> for SliceRange {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None)
    }
}

impl From<RangeToInclusive<i64>> for SliceRange {
    fn from(range: RangeToInclusive<i64>) -> Self {
        Self::new(None, Some(range.end))
    }
}

impl From<RangeFull> for SliceRange {
    fn from(_: RangeFull) -> Self {
        Self::default()
    }
}

/// A per-dimension selector.
///
/// Half-open ranges (`a..b`, `..b`) deliberately have no conversion: every range selector is inclusive on both ends.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum Selector {
    /// The whole dimension.
    #[default]
    Full,
    /// A single coordinate.
    ///
    /// Points are not validated against the domain, out of domain points are rejected by the storage engine.
    Point(i64),
    /// An inclusive range.
    Range(SliceRange),
    /// A list of discrete coordinates. Always rejected at resolution.
    Points(Vec<i64>),
}

impl Selector {
    /// Create a range selector from any inclusive range expression.
    #[must_use]
    pub fn range(range: impl Into<SliceRange>) -> Self {
        Self::Range(range.into())
    }
}

impl From<i64> for Selector {
    fn from(point: i64) -> Self {
        Self::Point(point)
    }
}

impl From<SliceRange> for Selector {
    fn from(range: SliceRange) -> Self {
        Self::Range(range)
    }
}

impl From<RangeInclusive<i64>> for Selector {
    fn from(range: RangeInclusive<i64>) -> Self {
        Self::range(range)
    }
}

impl From<RangeFrom<i64>> for Selector {
    fn from(range: RangeFrom<i64>) -> Self {
        Self::range(range)
    }
}

impl From<RangeToInclusive<i64>> for Selector {
    fn from(range: RangeToInclusive<i64>) -> Self {
        Self::range(range)
    }
}

impl From<RangeFull> for Selector {
    fn from(_: RangeFull) -> Self {
        Self::Full
    }
}

impl From<Vec<i64>> for Selector {
    fn from(points: Vec<i64>) -> Self {
        Self::Points(points)
    }
}

/// A selector resolution error.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum SelectorError {
    /// More selectors than dimensions.
    #[error("got {got} selectors for an array of dimensionality {dimensionality}")]
    TooManySelectors {
        /// The number of selectors.
        got: usize,
        /// The array dimensionality.
        dimensionality: usize,
    },
    /// A negative range bound.
    #[error("negative bound {bound} in the selector of dimension {dimension}")]
    NegativeBound {
        /// The dimension index.
        dimension: usize,
        /// The bound.
        bound: i64,
    },
    /// A range outside of the domain of the dimension.
    #[error("range {start}..={stop} is out of the domain 0..={max} of dimension {dimension}")]
    OutOfDomain {
        /// The dimension index.
        dimension: usize,
        /// The resolved start.
        start: i64,
        /// The resolved stop.
        stop: i64,
        /// The largest valid coordinate.
        max: i64,
    },
    /// A range with a start greater than its stop.
    #[error("range {start}..={stop} of dimension {dimension} is empty")]
    EmptyRange {
        /// The dimension index.
        dimension: usize,
        /// The resolved start.
        start: i64,
        /// The resolved stop.
        stop: i64,
    },
    /// A step other than 1.
    #[error("unsupported step {step} in the selector of dimension {dimension}, only 1 is supported")]
    UnsupportedStep {
        /// The dimension index.
        dimension: usize,
        /// The step.
        step: i64,
    },
    /// A list of discrete coordinates.
    #[error("discrete coordinate lists are not supported (dimension {dimension}), use a point or an inclusive range")]
    DiscretePoints {
        /// The dimension index.
        dimension: usize,
    },
}

fn resolve_range(
    dimension: usize,
    range: SliceRange,
    max: i64,
) -> Result<(i64, i64), SelectorError> {
    if let Some(step) = range.step {
        if step != 1 {
            return Err(SelectorError::UnsupportedStep { dimension, step });
        }
    }
    for bound in [range.start, range.stop].into_iter().flatten() {
        if bound < 0 {
            return Err(SelectorError::NegativeBound { dimension, bound });
        }
    }
    let start = range.start.unwrap_or(0);
    let stop = range.stop.unwrap_or(max);
    if start > max || stop > max {
        Err(SelectorError::OutOfDomain {
            dimension,
            start,
            stop,
            max,
        })
    } else if start > stop {
        Err(SelectorError::EmptyRange {
            dimension,
            start,
            stop,
        })
    } else {
        Ok((start, stop))
    }
}

/// Resolve `selectors` against an array of `shape`.
///
/// - An empty selector sequence selects the whole array.
/// - Dimensions without a selector are fully selected.
/// - Ranges are inclusive on both ends and must lie within `0..=shape[dim]-1`.
/// - Points are passed through unvalidated.
///
/// # Errors
/// Returns a [`SelectorError`] if there are more selectors than dimensions, a range is negative, empty, out of domain, or has a step other than 1, or a discrete coordinate list is given.
pub fn resolve(shape: &[u64], selectors: &[Selector]) -> Result<ArraySubset, SelectorError> {
    if selectors.len() > shape.len() {
        return Err(SelectorError::TooManySelectors {
            got: selectors.len(),
            dimensionality: shape.len(),
        });
    }
    let (start, end_inc): (Vec<i64>, Vec<i64>) = shape
        .iter()
        .enumerate()
        .map(|(dimension, &size)| {
            let max = i64::try_from(size).map_or(i64::MAX, |size| size - 1);
            match selectors.get(dimension).unwrap_or(&Selector::Full) {
                Selector::Full => Ok((0, max)),
                Selector::Point(point) => Ok((*point, *point)),
                Selector::Range(range) => resolve_range(dimension, *range, max),
                Selector::Points(_) => Err(SelectorError::DiscretePoints { dimension }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .unzip();
    Ok(ArraySubset { start, end_inc })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_is_doubly_inclusive() {
        let subset = resolve(&[10], &[Selector::range(2..=4)]).unwrap();
        assert_eq!(subset.to_ranges(), vec![2..=4]);
        assert_eq!(subset.num_elements(), Some(3));
    }

    #[test]
    fn resolve_full_and_trailing() {
        let shape = [4, 6];
        assert_eq!(resolve(&shape, &[]).unwrap().to_ranges(), vec![0..=3, 0..=5]);
        assert_eq!(
            resolve(&shape, &[2.into()]).unwrap().to_ranges(),
            vec![2..=2, 0..=5]
        );
        assert_eq!(
            resolve(&shape, &[(..).into(), 3.into()]).unwrap().to_ranges(),
            vec![0..=3, 3..=3]
        );
        assert_eq!(
            resolve(&shape, &[(..=2).into(), (5..).into()])
                .unwrap()
                .to_ranges(),
            vec![0..=2, 5..=5]
        );
        assert_eq!(
            resolve(&shape, &[(0..=2).into(), (5..=5).into()])
                .unwrap()
                .to_ranges(),
            vec![0..=2, 5..=5]
        );
        assert_eq!(
            resolve(&shape, &[SliceRange::new(None, None).with_step(1).into()])
                .unwrap()
                .to_ranges(),
            vec![0..=3, 0..=5]
        );
    }

    #[test]
    fn resolve_points_are_unvalidated() {
        assert_eq!(
            resolve(&[10], &[(-1).into()]).unwrap().to_ranges(),
            vec![-1..=-1]
        );
        assert_eq!(
            resolve(&[10], &[12.into()]).unwrap().to_ranges(),
            vec![12..=12]
        );
    }

    #[test]
    fn resolve_errors() {
        assert_eq!(
            resolve(&[10], &[1.into(), 2.into()]),
            Err(SelectorError::TooManySelectors {
                got: 2,
                dimensionality: 1
            })
        );
        assert!(matches!(
            resolve(&[10], &[Selector::range(-1..=2)]),
            Err(SelectorError::NegativeBound { bound: -1, .. })
        ));
        assert!(matches!(
            resolve(&[10], &[Selector::range(..=-1)]),
            Err(SelectorError::NegativeBound { .. })
        ));
        assert!(matches!(
            resolve(&[5], &[Selector::range(10..=20)]),
            Err(SelectorError::OutOfDomain { max: 4, .. })
        ));
        assert!(matches!(
            resolve(&[5], &[Selector::range(10..)]),
            Err(SelectorError::OutOfDomain { .. })
        ));
        assert!(matches!(
            resolve(&[10], &[SliceRange::new(None, None).with_step(-1).into()]),
            Err(SelectorError::UnsupportedStep { step: -1, .. })
        ));
        assert!(matches!(
            resolve(&[10], &[SliceRange::new(Some(3), Some(2)).with_step(1).into()]),
            Err(SelectorError::EmptyRange { .. })
        ));
        assert!(matches!(
            resolve(&[10], &[SliceRange::new(Some(2), Some(8)).with_step(2).into()]),
            Err(SelectorError::UnsupportedStep { step: 2, .. })
        ));
        assert_eq!(
            resolve(&[10, 10], &[(..).into(), vec![1, 3].into()]),
            Err(SelectorError::DiscretePoints { dimension: 1 })
        );
    }
}
