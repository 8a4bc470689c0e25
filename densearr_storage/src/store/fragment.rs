//! Immutable write fragments and their overlay onto read regions.

use crate::{Bytes, CellRange};

/// The cells of a region written by a single range write.
#[derive(Clone, Debug)]
pub(crate) struct Fragment {
    region: Vec<CellRange>,
    bytes: Bytes,
}

impl Fragment {
    pub(crate) fn new(region: Vec<CellRange>, bytes: Bytes) -> Self {
        Self { region, bytes }
    }
}

/// Return the number of cells along each dimension of `region`.
pub(crate) fn region_shape(region: &[CellRange]) -> Vec<u64> {
    region
        .iter()
        .map(|range| range.end().abs_diff(*range.start()) + 1)
        .collect()
}

/// Return the number of cells in `region`, or [`None`] on overflow.
pub(crate) fn region_num_cells(region: &[CellRange]) -> Option<u64> {
    region_shape(region)
        .into_iter()
        .try_fold(1u64, u64::checked_mul)
}

/// Copy the cells of `fragment` that intersect the cells `cells` of `region` into `out`.
///
/// `cells` indexes the cells of `region` in row-major order and `out` holds exactly those cells.
pub(crate) fn overlay(
    fragment: &Fragment,
    region: &[CellRange],
    cells: std::ops::Range<u64>,
    cell_size: usize,
    out: &mut [u8],
) {
    debug_assert_eq!(fragment.region.len(), region.len());
    let Some((last_region, outer_region)) = region.split_last() else {
        // Zero-dimensional regions hold a single cell.
        if cells.start == 0 && cells.end > 0 {
            out[..cell_size].copy_from_slice(&fragment.bytes[..cell_size]);
        }
        return;
    };
    let (last_fragment, outer_fragment) = fragment.region.split_last().unwrap_or((last_region, &[]));

    // Skip fragments that cannot intersect the region.
    if region
        .iter()
        .zip(&fragment.region)
        .any(|(r, f)| r.end() < f.start() || f.end() < r.start())
    {
        return;
    }

    let shape = region_shape(region);
    let fragment_shape = region_shape(&fragment.region);
    let row_len = shape[shape.len() - 1];
    let fragment_row_len = fragment_shape[fragment_shape.len() - 1];

    let mut cell = cells.start;
    while cell < cells.end {
        let row_start = cell - cell % row_len;
        let row_end = (row_start + row_len).min(cells.end);

        // The coordinates of the row, outer dimensions only.
        let mut remainder = row_start / row_len;
        let mut coords = vec![0i64; outer_region.len()];
        for (i, range) in outer_region.iter().enumerate().rev() {
            let extent = shape[i];
            coords[i] = range.start() + i64::try_from(remainder % extent).unwrap_or(i64::MAX);
            remainder /= extent;
        }

        let in_fragment = coords
            .iter()
            .zip(outer_fragment)
            .all(|(c, f)| f.contains(c));
        if in_fragment {
            // Column span of the row segment, in region coordinates.
            let col_lo = last_region.start() + to_i64(cell - row_start);
            let col_hi = last_region.start() + to_i64(row_end - row_start) - 1;
            let lo = col_lo.max(*last_fragment.start());
            let hi = col_hi.min(*last_fragment.end());
            if lo <= hi {
                // Linear index of the row within the fragment.
                let mut fragment_row = 0u64;
                for ((c, f), extent) in coords.iter().zip(outer_fragment).zip(&fragment_shape) {
                    fragment_row = fragment_row * extent + c.abs_diff(*f.start());
                }
                let src_cell = fragment_row * fragment_row_len + lo.abs_diff(*last_fragment.start());
                let dst_cell = row_start + lo.abs_diff(*last_region.start()) - cells.start;
                let n = to_usize(hi.abs_diff(lo) + 1) * cell_size;
                let src = to_usize(src_cell) * cell_size;
                let dst = to_usize(dst_cell) * cell_size;
                out[dst..dst + n].copy_from_slice(&fragment.bytes[src..src + n]);
            }
        }
        cell = row_end;
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
