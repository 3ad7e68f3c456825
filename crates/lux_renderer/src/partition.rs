//! Row-range partitioning of the frame across workers.
//!
//! Each worker gets one contiguous band of rows. Bands are handed out as
//! disjoint `&mut` slices of the pixel buffer, so workers never share
//! writable memory.

use std::ops::Range;

use lux_core::Color;

/// Split `[0, height)` into `threads.max(1)` contiguous ranges.
///
/// The first `height % threads` ranges get one extra row. When there are
/// more threads than rows the surplus ranges are empty.
pub fn row_ranges(height: usize, threads: usize) -> Vec<Range<usize>> {
    let threads = threads.max(1);
    let base = height / threads;
    let extra = height % threads;

    let mut ranges = Vec::with_capacity(threads);
    let mut start = 0;
    for i in 0..threads {
        let rows = base + usize::from(i < extra);
        ranges.push(start..start + rows);
        start += rows;
    }
    ranges
}

/// Split a row-major pixel buffer into one mutable slice per range.
///
/// `ranges` must be contiguous and start at row 0, as produced by
/// [`row_ranges`].
pub fn split_rows<'a>(
    mut pixels: &'a mut [Color],
    width: usize,
    ranges: &[Range<usize>],
) -> Vec<&'a mut [Color]> {
    let mut bands = Vec::with_capacity(ranges.len());
    for range in ranges {
        let len = (range.len() * width).min(pixels.len());
        let (band, rest) = std::mem::take(&mut pixels).split_at_mut(len);
        bands.push(band);
        pixels = rest;
    }
    bands
}
