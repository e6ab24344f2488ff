/*
 Copyright (c) 2026 The remdet Developers

 This file is part of remdet

 remdet is free software: you can redistribute it and/or modify it
 under the terms of the GNU General Public License as published by the
 Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 remdet is distributed in the hope that it will be useful, but
 WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU General Public License for more details.
 You should have received a copy of the GNU General Public License
 along with remdet. If not, see <https://www.gnu.org/licenses/>.
*/

use rayon::prelude::*;

use crate::accumulate::phase_aligned_chunk_len;
use crate::kernel::SimdKind;
use crate::sample::DetSample;

/// Generic residual subtraction over a chunk starting at phase 0.
#[inline]
pub fn subtract_chunk<T: DetSample>(chunk: &mut [T], detpart: &[T]) {
    for frame in chunk.chunks_mut(detpart.len()) {
        for (x, &d) in frame.iter_mut().zip(detpart) {
            *x = x.wrap_sub(d);
        }
    }
}

/// Inverse of [`subtract_chunk`].
#[inline]
pub fn add_chunk<T: DetSample>(chunk: &mut [T], detpart: &[T]) {
    for frame in chunk.chunks_mut(detpart.len()) {
        for (x, &d) in frame.iter_mut().zip(detpart) {
            *x = x.wrap_add(d);
        }
    }
}

/// Subtract `detpart` from `buffer` across the current rayon pool. Uses the
/// type's specialized kernel for this period when `fast_path` allows it.
/// Inputs must already be validated (non-empty, period <= size).
pub fn subtract_parallel<T: DetSample>(
    buffer: &mut [T],
    detpart: &[T],
    simd: SimdKind,
    fast_path: bool,
) {
    let period = detpart.len();
    let chunk_len = phase_aligned_chunk_len(period);
    let special = if fast_path {
        T::subtract_override(period)
    } else {
        None
    };

    match special {
        Some(kernel) => buffer
            .par_chunks_mut(chunk_len)
            .for_each(|chunk| kernel(chunk, detpart, simd)),
        None => buffer
            .par_chunks_mut(chunk_len)
            .for_each(|chunk| subtract_chunk(chunk, detpart)),
    }
}

/// Add `detpart` back onto a residual across the current rayon pool.
pub fn add_parallel<T: DetSample>(buffer: &mut [T], detpart: &[T]) {
    let chunk_len = phase_aligned_chunk_len(detpart.len());
    buffer
        .par_chunks_mut(chunk_len)
        .for_each(|chunk| add_chunk(chunk, detpart));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtracts_per_phase_with_partial_last_cycle() {
        let mut buf: Vec<i8> = vec![5, 6, 7, 5, 6, 7, 5];
        subtract_chunk(&mut buf, &[5, 6, 7]);
        assert_eq!(buf, vec![0; 7]);
    }

    #[test]
    fn unsigned_subtraction_wraps() {
        let mut buf: Vec<u8> = vec![0, 1, 255];
        subtract_chunk(&mut buf, &[1]);
        assert_eq!(buf, vec![255, 0, 254]);
    }

    #[test]
    fn add_undoes_subtract_at_extremes() {
        let original: Vec<i16> = vec![i16::MIN, i16::MAX, -1, 0, 1, i16::MIN + 1];
        let det = [i16::MAX, i16::MIN];
        let mut buf = original.clone();
        subtract_chunk(&mut buf, &det);
        assert_ne!(buf, original);
        add_chunk(&mut buf, &det);
        assert_eq!(buf, original);
    }

    #[test]
    fn parallel_matches_chunk_for_long_buffers() {
        let input: Vec<u16> = (0..300_000u32).map(|i| (i * 7919 % 65536) as u16).collect();
        let det: Vec<u16> = (0..13u16).map(|i| i * 1000).collect();

        let mut serial = input.clone();
        subtract_chunk(&mut serial, &det);

        let mut parallel = input.clone();
        subtract_parallel(&mut parallel, &det, SimdKind::Scalar, true);
        assert_eq!(parallel, serial);

        add_parallel(&mut parallel, &det);
        assert_eq!(parallel, input);
    }

    #[test]
    fn fast_path_toggle_gives_same_result() {
        let input: Vec<i16> = (0..100_003i32).map(|i| (i * 31 - 50_000) as i16).collect();
        let det: Vec<i16> = (0..16).map(|i| i * 2047 - 16_000).collect();

        let mut fast = input.clone();
        subtract_parallel(&mut fast, &det, SimdKind::detect(), true);
        let mut generic = input.clone();
        subtract_parallel(&mut generic, &det, SimdKind::detect(), false);
        assert_eq!(fast, generic);
    }
}
