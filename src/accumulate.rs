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

//! Per-phase averaging of a sample buffer.
//!
//! The buffer is cut into chunks whose length is a whole number of periods,
//! so every chunk starts at phase 0. Each chunk is summed per phase into
//! `i64` partials, which are widened and merged into `i128` totals. Integer
//! addition is associative, so the totals, and the rounded means derived
//! from them, do not depend on how the work was split or on how many
//! threads ran it.

use rayon::prelude::*;

use crate::sample::DetSample;

/// Preferred number of samples handled by one worker task.
pub const TARGET_CHUNK_SAMPLES: usize = 1 << 16;

/// Chunk length used for parallel passes: a whole number of periods, close
/// to [`TARGET_CHUNK_SAMPLES`] but never shorter than one period.
pub fn phase_aligned_chunk_len(period: usize) -> usize {
    let period = period.max(1);
    (TARGET_CHUNK_SAMPLES / period).max(1) * period
}

/// Number of samples falling in phase bin `phase`.
#[inline]
pub fn bin_count(size: usize, period: usize, phase: usize) -> usize {
    if phase >= size {
        0
    } else {
        (size - phase).div_ceil(period)
    }
}

/// Exact integer mean, rounded half away from zero (2.5 -> 3, -2.5 -> -3).
#[inline]
pub fn rounded_mean(sum: i128, count: usize) -> i128 {
    debug_assert!(count > 0);
    let n = count as i128;
    let q = sum / n;
    let r = sum % n;
    // r carries the sign of sum
    if 2 * r.abs() >= n { q + sum.signum() } else { q }
}

/// Exact per-phase running sums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSums {
    sums: Vec<i128>,
}

impl PhaseSums {
    pub fn zeroed(period: usize) -> Self {
        Self {
            sums: vec![0; period],
        }
    }

    /// Sum one phase-aligned chunk.
    pub fn from_chunk<T: DetSample>(chunk: &[T], period: usize) -> Self {
        // A chunk holds at most max(TARGET_CHUNK_SAMPLES / period, 1) samples
        // per bin, far below what an i64 can absorb at 16 bits per sample.
        let mut partial = vec![0i64; period];
        for frame in chunk.chunks(period) {
            for (acc, &x) in partial.iter_mut().zip(frame) {
                *acc += x.widen();
            }
        }
        Self {
            sums: partial.into_iter().map(i128::from).collect(),
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        debug_assert_eq!(self.sums.len(), other.sums.len());
        for (a, b) in self.sums.iter_mut().zip(other.sums) {
            *a += b;
        }
        self
    }

    pub fn period(&self) -> usize {
        self.sums.len()
    }

    pub fn sums(&self) -> &[i128] {
        &self.sums
    }

    /// Rounded per-phase means for a buffer of `size` samples, written into
    /// `detpart` (which must be `period` long). Existing contents are
    /// overwritten.
    pub fn write_means<T: DetSample>(&self, size: usize, detpart: &mut [T]) {
        let period = self.period();
        for (phase, (out, &sum)) in detpart.iter_mut().zip(&self.sums).enumerate() {
            let count = bin_count(size, period, phase);
            *out = if count == 0 {
                T::default()
            } else {
                T::narrow(rounded_mean(sum, count))
            };
        }
    }
}

/// Phase sums over the whole buffer on the current rayon pool.
pub fn phase_sums_parallel<T: DetSample>(buffer: &[T], period: usize) -> PhaseSums {
    buffer
        .par_chunks(phase_aligned_chunk_len(period))
        .map(|chunk| PhaseSums::from_chunk(chunk, period))
        .reduce(|| PhaseSums::zeroed(period), PhaseSums::merge)
}

/// Average `buffer` per phase into `detpart`. `detpart.len()` is the period.
/// Inputs must already be validated (non-empty, period <= size).
pub fn average_into<T: DetSample>(buffer: &[T], detpart: &mut [T]) {
    let sums = phase_sums_parallel(buffer, detpart.len());
    sums.write_means(buffer.len(), detpart);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn average<T: DetSample>(buffer: &[T], period: usize) -> Vec<T> {
        let mut det = vec![T::default(); period];
        average_into(buffer, &mut det);
        det
    }

    #[test]
    fn repeating_ramp_recovers_waveform() {
        let buf: Vec<i8> = vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4];
        assert_eq!(average(&buf, 4), vec![1, 2, 3, 4]);
    }

    #[test]
    fn alternating_signal_with_odd_length() {
        let buf: Vec<i8> = vec![10, -10, 10, -10, 10];
        assert_eq!(average(&buf, 2), vec![10, -10]);
    }

    #[test]
    fn partial_last_cycle_uses_smaller_count() {
        // phase 0: {0, 3, 6} -> 3, phase 1: {1, 4, 8} -> 13/3 = 4.33 -> 4,
        // phase 2: {2, 5} -> 3.5 -> 4
        let buf: Vec<u8> = vec![0, 1, 2, 3, 4, 5, 6, 8];
        assert_eq!(bin_count(8, 3, 0), 3);
        assert_eq!(bin_count(8, 3, 1), 3);
        assert_eq!(bin_count(8, 3, 2), 2);
        assert_eq!(average(&buf, 3), vec![3, 4, 4]);
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(rounded_mean(5, 2), 3);
        assert_eq!(rounded_mean(-5, 2), -3);
        assert_eq!(rounded_mean(7, 3), 2);
        assert_eq!(rounded_mean(-7, 3), -2);
        assert_eq!(rounded_mean(8, 3), 3);
        assert_eq!(rounded_mean(-8, 3), -3);
        assert_eq!(rounded_mean(0, 9), 0);
    }

    #[test]
    fn extreme_means_stay_in_range() {
        let top: Vec<i8> = vec![127, 126];
        assert_eq!(average(&top, 1), vec![127]);
        let bottom: Vec<i8> = vec![-128, -127];
        assert_eq!(average(&bottom, 1), vec![-128]);
        let full: Vec<u16> = vec![u16::MAX; 1000];
        assert_eq!(average(&full, 10), vec![u16::MAX; 10]);
    }

    #[test]
    fn sums_independent_of_chunking() {
        let buf: Vec<i16> = (0..10_007i32).map(|i| (i.wrapping_mul(2654435761u32 as i32) >> 16) as i16).collect();
        let period = 7;
        let whole = PhaseSums::from_chunk(&buf, period);

        for cycles in [1usize, 3, 100, 1429] {
            let len = cycles * period;
            let pieces: Vec<PhaseSums> = buf
                .chunks(len)
                .map(|c| PhaseSums::from_chunk(c, period))
                .collect();
            let forward = pieces
                .iter()
                .cloned()
                .fold(PhaseSums::zeroed(period), PhaseSums::merge);
            let backward = pieces
                .into_iter()
                .rev()
                .fold(PhaseSums::zeroed(period), PhaseSums::merge);
            assert_eq!(forward, whole);
            assert_eq!(backward, whole);
        }
        assert_eq!(phase_sums_parallel(&buf, period), whole);
    }

    #[test]
    fn chunk_len_is_whole_periods() {
        assert_eq!(phase_aligned_chunk_len(16) % 16, 0);
        assert_eq!(phase_aligned_chunk_len(7) % 7, 0);
        assert_eq!(phase_aligned_chunk_len(100_000), 100_000);
        assert_eq!(phase_aligned_chunk_len(0), TARGET_CHUNK_SAMPLES);
    }

    #[test]
    fn write_means_overwrites_previous_contents() {
        let buf: Vec<u8> = vec![4, 8, 4, 8];
        let mut det = vec![200u8, 200];
        average_into(&buf, &mut det);
        assert_eq!(det, vec![4, 8]);
    }
}
