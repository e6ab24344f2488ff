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

//! Working precision of the phase accumulator.
//!
//! Precision is expressed in decimal digits and converted to bits the same
//! way arbitrary-precision float libraries do (`ceil(digits * log2(10))`).
//! Sums are kept as exact integers, so the precision acts as a capacity
//! bound: an accumulation that could need more bits than configured is
//! refused instead of being rounded.

use crate::model::{RemdetError, RemdetResult};

const LOG2_10: f64 = std::f64::consts::LOG2_10;

/// Width of the widest accumulator the engine carries (`i128`, minus sign).
pub const ACCUMULATOR_BITS: u32 = 127;

/// Default working precision, in decimal digits.
pub const DEFAULT_PRECISION_DIGITS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    digits: u32,
}

impl Precision {
    pub fn from_digits(digits: u32) -> RemdetResult<Self> {
        if digits == 0 {
            return Err(RemdetError::InvalidConfig(
                "precision must be at least one decimal digit".into(),
            ));
        }
        Ok(Self { digits })
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Configured precision in bits.
    pub fn bits(&self) -> u32 {
        (self.digits as f64 * LOG2_10).ceil() as u32
    }

    /// Bits actually usable: the configured precision, capped by the accumulator.
    pub fn available_bits(&self) -> u32 {
        self.bits().min(ACCUMULATOR_BITS)
    }

    /// Fails if summing `count` samples of `sample_bits` width could exceed
    /// the working precision.
    pub fn check_capacity(&self, sample_bits: u32, count: usize) -> RemdetResult<()> {
        let required_bits = required_bits(sample_bits, count);
        let available_bits = self.available_bits();
        if required_bits > available_bits {
            return Err(RemdetError::PrecisionExhausted {
                required_bits,
                available_bits,
            });
        }
        Ok(())
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            digits: DEFAULT_PRECISION_DIGITS,
        }
    }
}

/// Conservative bound on the bits needed to hold the sum of `count`
/// samples of `sample_bits` width, sign included.
pub fn required_bits(sample_bits: u32, count: usize) -> u32 {
    sample_bits + ceil_log2(count) + 1
}

#[inline]
fn ceil_log2(n: usize) -> u32 {
    if n <= 1 {
        0
    } else {
        usize::BITS - (n - 1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_convert_like_mpfr() {
        // 100 digits -> ceil(332.19...) = 333 bits
        assert_eq!(Precision::from_digits(100).unwrap().bits(), 333);
        assert_eq!(Precision::from_digits(1).unwrap().bits(), 4);
        assert_eq!(Precision::from_digits(15).unwrap().bits(), 50);
    }

    #[test]
    fn zero_digits_rejected() {
        assert!(matches!(
            Precision::from_digits(0),
            Err(RemdetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn available_bits_capped_by_accumulator() {
        assert_eq!(Precision::default().available_bits(), ACCUMULATOR_BITS);
        assert_eq!(Precision::from_digits(5).unwrap().available_bits(), 17);
    }

    #[test]
    fn ceil_log2_edges() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(1024), 10);
        assert_eq!(ceil_log2(1025), 11);
    }

    #[test]
    fn capacity_check_reports_shortfall() {
        // 5 digits = 17 bits; 16-bit samples summed 4 at a time need 19.
        let p = Precision::from_digits(5).unwrap();
        match p.check_capacity(16, 4) {
            Err(RemdetError::PrecisionExhausted {
                required_bits,
                available_bits,
            }) => {
                assert_eq!(required_bits, 19);
                assert_eq!(available_bits, 17);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(p.check_capacity(8, 4).is_ok());
    }

    #[test]
    fn default_precision_covers_any_buffer() {
        assert!(Precision::default().check_capacity(16, usize::MAX).is_ok());
    }
}
