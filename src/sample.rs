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

use core::fmt;
use std::str::FromStr;

use crate::kernel::{self, SimdKind};
use crate::model::RemdetError;

/// Vectorized replacement for the generic residual subtraction. Receives a
/// period-aligned chunk of the buffer and the full waveform.
pub type SubtractFn<T> = fn(&mut [T], &[T], SimdKind);

mod sealed {
    pub trait Sealed {}
    impl Sealed for i8 {}
    impl Sealed for u8 {}
    impl Sealed for i16 {}
    impl Sealed for u16 {}
}

/// Integer sample types the engine operates on. Implemented for `i8`, `u8`,
/// `i16` and `u16` only.
pub trait DetSample:
    sealed::Sealed + Copy + Send + Sync + Default + PartialEq + fmt::Debug + 'static
{
    const BITS: u32;
    const SAMPLE_TYPE: SampleType;

    /// Lossless widening into the per-chunk accumulator.
    fn widen(self) -> i64;

    /// Narrow a rounded mean back into the sample type. The mean of in-range
    /// samples is always in range, so this never truncates.
    fn narrow(mean: i128) -> Self;

    fn wrap_sub(self, rhs: Self) -> Self;
    fn wrap_add(self, rhs: Self) -> Self;

    /// Hand-specialized subtraction for this type at `period`, if any.
    fn subtract_override(_period: usize) -> Option<SubtractFn<Self>> {
        None
    }
}

macro_rules! impl_det_sample {
    ($t:ty, $tag:expr) => {
        impl_det_sample!($t, $tag, |_period| None);
    };
    ($t:ty, $tag:expr, $select:expr) => {
        impl DetSample for $t {
            const BITS: u32 = <$t>::BITS;
            const SAMPLE_TYPE: SampleType = $tag;

            #[inline(always)]
            fn widen(self) -> i64 {
                self as i64
            }

            #[inline]
            fn narrow(mean: i128) -> Self {
                debug_assert!(
                    mean >= <$t>::MIN as i128 && mean <= <$t>::MAX as i128,
                    "mean {} outside {}",
                    mean,
                    stringify!($t)
                );
                mean as $t
            }

            #[inline(always)]
            fn wrap_sub(self, rhs: Self) -> Self {
                self.wrapping_sub(rhs)
            }

            #[inline(always)]
            fn wrap_add(self, rhs: Self) -> Self {
                self.wrapping_add(rhs)
            }

            fn subtract_override(period: usize) -> Option<SubtractFn<Self>> {
                let select: fn(usize) -> Option<SubtractFn<Self>> = $select;
                select(period)
            }
        }
    };
}

impl_det_sample!(i8, SampleType::Int8);
impl_det_sample!(u8, SampleType::Uint8);
impl_det_sample!(u16, SampleType::Uint16);
impl_det_sample!(i16, SampleType::Int16, |period| {
    if period == kernel::FAST_PERIOD {
        Some(kernel::subtract_period16_i16 as SubtractFn<i16>)
    } else {
        None
    }
});

/// Runtime tag for the supported sample types, used at the I/O boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    Int8,
    Uint8,
    Int16,
    Uint16,
}

impl SampleType {
    /// Width of one sample in bytes.
    pub fn width(&self) -> usize {
        match self {
            SampleType::Int8 | SampleType::Uint8 => 1,
            SampleType::Int16 | SampleType::Uint16 => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SampleType::Int8 => "int8",
            SampleType::Uint8 => "uint8",
            SampleType::Int16 => "int16",
            SampleType::Uint16 => "uint16",
        }
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleType {
    type Err = RemdetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int8" | "i8" => Ok(SampleType::Int8),
            "uint8" | "u8" => Ok(SampleType::Uint8),
            "int16" | "i16" => Ok(SampleType::Int16),
            "uint16" | "u16" => Ok(SampleType::Uint16),
            other => Err(RemdetError::Message(format!(
                "Unsupported sample type \"{}\"; must be int8, uint8, int16, or uint16",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_keeps_extremes() {
        assert_eq!(<i8 as DetSample>::narrow(-128), i8::MIN);
        assert_eq!(<i8 as DetSample>::narrow(127), i8::MAX);
        assert_eq!(<u16 as DetSample>::narrow(65535), u16::MAX);
        assert_eq!(<u8 as DetSample>::narrow(0), 0u8);
    }

    #[test]
    fn wrapping_arithmetic_is_modular() {
        assert_eq!(DetSample::wrap_sub(-128i8, 1), 127);
        assert_eq!(DetSample::wrap_add(127i8, 1), -128);
        assert_eq!(DetSample::wrap_sub(0u16, 1), u16::MAX);
        assert_eq!(DetSample::wrap_sub(3u8, 200), 59);
    }

    #[test]
    fn only_i16_period16_has_override() {
        assert!(<i16 as DetSample>::subtract_override(16).is_some());
        assert!(<i16 as DetSample>::subtract_override(8).is_none());
        assert!(<u16 as DetSample>::subtract_override(16).is_none());
        assert!(<i8 as DetSample>::subtract_override(16).is_none());
    }

    #[test]
    fn sample_type_parses_names_and_short_forms() {
        assert_eq!("int16".parse::<SampleType>().unwrap(), SampleType::Int16);
        assert_eq!("U8".parse::<SampleType>().unwrap(), SampleType::Uint8);
        assert!("float32".parse::<SampleType>().is_err());
        assert_eq!(SampleType::Uint16.width(), 2);
        assert_eq!(<i8 as DetSample>::SAMPLE_TYPE, SampleType::Int8);
    }
}
