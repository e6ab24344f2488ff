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

// Vectorized residual subtraction for i16 samples at period 16.
// One period is exactly 16 x 16 bits = 256 bits: a single AVX2 register, or
// two NEON q-registers. The waveform is loaded once and every full frame of
// the chunk is one load/sub/store. A trailing partial frame is done scalar.
// Arithmetic is wrapping (two's complement), same as the generic path.

/// Period the hand-specialized kernel is built for.
pub const FAST_PERIOD: usize = 16;

/// SIMD implementation selected at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimdKind {
    Scalar,
    Avx2,
    Neon,
}

impl SimdKind {
    #[inline]
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        if std::is_x86_feature_detected!("avx2") {
            return SimdKind::Avx2;
        }
        if cfg!(target_arch = "aarch64") {
            return SimdKind::Neon;
        }
        SimdKind::Scalar
    }

    pub fn name(&self) -> &'static str {
        match self {
            SimdKind::Scalar => "scalar",
            SimdKind::Avx2 => "avx2",
            SimdKind::Neon => "neon",
        }
    }
}

/// Subtract a 16-sample waveform from a chunk that starts at phase 0.
pub fn subtract_period16_i16(buffer: &mut [i16], detpart: &[i16], kind: SimdKind) {
    let Ok(det) = <&[i16; FAST_PERIOD]>::try_from(detpart) else {
        // Not a period-16 waveform; nothing to specialize.
        crate::subtract::subtract_chunk(buffer, detpart);
        return;
    };

    match kind {
        SimdKind::Scalar => subtract_scalar(buffer, det),

        #[cfg(target_arch = "x86_64")]
        SimdKind::Avx2 => {
            if std::is_x86_feature_detected!("avx2") {
                // SAFETY: AVX2 support was just confirmed.
                unsafe { subtract_avx2(buffer, det) }
            } else {
                subtract_scalar(buffer, det)
            }
        }
        #[cfg(not(target_arch = "x86_64"))]
        SimdKind::Avx2 => subtract_scalar(buffer, det),

        #[cfg(target_arch = "aarch64")]
        SimdKind::Neon => subtract_neon(buffer, det),
        #[cfg(not(target_arch = "aarch64"))]
        SimdKind::Neon => subtract_scalar(buffer, det),
    }
}

#[inline]
fn subtract_scalar(buffer: &mut [i16], det: &[i16; FAST_PERIOD]) {
    let mut frames = buffer.chunks_exact_mut(FAST_PERIOD);
    for frame in &mut frames {
        for (x, &d) in frame.iter_mut().zip(det.iter()) {
            *x = x.wrapping_sub(d);
        }
    }
    subtract_tail(frames.into_remainder(), det);
}

#[inline(always)]
fn subtract_tail(tail: &mut [i16], det: &[i16; FAST_PERIOD]) {
    for (x, &d) in tail.iter_mut().zip(det.iter()) {
        *x = x.wrapping_sub(d);
    }
}

// ================= AVX2 (x86_64) =================
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn subtract_avx2(buffer: &mut [i16], det: &[i16; FAST_PERIOD]) {
    use std::arch::x86_64::*;

    let mut frames = buffer.chunks_exact_mut(FAST_PERIOD);
    // SAFETY: every pointer covers exactly 16 i16 (32 bytes); loads and
    // stores are unaligned.
    unsafe {
        let d = _mm256_loadu_si256(det.as_ptr() as *const __m256i);
        for frame in &mut frames {
            let p = frame.as_mut_ptr() as *mut __m256i;
            let x = _mm256_loadu_si256(p as *const __m256i);
            _mm256_storeu_si256(p, _mm256_sub_epi16(x, d));
        }
    }
    subtract_tail(frames.into_remainder(), det);
}

// ================= NEON (aarch64) =================
#[cfg(target_arch = "aarch64")]
fn subtract_neon(buffer: &mut [i16], det: &[i16; FAST_PERIOD]) {
    use core::arch::aarch64::*;

    let mut frames = buffer.chunks_exact_mut(FAST_PERIOD);
    // SAFETY: NEON is baseline on aarch64; each pointer covers 8 i16.
    unsafe {
        let lo = vld1q_s16(det.as_ptr());
        let hi = vld1q_s16(det.as_ptr().add(8));
        for frame in &mut frames {
            let p = frame.as_mut_ptr();
            vst1q_s16(p, vsubq_s16(vld1q_s16(p), lo));
            let q = p.add(8);
            vst1q_s16(q, vsubq_s16(vld1q_s16(q), hi));
        }
    }
    subtract_tail(frames.into_remainder(), det);
}
