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

use log::debug;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::accumulate;
use crate::config::EngineConfig;
use crate::kernel::SimdKind;
use crate::model::{RemdetError, RemdetResult};
use crate::sample::DetSample;
use crate::subtract;

/// Extracts and removes the periodic deterministic part of a sample buffer.
///
/// All parallel work runs on the engine's own rayon pool. Results are
/// bit-identical whatever the pool size.
pub struct Engine {
    config: EngineConfig,
    pool: ThreadPool,
    simd: SimdKind,
}

impl Engine {
    pub fn new(config: EngineConfig) -> RemdetResult<Self> {
        let threads = config.resolved_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("remdet-{}", i))
            .build()
            .map_err(|e| {
                RemdetError::InvalidConfig(format!(
                    "could not build a {}-thread worker pool: {}",
                    threads, e
                ))
            })?;
        let simd = SimdKind::detect();

        debug!(
            "Engine ready: {} threads, {} digits ({} bits) of precision, {} kernels, fast path {}",
            threads,
            config.precision().digits(),
            config.precision().available_bits(),
            simd.name(),
            if config.fast_path() { "on" } else { "off" }
        );

        Ok(Self { config, pool, simd })
    }

    pub fn with_defaults() -> RemdetResult<Self> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn simd_kind(&self) -> SimdKind {
        self.simd
    }

    /// Whether `deldet` on `T` at `period` goes through a specialized kernel.
    pub fn uses_fast_path<T: DetSample>(&self, period: usize) -> bool {
        self.config.fast_path() && T::subtract_override(period).is_some()
    }

    /// Per-phase average waveform of `buffer`, `period` samples long.
    pub fn getdet<T: DetSample>(&self, buffer: &[T], period: usize) -> RemdetResult<Vec<T>> {
        // Validate before sizing the waveform from `period`.
        self.check_average::<T>(buffer.len(), period)?;
        let mut detpart = vec![T::default(); period];
        self.getdet_into(buffer, &mut detpart)?;
        Ok(detpart)
    }

    /// Like [`getdet`](Self::getdet), writing into caller storage whose length
    /// is the period. Previous contents are overwritten, not accumulated.
    pub fn getdet_into<T: DetSample>(&self, buffer: &[T], detpart: &mut [T]) -> RemdetResult<()> {
        self.check_average::<T>(buffer.len(), detpart.len())?;
        self.pool.install(|| accumulate::average_into(buffer, detpart));
        Ok(())
    }

    /// Subtract `detpart` (one value per phase) from `buffer` in place, with
    /// wrapping arithmetic.
    pub fn deldet<T: DetSample>(&self, buffer: &mut [T], detpart: &[T]) -> RemdetResult<()> {
        check_shape(buffer.len(), detpart.len())?;
        let (simd, fast_path) = (self.simd, self.config.fast_path());
        self.pool
            .install(|| subtract::subtract_parallel(buffer, detpart, simd, fast_path));
        Ok(())
    }

    /// Add `detpart` back onto a residual; exact inverse of [`deldet`](Self::deldet).
    pub fn adddet<T: DetSample>(&self, buffer: &mut [T], detpart: &[T]) -> RemdetResult<()> {
        check_shape(buffer.len(), detpart.len())?;
        self.pool.install(|| subtract::add_parallel(buffer, detpart));
        Ok(())
    }

    /// Average then subtract in one call. Returns the waveform that was removed.
    pub fn remdet<T: DetSample>(&self, buffer: &mut [T], period: usize) -> RemdetResult<Vec<T>> {
        self.check_average::<T>(buffer.len(), period)?;
        let mut detpart = vec![T::default(); period];
        self.remdet_into(buffer, &mut detpart)?;
        Ok(detpart)
    }

    pub fn remdet_into<T: DetSample>(&self, buffer: &mut [T], detpart: &mut [T]) -> RemdetResult<()> {
        self.check_average::<T>(buffer.len(), detpart.len())?;
        let (simd, fast_path) = (self.simd, self.config.fast_path());
        self.pool.install(|| {
            accumulate::average_into(buffer, detpart);
            subtract::subtract_parallel(buffer, detpart, simd, fast_path);
        });
        Ok(())
    }

    fn check_average<T: DetSample>(&self, size: usize, period: usize) -> RemdetResult<()> {
        check_shape(size, period)?;
        self.config
            .precision()
            .check_capacity(T::BITS, size.div_ceil(period))
    }
}

fn check_shape(size: usize, period: usize) -> RemdetResult<()> {
    if period == 0 {
        return Err(RemdetError::ZeroPeriod);
    }
    if size == 0 {
        return Err(RemdetError::EmptyBuffer);
    }
    if period > size {
        return Err(RemdetError::PeriodExceedsSize { period, size });
    }
    Ok(())
}
