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

//! Extraction and removal of the periodic deterministic component of
//! integer sample streams.
//!
//! A buffer of `i8`, `u8`, `i16` or `u16` samples is averaged per phase
//! over a known period (`getdet`), and the resulting waveform is subtracted
//! back out in place (`deldet`), leaving the residual. `remdet` does both in
//! one call. Accumulation is exact, so results do not depend on thread count.
//!
//! ```no_run
//! use remdet::{Engine, EngineConfig};
//!
//! let engine = Engine::new(EngineConfig::new().with_threads(4))?;
//! let mut samples: Vec<i16> = vec![0; 1 << 20];
//! let waveform = engine.remdet(&mut samples, 16)?;
//! assert_eq!(waveform.len(), 16);
//! # Ok::<(), remdet::RemdetError>(())
//! ```

pub mod accumulate;
pub mod color_logger;
pub mod config;
pub mod engine;
pub mod kernel;
pub mod model;
pub mod precision;
pub mod raw_file;
pub mod sample;
pub mod subtract;

pub use color_logger::ColorLogger;
pub use config::EngineConfig;
pub use engine::Engine;
pub use kernel::{SimdKind, FAST_PERIOD};
pub use model::{RemdetError, RemdetResult, TermResult};
pub use precision::Precision;
pub use raw_file::{find_sample_files, read_samples, write_samples, Endianness, RawSample};
pub use sample::{DetSample, SampleType};
