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

use std::thread::available_parallelism;

use crate::model::RemdetResult;
use crate::precision::Precision;

/// Settings an [`Engine`](crate::Engine) is built from. Each engine owns its
/// own copy, so differently configured engines can live side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    precision: Precision,
    num_threads: usize,
    fast_path: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            num_threads: 0,
            fast_path: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_precision_digits(self, digits: u32) -> RemdetResult<Self> {
        Ok(self.with_precision(Precision::from_digits(digits)?))
    }

    /// Worker pool size. Zero means one thread per available core.
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Enable or disable the hand-specialized subtraction kernels.
    pub fn with_fast_path(mut self, enabled: bool) -> Self {
        self.fast_path = enabled;
        self
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn fast_path(&self) -> bool {
        self.fast_path
    }

    /// Thread count after resolving zero to the available parallelism.
    pub fn resolved_threads(&self) -> usize {
        if self.num_threads > 0 {
            self.num_threads
        } else {
            available_parallelism().map(|n| n.get()).unwrap_or(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.precision().digits(), 100);
        assert_eq!(cfg.num_threads(), 0);
        assert!(cfg.fast_path());
        assert!(cfg.resolved_threads() >= 1);
    }

    #[test]
    fn builder_setters_chain() {
        let cfg = EngineConfig::new()
            .with_threads(3)
            .with_fast_path(false)
            .with_precision_digits(20)
            .unwrap();
        assert_eq!(cfg.resolved_threads(), 3);
        assert!(!cfg.fast_path());
        assert_eq!(cfg.precision().digits(), 20);
    }

    #[test]
    fn zero_digit_precision_is_rejected() {
        assert!(EngineConfig::new().with_precision_digits(0).is_err());
    }
}
