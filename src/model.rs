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
use std::io;
use std::process::{ExitCode, Termination};

use log::error;

#[derive(Debug)]
pub enum RemdetError {
    /// A period of zero was requested.
    ZeroPeriod,
    /// The sample buffer has no samples.
    EmptyBuffer,
    /// The period (or waveform length) is longer than the buffer.
    PeriodExceedsSize { period: usize, size: usize },
    /// The worst-case phase sum needs more bits than the configured precision.
    PrecisionExhausted { required_bits: u32, available_bits: u32 },
    InvalidConfig(String),
    Io(io::Error),
    Message(String),
}

impl fmt::Display for RemdetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemdetError::ZeroPeriod => write!(f, "Period must be greater than zero"),
            RemdetError::EmptyBuffer => write!(f, "Sample buffer is empty"),
            RemdetError::PeriodExceedsSize { period, size } => write!(
                f,
                "Period {} exceeds buffer size {}",
                period, size
            ),
            RemdetError::PrecisionExhausted {
                required_bits,
                available_bits,
            } => write!(
                f,
                "Accumulation needs {} bits of precision but only {} are configured",
                required_bits, available_bits
            ),
            RemdetError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            RemdetError::Io(e) => write!(f, "I/O error: {}", e),
            RemdetError::Message(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RemdetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RemdetError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RemdetError {
    fn from(err: io::Error) -> Self {
        RemdetError::Io(err)
    }
}

// Convert boxed dynamic errors into RemdetError
impl From<Box<dyn std::error::Error>> for RemdetError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        RemdetError::Message(err.to_string())
    }
}

impl From<String> for RemdetError {
    fn from(msg: String) -> Self {
        RemdetError::Message(msg)
    }
}

impl From<&str> for RemdetError {
    fn from(msg: &str) -> Self {
        RemdetError::Message(msg.to_string())
    }
}

pub type RemdetResult<T> = Result<T, RemdetError>;

pub struct TermResult(pub RemdetResult<()>);

impl Termination for TermResult {
    fn report(self) -> ExitCode {
        match self.0 {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                error!("{}", err);
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_both_sides_of_a_size_mismatch() {
        let e = RemdetError::PeriodExceedsSize { period: 16, size: 4 };
        assert_eq!(e.to_string(), "Period 16 exceeds buffer size 4");
    }

    #[test]
    fn io_errors_keep_their_source() {
        use std::error::Error;
        let e: RemdetError = io::Error::new(io::ErrorKind::UnexpectedEof, "short").into();
        assert!(e.source().is_some());
        assert!(e.to_string().contains("short"));
    }

    #[test]
    fn boxed_errors_collapse_to_message() {
        let boxed: Box<dyn std::error::Error> = "bad input".into();
        let e: RemdetError = boxed.into();
        assert!(matches!(e, RemdetError::Message(ref m) if m == "bad input"));
    }
}
