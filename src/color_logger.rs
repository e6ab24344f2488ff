use std::io::{self, Write};

use colored::Colorize;
use log::{Level, LevelFilter, Metadata, Record};

/// Stderr logger with colored level tags. Errors and warnings are
/// highlighted; everything else carries a blue `[LEVEL]` prefix.
#[derive(Clone)]
pub struct ColorLogger {
    max_level: LevelFilter,
}

impl ColorLogger {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        let max_level = if quiet {
            LevelFilter::Off
        } else if verbose {
            LevelFilter::Trace
        } else {
            LevelFilter::Info
        };
        Self { max_level }
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.max_level
    }
}

impl log::Log for ColorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!(
                "{} {}",
                "[ERROR]".red().bold(),
                format!("{}", record.args()).red().bold()
            ),
            Level::Warn => eprintln!(
                "{} {}",
                "[WARN]".yellow().bold(),
                format!("{}", record.args()).yellow().bold()
            ),
            _ => eprintln!(
                "[{}] {}",
                record.level().to_string().blue(),
                record.args()
            ),
        }
        self.flush();
    }

    fn flush(&self) {
        // Nothing useful to do if stderr itself is gone.
        let _ = io::stderr().flush();
    }
}
