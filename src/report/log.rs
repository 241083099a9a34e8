//! Append-only opportunity log.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;

use crate::signal::Opportunity;

/// Persistent text sink for detected opportunities, one line each.
#[derive(Debug, Clone)]
pub struct OpportunityLog {
    path: PathBuf,
}

impl OpportunityLog {
    /// Create a log writing to the given path. The file is created on
    /// first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one human-readable line for the opportunity.
    ///
    /// Opens, writes, and flushes per call so no line is lost on
    /// shutdown.
    pub fn append(&self, opportunity: &Opportunity) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let timestamp = opportunity
            .detected_at
            .format(&Rfc3339)
            .unwrap_or_else(|_| opportunity.detected_at.unix_timestamp().to_string());

        writeln!(file, "{timestamp} {opportunity}")?;
        file.flush()
    }
}
