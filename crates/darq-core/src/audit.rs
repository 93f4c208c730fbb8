//! Quarantine Audit Log
//!
//! Append-only CSV, one physical file per calendar day per destination
//! site: `<root>/<YYYY-MM-DD>/quarantine_log.csv`. The root is picked by a
//! substring test on the quarantine destination against a fixed route
//! table, with a generic fallback. No cross-process locking: one incident
//! is processed per invocation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "quarantine_log.csv";
const LOG_HEADER: &str =
    "Date Quarantined,Original File Path,Original File Directory,Original File Name,Quarantine File Path";

/// One audit route: destinations containing `site_token` log under `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRoute {
    pub site_token: String,
    pub root: PathBuf,
}

/// Route table plus the fallback root for destinations matching no site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub routes: Vec<LogRoute>,
    pub fallback_root: PathBuf,
}

/// One appended row.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub date: NaiveDate,
    pub original_path: String,
    pub original_directory: String,
    pub original_file_name: String,
    pub quarantine_path: String,
}

impl AuditLog {
    /// Log file for a given destination and date; routing is a fixed
    /// substring lookup, not a computed rule.
    pub fn log_path_for(&self, destination: &str, date: NaiveDate) -> PathBuf {
        let root = self
            .routes
            .iter()
            .find(|r| destination.contains(r.site_token.as_str()))
            .map(|r| r.root.clone())
            .unwrap_or_else(|| self.fallback_root.clone());

        root.join(date.format("%Y-%m-%d").to_string()).join(LOG_FILE_NAME)
    }

    /// Append one row, creating the day directory and header row if absent.
    pub fn append(&self, destination: &str, entry: &AuditEntry) -> std::io::Result<PathBuf> {
        let path = self.log_path_for(destination, entry.date);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let is_new = !path.exists();
        let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
        if is_new {
            writeln!(file, "{LOG_HEADER}")?;
        }
        writeln!(
            file,
            "{},{},{},{},{}",
            entry.date.format("%Y-%m-%d"),
            entry.original_path,
            entry.original_directory,
            entry.original_file_name,
            entry.quarantine_path,
        )?;

        Ok(path)
    }
}
