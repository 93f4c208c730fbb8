//! Quarantine Store
//!
//! Relocates an offending file into the quarantine destination with
//! collision-avoiding renaming, leaves a tombstone at the original
//! location, and records the action in the audit log.
//!
//! Move failures never propagate: they downgrade to
//! [`QuarantineResult::NotMoved`] and the caller branches on the variant.
//! Bookkeeping failures after a successful move (tombstone write, log
//! append) are logged and surfaced as warnings on the result; the move
//! stands.

use crate::audit::{AuditEntry, AuditLog};
use crate::notify;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const TOMBSTONE_TEMPLATE: &str = include_str!("../templates/tombstone.txt");

/// Outcome of one quarantine attempt.
#[derive(Debug, Clone)]
pub enum QuarantineResult {
    Moved {
        /// Final destination; may differ from the requested one due to
        /// collision renaming.
        destination: PathBuf,
        /// Tombstone left at the original directory.
        tombstone: PathBuf,
        /// Bookkeeping steps that failed after the move succeeded.
        warnings: Vec<String>,
    },
    NotMoved {
        reason: String,
    },
}

impl QuarantineResult {
    pub fn moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Fields rendered into the tombstone text.
#[derive(Debug, Clone)]
pub struct TombstoneContext {
    pub date: NaiveDate,
    pub incident_id: String,
    pub display_folder_path: String,
    pub display_file_name: String,
    pub deletion_date: String,
    pub policy_url: String,
}

/// Quarantine destination store.
pub struct QuarantineStore {
    audit: AuditLog,
}

impl QuarantineStore {
    pub fn new(audit: AuditLog) -> Self {
        Self { audit }
    }

    /// Move `source` into `dest_dir` under `base_name`, avoiding
    /// collisions with `base(1).ext`, `base(2).ext`, ... (smallest unused
    /// positive suffix). On success, write the tombstone and append the
    /// audit row.
    pub fn quarantine(
        &self,
        source: &Path,
        dest_dir: &Path,
        base_name: &str,
        ctx: &TombstoneContext,
    ) -> QuarantineResult {
        let destination = next_free_destination(dest_dir, base_name);

        if let Err(e) = move_file(source, &destination) {
            tracing::warn!(
                source = %source.display(),
                destination = %destination.display(),
                error = %e,
                "quarantine move failed"
            );
            return QuarantineResult::NotMoved { reason: e.to_string() };
        }

        tracing::info!(
            incident_id = %ctx.incident_id,
            destination = %destination.display(),
            "file quarantined"
        );

        let mut warnings = Vec::new();

        let tombstone = tombstone_path(source);
        if let Err(e) = std::fs::write(&tombstone, render_tombstone(ctx)) {
            tracing::error!(path = %tombstone.display(), error = %e, "tombstone write failed");
            warnings.push(format!("tombstone write failed: {e}"));
        }

        let entry = AuditEntry {
            date: ctx.date,
            original_path: source.display().to_string(),
            original_directory: source
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            original_file_name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            quarantine_path: destination.display().to_string(),
        };
        if let Err(e) = self.audit.append(&destination.display().to_string(), &entry) {
            tracing::error!(error = %e, "audit log append failed");
            warnings.push(format!("audit log append failed: {e}"));
        }

        QuarantineResult::Moved { destination, tombstone, warnings }
    }
}

/// `dest_dir/base_name`, or the first `stem(n).ext` not already in use.
fn next_free_destination(dest_dir: &Path, base_name: &str) -> PathBuf {
    let initial = dest_dir.join(base_name);
    if !initial.exists() {
        return initial;
    }

    let stem = initial
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| base_name.to_string());
    let ext = initial
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = dest_dir.join(format!("{stem}({counter}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Rename when possible, copy-and-remove across devices.
fn move_file(source: &Path, destination: &Path) -> std::io::Result<()> {
    match std::fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(_) => {
            std::fs::copy(source, destination)?;
            std::fs::remove_file(source)
        }
    }
}

fn tombstone_path(source: &Path) -> PathBuf {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{name}.txt"))
}

fn render_tombstone(ctx: &TombstoneContext) -> String {
    notify::render(
        TOMBSTONE_TEMPLATE,
        &[
            ("quarantine_date", ctx.date.format("%m/%d/%Y").to_string()),
            ("incident_id", ctx.incident_id.clone()),
            ("folder_path", ctx.display_folder_path.clone()),
            ("file_name", ctx.display_file_name.clone()),
            ("deletion_date", ctx.deletion_date.clone()),
            ("policy_url", ctx.policy_url.clone()),
        ],
    )
}
