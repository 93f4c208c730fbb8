//! Share Path Translation
//!
//! Rewrites an internal administrative share path (`\\host\K$\...`) into
//! the human-friendly display path users recognize, driven by an external
//! share-enumeration CSV. Falls back to the raw path when nothing matches.

use crate::error::DarqError;
use std::path::Path;

/// One share-root mapping row.
#[derive(Debug, Clone)]
pub struct ShareMapping {
    /// Administrative form of the share root (`:` replaced by `$`, uppercased).
    pub admin_root: String,
    /// Display alias substituted for the root.
    pub alias: String,
}

/// Share-root to display-alias mapping table.
///
/// Row order is significant: the first row whose root matches the path
/// wins. Two roots carry fixed literal aliases that override whatever the
/// table says for them.
#[derive(Debug, Clone, Default)]
pub struct ShareMap {
    rows: Vec<ShareMapping>,
}

/// Fixed alias overrides, keyed by normalized admin root.
const ALIAS_OVERRIDES: &[(&str, &str)] = &[
    (r"K$\KNOXVILLE\DEPARTMENTS", "KnoxvilleDept"),
    (r"F$\ATLANTA\DEPARTMENTS", "AtlantaDept"),
];

impl ShareMap {
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn new(rows: Vec<ShareMapping>) -> Self {
        Self { rows }
    }

    /// Load the share-enumeration CSV. Each row is
    /// `(ignored, display_alias, share_root)`; the whole file is consumed
    /// into memory before any translation happens.
    pub fn load(path: &Path) -> Result<Self, DarqError> {
        let content = std::fs::read_to_string(path).map_err(|e| DarqError::io(path, e))?;

        let mut rows = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() < 3 {
                return Err(DarqError::Config(format!(
                    "share map row has {} fields, expected 3: '{line}'",
                    fields.len()
                )));
            }
            rows.push(ShareMapping {
                admin_root: fields[2].trim().replace(':', "$").to_uppercase(),
                alias: fields[1].trim().to_string(),
            });
        }

        Ok(Self::new(rows))
    }

    /// Translate an administrative path into display `(folder, file_name)`.
    ///
    /// The first row whose admin root appears (case-insensitively) in the
    /// path wins; the root is replaced by its alias and the result is
    /// lowercased. With no matching row the raw path is split as-is.
    pub fn translate(&self, admin_path: &str) -> (String, String) {
        let upper = admin_path.to_uppercase();

        for row in &self.rows {
            if !upper.contains(&row.admin_root) {
                continue;
            }
            let alias = ALIAS_OVERRIDES
                .iter()
                .find(|(root, _)| *root == row.admin_root)
                .map(|(_, alias)| *alias)
                .unwrap_or(row.alias.as_str());

            let display = upper.replace(&row.admin_root, alias).to_lowercase();
            return split_display_path(&display);
        }

        split_display_path(admin_path)
    }
}

/// Split a display path into `(folder, file_name)`.
///
/// Administrative paths are UNC style, so both separators are honored
/// regardless of host platform.
pub fn split_display_path(path: &str) -> (String, String) {
    match path.rfind(['\\', '/']) {
        Some(idx) => (path[..idx].to_string(), path[idx + 1..].to_string()),
        None => (String::new(), path.to_string()),
    }
}
