//! Policy Configuration
//!
//! Every lookup table the pipeline consults (quarantine roots, audit-log
//! routes, site-code tokens, mailboxes) lives here as immutable data
//! constructed once at startup and passed explicitly into the components.

use crate::audit::{AuditLog, LogRoute};
use crate::error::DarqError;
use crate::notify::NotificationComposer;
use crate::region::{Region, SiteTokens};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Mail relay accepting unauthenticated internal submissions.
    pub relay_host: String,
    pub relay_port: u16,

    pub from_address: String,
    /// Always-notified security mailbox.
    pub security_mailbox: String,
    /// Fallback recipient for the no-owner branch.
    pub admin_mailbox: String,
    /// Remediation FAQ linked from tombstones and notifications.
    pub policy_url: String,

    /// Share-enumeration CSV consumed by the path translator.
    pub share_map_path: PathBuf,

    /// Days until a quarantined file is deleted.
    pub retention_days: i64,

    pub site_tokens: SiteTokens,

    /// Per-region quarantine site roots.
    pub quarantine_roots: HashMap<Region, PathBuf>,

    /// Audit-log routing: site token to log root, plus generic fallback.
    pub audit_routes: Vec<LogRoute>,
    pub audit_fallback_root: PathBuf,

    /// Per-region directory facade endpoints.
    pub directory_endpoints: HashMap<Region, String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let mut quarantine_roots = HashMap::new();
        quarantine_roots.insert(
            Region::NorthAmerica,
            PathBuf::from(r"\\SVPKNXSZDATA01\Quarantine"),
        );
        quarantine_roots.insert(Region::Europe, PathBuf::from(r"\\SVPCTYSZDATA01\Quarantine"));

        let mut directory_endpoints = HashMap::new();
        directory_endpoints.insert(
            Region::NorthAmerica,
            "https://directory.na.global.prv/api".to_string(),
        );
        directory_endpoints.insert(Region::Europe, "https://directory.eu.global.prv/api".to_string());

        Self {
            relay_host: "mailrelay.global.prv".into(),
            relay_port: 25,
            from_address: "DLP-Admin-Quarantine@example.com".into(),
            security_mailbox: "dlp-engineering@example.com".into(),
            admin_mailbox: "DLP-Admin@example.com".into(),
            policy_url: "https://intranet.example.com/dlp-remediation-faq".into(),
            share_map_path: PathBuf::from(r"\\na\departments\_Anyshare\ShareEnum\sharelist.csv"),
            retention_days: 90,
            site_tokens: SiteTokens::default(),
            quarantine_roots,
            audit_routes: vec![
                LogRoute {
                    site_token: "KNXSZDATA01".into(),
                    root: PathBuf::from(r"\\SVPKNXSZDATA01\Quarantine\Logs"),
                },
                LogRoute {
                    site_token: "CTYSZDATA01".into(),
                    root: PathBuf::from(r"\\SVPCTYSZDATA01\Quarantine\Logs"),
                },
            ],
            audit_fallback_root: PathBuf::from(r"\\svpknxdfsr01\departments\GIS-DLP\Logs"),
            directory_endpoints,
        }
    }
}

impl PolicyConfig {
    pub fn load(path: &Path) -> Result<Self, DarqError> {
        let content = std::fs::read_to_string(path).map_err(|e| DarqError::io(path, e))?;
        toml::from_str(&content).map_err(|e| DarqError::Config(e.to_string()))
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), DarqError> {
        for (name, value) in [
            ("relay_host", &self.relay_host),
            ("from_address", &self.from_address),
            ("security_mailbox", &self.security_mailbox),
            ("admin_mailbox", &self.admin_mailbox),
        ] {
            if value.is_empty() {
                return Err(DarqError::Config(format!("{name} must not be empty")));
            }
        }
        for region in [Region::NorthAmerica, Region::Europe] {
            if !self.quarantine_roots.contains_key(&region) {
                return Err(DarqError::Config(format!("no quarantine root for {region}")));
            }
        }
        Ok(())
    }

    pub fn quarantine_root(&self, region: Region) -> &Path {
        // validate() guarantees both regions are present.
        &self.quarantine_roots[&region]
    }

    pub fn audit_log(&self) -> AuditLog {
        AuditLog {
            routes: self.audit_routes.clone(),
            fallback_root: self.audit_fallback_root.clone(),
        }
    }

    pub fn composer(&self) -> NotificationComposer {
        NotificationComposer {
            from_address: self.from_address.clone(),
            security_mailbox: self.security_mailbox.clone(),
            admin_mailbox: self.admin_mailbox.clone(),
            policy_url: self.policy_url.clone(),
        }
    }
}
