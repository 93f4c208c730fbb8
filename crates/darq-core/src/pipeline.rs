//! Incident Pipeline
//!
//! The orchestrator: one incident in, one terminal state out. Strictly
//! sequential, no loops, no re-entry:
//!
//! ```text
//! Parsed -> Enriched -> { Skipped | Resolved -> Quarantined -> Notified }
//! ```
//!
//! Resolver failures never block the quarantine step; they only force the
//! no-owner notification branch. A failed move suppresses notification
//! entirely.

use crate::classify::RuleCatalog;
use crate::config::PolicyConfig;
use crate::directory::{DirectoryResolver, ManagerProfile, UserProfile};
use crate::error::DarqError;
use crate::incident::{EnrichedIncident, IncidentRecord};
use crate::notify::Mailer;
use crate::quarantine::{QuarantineResult, QuarantineStore, TombstoneContext};
use crate::region::{OwnerId, Region};
use crate::sharemap::{split_display_path, ShareMap};
use chrono::{Duration, Local, NaiveDate};
use std::path::PathBuf;
use std::sync::Arc;

/// Network file share scan; the only resource type handled automatically.
const NETWORK_SCAN: &str = "NETWORK";

/// Why an incident was not handled automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `resource_type` does not indicate a network-share scan.
    NotNetworkScan,
    /// No site-code token matched the file path.
    UndeterminedRegion,
}

/// Which notification branch ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSent {
    OwnerNotice,
    NoOwnerNotice,
    /// Move failed; no mail is sent for the incident.
    Suppressed,
}

/// Terminal pipeline state.
#[derive(Debug)]
pub enum PipelineOutcome {
    Skipped(SkipReason),
    Processed {
        quarantine: QuarantineResult,
        notification: NotificationSent,
    },
}

/// Result of one pipeline invocation.
#[derive(Debug)]
pub struct PipelineReport {
    pub incident_id: String,
    pub outcome: PipelineOutcome,
}

pub struct IncidentPipeline {
    config: PolicyConfig,
    catalog: RuleCatalog,
    share_map: ShareMap,
    resolver: Arc<dyn DirectoryResolver>,
    mailer: Arc<dyn Mailer>,
    store: QuarantineStore,
}

impl IncidentPipeline {
    pub fn new(
        config: PolicyConfig,
        catalog: RuleCatalog,
        share_map: ShareMap,
        resolver: Arc<dyn DirectoryResolver>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let store = QuarantineStore::new(config.audit_log());
        Self { config, catalog, share_map, resolver, mailer, store }
    }

    /// Run one incident through to a terminal state.
    pub async fn process(&self, record: IncidentRecord) -> Result<PipelineReport, DarqError> {
        self.process_on(record, Local::now().date_naive()).await
    }

    /// Same as [`process`](Self::process) with an explicit "today".
    pub async fn process_on(
        &self,
        record: IncidentRecord,
        today: NaiveDate,
    ) -> Result<PipelineReport, DarqError> {
        let incident_id = record.incident_id.clone();
        let deletion_date =
            (today + Duration::days(self.config.retention_days)).format("%b %d, %Y").to_string();

        // Parsed -> Enriched
        let enriched = EnrichedIncident::enrich(
            record,
            &self.catalog,
            &self.share_map,
            &self.config.site_tokens,
            deletion_date,
        );

        // Enriched -> Skipped
        if enriched.record.resource_type != NETWORK_SCAN {
            tracing::info!(%incident_id, resource_type = %enriched.record.resource_type, "skipped: not a network-share scan");
            return Ok(PipelineReport {
                incident_id,
                outcome: PipelineOutcome::Skipped(SkipReason::NotNetworkScan),
            });
        }
        let Some(region) = enriched.region else {
            tracing::info!(%incident_id, path = %enriched.record.file_path, "skipped: no region token in path");
            return Ok(PipelineReport {
                incident_id,
                outcome: PipelineOutcome::Skipped(SkipReason::UndeterminedRegion),
            });
        };

        // Enriched -> Resolved
        let owner = OwnerId::parse(&enriched.record.owner_id);
        let (profile, manager, dest_dir) = match &owner {
            OwnerId::User { login, .. } => {
                let profile = self.resolver.resolve_user(login, region).await.found();
                let manager = match &profile {
                    Some(p) if !p.manager_id.is_empty() => {
                        self.resolver.resolve_manager(&p.manager_id, region).await.found()
                    }
                    _ => None,
                };
                (profile, manager, self.destination_dir(region, login, today))
            }
            // Administrative/system account path: quarantine to the
            // Administrator bucket, always no-owner notification.
            OwnerId::Unrecognized(_) => {
                (None, None, self.destination_dir(region, "Administrator", today))
            }
        };

        std::fs::create_dir_all(&dest_dir).map_err(|e| DarqError::io(&dest_dir, e))?;

        // Resolved -> Quarantined
        let source = PathBuf::from(&enriched.record.file_path);
        let (_, base_name) = split_display_path(&enriched.record.file_path);
        let ctx = TombstoneContext {
            date: today,
            incident_id: enriched.record.incident_id.clone(),
            display_folder_path: enriched.display_folder_path.clone(),
            display_file_name: enriched.display_file_name.clone(),
            deletion_date: enriched.deletion_date.clone(),
            policy_url: self.config.policy_url.clone(),
        };
        let quarantine = self.store.quarantine(&source, &dest_dir, &base_name, &ctx);

        // Quarantined -> Notified
        let notification = if quarantine.moved() {
            self.notify(&owner, &enriched, profile.as_ref(), manager.as_ref()).await?
        } else {
            NotificationSent::Suppressed
        };

        Ok(PipelineReport {
            incident_id,
            outcome: PipelineOutcome::Processed { quarantine, notification },
        })
    }

    /// The owner branch requires both a moved file and a non-empty
    /// resolved owner address; everything else takes the no-owner branch.
    async fn notify(
        &self,
        owner: &OwnerId,
        enriched: &EnrichedIncident,
        profile: Option<&UserProfile>,
        manager: Option<&ManagerProfile>,
    ) -> Result<NotificationSent, DarqError> {
        let composer = self.config.composer();

        match (owner, profile) {
            (OwnerId::User { .. }, Some(user)) if !user.email.is_empty() => {
                let notice = composer.owner_notice(enriched, user, manager);
                self.mailer.send(&notice).await?;
                Ok(NotificationSent::OwnerNotice)
            }
            _ => {
                let notice = composer.no_owner_notice(enriched);
                self.mailer.send(&notice).await?;
                Ok(NotificationSent::NoOwnerNotice)
            }
        }
    }

    /// Region-specific, date-partitioned destination directory.
    fn destination_dir(&self, region: Region, bucket: &str, today: NaiveDate) -> PathBuf {
        self.config
            .quarantine_root(region)
            .join("Automated")
            .join(bucket)
            .join(today.format("%Y-%m-%d").to_string())
    }
}

impl std::fmt::Debug for IncidentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncidentPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
