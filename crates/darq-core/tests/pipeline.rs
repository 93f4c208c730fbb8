//! End-to-end pipeline scenarios with a recording mailer and an in-memory
//! directory.

use async_trait::async_trait;
use chrono::NaiveDate;
use darq_core::pipeline::{NotificationSent, SkipReason};
use darq_core::{
    DarqError, DirectoryResolver, IncidentPipeline, IncidentRecord, Mailer, ManagerProfile,
    Notification, PipelineOutcome, PolicyConfig, QuarantineResult, Region, RuleCatalog, ShareMap,
    UserProfile,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<Notification>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, notification: &Notification) -> Result<(), DarqError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 5, 20).unwrap()
}

fn test_config(tmp: &Path) -> PolicyConfig {
    let mut quarantine_roots = HashMap::new();
    quarantine_roots.insert(Region::NorthAmerica, tmp.join("quarantine-na"));
    quarantine_roots.insert(Region::Europe, tmp.join("quarantine-eu"));

    PolicyConfig {
        quarantine_roots,
        audit_routes: vec![],
        audit_fallback_root: tmp.join("logs"),
        ..Default::default()
    }
}

/// A source file whose path carries the KNX (North America) site token.
fn write_source(tmp: &Path, name: &str) -> PathBuf {
    let dir = tmp.join("shares").join("KNX").join("finance");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, b"4111-1111-1111-1111").unwrap();
    path
}

fn incident(file_path: &str, owner_id: &str, resource_type: &str) -> IncidentRecord {
    let ts = today().and_hms_opt(14, 12, 11).unwrap();
    IncidentRecord {
        incident_id: "4211337".into(),
        detect_time: ts,
        match_counts: vec![120, 12],
        matched_samples: vec!["XXX-XX-1234".into()],
        owner_id: owner_id.into(),
        file_path: file_path.into(),
        accessed_time: ts,
        modified_time: ts,
        resource_type: resource_type.into(),
        analyzed_by: "Policy Engine KNX01".into(),
        rule_ids: vec!["18794".into()],
    }
}

fn pipeline(
    config: PolicyConfig,
    resolver: Arc<dyn DirectoryResolver>,
    mailer: Arc<RecordingMailer>,
) -> IncidentPipeline {
    IncidentPipeline::new(config, RuleCatalog::production(), ShareMap::empty(), resolver, mailer)
}

fn directory_with_owner() -> darq_core::directory::StaticDirectory {
    darq_core::directory::StaticDirectory::new()
        .with_user(
            Region::NorthAmerica,
            "jsmith",
            UserProfile {
                full_name: "Jane Smith".into(),
                email: "jane.smith@example.com".into(),
                manager_id: "CN=Max Mgr".into(),
                phone: "555-0100".into(),
                title: "Analyst".into(),
                department: "Finance".into(),
            },
        )
        .with_manager(
            Region::NorthAmerica,
            "CN=Max Mgr",
            ManagerProfile { name: "Max Mgr".into(), email: "max.mgr@example.com".into() },
        )
}

#[tokio::test]
async fn owned_file_is_quarantined_and_owner_notified() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "cards.xlsx");
    let mailer = Arc::new(RecordingMailer::default());
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    let report = p
        .process_on(incident(&source.display().to_string(), r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    let PipelineOutcome::Processed { quarantine, notification } = report.outcome else {
        panic!("expected Processed");
    };
    assert_eq!(notification, NotificationSent::OwnerNotice);
    let QuarantineResult::Moved { destination, tombstone, .. } = quarantine else {
        panic!("expected Moved");
    };

    // Destination is region- and owner-bucketed, date-partitioned.
    assert!(destination.starts_with(
        tmp.path().join("quarantine-na").join("Automated").join("jsmith").join("2019-05-20")
    ));
    assert!(!source.exists());
    assert!(tombstone.exists());

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "jane.smith@example.com");
    assert_eq!(sent[0].cc.as_deref(), Some("max.mgr@example.com"));
    assert!(sent[0].text_body.contains("Aug 18, 2019")); // 90-day retention

    // Audit row landed under the fallback root (no site token in tmp paths).
    let log = tmp.path().join("logs").join("2019-05-20").join("quarantine_log.csv");
    assert!(log.exists());
}

#[tokio::test]
async fn non_network_scan_is_skipped_entirely() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "cards.xlsx");
    let mailer = Arc::new(RecordingMailer::default());
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    let report = p
        .process_on(incident(&source.display().to_string(), r"NA\jsmith", "DISCOVERY"), today())
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Skipped(SkipReason::NotNetworkScan)
    ));
    assert!(source.exists(), "no file move for a skipped incident");
    assert!(!tmp.path().join("logs").exists(), "no log entry for a skipped incident");
    assert!(mailer.sent.lock().unwrap().is_empty(), "no mail for a skipped incident");
}

#[tokio::test]
async fn unknown_region_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    // No site token anywhere in the path; the skip happens before any
    // filesystem access, so the file does not need to exist.
    let report = p
        .process_on(incident(r"\\fileserver\misc\cards.xlsx", r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    assert!(matches!(
        report.outcome,
        PipelineOutcome::Skipped(SkipReason::UndeterminedRegion)
    ));
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn service_account_goes_to_administrator_bucket() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "cards.xlsx");
    let mailer = Arc::new(RecordingMailer::default());
    // Directory knows the owner, but the prefix is unrecognized: the
    // resolver outcome must not matter.
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    let report = p
        .process_on(incident(&source.display().to_string(), r"SYSTEM\svc-scan", "NETWORK"), today())
        .await
        .unwrap();

    let PipelineOutcome::Processed { quarantine, notification } = report.outcome else {
        panic!("expected Processed");
    };
    assert_eq!(notification, NotificationSent::NoOwnerNotice);
    let QuarantineResult::Moved { destination, .. } = quarantine else { panic!() };
    assert!(destination.starts_with(
        tmp.path().join("quarantine-na").join("Automated").join("Administrator")
    ));

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "NOTICE: A file has been quarantined");
}

#[tokio::test]
async fn unresolved_owner_still_quarantines_with_no_owner_notice() {
    let tmp = tempfile::tempdir().unwrap();
    let source = write_source(tmp.path(), "cards.xlsx");
    let mailer = Arc::new(RecordingMailer::default());
    // Empty directory: a validly-prefixed owner resolves to nothing.
    let p = pipeline(
        test_config(tmp.path()),
        Arc::new(darq_core::directory::StaticDirectory::new()),
        mailer.clone(),
    );

    let report = p
        .process_on(incident(&source.display().to_string(), r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    let PipelineOutcome::Processed { quarantine, notification } = report.outcome else {
        panic!("expected Processed");
    };
    assert!(quarantine.moved());
    assert_eq!(notification, NotificationSent::NoOwnerNotice);
    assert!(!source.exists());
}

#[tokio::test]
async fn missing_source_suppresses_notification() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("shares").join("KNX");
    std::fs::create_dir_all(&dir).unwrap();
    let ghost = dir.join("gone.xlsx");

    let mailer = Arc::new(RecordingMailer::default());
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    let report = p
        .process_on(incident(&ghost.display().to_string(), r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    let PipelineOutcome::Processed { quarantine, notification } = report.outcome else {
        panic!("expected Processed");
    };
    assert!(!quarantine.moved());
    assert_eq!(notification, NotificationSent::Suppressed);
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn repeat_quarantine_gets_suffixed_name() {
    let tmp = tempfile::tempdir().unwrap();
    let mailer = Arc::new(RecordingMailer::default());
    let p = pipeline(test_config(tmp.path()), Arc::new(directory_with_owner()), mailer.clone());

    let first = write_source(tmp.path(), "report.pdf");
    let r1 = p
        .process_on(incident(&first.display().to_string(), r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    let second = write_source(tmp.path(), "report.pdf");
    let r2 = p
        .process_on(incident(&second.display().to_string(), r"NA\jsmith", "NETWORK"), today())
        .await
        .unwrap();

    let dest = |r: darq_core::PipelineReport| match r.outcome {
        PipelineOutcome::Processed {
            quarantine: QuarantineResult::Moved { destination, .. },
            ..
        } => destination,
        other => panic!("expected Moved, got {other:?}"),
    };

    let d1 = dest(r1);
    let d2 = dest(r2);
    assert_ne!(d1, d2);
    assert_eq!(d2.file_name().unwrap().to_str().unwrap(), "report(1).pdf");
}
