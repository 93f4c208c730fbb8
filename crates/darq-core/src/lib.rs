//! Data-at-Rest Quarantine Policy Engine
//!
//! Per-incident remediation for DLP discovery scans: a file flagged as
//! containing unsecured sensitive data is relocated into a quarantine
//! store, a tombstone is left in its place, the action is recorded in a
//! date-partitioned audit log, and the file owner (or a fallback
//! administrative mailbox) is notified by mail.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Incident Pipeline                          │
//! │                                                              │
//! │  ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌───────────┐ │
//! │  │ Incident │   │   Rule   │   │  Share   │   │  Region   │ │
//! │  │  Parser  │──▶│ Catalog  │──▶│   Map    │──▶│ Derivation│ │
//! │  └──────────┘   └──────────┘   └──────────┘   └─────┬─────┘ │
//! │                                                      │       │
//! │              ┌───────────────┬───────────────────────┘       │
//! │              ▼               ▼                               │
//! │      ┌──────────────┐ ┌──────────────┐  ┌────────────────┐  │
//! │      │  Directory   │ │  Quarantine  │  │  Notification  │  │
//! │      │  Resolver    │ │    Store     │─▶│   Composer     │  │
//! │      └──────────────┘ └──────┬───────┘  └────────────────┘  │
//! │                              ▼                               │
//! │                   tombstone + audit log                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod audit;
pub mod classify;
pub mod config;
pub mod directory;
pub mod error;
pub mod incident;
pub mod notify;
pub mod pipeline;
pub mod quarantine;
pub mod region;
pub mod sharemap;

pub use classify::{RuleCatalog, Severity};
pub use config::PolicyConfig;
pub use directory::{DirectoryResolver, ManagerProfile, ResolveOutcome, UserProfile};
pub use error::DarqError;
pub use incident::{EnrichedIncident, IncidentRecord};
pub use notify::{Mailer, Notification};
pub use pipeline::{IncidentPipeline, PipelineOutcome, PipelineReport};
pub use quarantine::{QuarantineResult, QuarantineStore};
pub use region::{OwnerId, Region};
pub use sharemap::ShareMap;
