//! Directory Resolution
//!
//! Resolves a login identifier to user and manager profiles through the
//! corporate directory. Lookup failures of any kind (transport error,
//! empty result, absent identifier) are downgraded to [`ResolveOutcome::NotFound`];
//! the pipeline treats them all the same way and never lets them block the
//! quarantine step.

use crate::region::Region;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Directory attributes for a resolved file owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    /// Directory reference to the manager, empty when unset.
    pub manager_id: String,
    pub phone: String,
    pub title: String,
    pub department: String,
}

/// Directory attributes for a resolved manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManagerProfile {
    pub name: String,
    pub email: String,
}

/// Explicit lookup result; errors never escape the resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome<T> {
    Found(T),
    NotFound,
}

impl<T> ResolveOutcome<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(v) => Some(v),
            Self::NotFound => None,
        }
    }
}

/// Boundary contract toward the corporate directory.
///
/// `region` selects which directory partition is queried.
#[async_trait]
pub trait DirectoryResolver: Send + Sync {
    async fn resolve_user(&self, login: &str, region: Region) -> ResolveOutcome<UserProfile>;

    async fn resolve_manager(
        &self,
        manager_ref: &str,
        region: Region,
    ) -> ResolveOutcome<ManagerProfile>;
}

/// Directory facade client querying a per-region REST endpoint.
pub struct RestDirectory {
    client: reqwest::Client,
    endpoints: HashMap<Region, String>,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(default)]
    name: String,
    #[serde(default)]
    mail: String,
    #[serde(default)]
    manager: String,
    #[serde(default, rename = "telephoneNumber")]
    telephone_number: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    department: String,
}

impl RestDirectory {
    pub fn new(endpoints: HashMap<Region, String>) -> Self {
        Self { client: reqwest::Client::new(), endpoints }
    }

    async fn fetch(&self, region: Region, kind: &str, key: &str) -> Option<UserRecord> {
        let base = self.endpoints.get(&region)?;
        let url = format!("{base}/{kind}");

        let response = match self.client.get(&url).query(&[("id", key)]).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(region = %region, kind, error = %e, "directory request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(region = %region, kind, status = %response.status(), "directory miss");
            return None;
        }

        response.json::<UserRecord>().await.ok()
    }
}

#[async_trait]
impl DirectoryResolver for RestDirectory {
    async fn resolve_user(&self, login: &str, region: Region) -> ResolveOutcome<UserProfile> {
        match self.fetch(region, "users", login).await {
            Some(rec) if !rec.mail.is_empty() || !rec.name.is_empty() => {
                ResolveOutcome::Found(UserProfile {
                    full_name: rec.name,
                    email: rec.mail,
                    manager_id: rec.manager,
                    phone: rec.telephone_number,
                    title: rec.title,
                    department: rec.department,
                })
            }
            _ => ResolveOutcome::NotFound,
        }
    }

    async fn resolve_manager(
        &self,
        manager_ref: &str,
        region: Region,
    ) -> ResolveOutcome<ManagerProfile> {
        match self.fetch(region, "managers", manager_ref).await {
            Some(rec) if !rec.mail.is_empty() => {
                ResolveOutcome::Found(ManagerProfile { name: rec.name, email: rec.mail })
            }
            _ => ResolveOutcome::NotFound,
        }
    }
}

/// In-memory directory, keyed by `(region, login)`. Used by tests and
/// offline runs.
#[derive(Default)]
pub struct StaticDirectory {
    users: HashMap<(Region, String), UserProfile>,
    managers: HashMap<(Region, String), ManagerProfile>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, region: Region, login: &str, profile: UserProfile) -> Self {
        self.users.insert((region, login.to_string()), profile);
        self
    }

    pub fn with_manager(mut self, region: Region, key: &str, profile: ManagerProfile) -> Self {
        self.managers.insert((region, key.to_string()), profile);
        self
    }
}

#[async_trait]
impl DirectoryResolver for StaticDirectory {
    async fn resolve_user(&self, login: &str, region: Region) -> ResolveOutcome<UserProfile> {
        match self.users.get(&(region, login.to_string())) {
            Some(p) => ResolveOutcome::Found(p.clone()),
            None => ResolveOutcome::NotFound,
        }
    }

    async fn resolve_manager(
        &self,
        manager_ref: &str,
        region: Region,
    ) -> ResolveOutcome<ManagerProfile> {
        match self.managers.get(&(region, manager_ref.to_string())) {
            Some(p) => ResolveOutcome::Found(p.clone()),
            None => ResolveOutcome::NotFound,
        }
    }
}
