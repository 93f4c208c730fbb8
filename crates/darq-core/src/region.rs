//! Region Derivation
//!
//! A quarantine region is inferred from site-code tokens embedded in the
//! administrative file path. The region governs which directory partition
//! is queried and which quarantine site receives the file.

use serde::{Deserialize, Serialize};

/// Quarantine region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    NorthAmerica,
    Europe,
}

/// Site-code token lists used to derive a region from a file path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteTokens {
    pub north_america: Vec<String>,
    pub europe: Vec<String>,
}

impl Default for SiteTokens {
    fn default() -> Self {
        let to_vec = |codes: &[&str]| codes.iter().map(|s| s.to_string()).collect();
        Self {
            north_america: to_vec(&["KNX", "ATL", "DEN", "LAR", "ONT", "MEX", "TOR", "PLS", "QTR"]),
            europe: to_vec(&["IXN", "CTY", "WAT", "LON", "MAD", "SVRFRA", "SVROSL"]),
        }
    }
}

impl Region {
    /// Derive a region from site-code tokens in the file path.
    ///
    /// Matching is a case-insensitive substring test. A path carrying
    /// tokens from both lists resolves to Europe. No token means the
    /// incident is not eligible for automated handling.
    pub fn from_path(path: &str, tokens: &SiteTokens) -> Option<Region> {
        let upper = path.to_uppercase();

        if tokens.europe.iter().any(|t| upper.contains(t.as_str())) {
            return Some(Region::Europe);
        }
        if tokens.north_america.iter().any(|t| upper.contains(t.as_str())) {
            return Some(Region::NorthAmerica);
        }
        None
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NorthAmerica => "North America",
            Self::Europe => "Europe",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed owner identifier.
///
/// A recognized owner carries a region-qualified `NA\login` or `EU\login`
/// form. Anything else (service accounts, bare SIDs) is treated as an
/// administrative identity: the file is still quarantined, into the
/// Administrator bucket, and notification always takes the no-owner branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerId {
    /// Region-qualified user account; `login` is the bare sAMAccountName.
    User { domain: Region, login: String },
    /// No recognized region prefix.
    Unrecognized(String),
}

impl OwnerId {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('\\') {
            Some(("NA", login)) if !login.is_empty() => OwnerId::User {
                domain: Region::NorthAmerica,
                login: login.to_string(),
            },
            Some(("EU", login)) if !login.is_empty() => OwnerId::User {
                domain: Region::Europe,
                login: login.to_string(),
            },
            _ => OwnerId::Unrecognized(raw.to_string()),
        }
    }

    /// Bare login for recognized users.
    pub fn login(&self) -> Option<&str> {
        match self {
            OwnerId::User { login, .. } => Some(login),
            OwnerId::Unrecognized(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_from_path() {
        let tokens = SiteTokens::default();
        assert_eq!(
            Region::from_path(r"\\svpknxdata01\departments\finance", &tokens),
            Some(Region::NorthAmerica)
        );
        assert_eq!(
            Region::from_path(r"\\SVPCTYSZDATA01\shares\hr", &tokens),
            Some(Region::Europe)
        );
        assert_eq!(Region::from_path(r"\\fileserver\misc\readme.txt", &tokens), None);
    }

    #[test]
    fn test_europe_wins_when_both_match() {
        let tokens = SiteTokens::default();
        // KNX (NA) and LON (EU) both present
        assert_eq!(
            Region::from_path(r"\\KNX-mirror\LON\backup", &tokens),
            Some(Region::Europe)
        );
    }

    #[test]
    fn test_owner_id_parse() {
        assert_eq!(
            OwnerId::parse(r"NA\jsmith"),
            OwnerId::User { domain: Region::NorthAmerica, login: "jsmith".into() }
        );
        assert_eq!(
            OwnerId::parse(r"EU\mmeyer"),
            OwnerId::User { domain: Region::Europe, login: "mmeyer".into() }
        );
        assert_eq!(
            OwnerId::parse(r"SYSTEM\svc-scan"),
            OwnerId::Unrecognized(r"SYSTEM\svc-scan".into())
        );
        assert_eq!(OwnerId::parse("jsmith"), OwnerId::Unrecognized("jsmith".into()));
    }
}
