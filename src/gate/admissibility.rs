//! Admissibility Filter
//!
//! Content screening of a submission payload, independent of its score.
//! The payload is matched as text; no schema is imposed.

use serde::{Deserialize, Serialize};

/// Marker rejected unless configured otherwise
pub const DEFAULT_DISALLOWED_MARKER: &str = "PRIVATE_KEY";

/// Default jurisdiction tag
pub const DEFAULT_JURISDICTION: &str = "GLOBAL_NEUTRAL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissibilityReason {
    VerifiedAdmissible,
    ExposedCredentials,
}

impl AdmissibilityReason {
    pub fn code(&self) -> &'static str {
        match self {
            AdmissibilityReason::VerifiedAdmissible => "VERIFIED_ADMISSIBLE",
            AdmissibilityReason::ExposedCredentials => "EXPOSED_CREDENTIALS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissibilityVerdict {
    pub admissible: bool,
    pub reason: AdmissibilityReason,
}

impl AdmissibilityVerdict {
    fn admissible() -> Self {
        Self {
            admissible: true,
            reason: AdmissibilityReason::VerifiedAdmissible,
        }
    }

    fn exposed_credentials() -> Self {
        Self {
            admissible: false,
            reason: AdmissibilityReason::ExposedCredentials,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmissibilityFilter {
    jurisdiction: String,
    /// Stored upper-cased
    markers: Vec<String>,
}

impl AdmissibilityFilter {
    pub fn new(jurisdiction: impl Into<String>) -> Self {
        Self::with_markers(jurisdiction, [DEFAULT_DISALLOWED_MARKER])
    }

    pub fn with_markers<I, S>(jurisdiction: impl Into<String>, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            jurisdiction: jurisdiction.into(),
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_uppercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    /// Screen an already serialized payload
    pub fn check(&self, payload: &str) -> AdmissibilityVerdict {
        let haystack = payload.to_uppercase();
        if self.markers.iter().any(|m| haystack.contains(m.as_str())) {
            AdmissibilityVerdict::exposed_credentials()
        } else {
            AdmissibilityVerdict::admissible()
        }
    }

    /// Screen any JSON value by its compact text form (keys included)
    pub fn check_value(&self, payload: &serde_json::Value) -> AdmissibilityVerdict {
        self.check(&payload.to_string())
    }
}

impl Default for AdmissibilityFilter {
    fn default() -> Self {
        Self::new(DEFAULT_JURISDICTION)
    }
}
