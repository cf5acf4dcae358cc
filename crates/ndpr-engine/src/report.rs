//! Breach report records and their lifecycle state machine.
//!
//! A breach report is the incident as first logged by the intake
//! collaborator. Its `discovered_at` timestamp anchors every deadline
//! downstream, so it is immutable once set: correcting a wrong discovery
//! time means filing a new report, never mutating the old one.
//!
//! # Lifecycle
//!
//! ```text
//! Ongoing -> Contained -> Resolved
//! ```
//!
//! Transitions are forward-only. A resolved breach never reopens; new facts
//! go into a fresh assessment or a follow-up on the notification record.

use ndpr_types::{BreachId, SeverityLevel, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Category a breach is filed under, carrying the conservative default
/// severity used when no risk assessment exists yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachCategory {
    /// Stable category identifier (e.g. "unauthorised-disclosure").
    pub id: String,
    pub name: String,
    pub description: String,
    /// Severity assumed until an assessment says otherwise.
    pub default_severity: SeverityLevel,
}

/// Containment status of a breach, ordered so that "forward-only" is a
/// plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreachStatus {
    Ongoing,
    Contained,
    Resolved,
}

impl BreachStatus {
    /// Whether moving to `next` is a legal (non-regressing) transition.
    /// Staying in place is allowed; moving backward is not.
    pub fn can_transition_to(self, next: BreachStatus) -> bool {
        next >= self
    }
}

impl std::fmt::Display for BreachStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => write!(f, "ongoing"),
            Self::Contained => write!(f, "contained"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

/// A piece of evidence attached to a breach report. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Collaborator-side reference (filename, document id).
    pub name: String,
    pub added_at: Timestamp,
    pub note: Option<String>,
}

/// An incident as first logged, plus its evolving containment status and
/// evidence trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachReport {
    /// Assigned by the store at creation; immutable.
    pub id: BreachId,
    pub category: BreachCategory,
    /// When the breach was discovered. Anchor for all deadlines; immutable.
    pub discovered_at: Timestamp,
    /// When the breach actually occurred, if known. Never after discovery.
    pub occurred_at: Option<Timestamp>,
    /// When the incident was logged internally.
    pub reported_at: Timestamp,
    pub status: BreachStatus,
    pub affected_systems: Vec<String>,
    pub data_types: Vec<String>,
    pub estimated_affected_subjects: Option<u64>,
    pub attachments: Vec<Attachment>,
}

/// Input for creating a breach report. Everything except the id, which the
/// store assigns; status always starts `Ongoing`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBreachReport {
    pub category: BreachCategory,
    pub discovered_at: Timestamp,
    pub occurred_at: Option<Timestamp>,
    pub reported_at: Timestamp,
    pub affected_systems: Vec<String>,
    pub data_types: Vec<String>,
    pub estimated_affected_subjects: Option<u64>,
}

impl NewBreachReport {
    /// Materialises the report with a freshly assigned id.
    pub(crate) fn into_report(self, id: BreachId) -> Result<BreachReport> {
        if let Some(occurred_at) = self.occurred_at {
            if occurred_at > self.discovered_at {
                return Err(EngineError::InvalidInput(format!(
                    "occurred_at {occurred_at} is after discovered_at {}",
                    self.discovered_at
                )));
            }
        }

        Ok(BreachReport {
            id,
            category: self.category,
            discovered_at: self.discovered_at,
            occurred_at: self.occurred_at,
            reported_at: self.reported_at,
            status: BreachStatus::Ongoing,
            affected_systems: self.affected_systems,
            data_types: self.data_types,
            estimated_affected_subjects: self.estimated_affected_subjects,
            attachments: Vec::new(),
        })
    }
}

/// Partial update to a breach report.
///
/// `id` and `discovered_at` are deliberately not representable here, which
/// is what keeps them immutable. Attachments have their own append-only
/// path on the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BreachReportUpdate {
    pub category: Option<BreachCategory>,
    pub occurred_at: Option<Timestamp>,
    pub status: Option<BreachStatus>,
    pub affected_systems: Option<Vec<String>>,
    pub data_types: Option<Vec<String>>,
    pub estimated_affected_subjects: Option<u64>,
}

impl BreachReportUpdate {
    /// Validates and applies the update to `report` in place.
    ///
    /// All checks run before the first field is written, so a rejected
    /// update leaves the report untouched.
    pub(crate) fn apply(self, report: &mut BreachReport) -> Result<()> {
        if let Some(next) = self.status {
            if !report.status.can_transition_to(next) {
                return Err(EngineError::InvalidTransition {
                    from: report.status,
                    to: next,
                });
            }
        }
        if let Some(occurred_at) = self.occurred_at {
            if occurred_at > report.discovered_at {
                return Err(EngineError::InvalidInput(format!(
                    "occurred_at {occurred_at} is after discovered_at {}",
                    report.discovered_at
                )));
            }
        }

        if let Some(category) = self.category {
            report.category = category;
        }
        if let Some(occurred_at) = self.occurred_at {
            report.occurred_at = Some(occurred_at);
        }
        if let Some(status) = self.status {
            report.status = status;
        }
        if let Some(affected_systems) = self.affected_systems {
            report.affected_systems = affected_systems;
        }
        if let Some(data_types) = self.data_types {
            report.data_types = data_types;
        }
        if let Some(estimated) = self.estimated_affected_subjects {
            report.estimated_affected_subjects = Some(estimated);
        }
        Ok(())
    }
}
