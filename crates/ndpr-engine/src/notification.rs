//! Notification requirements and the record of notifications sent.
//!
//! [`compute_requirement`] turns a breach report (and its current risk
//! assessment, when one exists) into the concrete NITDA obligation: whether
//! to notify, by when, and whether data subjects must be informed too. The
//! deadline is always computed, even when no duty applies, so the
//! collaborator UI can render "not applicable" against a real timestamp
//! rather than a missing one.
//!
//! [`RegulatoryNotification`] is the record of a notification actually sent
//! to the regulator; a breach may accumulate several (initial plus
//! supplementary), each with its own append-only follow-up trail.

use ndpr_types::{BreachId, NotificationId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::report::BreachReport;
use crate::risk::RiskAssessment;
use crate::severity::{classify_severity, SeverityConfig};

/// The computed NITDA obligation for a breach. Derived on demand, never
/// stored: recomputing from the report and assessment is what keeps it
/// consistent with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequirement {
    pub nitda_notification_required: bool,
    /// `discovered_at` plus the duty window. Computed even when the duty
    /// does not apply (window 0, deadline == discovery time).
    pub nitda_notification_deadline: Timestamp,
    pub data_subject_notification_required: bool,
    pub justification: String,
}

/// Computes the notification requirement for a breach.
///
/// Idempotent: identical inputs yield an identical requirement. The only
/// time anchor is the report's `discovered_at`.
pub fn compute_requirement(
    report: &BreachReport,
    assessment: Option<&RiskAssessment>,
    config: &SeverityConfig,
) -> Result<NotificationRequirement> {
    let classification = classify_severity(report, assessment, config)?;

    let deadline = report
        .discovered_at
        .plus_hours(i64::from(classification.timeframe_hours));

    let data_subject_notification_required = classification.urgent_notification_required;
    let mut justification = classification.justification;
    if data_subject_notification_required {
        justification.push_str(
            "; data subjects must be informed without undue delay (high risk to their rights \
             and freedoms)",
        );
    }

    Ok(NotificationRequirement {
        nitda_notification_required: classification.notification_required,
        nitda_notification_deadline: deadline,
        data_subject_notification_required,
        justification,
    })
}

/// Channel a notification was sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMethod {
    Email,
    Portal,
    Letter,
    Other,
}

/// Direction of a follow-up exchange with the regulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowUpDirection {
    Sent,
    Received,
}

/// One follow-up exchange on a notification. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub timestamp: Timestamp,
    pub direction: FollowUpDirection,
    pub content: String,
}

/// The record of a notification actually sent to NITDA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulatoryNotification {
    pub id: NotificationId,
    pub breach_id: BreachId,
    pub sent_at: Timestamp,
    pub method: NotificationMethod,
    /// Regulator-assigned reference, once one exists.
    pub reference_number: Option<String>,
    pub content: String,
    pub follow_ups: Vec<FollowUp>,
}

/// Input for recording a sent notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub sent_at: Timestamp,
    pub method: NotificationMethod,
    pub reference_number: Option<String>,
    pub content: String,
}

impl NewNotification {
    /// Materialises the record, enforcing that a notification cannot
    /// predate the discovery of the breach it reports.
    pub(crate) fn into_notification(
        self,
        id: NotificationId,
        breach_id: BreachId,
        discovered_at: Timestamp,
    ) -> Result<RegulatoryNotification> {
        if self.sent_at < discovered_at {
            return Err(EngineError::InvalidInput(format!(
                "sent_at {} predates breach discovery at {discovered_at}",
                self.sent_at
            )));
        }
        Ok(RegulatoryNotification {
            id,
            breach_id,
            sent_at: self.sent_at,
            method: self.method,
            reference_number: self.reference_number,
            content: self.content,
            follow_ups: Vec::new(),
        })
    }
}
