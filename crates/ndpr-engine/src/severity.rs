//! Breach severity classification under the NDPR 72-hour rule.
//!
//! Given a breach report and, when one exists, its current risk assessment,
//! the classifier produces the severity level, whether NITDA must be
//! notified, whether the matter is urgent, and the hour window the
//! notification duty runs in. Absent an assessment the category's default
//! severity stands in as a conservative proxy, and the engine errs toward
//! requiring notification rather than silently excusing it.
//!
//! The classification carries a deterministic justification string listing
//! exactly the rules that fired, in a fixed order, so decisions are
//! traceable and testable.

use std::collections::BTreeSet;

use ndpr_types::SeverityLevel;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::report::BreachReport;
use crate::risk::RiskAssessment;

/// Regulator notification window: 72 hours from discovery (NDPR Art. 2.10,
/// mirroring GDPR Article 33).
pub const NOTIFICATION_WINDOW_HOURS: u32 = 72;

/// Documentation-only window when no regulator deadline applies. Distinct
/// from "deadline has passed".
pub const NO_DEADLINE_HOURS: u32 = 0;

/// Configurable thresholds for severity escalation.
///
/// Fields are private and immutable after construction; use
/// [`SeverityConfigBuilder`] for custom thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityConfig {
    /// Estimated affected subjects above which a breach counts as
    /// large-scale. Default: 1000.
    large_scale_threshold: u64,
    /// Data types treated as sensitive, stored lowercase and matched
    /// case-insensitively against the report's `data_types` entries.
    /// Lowercased on every construction path, deserialization included.
    #[serde(deserialize_with = "lowercase_data_types")]
    sensitive_data_types: BTreeSet<String>,
}

fn lowercase_data_types<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = BTreeSet::<String>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|s| s.to_lowercase()).collect())
}

impl SeverityConfig {
    /// Returns the large-scale subject threshold.
    pub fn large_scale_threshold(&self) -> u64 {
        self.large_scale_threshold
    }

    /// Returns the sensitive data type set (lowercase).
    pub fn sensitive_data_types(&self) -> &BTreeSet<String> {
        &self.sensitive_data_types
    }

    /// Whether a report data-type entry is flagged sensitive.
    pub fn is_sensitive(&self, data_type: &str) -> bool {
        self.sensitive_data_types
            .contains(&data_type.to_lowercase())
    }
}

impl Default for SeverityConfig {
    fn default() -> Self {
        Self {
            large_scale_threshold: 1000,
            sensitive_data_types: ["health", "biometric", "financial", "children"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Builder for [`SeverityConfig`].
#[derive(Debug, Clone, Default)]
pub struct SeverityConfigBuilder {
    config: SeverityConfig,
}

impl SeverityConfigBuilder {
    /// Creates a builder seeded with the default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the large-scale subject threshold.
    pub fn large_scale_threshold(mut self, value: u64) -> Self {
        self.config.large_scale_threshold = value;
        self
    }

    /// Replaces the sensitive data type set (entries lowercased).
    pub fn sensitive_data_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.sensitive_data_types = types
            .into_iter()
            .map(|s| s.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Builds the immutable `SeverityConfig`.
    pub fn build(self) -> SeverityConfig {
        self.config
    }
}

/// Output of the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityClassification {
    pub severity_level: SeverityLevel,
    /// Whether NITDA must be notified.
    pub notification_required: bool,
    /// Whether the matter is urgent (high risk to data subjects).
    pub urgent_notification_required: bool,
    /// Hour window for the regulator duty; [`NO_DEADLINE_HOURS`] when no
    /// deadline applies.
    pub timeframe_hours: u32,
    /// Which rules fired, in a fixed order. Deterministic for identical
    /// inputs.
    pub justification: String,
}

/// Classifies a breach's severity and the notification duties that follow.
///
/// Pure function of the report, the assessment, and the configuration; no
/// clock reads, no side effects.
pub fn classify_severity(
    report: &BreachReport,
    assessment: Option<&RiskAssessment>,
    config: &SeverityConfig,
) -> Result<SeverityClassification> {
    if let Some(assessment) = assessment {
        assessment.inputs.validate()?;
        if assessment.breach_id != report.id {
            return Err(EngineError::InvalidInput(format!(
                "assessment {} belongs to breach {}, not {}",
                assessment.id, assessment.breach_id, report.id
            )));
        }
    }

    let mut reasons = Vec::new();

    let baseline = match assessment {
        Some(assessment) => {
            let level = SeverityLevel::from(assessment.risk_level);
            reasons.push(format!(
                "baseline severity {level} from risk assessment (score {:.1})",
                assessment.overall_risk_score
            ));
            level
        }
        None => {
            let level = report.category.default_severity;
            reasons.push(format!(
                "baseline severity {level} from category '{}' default (no assessment on file)",
                report.category.id
            ));
            level
        }
    };

    // One escalation step at most, even when both triggers fire.
    let large_scale = report
        .estimated_affected_subjects
        .is_some_and(|n| n > config.large_scale_threshold());
    let sensitive: Vec<&str> = report
        .data_types
        .iter()
        .map(String::as_str)
        .filter(|dt| config.is_sensitive(dt))
        .collect();

    let mut severity = baseline;
    if large_scale || !sensitive.is_empty() {
        severity = baseline.escalated();
        if large_scale {
            reasons.push(format!(
                "escalated to {severity}: estimated affected subjects ({}) exceed the \
                 large-scale threshold ({})",
                report.estimated_affected_subjects.unwrap_or(0),
                config.large_scale_threshold()
            ));
        }
        if !sensitive.is_empty() {
            reasons.push(format!(
                "escalated to {severity}: sensitive data types involved ({})",
                sensitive.join(", ")
            ));
        }
    }

    let rights_at_risk = assessment.is_none_or(|a| a.risks_to_rights_and_freedoms);
    let notification_required = severity >= SeverityLevel::Medium && rights_at_risk;

    let urgent_notification_required = severity >= SeverityLevel::High
        || assessment.is_some_and(|a| a.high_risks_to_rights_and_freedoms);

    if notification_required {
        reasons.push(format!(
            "NITDA notification required within {NOTIFICATION_WINDOW_HOURS} hours of discovery"
        ));
    } else if severity < SeverityLevel::Medium {
        reasons.push("no NITDA notification required: severity below medium".to_string());
    } else {
        reasons.push(
            "no NITDA notification required: assessment found no risk to the rights and \
             freedoms of data subjects"
                .to_string(),
        );
    }
    if urgent_notification_required {
        reasons.push("urgent: high risk to data subjects".to_string());
    }

    Ok(SeverityClassification {
        severity_level: severity,
        notification_required,
        urgent_notification_required,
        timeframe_hours: if notification_required {
            NOTIFICATION_WINDOW_HOURS
        } else {
            NO_DEADLINE_HOURS
        },
        justification: reasons.join("; "),
    })
}
