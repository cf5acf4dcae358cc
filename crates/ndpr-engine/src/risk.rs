//! Risk assessment scoring.
//!
//! An assessor supplies five 1-5 integers (CIA impact, harm likelihood,
//! harm severity); the scorer derives the overall score, the coarse risk
//! level, and the NDPR "risk to the rights and freedoms of data subjects"
//! flags. Derived fields are always recomputed from the inputs and never
//! settable on their own, so a stored assessment cannot drift out of sync
//! with its scores.
//!
//! # Formula
//!
//! ```text
//! raw   = (confidentiality + integrity + availability) / 3
//!         * harm_likelihood * harm_severity          # range 1..=125
//! score = raw / 125 * 100                            # range 0..=100
//! ```
//!
//! Level bands on the 0-100 scale, lower bound inclusive:
//! `<25` low, `<50` medium, `<75` high, `>=75` critical.

use ndpr_types::{AssessmentId, BreachId, RiskLevel, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Maximum of the raw weighted score (all five inputs at 5).
const RAW_SCORE_MAX: f64 = 125.0;

/// Assessor-provided inputs, each constrained to 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskInputs {
    pub confidentiality_impact: u8,
    pub integrity_impact: u8,
    pub availability_impact: u8,
    pub harm_likelihood: u8,
    pub harm_severity: u8,
}

impl RiskInputs {
    /// Rejects any input outside 1-5. No clamping: the assessor must
    /// supply valid data.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("confidentiality_impact", self.confidentiality_impact),
            ("integrity_impact", self.integrity_impact),
            ("availability_impact", self.availability_impact),
            ("harm_likelihood", self.harm_likelihood),
            ("harm_severity", self.harm_severity),
        ] {
            if !(1..=5).contains(&value) {
                return Err(EngineError::InvalidInput(format!(
                    "{name} must be 1-5, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// A completed risk assessment: the inputs plus every derived field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub id: AssessmentId,
    /// The breach this assessment belongs to.
    pub breach_id: BreachId,
    pub assessed_at: Timestamp,
    /// Who performed the assessment, as reported by the collaborator UI.
    pub assessor: Option<String>,
    pub inputs: RiskInputs,
    /// Normalized 0-100 overall score.
    pub overall_risk_score: f64,
    pub risk_level: RiskLevel,
    /// NDPR trigger for regulator notification.
    pub risks_to_rights_and_freedoms: bool,
    /// NDPR trigger for data-subject notification.
    pub high_risks_to_rights_and_freedoms: bool,
}

/// Scores the inputs and fills every derived field.
///
/// Pure: the only timestamp is the caller-supplied `assessed_at`.
pub fn score_risk(
    breach_id: BreachId,
    inputs: RiskInputs,
    assessed_at: Timestamp,
    assessor: Option<String>,
) -> Result<RiskAssessment> {
    inputs.validate()?;

    let impact_sum = u16::from(inputs.confidentiality_impact)
        + u16::from(inputs.integrity_impact)
        + u16::from(inputs.availability_impact);
    let raw = f64::from(impact_sum) / 3.0
        * f64::from(inputs.harm_likelihood)
        * f64::from(inputs.harm_severity);
    let overall_risk_score = raw / RAW_SCORE_MAX * 100.0;

    let risk_level = risk_level_for_score(overall_risk_score);

    Ok(RiskAssessment {
        id: AssessmentId::new(),
        breach_id,
        assessed_at,
        assessor,
        inputs,
        overall_risk_score,
        risk_level,
        risks_to_rights_and_freedoms: risk_level >= RiskLevel::Medium,
        high_risks_to_rights_and_freedoms: risk_level >= RiskLevel::High,
    })
}

/// Maps a normalized 0-100 score onto the coarse risk level.
/// Band lower bounds are inclusive.
pub fn risk_level_for_score(score: f64) -> RiskLevel {
    if score < 25.0 {
        RiskLevel::Low
    } else if score < 50.0 {
        RiskLevel::Medium
    } else if score < 75.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}
