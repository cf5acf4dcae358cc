//! # ndpr-types: Shared types for the NDPR breach-notification engine
//!
//! This crate contains the types shared between the engine and its
//! collaborators (report intake, risk-assessment UI, notification manager,
//! report generator):
//! - Entity IDs ([`BreachId`], [`AssessmentId`], [`NotificationId`])
//! - Temporal type ([`Timestamp`], Unix milliseconds UTC)
//! - Coarse classifications ([`SeverityLevel`], [`RiskLevel`])
//!
//! It is deliberately leaf-level: no engine logic, no I/O.

use std::fmt::{self, Display};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Milliseconds in one hour; all deadline arithmetic uses this factor.
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

// ============================================================================
// Entity IDs - UUID newtypes, Copy and Ord (Ord gives deterministic
// tie-breaking wherever records are sorted)
// ============================================================================

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID (e.g. one read back from a snapshot).
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the underlying UUID.
            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a breach report, assigned at creation and
    /// immutable thereafter.
    BreachId
);
entity_id!(
    /// Unique identifier for a risk assessment record.
    AssessmentId
);
entity_id!(
    /// Unique identifier for a regulatory notification record.
    NotificationId
);

// ============================================================================
// Timestamp
// ============================================================================

/// A point in time as milliseconds since the Unix epoch, UTC.
///
/// Milliseconds are the wire unit the collaborator layers use, so deadline
/// arithmetic stays exact end to end (no sub-unit truncation across the
/// 72-hour notification window).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The Unix epoch (1970-01-01 00:00:00 UTC).
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp from milliseconds since the Unix epoch.
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as milliseconds since the Unix epoch.
    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Creates a timestamp for the current time.
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    /// Returns this timestamp shifted forward by whole hours.
    ///
    /// Saturates at the representable range rather than wrapping.
    pub fn plus_hours(self, hours: i64) -> Self {
        Self(self.0.saturating_add(hours.saturating_mul(MILLIS_PER_HOUR)))
    }

    /// Fractional hours from `now` until this timestamp.
    ///
    /// Positive while this timestamp is in the future, negative once it has
    /// passed. The sign is how a missed deadline is distinguished from a
    /// running countdown.
    ///
    /// Subtraction happens in f64 so timestamps near the i64 extremes
    /// cannot overflow (mirrors the saturation in [`Timestamp::plus_hours`]).
    pub fn hours_until(self, now: Timestamp) -> f64 {
        (self.0 as f64 - now.0 as f64) / MILLIS_PER_HOUR as f64
    }

    /// Converts to a chrono `DateTime` for display and formatting.
    pub fn to_datetime(self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Creates a timestamp from a chrono `DateTime` (truncates to millis).
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_millis())
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S%.3f UTC"))
    }
}

// ============================================================================
// Coarse classifications
// ============================================================================

/// Severity level for a breach, ordered from lowest to highest.
///
/// Ordering is load-bearing: escalation and the "cap at critical" rule are
/// plain comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Returns the next level up, capped at `Critical`.
    pub fn escalated(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }
}

impl Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Risk level derived from a completed risk assessment's numeric inputs.
///
/// Same scale as [`SeverityLevel`], kept distinct because one is an analyst
/// judgement over scored inputs and the other a classification of the breach
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl From<RiskLevel> for SeverityLevel {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => Self::Low,
            RiskLevel::Medium => Self::Medium,
            RiskLevel::High => Self::High,
            RiskLevel::Critical => Self::Critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_hours_exact_millis() {
        let t = Timestamp::from_millis(1_700_000_000_000);
        assert_eq!(
            t.plus_hours(72).as_millis(),
            1_700_000_000_000 + 72 * MILLIS_PER_HOUR
        );
    }

    #[test]
    fn test_hours_until_sign() {
        let deadline = Timestamp::from_millis(100 * MILLIS_PER_HOUR);

        let before = Timestamp::from_millis(90 * MILLIS_PER_HOUR);
        assert!((deadline.hours_until(before) - 10.0).abs() < f64::EPSILON);

        let after = Timestamp::from_millis(105 * MILLIS_PER_HOUR);
        assert!((deadline.hours_until(after) + 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hours_until_does_not_overflow_at_extremes() {
        let far_future = Timestamp::from_millis(i64::MAX);
        let far_past = Timestamp::from_millis(i64::MIN);

        let remaining = far_future.hours_until(far_past);
        assert!(remaining.is_finite());
        assert!(remaining > 0.0);

        let overdue = far_past.hours_until(far_future);
        assert!(overdue.is_finite());
        assert!(overdue < 0.0);
    }

    #[test]
    fn test_escalation_caps_at_critical() {
        assert_eq!(SeverityLevel::Low.escalated(), SeverityLevel::Medium);
        assert_eq!(SeverityLevel::Medium.escalated(), SeverityLevel::High);
        assert_eq!(SeverityLevel::High.escalated(), SeverityLevel::Critical);
        assert_eq!(SeverityLevel::Critical.escalated(), SeverityLevel::Critical);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(SeverityLevel::Low < SeverityLevel::Medium);
        assert!(SeverityLevel::High < SeverityLevel::Critical);
        assert!(RiskLevel::Medium < RiskLevel::High);
    }

    #[test]
    fn test_risk_level_maps_onto_severity() {
        assert_eq!(SeverityLevel::from(RiskLevel::High), SeverityLevel::High);
        assert_eq!(
            SeverityLevel::from(RiskLevel::Critical),
            SeverityLevel::Critical
        );
    }

    #[test]
    fn test_id_roundtrip() {
        let id = BreachId::new();
        let parsed: BreachId = id.to_string().parse().expect("uuid string parses");
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_timestamp_serde_is_plain_millis() {
        let t = Timestamp::from_millis(42);
        let json = serde_json::to_string(&t).expect("serialize");
        assert_eq!(json, "42");
    }
}
