//! NDPR breach-notification compliance engine.
//!
//! Given a reported data-breach incident, this crate determines its
//! severity, the notification obligations that follow under the Nigeria
//! Data Protection Regulation, and the deadlines that govern them, and it
//! tracks the incident through report -> risk assessment -> notification
//! -> follow-up.
//!
//! # Architecture
//!
//! ```text
//! classify_severity   score_risk   compute_requirement     (pure, stateless)
//!          \              |               /
//!           +------- BreachStore --------+                 (owns all state)
//!                         |
//!                  DeadlineMonitor                          (read-only scan)
//! ```
//!
//! The three calculators are pure functions of their inputs and a
//! [`severity::SeverityConfig`]; the store serializes writes per breach id;
//! the monitor polls the store without mutating it. Persistence, rendering,
//! and the regulator's actual submission channel are collaborator layers on
//! top of this crate.
//!
//! # The 72-hour rule
//!
//! Qualifying breaches must be reported to NITDA within 72 hours of
//! discovery. All deadline arithmetic is exact Unix-millisecond arithmetic
//! anchored on the report's `discovered_at`; the engine never reads the
//! clock on its own.

pub mod error;
pub mod monitor;
pub mod notification;
pub mod report;
pub mod risk;
pub mod severity;
pub mod store;

pub use error::{EngineError, Result};
pub use monitor::{DeadlineMonitor, PendingNotification};
pub use notification::{
    compute_requirement, FollowUp, FollowUpDirection, NewNotification, NotificationMethod,
    NotificationRequirement, RegulatoryNotification,
};
pub use report::{
    Attachment, BreachCategory, BreachReport, BreachReportUpdate, BreachStatus, NewBreachReport,
};
pub use risk::{score_risk, RiskAssessment, RiskInputs};
pub use severity::{
    classify_severity, SeverityClassification, SeverityConfig, SeverityConfigBuilder,
    NOTIFICATION_WINDOW_HOURS,
};
pub use store::{BreachRecord, BreachStore, StoreSnapshot};
