//! Deadline monitoring over the lifecycle store.
//!
//! A read-only query surface intended to be polled by the notification
//! manager: given "now" and an hours threshold, it returns every breach
//! whose regulator deadline falls within the threshold and which has no
//! notification on record yet, most urgent first. A negative
//! `hours_remaining` means the deadline has already been missed; those
//! breaches are still returned, distinguished by sign.

use ndpr_types::Timestamp;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::notification::{compute_requirement, NotificationRequirement};
use crate::report::BreachReport;
use crate::risk::RiskAssessment;
use crate::severity::SeverityConfig;
use crate::store::BreachStore;

/// One breach awaiting its regulator notification.
#[derive(Debug, Clone, Serialize)]
pub struct PendingNotification {
    pub report: BreachReport,
    pub assessment: Option<RiskAssessment>,
    pub requirement: NotificationRequirement,
    /// Fractional hours until the deadline; negative once it has passed.
    pub hours_remaining: f64,
}

/// Read-only deadline scanner over a [`BreachStore`].
#[derive(Debug)]
pub struct DeadlineMonitor<'a> {
    store: &'a BreachStore,
    config: SeverityConfig,
}

impl<'a> DeadlineMonitor<'a> {
    pub fn new(store: &'a BreachStore, config: SeverityConfig) -> Self {
        Self { store, config }
    }

    /// Breaches whose notification deadline falls within `hours_threshold`
    /// of `now` and which have not been notified yet.
    ///
    /// Ordered ascending by `hours_remaining` (most urgent first), ties
    /// broken by breach id. Does not mutate anything; each breach is read
    /// as one consistent snapshot.
    pub fn breaches_requiring_notification(
        &self,
        now: Timestamp,
        hours_threshold: f64,
    ) -> Result<Vec<PendingNotification>> {
        let mut pending = Vec::new();

        for id in self.store.breach_ids()? {
            let record = self.store.breach_record(id)?;
            let assessment = record.current_assessment().cloned();
            let requirement =
                compute_requirement(&record.report, assessment.as_ref(), &self.config)?;

            if !requirement.nitda_notification_required || !record.notifications.is_empty() {
                continue;
            }

            let hours_remaining = requirement.nitda_notification_deadline.hours_until(now);
            if hours_remaining > hours_threshold {
                continue;
            }
            if hours_remaining < 0.0 {
                warn!(
                    breach = %id,
                    hours_overdue = -hours_remaining,
                    "notification deadline missed"
                );
            }

            pending.push(PendingNotification {
                report: record.report,
                assessment,
                requirement,
                hours_remaining,
            });
        }

        pending.sort_by(|a, b| {
            a.hours_remaining
                .total_cmp(&b.hours_remaining)
                .then_with(|| a.report.id.cmp(&b.report.id))
        });
        Ok(pending)
    }
}
