//! In-memory breach lifecycle store.
//!
//! The store exclusively owns the report, assessment, and notification
//! collections, keyed by breach id. Nothing is ever deleted: status
//! changes, new assessments, and new notifications are the only mutation
//! paths, so the incident history stays reconstructible.
//!
//! # Concurrency
//!
//! Two lock levels: an outer map lock held only for id lookup and insert,
//! and one lock per breach record. Writers to the *same* breach serialize
//! on the record lock; writers to different breaches proceed in parallel.
//! Readers take the record lock shared and therefore always observe a
//! complete record, never a half-applied write.
//!
//! # Failure semantics
//!
//! Every operation validates before it mutates; a rejected write leaves
//! the prior state untouched. Persistence is an external collaborator's
//! job: it pulls [`StoreSnapshot`]s out and feeds them back through
//! [`BreachStore::from_snapshot`], which re-validates every record.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ndpr_types::{BreachId, NotificationId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{EngineError, Result};
use crate::notification::{FollowUp, NewNotification, RegulatoryNotification};
use crate::report::{Attachment, BreachReport, BreachReportUpdate, NewBreachReport};
use crate::risk::{score_risk, RiskAssessment, RiskInputs};

/// Everything the store holds for one breach. Cloning yields a consistent
/// point-in-time snapshot of that breach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreachRecord {
    pub report: BreachReport,
    /// Full assessment history, oldest first; the last entry is "current".
    pub assessments: Vec<RiskAssessment>,
    /// Notifications in the order they were recorded.
    pub notifications: Vec<RegulatoryNotification>,
}

impl BreachRecord {
    /// The most recently recorded assessment, if any.
    pub fn current_assessment(&self) -> Option<&RiskAssessment> {
        self.assessments.last()
    }

    /// Re-checks every cross-record invariant. Used when loading a
    /// snapshot whose producer the store does not control.
    fn validate(&self) -> Result<()> {
        if let Some(occurred_at) = self.report.occurred_at {
            if occurred_at > self.report.discovered_at {
                return Err(EngineError::InvalidInput(format!(
                    "breach {}: occurred_at after discovered_at",
                    self.report.id
                )));
            }
        }
        for assessment in &self.assessments {
            assessment.inputs.validate()?;
            if assessment.breach_id != self.report.id {
                return Err(EngineError::InvalidInput(format!(
                    "assessment {} references breach {}, expected {}",
                    assessment.id, assessment.breach_id, self.report.id
                )));
            }
        }
        for notification in &self.notifications {
            if notification.breach_id != self.report.id {
                return Err(EngineError::InvalidInput(format!(
                    "notification {} references breach {}, expected {}",
                    notification.id, notification.breach_id, self.report.id
                )));
            }
            if notification.sent_at < self.report.discovered_at {
                return Err(EngineError::InvalidInput(format!(
                    "notification {} sent before breach discovery",
                    notification.id
                )));
            }
        }
        Ok(())
    }
}

/// Serializable export of the full store, for the persistence
/// collaborator. Records are ordered by breach id so repeated exports of
/// the same state are byte-identical.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub records: Vec<BreachRecord>,
}

/// The in-memory repository of breach reports, assessments, and
/// notifications.
#[derive(Debug, Default)]
pub struct BreachStore {
    records: RwLock<HashMap<BreachId, Arc<RwLock<BreachRecord>>>>,
}

impl BreachStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from a snapshot, re-validating every record.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self> {
        let mut records = HashMap::with_capacity(snapshot.records.len());
        for record in snapshot.records {
            record.validate()?;
            let id = record.report.id;
            if records
                .insert(id, Arc::new(RwLock::new(record)))
                .is_some()
            {
                return Err(EngineError::InvalidInput(format!(
                    "snapshot contains breach {id} twice"
                )));
            }
        }
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    /// Exports the full store state, ordered by breach id.
    pub fn snapshot(&self) -> Result<StoreSnapshot> {
        let map = self.records.read().map_err(|_| EngineError::LockPoisoned)?;
        let mut entries: Vec<(BreachId, Arc<RwLock<BreachRecord>>)> =
            map.iter().map(|(id, rec)| (*id, Arc::clone(rec))).collect();
        drop(map);
        entries.sort_by_key(|(id, _)| *id);

        let mut records = Vec::with_capacity(entries.len());
        for (_, record) in entries {
            let guard = record.read().map_err(|_| EngineError::LockPoisoned)?;
            records.push(guard.clone());
        }
        Ok(StoreSnapshot { records })
    }

    /// Logs a new breach report, assigning its id. Status starts ongoing.
    pub fn create_report(&self, new: NewBreachReport) -> Result<BreachReport> {
        let report = new.into_report(BreachId::new())?;
        let record = BreachRecord {
            report: report.clone(),
            assessments: Vec::new(),
            notifications: Vec::new(),
        };

        let mut map = self.records.write().map_err(|_| EngineError::LockPoisoned)?;
        map.insert(report.id, Arc::new(RwLock::new(record)));
        drop(map);

        info!(breach = %report.id, category = %report.category.id, "breach report created");
        Ok(report)
    }

    /// Applies a partial update to a report. Status moves forward only;
    /// `id` and `discovered_at` are not updatable.
    pub fn update_report(
        &self,
        id: BreachId,
        update: BreachReportUpdate,
    ) -> Result<BreachReport> {
        let record = self.record(id)?;
        let mut guard = record.write().map_err(|_| EngineError::LockPoisoned)?;
        update.apply(&mut guard.report)?;
        Ok(guard.report.clone())
    }

    /// Appends an evidence attachment to a report.
    pub fn append_attachment(&self, id: BreachId, attachment: Attachment) -> Result<()> {
        let record = self.record(id)?;
        let mut guard = record.write().map_err(|_| EngineError::LockPoisoned)?;
        guard.report.attachments.push(attachment);
        Ok(())
    }

    /// Scores and records a new risk assessment for a breach. The new
    /// assessment becomes "current"; earlier ones are retained as history.
    pub fn record_assessment(
        &self,
        id: BreachId,
        inputs: RiskInputs,
        assessed_at: Timestamp,
        assessor: Option<String>,
    ) -> Result<RiskAssessment> {
        let record = self.record(id)?;
        let assessment = score_risk(id, inputs, assessed_at, assessor)?;

        let mut guard = record.write().map_err(|_| EngineError::LockPoisoned)?;
        guard.assessments.push(assessment.clone());
        drop(guard);

        info!(
            breach = %id,
            assessment = %assessment.id,
            level = %assessment.risk_level,
            "risk assessment recorded"
        );
        Ok(assessment)
    }

    /// Records a notification sent to the regulator. `sent_at` must not
    /// predate the breach's discovery.
    pub fn record_notification(
        &self,
        id: BreachId,
        new: NewNotification,
    ) -> Result<RegulatoryNotification> {
        let record = self.record(id)?;
        let mut guard = record.write().map_err(|_| EngineError::LockPoisoned)?;
        let notification =
            new.into_notification(NotificationId::new(), id, guard.report.discovered_at)?;
        guard.notifications.push(notification.clone());
        drop(guard);

        info!(breach = %id, notification = %notification.id, "regulatory notification recorded");
        Ok(notification)
    }

    /// Appends a follow-up exchange to an existing notification.
    pub fn append_follow_up(
        &self,
        breach_id: BreachId,
        notification_id: NotificationId,
        follow_up: FollowUp,
    ) -> Result<()> {
        let record = self.record(breach_id)?;
        let mut guard = record.write().map_err(|_| EngineError::LockPoisoned)?;
        let notification = guard
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or(EngineError::NotificationNotFound(notification_id))?;
        notification.follow_ups.push(follow_up);
        Ok(())
    }

    /// Looks up a breach report by id.
    pub fn report(&self, id: BreachId) -> Result<BreachReport> {
        let record = self.record(id)?;
        let guard = record.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(guard.report.clone())
    }

    /// The current (most recent) assessment for a breach, if any.
    pub fn current_assessment(&self, id: BreachId) -> Result<Option<RiskAssessment>> {
        let record = self.record(id)?;
        let guard = record.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(guard.current_assessment().cloned())
    }

    /// All notifications for a breach, in insertion order.
    pub fn notifications(&self, id: BreachId) -> Result<Vec<RegulatoryNotification>> {
        let record = self.record(id)?;
        let guard = record.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(guard.notifications.clone())
    }

    /// A consistent point-in-time copy of everything held for one breach.
    pub fn breach_record(&self, id: BreachId) -> Result<BreachRecord> {
        let record = self.record(id)?;
        let guard = record.read().map_err(|_| EngineError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Ids of all breaches currently in the store, sorted.
    pub fn breach_ids(&self) -> Result<Vec<BreachId>> {
        let map = self.records.read().map_err(|_| EngineError::LockPoisoned)?;
        let mut ids: Vec<BreachId> = map.keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }

    /// Number of breaches in the store.
    pub fn len(&self) -> usize {
        self.records.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn record(&self, id: BreachId) -> Result<Arc<RwLock<BreachRecord>>> {
        let map = self.records.read().map_err(|_| EngineError::LockPoisoned)?;
        map.get(&id)
            .cloned()
            .ok_or(EngineError::BreachNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use ndpr_types::SeverityLevel;

    use super::*;
    use crate::notification::{FollowUpDirection, NotificationMethod};
    use crate::report::{BreachCategory, BreachStatus};

    const DISCOVERED: i64 = 1_700_000_000_000;

    fn new_report() -> NewBreachReport {
        NewBreachReport {
            category: BreachCategory {
                id: "ransomware".to_string(),
                name: "Ransomware".to_string(),
                description: "Systems encrypted by ransomware".to_string(),
                default_severity: SeverityLevel::High,
            },
            discovered_at: Timestamp::from_millis(DISCOVERED),
            occurred_at: None,
            reported_at: Timestamp::from_millis(DISCOVERED + 30_000),
            affected_systems: vec!["fileserver".to_string()],
            data_types: vec!["email".to_string()],
            estimated_affected_subjects: Some(300),
        }
    }

    fn inputs(all: u8) -> RiskInputs {
        RiskInputs {
            confidentiality_impact: all,
            integrity_impact: all,
            availability_impact: all,
            harm_likelihood: all,
            harm_severity: all,
        }
    }

    #[test]
    fn test_create_and_lookup() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        assert_eq!(store.report(report.id).expect("found").id, report.id);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_missing_breach_is_not_found() {
        let store = BreachStore::new();
        let result = store.report(BreachId::new());
        assert!(matches!(result, Err(EngineError::BreachNotFound(_))));
    }

    #[test]
    fn test_status_regression_rejected_and_state_untouched() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        store
            .update_report(
                report.id,
                BreachReportUpdate {
                    status: Some(BreachStatus::Resolved),
                    ..Default::default()
                },
            )
            .expect("forward transition");

        let result = store.update_report(
            report.id,
            BreachReportUpdate {
                status: Some(BreachStatus::Ongoing),
                affected_systems: Some(vec!["mail".to_string()]),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(EngineError::InvalidTransition { .. })));

        let stored = store.report(report.id).expect("found");
        assert_eq!(stored.status, BreachStatus::Resolved);
        assert_eq!(stored.affected_systems, vec!["fileserver".to_string()]);
    }

    #[test]
    fn test_assessment_history_and_current() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");

        let first = store
            .record_assessment(
                report.id,
                inputs(2),
                Timestamp::from_millis(DISCOVERED + 60_000),
                None,
            )
            .expect("records");
        let second = store
            .record_assessment(
                report.id,
                inputs(4),
                Timestamp::from_millis(DISCOVERED + 120_000),
                Some("dpo@example.ng".to_string()),
            )
            .expect("records");

        let current = store
            .current_assessment(report.id)
            .expect("found")
            .expect("has assessment");
        assert_eq!(current.id, second.id);

        let record = store.breach_record(report.id).expect("found");
        assert_eq!(record.assessments.len(), 2);
        assert_eq!(record.assessments[0].id, first.id);
    }

    #[test]
    fn test_invalid_assessment_inputs_leave_history_unchanged() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        let result = store.record_assessment(
            report.id,
            inputs(6),
            Timestamp::from_millis(DISCOVERED + 60_000),
            None,
        );
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        assert!(store
            .current_assessment(report.id)
            .expect("found")
            .is_none());
    }

    #[test]
    fn test_notification_before_discovery_rejected() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        let result = store.record_notification(
            report.id,
            NewNotification {
                sent_at: Timestamp::from_millis(DISCOVERED - 1_000),
                method: NotificationMethod::Email,
                reference_number: None,
                content: "too early".to_string(),
            },
        );
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
        assert!(store.notifications(report.id).expect("found").is_empty());
    }

    #[test]
    fn test_notifications_keep_insertion_order() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");

        let initial = store
            .record_notification(
                report.id,
                NewNotification {
                    sent_at: Timestamp::from_millis(DISCOVERED + 3_600_000),
                    method: NotificationMethod::Portal,
                    reference_number: None,
                    content: "initial".to_string(),
                },
            )
            .expect("records");
        let supplementary = store
            .record_notification(
                report.id,
                NewNotification {
                    sent_at: Timestamp::from_millis(DISCOVERED + 7_200_000),
                    method: NotificationMethod::Email,
                    reference_number: Some("NITDA-1".to_string()),
                    content: "supplementary".to_string(),
                },
            )
            .expect("records");

        let notifications = store.notifications(report.id).expect("found");
        assert_eq!(
            notifications.iter().map(|n| n.id).collect::<Vec<_>>(),
            vec![initial.id, supplementary.id]
        );
    }

    #[test]
    fn test_follow_up_appends_and_unknown_notification_fails() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        let notification = store
            .record_notification(
                report.id,
                NewNotification {
                    sent_at: Timestamp::from_millis(DISCOVERED + 3_600_000),
                    method: NotificationMethod::Letter,
                    reference_number: None,
                    content: "initial".to_string(),
                },
            )
            .expect("records");

        store
            .append_follow_up(
                report.id,
                notification.id,
                FollowUp {
                    timestamp: Timestamp::from_millis(DISCOVERED + 10_000_000),
                    direction: FollowUpDirection::Received,
                    content: "acknowledged".to_string(),
                },
            )
            .expect("appends");
        let notifications = store.notifications(report.id).expect("found");
        assert_eq!(notifications[0].follow_ups.len(), 1);

        let result = store.append_follow_up(
            report.id,
            NotificationId::new(),
            FollowUp {
                timestamp: Timestamp::from_millis(DISCOVERED + 10_000_000),
                direction: FollowUpDirection::Sent,
                content: "lost".to_string(),
            },
        );
        assert!(matches!(
            result,
            Err(EngineError::NotificationNotFound(_))
        ));
    }

    #[test]
    fn test_attachments_append() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        store
            .append_attachment(
                report.id,
                Attachment {
                    name: "forensics.pdf".to_string(),
                    added_at: Timestamp::from_millis(DISCOVERED + 500_000),
                    note: Some("initial forensic review".to_string()),
                },
            )
            .expect("appends");
        assert_eq!(store.report(report.id).expect("found").attachments.len(), 1);
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let store = BreachStore::new();
        let a = store.create_report(new_report()).expect("creates");
        let b = store.create_report(new_report()).expect("creates");
        store
            .record_assessment(
                a.id,
                inputs(3),
                Timestamp::from_millis(DISCOVERED + 60_000),
                None,
            )
            .expect("records");

        let snapshot = store.snapshot().expect("exports");
        let json = serde_json::to_string(&snapshot).expect("serializes");
        let restored: StoreSnapshot = serde_json::from_str(&json).expect("deserializes");
        let restored = BreachStore::from_snapshot(restored).expect("validates");

        assert_eq!(restored.len(), 2);
        assert_eq!(restored.report(a.id).expect("found").id, a.id);
        assert!(restored
            .current_assessment(a.id)
            .expect("found")
            .is_some());
        assert!(restored
            .current_assessment(b.id)
            .expect("found")
            .is_none());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let store = BreachStore::new();
        store.create_report(new_report()).expect("creates");
        store.create_report(new_report()).expect("creates");
        let a = serde_json::to_string(&store.snapshot().expect("exports")).expect("serializes");
        let b = serde_json::to_string(&store.snapshot().expect("exports")).expect("serializes");
        assert_eq!(a, b);
    }

    #[test]
    fn test_from_snapshot_rejects_cross_references() {
        let store = BreachStore::new();
        let report = store.create_report(new_report()).expect("creates");
        store
            .record_assessment(
                report.id,
                inputs(3),
                Timestamp::from_millis(DISCOVERED + 60_000),
                None,
            )
            .expect("records");

        let mut snapshot = store.snapshot().expect("exports");
        // Point the assessment at a breach that does not exist.
        snapshot.records[0].assessments[0].breach_id = BreachId::new();
        let result = BreachStore::from_snapshot(snapshot);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_parallel_writers_to_distinct_breaches() {
        let store = Arc::new(BreachStore::new());
        let a = store.create_report(new_report()).expect("creates");
        let b = store.create_report(new_report()).expect("creates");

        let handles: Vec<_> = [a.id, b.id]
            .into_iter()
            .map(|id| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50i64 {
                        store
                            .record_assessment(
                                id,
                                inputs(3),
                                Timestamp::from_millis(DISCOVERED + i),
                                None,
                            )
                            .expect("records");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("no panics");
        }

        assert_eq!(store.breach_record(a.id).expect("found").assessments.len(), 50);
        assert_eq!(store.breach_record(b.id).expect("found").assessments.len(), 50);
    }

    #[test]
    fn test_serialized_writers_to_same_breach_lose_nothing() {
        let store = Arc::new(BreachStore::new());
        let report = store.create_report(new_report()).expect("creates");

        let handles: Vec<_> = (0..4i64)
            .map(|t| {
                let store = Arc::clone(&store);
                let id = report.id;
                std::thread::spawn(move || {
                    for i in 0..25i64 {
                        store
                            .record_assessment(
                                id,
                                inputs(2),
                                Timestamp::from_millis(DISCOVERED + t * 1_000 + i),
                                None,
                            )
                            .expect("records");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("no panics");
        }

        // Interleaved appends must not drop entries.
        assert_eq!(
            store.breach_record(report.id).expect("found").assessments.len(),
            100
        );
    }
}
