use serde::{Deserialize, Serialize};

use crate::error::{CorrelateError, Result};
use crate::snapshot::{self, ResourceRecord, Snapshot};

// ── States ──

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Unobserved,
    BaselineCaptured,
    SpawnConfirmed,
    DeleteConfirmed,
}

// ── Valid transitions ──

const VALID_TRANSITIONS: &[(LifecycleState, &[LifecycleState])] = &[
    (
        LifecycleState::Unobserved,
        &[LifecycleState::BaselineCaptured],
    ),
    (
        LifecycleState::BaselineCaptured,
        &[
            LifecycleState::BaselineCaptured, // re-capture
            LifecycleState::SpawnConfirmed,
        ],
    ),
    (
        LifecycleState::SpawnConfirmed,
        &[LifecycleState::DeleteConfirmed],
    ),
    (
        LifecycleState::DeleteConfirmed,
        &[LifecycleState::BaselineCaptured], // next cycle
    ),
];

fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
    VALID_TRANSITIONS
        .iter()
        .any(|(f, targets)| *f == from && targets.contains(&to))
}

// ── Tracked resource ──

/// The resource this run created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackedResource {
    pub record: ResourceRecord,
    pub spawned_at: String,
}

// ── Tracker ──

/// Spawn/delete correlation for one virtual-user run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LifecycleTracker {
    pub state: LifecycleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked: Option<TrackedResource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub version: u32,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`CorrelateError::InvalidState`] unless `op` may move the
    /// tracker to `to` from where it is now.
    pub fn ensure_transition(&self, op: &str, to: LifecycleState) -> Result<()> {
        if is_valid_transition(self.state, to) {
            Ok(())
        } else {
            Err(CorrelateError::InvalidState {
                op: op.to_string(),
                state: self.state,
            })
        }
    }

    fn advance(&mut self, to: LifecycleState) {
        tracing::debug!(from = ?self.state, to = ?to, "lifecycle transition");
        self.state = to;
        self.version += 1;
    }

    /// Store the listing taken before the spawn action.
    pub fn capture_baseline(&mut self, snapshot: Snapshot) -> Result<()> {
        self.ensure_transition("capture_baseline", LifecycleState::BaselineCaptured)?;
        if self.state == LifecycleState::DeleteConfirmed {
            self.tracked = None;
            self.deleted_at = None;
        }
        self.snapshot = Some(snapshot);
        self.advance(LifecycleState::BaselineCaptured);
        Ok(())
    }

    /// Diff the post-spawn listing against the baseline and remember the
    /// spawned record.
    pub fn confirm_spawn(
        &mut self,
        new_snapshot: Snapshot,
        target_id: Option<&str>,
    ) -> Result<&TrackedResource> {
        self.ensure_transition("confirm_spawn", LifecycleState::SpawnConfirmed)?;
        let baseline = self.snapshot.as_ref().ok_or_else(|| CorrelateError::InvalidState {
            op: "confirm_spawn".into(),
            state: self.state,
        })?;
        let record = snapshot::select_spawned(baseline, &new_snapshot, target_id)?;
        tracing::info!(id = %record.id, "spawn confirmed");

        self.snapshot = Some(new_snapshot);
        self.advance(LifecycleState::SpawnConfirmed);
        Ok(&*self.tracked.insert(TrackedResource {
            record,
            spawned_at: now_rfc3339(),
        }))
    }

    /// Check that the tracked resource is gone from the post-delete listing.
    pub fn confirm_delete(&mut self, new_snapshot: Snapshot) -> Result<()> {
        self.ensure_transition("confirm_delete", LifecycleState::DeleteConfirmed)?;
        let id = match &self.tracked {
            Some(t) => t.record.id.clone(),
            None => {
                return Err(CorrelateError::InvalidState {
                    op: "confirm_delete".into(),
                    state: self.state,
                })
            }
        };
        if !snapshot::is_absent(&new_snapshot, &id) {
            return Err(CorrelateError::ResourceStillExists(id));
        }
        tracing::info!(id = %id, "delete confirmed");

        self.snapshot = Some(new_snapshot);
        self.deleted_at = Some(now_rfc3339());
        self.advance(LifecycleState::DeleteConfirmed);
        Ok(())
    }

    pub fn tracked_id(&self) -> Option<&str> {
        self.tracked.as_ref().map(|t| t.record.id.as_str())
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawned(ids: &[&str], target: &str) -> LifecycleTracker {
        let mut tracker = LifecycleTracker::new();
        tracker.capture_baseline(Snapshot::from_ids(&ids[..ids.len() - 1])).unwrap();
        tracker
            .confirm_spawn(Snapshot::from_ids(ids), Some(target))
            .unwrap();
        tracker
    }

    #[test]
    fn starts_unobserved() {
        let tracker = LifecycleTracker::new();
        assert_eq!(tracker.state, LifecycleState::Unobserved);
        assert_eq!(tracker.version, 0);
        assert!(tracker.tracked_id().is_none());
    }

    #[test]
    fn full_cycle() {
        let mut tracker = LifecycleTracker::new();
        tracker.capture_baseline(Snapshot::from_ids(&["A", "B"])).unwrap();
        assert_eq!(tracker.state, LifecycleState::BaselineCaptured);

        let tracked = tracker
            .confirm_spawn(Snapshot::from_ids(&["A", "B", "C"]), Some("C"))
            .unwrap();
        assert_eq!(tracked.record.id, "C");
        assert!(!tracked.spawned_at.is_empty());
        assert_eq!(tracker.state, LifecycleState::SpawnConfirmed);

        tracker.confirm_delete(Snapshot::from_ids(&["A", "B"])).unwrap();
        assert_eq!(tracker.state, LifecycleState::DeleteConfirmed);
        assert!(tracker.deleted_at.is_some());
        assert_eq!(tracker.version, 3);
    }

    #[test]
    fn spawn_without_change_is_not_found() {
        let mut tracker = LifecycleTracker::new();
        tracker.capture_baseline(Snapshot::from_ids(&["A"])).unwrap();
        let err = tracker
            .confirm_spawn(Snapshot::from_ids(&["A"]), None)
            .unwrap_err();
        assert!(matches!(err, CorrelateError::ResourceNotFound(_)));
        assert_eq!(tracker.state, LifecycleState::BaselineCaptured);
        assert_eq!(tracker.version, 1);
    }

    #[test]
    fn delete_while_present_fails() {
        let mut tracker = spawned(&["A", "B", "C"], "C");
        let err = tracker
            .confirm_delete(Snapshot::from_ids(&["A", "B", "C"]))
            .unwrap_err();
        assert_eq!(err, CorrelateError::ResourceStillExists("C".into()));
        assert_eq!(tracker.state, LifecycleState::SpawnConfirmed);
    }

    #[test]
    fn delete_before_baseline_is_invalid_state() {
        let mut tracker = LifecycleTracker::new();
        let err = tracker.confirm_delete(Snapshot::from_ids(&["A"])).unwrap_err();
        assert!(matches!(
            err,
            CorrelateError::InvalidState {
                state: LifecycleState::Unobserved,
                ..
            }
        ));
    }

    #[test]
    fn delete_before_spawn_is_invalid_state() {
        let mut tracker = LifecycleTracker::new();
        tracker.capture_baseline(Snapshot::from_ids(&["A"])).unwrap();
        let err = tracker.confirm_delete(Snapshot::from_ids(&["A"])).unwrap_err();
        assert!(matches!(err, CorrelateError::InvalidState { .. }));
    }

    #[test]
    fn spawn_before_baseline_is_invalid_state() {
        let mut tracker = LifecycleTracker::new();
        let err = tracker
            .confirm_spawn(Snapshot::from_ids(&["A"]), Some("A"))
            .unwrap_err();
        assert!(matches!(err, CorrelateError::InvalidState { .. }));
    }

    #[test]
    fn double_spawn_is_invalid_state() {
        let mut tracker = spawned(&["A", "B"], "B");
        let err = tracker
            .confirm_spawn(Snapshot::from_ids(&["A", "B", "C"]), Some("C"))
            .unwrap_err();
        assert!(matches!(err, CorrelateError::InvalidState { .. }));
        assert_eq!(tracker.tracked_id(), Some("B"));
    }

    #[test]
    fn recapture_supersedes_baseline() {
        let mut tracker = LifecycleTracker::new();
        tracker.capture_baseline(Snapshot::from_ids(&["A"])).unwrap();
        tracker.capture_baseline(Snapshot::from_ids(&["A", "B"])).unwrap();
        // B was in the newer baseline, so it is not a spawn.
        assert!(tracker
            .confirm_spawn(Snapshot::from_ids(&["A", "B"]), Some("B"))
            .is_err());
    }

    #[test]
    fn baseline_after_delete_starts_next_cycle() {
        let mut tracker = spawned(&["A", "B"], "B");
        tracker.confirm_delete(Snapshot::from_ids(&["A"])).unwrap();
        tracker.capture_baseline(Snapshot::from_ids(&["A"])).unwrap();
        assert_eq!(tracker.state, LifecycleState::BaselineCaptured);
        assert!(tracker.tracked.is_none());
        assert!(tracker.deleted_at.is_none());
    }

    #[test]
    fn ensure_transition_follows_table() {
        let tracker = LifecycleTracker::new();
        assert!(tracker
            .ensure_transition("capture_baseline", LifecycleState::BaselineCaptured)
            .is_ok());
        let err = tracker
            .ensure_transition("confirm_delete", LifecycleState::DeleteConfirmed)
            .unwrap_err();
        assert_eq!(
            err,
            CorrelateError::InvalidState {
                op: "confirm_delete".into(),
                state: LifecycleState::Unobserved,
            }
        );
    }

    #[test]
    fn capture_while_spawned_is_invalid_state() {
        let mut tracker = spawned(&["A", "B"], "B");
        assert!(tracker.capture_baseline(Snapshot::from_ids(&["A"])).is_err());
        assert_eq!(tracker.state, LifecycleState::SpawnConfirmed);
    }

    #[test]
    fn tracker_roundtrip_json() {
        let tracker = spawned(&["A", "B"], "B");
        let json = serde_json::to_value(&tracker).unwrap();
        assert_eq!(json["state"], "spawn_confirmed");
        let restored: LifecycleTracker = serde_json::from_value(json).unwrap();
        assert_eq!(restored, tracker);
    }
}
