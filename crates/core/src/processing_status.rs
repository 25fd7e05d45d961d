//! Processing-status state machine and the parent reconciliation rule.
//!
//! This module lives in `core` (no I/O) so the rule can be tested against
//! plain snapshots and reused by any tool that reads status records.
//!
//! A parent with children never owns its status: it is recomputed from a
//! fresh snapshot of the children on every reconcile.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Generation, Timestamp};

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Triggering,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub const ALL: [ProcessingStatus; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Triggering,
        Self::Completed,
        Self::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Triggering => "triggering",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// `completed` and `failed`. Only a retrigger leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// States reconciliation is allowed to move forward.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    /// Targets reachable from `self` through an ordinary status write.
    ///
    /// Terminal states return an empty slice: leaving them is reserved to
    /// the explicit retrigger path.
    pub fn valid_transitions(self) -> &'static [ProcessingStatus] {
        use ProcessingStatus::*;
        match self {
            Pending => &[Processing, Triggering, Completed, Failed],
            Triggering => &[Pending, Processing, Completed, Failed],
            Processing => &[Completed, Failed],
            Completed | Failed => &[],
        }
    }

    /// Same-state writes are accepted as idempotent no-ops.
    pub fn can_transition(self, to: ProcessingStatus) -> bool {
        self == to || self.valid_transitions().contains(&to)
    }

    pub fn validate_transition(self, to: ProcessingStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid status transition: {self} -> {to}"
            )))
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "Invalid status '{s}'. Must be one of: pending, processing, triggering, completed, failed"
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Status of a parent (or childless) entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityStatus {
    pub entity_id: String,
    pub status: ProcessingStatus,
    pub generation: Generation,
    pub updated_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl EntityStatus {
    /// Initial record: `pending`, generation 0.
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            status: ProcessingStatus::Pending,
            generation: 0,
            updated_at: Utc::now(),
            completed_at: None,
            failed_at: None,
            failure_reason: None,
        }
    }

    /// Move to `status`, stamping completion/failure markers.
    pub fn transition(&mut self, status: ProcessingStatus, reason: Option<String>) {
        let now = Utc::now();
        self.status = status;
        self.updated_at = now;
        match status {
            ProcessingStatus::Completed => self.completed_at = Some(now),
            ProcessingStatus::Failed => {
                self.failed_at = Some(now);
                self.failure_reason = reason;
            }
            _ => {}
        }
    }

    /// Start a new trigger generation: `triggering` with every marker cleared.
    pub fn retrigger(&mut self, generation: Generation) {
        self.status = ProcessingStatus::Triggering;
        self.generation = generation;
        self.updated_at = Utc::now();
        self.completed_at = None;
        self.failed_at = None;
        self.failure_reason = None;
    }
}

/// Status of one child (e.g. a keyframe of a video).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildStatus {
    pub child_id: String,
    pub status: ProcessingStatus,
    /// Parent generation this status was written for.
    pub generation: Generation,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Per-state tally of the children that count toward the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildCounts {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub triggering: usize,
    pub completed: usize,
    pub failed: usize,
    /// Children whose latest record is from an older generation. Not part of
    /// `total`, but they still block completion: they have not reported for
    /// the current attempt.
    pub stale: usize,
}

impl ChildCounts {
    pub fn tally(generation: Generation, children: &[ChildStatus]) -> Self {
        let mut counts = Self::default();
        for child in children {
            if child.generation < generation {
                counts.stale += 1;
                continue;
            }
            counts.total += 1;
            match child.status {
                ProcessingStatus::Pending => counts.pending += 1,
                ProcessingStatus::Processing => counts.processing += 1,
                ProcessingStatus::Triggering => counts.triggering += 1,
                ProcessingStatus::Completed => counts.completed += 1,
                ProcessingStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Every indexed child is current and `completed`.
    pub fn all_completed(&self) -> bool {
        self.total > 0 && self.stale == 0 && self.completed == self.total
    }

    /// At least one child has moved past `pending`.
    pub fn any_started(&self) -> bool {
        self.total > self.pending
    }
}

/// Result of applying the reconciliation rule to a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileDecision {
    pub next: ProcessingStatus,
    pub counts: ChildCounts,
}

impl ReconcileDecision {
    pub fn changes(&self, current: ProcessingStatus) -> bool {
        self.next != current
    }
}

/// Derive a parent status from its current status and a fresh child snapshot.
///
/// - Terminal parents are left alone.
/// - `completed` iff at least one child exists and every child is both on the
///   current generation and `completed`.
/// - A `pending`/`triggering` parent becomes `processing` once any current
///   child has started.
/// - Failed children never fail the parent; a caller decides via retrigger.
pub fn reconcile_parent(
    current: ProcessingStatus,
    generation: Generation,
    children: &[ChildStatus],
) -> ReconcileDecision {
    let counts = ChildCounts::tally(generation, children);

    let next = if current.is_terminal() {
        current
    } else if counts.all_completed() {
        ProcessingStatus::Completed
    } else if matches!(
        current,
        ProcessingStatus::Pending | ProcessingStatus::Triggering
    ) && counts.any_started()
    {
        ProcessingStatus::Processing
    } else {
        current
    };

    ReconcileDecision { next, counts }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
