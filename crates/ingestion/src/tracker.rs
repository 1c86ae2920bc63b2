//! Tracker implementations backed by known rotations
//!
//! Neither performs feature matching: [`GroundTruthTracker`] looks up
//! orientations recorded alongside the images, [`ScriptedTracker`] replays a
//! fixed list of results.

use std::collections::VecDeque;

use contracts::{FrameObservation, RansacRotationResult, Timestamp, Tracker, TrackingStatus};
use nalgebra::UnitQuaternion;
use tracing::trace;

/// Relative rotations from a time-indexed orientation table
#[derive(Debug, Clone)]
pub struct GroundTruthTracker {
    table: Vec<(Timestamp, UnitQuaternion<f64>)>,
    calls: usize,
}

impl GroundTruthTracker {
    pub fn new(mut table: Vec<(Timestamp, UnitQuaternion<f64>)>) -> Self {
        table.sort_by_key(|(t, _)| *t);
        Self { table, calls: 0 }
    }

    /// Orientation recorded closest to `timestamp`
    pub fn orientation_at(&self, timestamp: Timestamp) -> Option<UnitQuaternion<f64>> {
        let idx = self.table.partition_point(|(t, _)| *t < timestamp);
        let after = self.table.get(idx);
        let before = idx.checked_sub(1).and_then(|i| self.table.get(i));

        match (before, after) {
            (Some(b), Some(a)) => {
                if timestamp - b.0 <= a.0 - timestamp {
                    Some(b.1)
                } else {
                    Some(a.1)
                }
            }
            (Some(only), None) | (None, Some(only)) => Some(only.1),
            (None, None) => None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl Tracker for GroundTruthTracker {
    fn geometric_outlier_rejection_mono(
        &mut self,
        reference: &FrameObservation,
        current: &FrameObservation,
    ) -> RansacRotationResult {
        self.calls += 1;
        match (
            self.orientation_at(reference.timestamp),
            self.orientation_at(current.timestamp),
        ) {
            (Some(r_ref), Some(r_cur)) => RansacRotationResult::valid(r_ref.inverse() * r_cur),
            _ => RansacRotationResult::with_status(TrackingStatus::Invalid),
        }
    }
}

/// Replays queued results, then reports `Invalid`
#[derive(Debug, Clone, Default)]
pub struct ScriptedTracker {
    results: VecDeque<RansacRotationResult>,
    calls: usize,
}

impl ScriptedTracker {
    pub fn new(results: impl IntoIterator<Item = RansacRotationResult>) -> Self {
        Self {
            results: results.into_iter().collect(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.results.len()
    }
}

impl Tracker for ScriptedTracker {
    fn geometric_outlier_rejection_mono(
        &mut self,
        reference: &FrameObservation,
        current: &FrameObservation,
    ) -> RansacRotationResult {
        self.calls += 1;
        trace!(reference = reference.id, current = current.id, "scripted tracker call");
        self.results
            .pop_front()
            .unwrap_or_else(|| RansacRotationResult::with_status(TrackingStatus::Invalid))
    }
}
