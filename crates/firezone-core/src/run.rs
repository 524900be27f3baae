//! Run configuration and run results.
//!
//! A run is parameterized by a [`Propagation`] strategy that determines how
//! each time step is resolved. Both strategies record exactly one history
//! entry per room per step; they differ only in how many evaluation passes
//! a step may take.

use crate::id::{ConnectionId, RoomId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Strategy choices
// ---------------------------------------------------------------------------

/// How a time step is resolved. Chosen per run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Propagation {
    /// One sweep of the processing order per step.
    #[default]
    FixedStep,

    /// Sweep, then keep re-evaluating every room against this step's
    /// provisional values until no room changes significantly or
    /// `depth_limit` extra passes have run.
    Converging {
        /// Maximum number of extra passes per step. `0` skips the check and
        /// reports every step as unconverged.
        depth_limit: u32,
        /// Change below which a room is considered settled. See
        /// [`crate::dynamics::has_significant_changes`].
        change_threshold: f64,
    },
}

/// How the per-connection terms of a connected room are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Arithmetic mean of independently computed terms.
    #[default]
    MeanOfTerms,
    /// Legacy accumulation over running partial sums, for output parity
    /// with older result sets.
    RunningPartial,
}

/// What to do when the connection graph contains a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Fail the run with `CycleDetected`.
    #[default]
    Reject,
    /// Run anyway. Reads across back edges see the previous step's value,
    /// and an upstream room without history yet contributes its ambient
    /// state.
    Tolerate,
}

// ---------------------------------------------------------------------------
// RunConfig
// ---------------------------------------------------------------------------

/// Everything a run needs besides the graph itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Last time (s) to compute, inclusive when it falls on a step.
    pub end_time: f64,
    /// Step size (s).
    pub time_step: f64,
    #[serde(default)]
    pub propagation: Propagation,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub cycles: CyclePolicy,
}

impl RunConfig {
    /// Fixed-step run with default aggregation and cycle handling.
    pub fn fixed_step(end_time: f64, time_step: f64) -> Self {
        Self {
            end_time,
            time_step,
            propagation: Propagation::FixedStep,
            aggregation: Aggregation::default(),
            cycles: CyclePolicy::default(),
        }
    }

    pub fn with_propagation(mut self, propagation: Propagation) -> Self {
        self.propagation = propagation;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_cycles(mut self, cycles: CyclePolicy) -> Self {
        self.cycles = cycles;
        self
    }

    /// Number of completed steps: `floor(end_time / time_step)`.
    pub fn step_count(&self) -> u64 {
        (self.end_time / self.time_step).floor() as u64
    }

    /// Time of step `step` (step 0 is the seed at t=0).
    pub fn time_at(&self, step: u64) -> f64 {
        step as f64 * self.time_step
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::fixed_step(200.0, 10.0)
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Result of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// The room the fire started in.
    pub source: RoomId,
    /// Processing order used for seeding and every step.
    pub order: Vec<RoomId>,
    /// Connections read one step stale because they close a cycle.
    /// Always empty under [`CyclePolicy::Reject`].
    pub back_edges: Vec<ConnectionId>,
    /// Steps completed after the seed.
    pub steps: u64,
    /// Step size used.
    pub time_step: f64,
    /// Extra evaluation passes spent by [`Propagation::Converging`].
    pub convergence_passes: u64,
    /// Steps that hit `depth_limit` without settling, including every step
    /// of a run with `depth_limit == 0`.
    pub unconverged_steps: u64,
}

impl RunSummary {
    /// History entries each room gained: the seed plus one per step.
    pub fn entries_per_room(&self) -> u64 {
        self.steps + 1
    }
}
