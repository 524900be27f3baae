//! The time integration driver: seeds every room at t=0, then advances the
//! whole graph one step at a time up to the end time.
//!
//! # Run pipeline
//!
//! Each call to [`RoomGraph::run`]:
//! 1. **Validate** -- check the step size and end time, find the single
//!    source room, and require every history to be empty.
//! 2. **Order** -- compute one processing order (see [`crate::ordering`]).
//!    The source room reads nothing, so it is hoisted to the front.
//! 3. **Seed** -- evaluate every room at t=0 in processing order.
//! 4. **Step** -- for `t = Δ, 2Δ, …, ⌊T/Δ⌋Δ`, evaluate every room in order
//!    and append the result to its history.
//!
//! Nothing is recorded unless steps 1 and 2 succeed.

use crate::dynamics::{
    DynamicsInputs, UpstreamState, calculate_fire_dynamics, has_significant_changes,
};
use crate::graph::{GraphError, RoomGraph};
use crate::id::{ConnectionId, RoomId};
use crate::room::FireDynamicsParameters;
use crate::run::{Aggregation, CyclePolicy, Propagation, RunConfig, RunSummary};
use std::collections::BTreeMap;
use tracing::{debug, info, trace, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that stop a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    #[error("no source room (fire origin) was found in the graph")]
    NoSourceRoom,
    #[error("more than one source room: {0:?}")]
    MultipleSourceRooms(Vec<RoomId>),
    #[error("time step must be finite and positive, got {0}")]
    InvalidTimeStep(f64),
    #[error("end time must be finite and non-negative, got {0}")]
    InvalidEndTime(f64),
    #[error("{room} already has recorded history")]
    HistoryNotEmpty { room: RoomId },
    #[error("{room} has no recorded state to read")]
    MissingHistory { room: RoomId },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Per-run settings threaded through every evaluation.
#[derive(Debug, Clone, Copy)]
struct Pass {
    source: RoomId,
    aggregation: Aggregation,
    /// Substitute the ambient state for upstream rooms with no history yet.
    ambient_fallback: bool,
}

/// This step's values that are not recorded yet.
type Provisional = BTreeMap<RoomId, FireDynamicsParameters>;

impl RoomGraph {
    /// Fixed-step run with default aggregation, rejecting cyclic graphs.
    pub fn calculate_fire_dynamics_up_to_time(
        &mut self,
        end_time: f64,
        time_step: f64,
    ) -> Result<RunSummary, RunError> {
        self.run(&RunConfig::fixed_step(end_time, time_step))
    }

    /// Run the graph from t=0 to `config.end_time`.
    ///
    /// Every room gains `floor(end_time / time_step) + 1` history entries.
    pub fn run(&mut self, config: &RunConfig) -> Result<RunSummary, RunError> {
        if !(config.time_step.is_finite() && config.time_step > 0.0) {
            return Err(RunError::InvalidTimeStep(config.time_step));
        }
        if !(config.end_time.is_finite() && config.end_time >= 0.0) {
            return Err(RunError::InvalidEndTime(config.end_time));
        }
        let source = self.find_source_room()?;
        if let Some(room) = self
            .rooms()
            .values()
            .find(|room| !room.fire_dynamics_history().is_empty())
        {
            return Err(RunError::HistoryNotEmpty { room: room.id() });
        }
        let (order, back_edges) = self.processing_order(source, config.cycles)?;

        let steps = config.step_count();
        info!(
            rooms = order.len(),
            source = source.0,
            steps,
            time_step = config.time_step,
            propagation = ?config.propagation,
            aggregation = ?config.aggregation,
            "fire dynamics run started"
        );

        let pass = Pass {
            source,
            aggregation: config.aggregation,
            ambient_fallback: config.cycles == CyclePolicy::Tolerate,
        };
        let mut summary = RunSummary {
            source,
            order,
            back_edges,
            steps,
            time_step: config.time_step,
            convergence_passes: 0,
            unconverged_steps: 0,
        };

        self.sweep(&pass, &summary.order, 0.0)?;

        for step in 1..=steps {
            let time = config.time_at(step);
            match config.propagation {
                Propagation::FixedStep => self.sweep(&pass, &summary.order, time)?,
                Propagation::Converging {
                    depth_limit,
                    change_threshold,
                } => {
                    let (passes, settled) =
                        self.converge(&pass, &summary.order, time, depth_limit, change_threshold)?;
                    summary.convergence_passes += passes;
                    if !settled {
                        summary.unconverged_steps += 1;
                    }
                }
            }
            debug!(step, time, "step complete");
        }

        if summary.unconverged_steps > 0 {
            warn!(
                steps = summary.unconverged_steps,
                "some steps did not settle within the depth limit"
            );
        }
        info!(steps, "fire dynamics run finished");
        Ok(summary)
    }

    fn find_source_room(&self) -> Result<RoomId, RunError> {
        let sources = self.source_rooms();
        match sources.as_slice() {
            [] => Err(RunError::NoSourceRoom),
            [source] => Ok(*source),
            _ => Err(RunError::MultipleSourceRooms(sources)),
        }
    }

    /// Dependency order with the source room first.
    fn processing_order(
        &self,
        source: RoomId,
        cycles: CyclePolicy,
    ) -> Result<(Vec<RoomId>, Vec<ConnectionId>), RunError> {
        let (mut order, back_edges) = match cycles {
            CyclePolicy::Reject => (self.dependency_order()?, Vec::new()),
            CyclePolicy::Tolerate => {
                let feedback = self.dependency_order_with_feedback();
                if !feedback.back_edges.is_empty() {
                    warn!(
                        back_edges = feedback.back_edges.len(),
                        "room graph has cycles; reads across back edges lag one step"
                    );
                }
                (feedback.order, feedback.back_edges)
            }
        };
        order.retain(|&id| id != source);
        order.insert(0, source);
        Ok((order, back_edges))
    }

    /// Evaluate every room once at `time` and record the results.
    fn sweep(&mut self, pass: &Pass, order: &[RoomId], time: f64) -> Result<(), RunError> {
        for &id in order {
            let state = self.evaluate(pass, id, time, None)?;
            self.record(id, state);
        }
        Ok(())
    }

    /// Re-evaluate the step until it settles, then record it once.
    /// Returns the number of extra passes and whether the step settled.
    /// With `depth_limit == 0` nothing is verified, so the step never counts
    /// as settled.
    fn converge(
        &mut self,
        pass: &Pass,
        order: &[RoomId],
        time: f64,
        depth_limit: u32,
        change_threshold: f64,
    ) -> Result<(u64, bool), RunError> {
        let mut provisional = Provisional::new();
        for &id in order {
            let state = self.evaluate(pass, id, time, Some(&provisional))?;
            provisional.insert(id, state);
        }

        let mut passes = 0u64;
        let mut settled = false;
        while passes < u64::from(depth_limit) {
            passes += 1;
            let mut changed = false;
            for &id in order {
                let state = self.evaluate(pass, id, time, Some(&provisional))?;
                if let Some(previous) = provisional.insert(id, state)
                    && has_significant_changes(&previous, &state, change_threshold)
                {
                    changed = true;
                }
            }
            if !changed {
                settled = true;
                break;
            }
        }
        trace!(time, passes, settled, "step converged");

        for &id in order {
            if let Some(&state) = provisional.get(&id) {
                self.record(id, state);
            }
        }
        Ok((passes, settled))
    }

    /// Gather one room's inputs and run the calculator.
    fn evaluate(
        &self,
        pass: &Pass,
        id: RoomId,
        time: f64,
        provisional: Option<&Provisional>,
    ) -> Result<FireDynamicsParameters, RunError> {
        let room = self.room(id).ok_or(GraphError::RoomNotFound(id))?;

        let inputs = if id == pass.source || self.incoming_ids(id).is_empty() {
            DynamicsInputs::Isolated
        } else {
            let source_burned_mass = self.read_state(pass, pass.source, provisional)?.burned_mass;
            let upstream = self
                .incoming(id)
                .map(|(from, strength)| {
                    Ok(UpstreamState {
                        state: self.read_state(pass, from, provisional)?,
                        strength,
                    })
                })
                .collect::<Result<Vec<_>, RunError>>()?;
            DynamicsInputs::Connected {
                source_burned_mass,
                upstream,
            }
        };

        let state = calculate_fire_dynamics(room, time, &inputs, pass.aggregation);
        trace!(room = id.0, time, ?state, "room evaluated");
        Ok(state)
    }

    /// The newest known state of `id`: this step's provisional value, else
    /// its latest recorded entry.
    fn read_state(
        &self,
        pass: &Pass,
        id: RoomId,
        provisional: Option<&Provisional>,
    ) -> Result<FireDynamicsParameters, RunError> {
        if let Some(state) = provisional.and_then(|p| p.get(&id)) {
            return Ok(*state);
        }
        let room = self.room(id).ok_or(GraphError::RoomNotFound(id))?;
        match room.latest() {
            Some(state) => Ok(*state),
            None if pass.ambient_fallback => Ok(room.ambient_state()),
            None => Err(RunError::MissingHistory { room: id }),
        }
    }

    fn record(&mut self, id: RoomId, state: FireDynamicsParameters) {
        if let Some(room) = self.room_mut(id) {
            room.add_to_fire_dynamics_history(state);
        }
    }
}
