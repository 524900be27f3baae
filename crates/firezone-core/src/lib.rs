//! Firezone Core -- a zone (compartment) fire model over a graph of rooms.
//!
//! Estimates how heat, smoke and loss of visibility spread through a
//! building from one source room, producing a per-room time series of
//! hazard indicators from a handful of empirical material constants.
//!
//! # Run pipeline
//!
//! Each call to [`graph::RoomGraph::run`]:
//!
//! 1. **Validate** -- timing, exactly one source room, empty histories.
//! 2. **Order** -- one dependency order over the outgoing connections,
//!    source room first.
//! 3. **Seed** -- one t=0 entry per room, in processing order.
//! 4. **Step** -- one sweep per time step, appending to every history.
//!
//! # Building a graph
//!
//! ```rust,ignore
//! let mut graph = RoomGraph::new();
//! graph.add_room(Room::source(RoomId(1), params))?;
//! graph.add_room(Room::new(RoomId(2), params))?;
//! graph.add_connection(RoomId(1), RoomId(2), 0.2)?;
//! let summary = graph.calculate_fire_dynamics_up_to_time(200.0, 10.0)?;
//! ```
//!
//! # Key Types
//!
//! - [`room::Room`] -- inputs, derived constants and append-only history.
//! - [`graph::RoomGraph`] -- rooms plus mirrored incoming/outgoing
//!   connection lists (a multigraph, possibly cyclic).
//! - [`dynamics`] -- the pure per-room calculator.
//! - [`run::RunConfig`] -- step size, end time, propagation strategy,
//!   aggregation rule and cycle policy.
//! - [`report::TimeSeries`] -- time-stamped history views.

pub mod dynamics;
pub mod engine;
pub mod graph;
pub mod id;
pub mod ordering;
pub mod report;
pub mod room;
pub mod run;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
