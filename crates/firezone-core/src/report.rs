//! Read-only views of recorded histories for reporting collaborators.
//!
//! History entries carry no timestamps; entry `i` was computed at
//! `i * time_step`.

use crate::graph::RoomGraph;
use crate::id::RoomId;
use crate::room::{FireDynamicsParameters, Room};
use serde::Serialize;

/// One history entry with the time it was computed for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: f64,
    pub state: FireDynamicsParameters,
}

/// A room's history as time-stamped samples, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub room: RoomId,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn from_room(room: &Room, time_step: f64) -> Self {
        let samples = room
            .fire_dynamics_history()
            .iter()
            .enumerate()
            .map(|(step, state)| Sample {
                time: step as f64 * time_step,
                state: *state,
            })
            .collect();
        Self {
            room: room.id(),
            samples,
        }
    }

    /// The sample with the highest gas temperature (first one on ties).
    pub fn peak_gas_temperature(&self) -> Option<Sample> {
        self.samples.iter().copied().fold(None, |best, sample| match best {
            Some(b) if b.state.gas_temperature >= sample.state.gas_temperature => Some(b),
            _ => Some(sample),
        })
    }

    /// First time visibility drops strictly below `limit`.
    pub fn first_time_visibility_below(&self, limit: f64) -> Option<f64> {
        self.first_time(|s| s.visibility < limit)
    }

    /// First time gas temperature rises strictly above `limit`.
    pub fn first_time_temperature_above(&self, limit: f64) -> Option<f64> {
        self.first_time(|s| s.gas_temperature > limit)
    }

    fn first_time(&self, hit: impl Fn(&FireDynamicsParameters) -> bool) -> Option<f64> {
        self.samples
            .iter()
            .find(|sample| hit(&sample.state))
            .map(|sample| sample.time)
    }
}

impl RoomGraph {
    /// Time series for every room, ordered by room id.
    pub fn time_series(&self, time_step: f64) -> Vec<TimeSeries> {
        self.rooms()
            .values()
            .map(|room| TimeSeries::from_room(room, time_step))
            .collect()
    }
}
