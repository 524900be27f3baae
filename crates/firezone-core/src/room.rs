//! Rooms: immutable material/geometry inputs, derived constants, and the
//! append-only fire dynamics history.

use crate::dynamics;
use crate::id::RoomId;
use serde::{Deserialize, Serialize};

/// Fire-growth exponent of the cubic burn model.
pub const GROWTH_EXPONENT: f64 = 3.0;

/// Critical visibility (m) used as the limit value by the regulatory method.
pub const LIMIT_VISIBILITY: f64 = 2.38;

/// Upper bound reported for visibility (m), reached in clear air.
pub const MAX_VISIBILITY: f64 = 30.0;

// ---------------------------------------------------------------------------
// Parameter sets
// ---------------------------------------------------------------------------

/// Caller-supplied inputs for one room. Never validated: zero or negative
/// values flow into the formulas as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialParameters {
    /// Lower heat of combustion of the fuel load.
    pub heat_of_combustion: f64,
    /// Linear flame spread rate.
    pub linear_flame_speed_rate: f64,
    /// Specific mass burn rate of the fuel load.
    pub specific_fuel_burn_rate: f64,
    /// Smoke-forming ability of the burning material.
    pub smoke_forming_ability: f64,
    /// Combustion completeness coefficient.
    pub combustion_completeness_coefficient: f64,
    /// Fraction of released heat absorbed by the enclosure.
    pub heat_absorption_coefficient: f64,
    /// Ambient gas temperature before ignition.
    pub start_temperature: f64,
    /// Ambient gas density before ignition.
    pub initial_gas_density: f64,
    /// Specific heat capacity of the gas at constant pressure.
    pub specific_heat_capacity: f64,
    /// Free volume of the room.
    pub room_volume: f64,
}

/// Constants derived once from [`InitialParameters`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculatedParameters {
    /// Fire-growth coefficient `A`.
    pub a: f64,
    /// Fire-growth exponent `n`.
    pub n: f64,
    /// Gas released per unit of burned mass (`k`).
    pub gas_release_per_meter_burn: f64,
    pub limit_gas_density: f64,
    pub limit_gas_temperature: f64,
    pub limit_smoke_extinction_coefficient: f64,
    pub limit_visibility: f64,
}

impl CalculatedParameters {
    /// Derive the constants. Pure: equal inputs give bit-identical outputs.
    pub fn derive(initial: &InitialParameters) -> Self {
        let a = 1.05 * initial.specific_fuel_burn_rate * initial.linear_flame_speed_rate.powi(2);
        let k = (initial.combustion_completeness_coefficient
            * initial.heat_of_combustion
            * (1.0 - initial.heat_absorption_coefficient))
            / (initial.start_temperature
                * initial.initial_gas_density
                * initial.specific_heat_capacity);
        let limit_gas_density = 1.0 / k;

        Self {
            a,
            n: GROWTH_EXPONENT,
            gas_release_per_meter_burn: k,
            limit_gas_density,
            limit_gas_temperature: initial.start_temperature * initial.initial_gas_density
                / limit_gas_density,
            limit_smoke_extinction_coefficient: initial.smoke_forming_ability / k,
            limit_visibility: LIMIT_VISIBILITY,
        }
    }
}

/// One snapshot of a room's hazard indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FireDynamicsParameters {
    pub burned_mass: f64,
    pub gas_density: f64,
    pub gas_temperature: f64,
    pub smoke_extinction_coefficient: f64,
    pub visibility: f64,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// A compartment with its inputs, derived constants and history.
///
/// History index 0 is the t=0 seed; each later entry is one time step.
/// Entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    id: RoomId,
    is_gas_source: bool,
    initial: InitialParameters,
    calculated: CalculatedParameters,
    history: Vec<FireDynamicsParameters>,
}

impl Room {
    /// Create a non-source room. Constants are derived here, once.
    pub fn new(id: RoomId, initial: InitialParameters) -> Self {
        Self {
            id,
            is_gas_source: false,
            calculated: CalculatedParameters::derive(&initial),
            initial,
            history: Vec::new(),
        }
    }

    /// Create the room the fire starts in.
    pub fn source(id: RoomId, initial: InitialParameters) -> Self {
        let mut room = Self::new(id, initial);
        room.is_gas_source = true;
        room
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn is_gas_source(&self) -> bool {
        self.is_gas_source
    }

    pub fn set_gas_source(&mut self, source: bool) {
        self.is_gas_source = source;
    }

    pub fn initial_parameters(&self) -> InitialParameters {
        self.initial
    }

    pub fn calculated_parameters(&self) -> CalculatedParameters {
        self.calculated
    }

    /// The recorded history, oldest first.
    pub fn fire_dynamics_history(&self) -> &[FireDynamicsParameters] {
        &self.history
    }

    /// The most recently recorded snapshot, if any.
    pub fn latest(&self) -> Option<&FireDynamicsParameters> {
        self.history.last()
    }

    /// Append one snapshot. The only way history changes.
    pub fn add_to_fire_dynamics_history(&mut self, params: FireDynamicsParameters) {
        self.history.push(params);
    }

    /// The room's state before any mass has burned.
    pub fn ambient_state(&self) -> FireDynamicsParameters {
        dynamics::isolated_room(&self.initial, &self.calculated, 0.0)
    }
}
