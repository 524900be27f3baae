//! The fire dynamics calculator.
//!
//! Pure functions: given a room's constants, the time, and (for connected
//! rooms) the latest states of its upstream neighbours and the source room's
//! burned mass, produce one [`FireDynamicsParameters`] snapshot. Nothing here
//! reads or writes history; the driver in [`crate::engine`] gathers inputs.
//!
//! Two regimes:
//!
//! - **Isolated** -- the source room, or any room with no incoming
//!   connections. Closed-form cubic burn model.
//! - **Connected** -- every other room. One term per incoming connection,
//!   driven by the upstream state and the source's burned mass, then averaged.

use crate::room::{
    CalculatedParameters, FireDynamicsParameters, InitialParameters, MAX_VISIBILITY, Room,
};
use crate::run::Aggregation;

/// The latest state of one upstream neighbour and the strength of the
/// connection it feeds through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpstreamState {
    pub state: FireDynamicsParameters,
    pub strength: f64,
}

/// What a room's computation depends on.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicsInputs {
    /// Source room or no incoming connections.
    Isolated,
    /// Non-source room with at least one incoming connection.
    Connected {
        /// Most recently recorded burned mass of the source room.
        source_burned_mass: f64,
        /// One entry per incoming connection, in connection order.
        upstream: Vec<UpstreamState>,
    },
}

/// Compute one snapshot for `room` at `time`.
///
/// A `Connected` input with an empty upstream list is treated as isolated.
pub fn calculate_fire_dynamics(
    room: &Room,
    time: f64,
    inputs: &DynamicsInputs,
    aggregation: Aggregation,
) -> FireDynamicsParameters {
    let initial = room.initial_parameters();
    let calculated = room.calculated_parameters();
    match inputs {
        DynamicsInputs::Connected {
            source_burned_mass,
            upstream,
        } if !upstream.is_empty() => match aggregation {
            Aggregation::MeanOfTerms => {
                mean_of_terms(&initial, &calculated, time, *source_burned_mass, upstream)
            }
            Aggregation::RunningPartial => {
                running_partial(&initial, &calculated, time, *source_burned_mass, upstream)
            }
        },
        _ => isolated_room(&initial, &calculated, time),
    }
}

/// Closed-form state of a room burning on its own.
pub fn isolated_room(
    initial: &InitialParameters,
    calculated: &CalculatedParameters,
    time: f64,
) -> FireDynamicsParameters {
    let burned_mass = burned_mass(calculated, time);
    let decay = (-calculated.gas_release_per_meter_burn * burned_mass / initial.room_volume).exp();

    let gas_density = calculated.limit_gas_density
        + (initial.initial_gas_density - calculated.limit_gas_density) * decay;
    let smoke = calculated.limit_smoke_extinction_coefficient
        + (0.0 - calculated.limit_smoke_extinction_coefficient) * decay;

    FireDynamicsParameters {
        burned_mass,
        gas_density,
        gas_temperature: initial.start_temperature * initial.initial_gas_density / gas_density,
        smoke_extinction_coefficient: smoke,
        visibility: visibility(calculated, smoke),
    }
}

/// `A * t^n`.
fn burned_mass(calculated: &CalculatedParameters, time: f64) -> f64 {
    calculated.a * time.powf(calculated.n)
}

/// Visibility for a smoke extinction coefficient, capped at [`MAX_VISIBILITY`].
fn visibility(calculated: &CalculatedParameters, smoke: f64) -> f64 {
    MAX_VISIBILITY.min(calculated.limit_visibility / smoke)
}

/// Exponential transfer factor of one connection.
fn connection_decay(
    initial: &InitialParameters,
    calculated: &CalculatedParameters,
    strength: f64,
    source_burned_mass: f64,
) -> f64 {
    (-strength * calculated.gas_release_per_meter_burn * source_burned_mass / initial.room_volume)
        .exp()
}

/// Each connection contributes an independent term; the result is their
/// arithmetic mean. Burned mass depends only on the room itself.
fn mean_of_terms(
    initial: &InitialParameters,
    calculated: &CalculatedParameters,
    time: f64,
    source_burned_mass: f64,
    upstream: &[UpstreamState],
) -> FireDynamicsParameters {
    let count = upstream.len() as f64;
    let mut gas_density = 0.0;
    let mut gas_temperature = 0.0;
    let mut smoke = 0.0;
    let mut vis = 0.0;

    for up in upstream {
        let decay = connection_decay(initial, calculated, up.strength, source_burned_mass);
        let density_term =
            up.state.gas_density + (initial.initial_gas_density - up.state.gas_density) * decay;
        let smoke_term = up.state.smoke_extinction_coefficient
            + (0.0 - up.state.smoke_extinction_coefficient) * decay;

        gas_density += density_term;
        gas_temperature += initial.start_temperature * initial.initial_gas_density / density_term;
        smoke += smoke_term;
        vis += visibility(calculated, smoke_term);
    }

    FireDynamicsParameters {
        burned_mass: burned_mass(calculated, time),
        gas_density: gas_density / count,
        gas_temperature: gas_temperature / count,
        smoke_extinction_coefficient: smoke / count,
        visibility: vis / count,
    }
}

/// Legacy aggregation, kept for exact output parity: burned mass is summed
/// once per connection, and temperature and visibility divide by the running
/// partial sums of density and smoke rather than by each term.
fn running_partial(
    initial: &InitialParameters,
    calculated: &CalculatedParameters,
    time: f64,
    source_burned_mass: f64,
    upstream: &[UpstreamState],
) -> FireDynamicsParameters {
    let mut acc = FireDynamicsParameters {
        burned_mass: 0.0,
        gas_density: 0.0,
        gas_temperature: 0.0,
        smoke_extinction_coefficient: 0.0,
        visibility: 0.0,
    };

    for up in upstream {
        let decay = connection_decay(initial, calculated, up.strength, source_burned_mass);
        acc.burned_mass += burned_mass(calculated, time);
        acc.gas_density +=
            up.state.gas_density + (initial.initial_gas_density - up.state.gas_density) * decay;
        acc.gas_temperature +=
            initial.start_temperature * initial.initial_gas_density / acc.gas_density;
        acc.smoke_extinction_coefficient += up.state.smoke_extinction_coefficient
            + (0.0 - up.state.smoke_extinction_coefficient) * decay;
        acc.visibility += visibility(calculated, acc.smoke_extinction_coefficient);
    }

    let count = upstream.len() as f64;
    acc.burned_mass /= count;
    acc.gas_density /= count;
    acc.gas_temperature /= count;
    acc.smoke_extinction_coefficient /= count;
    acc.visibility /= count;
    acc
}

/// Whether any indicator moved by more than `threshold` between two
/// snapshots. Changes are relative for magnitudes above 1 and absolute
/// below, so values near zero do not amplify noise.
pub fn has_significant_changes(
    old: &FireDynamicsParameters,
    new: &FireDynamicsParameters,
    threshold: f64,
) -> bool {
    let pairs = [
        (old.burned_mass, new.burned_mass),
        (old.gas_density, new.gas_density),
        (old.gas_temperature, new.gas_temperature),
        (old.smoke_extinction_coefficient, new.smoke_extinction_coefficient),
        (old.visibility, new.visibility),
    ];
    pairs.iter().any(|&(a, b)| {
        if a == b {
            return false;
        }
        if !(a.is_finite() && b.is_finite()) {
            return true;
        }
        (b - a).abs() / a.abs().max(1.0) > threshold
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::RoomId;
    use crate::test_utils::reference_parameters;
    use approx::assert_relative_eq;

    fn reference_room() -> Room {
        Room::source(RoomId(1), reference_parameters())
    }

    fn connected(source_burned_mass: f64, upstream: Vec<UpstreamState>) -> DynamicsInputs {
        DynamicsInputs::Connected {
            source_burned_mass,
            upstream,
        }
    }

    #[test]
    fn isolated_burned_mass_is_cubic() {
        let room = reference_room();
        let a = room.calculated_parameters().a;
        let s = calculate_fire_dynamics(
            &room,
            10.0,
            &DynamicsInputs::Isolated,
            Aggregation::default(),
        );
        assert_relative_eq!(s.burned_mass, a * 1000.0, max_relative = 1e-12);

        let s2 = calculate_fire_dynamics(
            &room,
            20.0,
            &DynamicsInputs::Isolated,
            Aggregation::default(),
        );
        assert_relative_eq!(s2.burned_mass / s.burned_mass, 8.0, max_relative = 1e-12);
    }

    #[test]
    fn isolated_density_approaches_limit_from_one_side() {
        let room = reference_room();
        let p = room.initial_parameters();
        let c = room.calculated_parameters();
        let initial_gap = p.initial_gas_density - c.limit_gas_density;

        let mut previous_gap = initial_gap.abs();
        for step in 1..=50 {
            let s = isolated_room(&p, &c, f64::from(step) * 20.0);
            let gap = s.gas_density - c.limit_gas_density;
            assert_eq!(gap.signum(), initial_gap.signum());
            assert!(gap.abs() <= previous_gap);
            previous_gap = gap.abs();
        }
    }

    #[test]
    fn isolated_temperature_follows_density() {
        let room = reference_room();
        let p = room.initial_parameters();
        let s = isolated_room(&p, &room.calculated_parameters(), 120.0);
        assert_relative_eq!(
            s.gas_temperature,
            p.start_temperature * p.initial_gas_density / s.gas_density,
            max_relative = 1e-12
        );
    }

    #[test]
    fn visibility_is_capped_at_thirty() {
        let room = reference_room();
        let s = isolated_room(&room.initial_parameters(), &room.calculated_parameters(), 0.0);
        assert_eq!(s.visibility, MAX_VISIBILITY);

        let late = isolated_room(&room.initial_parameters(), &room.calculated_parameters(), 600.0);
        assert!(late.visibility < MAX_VISIBILITY);
        assert!(late.visibility >= 0.0);
    }

    #[test]
    fn connected_with_no_upstream_is_isolated() {
        let room = Room::new(RoomId(2), reference_parameters());
        let a = calculate_fire_dynamics(
            &room,
            30.0,
            &connected(5.0, Vec::new()),
            Aggregation::MeanOfTerms,
        );
        let b = calculate_fire_dynamics(
            &room,
            30.0,
            &DynamicsInputs::Isolated,
            Aggregation::MeanOfTerms,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn connected_room_without_source_burn_stays_ambient() {
        let room = Room::new(RoomId(2), reference_parameters());
        let upstream = UpstreamState {
            state: isolated_room(&room.initial_parameters(), &room.calculated_parameters(), 300.0),
            strength: 0.2,
        };
        let s = calculate_fire_dynamics(
            &room,
            0.0,
            &connected(0.0, vec![upstream]),
            Aggregation::MeanOfTerms,
        );
        let p = room.initial_parameters();
        assert_relative_eq!(s.gas_density, p.initial_gas_density, max_relative = 1e-12);
        assert_relative_eq!(s.smoke_extinction_coefficient, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn single_connection_aggregations_agree_on_density_and_smoke() {
        let room = Room::new(RoomId(2), reference_parameters());
        let upstream = UpstreamState {
            state: isolated_room(&room.initial_parameters(), &room.calculated_parameters(), 200.0),
            strength: 0.3,
        };
        let inputs = connected(40.0, vec![upstream]);
        let mean = calculate_fire_dynamics(&room, 200.0, &inputs, Aggregation::MeanOfTerms);
        let legacy = calculate_fire_dynamics(&room, 200.0, &inputs, Aggregation::RunningPartial);
        assert_eq!(mean, legacy);
    }

    #[test]
    fn running_partial_biases_temperature_with_two_connections() {
        let room = Room::new(RoomId(3), reference_parameters());
        let p = room.initial_parameters();
        let c = room.calculated_parameters();
        let up = UpstreamState {
            state: isolated_room(&p, &c, 250.0),
            strength: 0.5,
        };
        let inputs = connected(60.0, vec![up, up]);

        let mean = calculate_fire_dynamics(&room, 250.0, &inputs, Aggregation::MeanOfTerms);
        let legacy = calculate_fire_dynamics(&room, 250.0, &inputs, Aggregation::RunningPartial);

        // Identical connections: the proper mean equals a single term.
        let single = calculate_fire_dynamics(
            &room,
            250.0,
            &connected(60.0, vec![up]),
            Aggregation::MeanOfTerms,
        );
        assert_relative_eq!(mean.gas_temperature, single.gas_temperature, max_relative = 1e-12);
        assert_relative_eq!(legacy.gas_density, mean.gas_density, max_relative = 1e-12);

        // Legacy: (T0p0/d + T0p0/(2d)) / 2 = 0.75 * T0p0/d.
        assert_relative_eq!(
            legacy.gas_temperature,
            0.75 * single.gas_temperature,
            max_relative = 1e-12
        );
    }

    #[test]
    fn mean_of_terms_burned_mass_is_own_growth() {
        let room = Room::new(RoomId(2), reference_parameters());
        let c = room.calculated_parameters();
        let up = UpstreamState {
            state: room.ambient_state(),
            strength: 1.0,
        };
        let s = calculate_fire_dynamics(
            &room,
            10.0,
            &connected(1.0, vec![up, up, up]),
            Aggregation::MeanOfTerms,
        );
        assert_eq!(s.burned_mass, c.a * 10f64.powf(3.0));
    }

    #[test]
    fn significant_change_detection() {
        let base = FireDynamicsParameters {
            burned_mass: 10.0,
            gas_density: 1.2,
            gas_temperature: 300.0,
            smoke_extinction_coefficient: 0.0,
            visibility: 30.0,
        };
        assert!(!has_significant_changes(&base, &base, 1e-5));

        let mut warmer = base;
        warmer.gas_temperature = 300.001;
        assert!(!has_significant_changes(&base, &warmer, 1e-5));
        warmer.gas_temperature = 301.0;
        assert!(has_significant_changes(&base, &warmer, 1e-5));

        let mut smoky = base;
        smoky.smoke_extinction_coefficient = 1e-7;
        assert!(!has_significant_changes(&base, &smoky, 1e-5));

        let mut broken = base;
        broken.gas_density = f64::NAN;
        assert!(has_significant_changes(&base, &broken, 1e-5));
    }

    #[test]
    fn small_magnitudes_compare_absolutely() {
        let base = FireDynamicsParameters {
            burned_mass: 0.0,
            gas_density: 0.5,
            gas_temperature: 300.0,
            smoke_extinction_coefficient: 0.0,
            visibility: 30.0,
        };

        // 8e-7 absolute is 1.6e-6 relative to 0.5; only the absolute change counts.
        let mut denser = base;
        denser.gas_density = 0.500_000_8;
        assert!(!has_significant_changes(&base, &denser, 1e-6));

        denser.gas_density = 0.500_002;
        assert!(has_significant_changes(&base, &denser, 1e-6));
    }
}
