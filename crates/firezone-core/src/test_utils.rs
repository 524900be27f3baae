//! Shared test helpers for unit tests, integration tests and downstream
//! crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]`.

use crate::graph::RoomGraph;
use crate::id::RoomId;
use crate::room::{InitialParameters, Room};

// ===========================================================================
// Material constants
// ===========================================================================

/// Reference fuel load in a 270 m³ room.
pub fn reference_parameters() -> InitialParameters {
    InitialParameters {
        heat_of_combustion: 13800.0,
        linear_flame_speed_rate: 0.0108,
        specific_fuel_burn_rate: 0.0145,
        smoke_forming_ability: 270.0,
        combustion_completeness_coefficient: 0.87,
        heat_absorption_coefficient: 0.95,
        start_temperature: 293.0,
        initial_gas_density: 1.21,
        specific_heat_capacity: 1.03,
        room_volume: 270.0,
    }
}

/// Reference fuel load in a room of the given volume.
pub fn reference_parameters_with_volume(room_volume: f64) -> InitialParameters {
    InitialParameters {
        room_volume,
        ..reference_parameters()
    }
}

// ===========================================================================
// Graph builders
// ===========================================================================

/// Source room 1 (270 m³) -> room 2 (500 m³) -> room 3 (270 m³), both
/// connections at strength 0.2.
pub fn three_room_chain() -> RoomGraph {
    let mut graph = RoomGraph::new();
    add_room(&mut graph, Room::source(RoomId(1), reference_parameters()));
    add_room(
        &mut graph,
        Room::new(RoomId(2), reference_parameters_with_volume(500.0)),
    );
    add_room(&mut graph, Room::new(RoomId(3), reference_parameters()));
    connect(&mut graph, 1, 2, 0.2);
    connect(&mut graph, 2, 3, 0.2);
    graph
}

/// Linear chain of `len` reference rooms, room 1 the source.
pub fn chain_graph(len: u32, strength: f64) -> RoomGraph {
    let mut graph = RoomGraph::new();
    for raw in 1..=len {
        let room = if raw == 1 {
            Room::source(RoomId(raw), reference_parameters())
        } else {
            Room::new(RoomId(raw), reference_parameters())
        };
        add_room(&mut graph, room);
    }
    for raw in 1..len {
        connect(&mut graph, raw, raw + 1, strength);
    }
    graph
}

// ===========================================================================
// Mutation helpers
// ===========================================================================

/// Add a room, panicking on a duplicate id.
pub fn add_room(graph: &mut RoomGraph, room: Room) {
    let id = room.id();
    graph
        .add_room(room)
        .unwrap_or_else(|e| panic!("failed to add {id}: {e}"));
}

/// Connect two rooms by raw id, panicking if either is missing.
pub fn connect(graph: &mut RoomGraph, from: u32, to: u32, strength: f64) {
    graph
        .add_connection(RoomId(from), RoomId(to), strength)
        .unwrap_or_else(|e| panic!("failed to connect {from} -> {to}: {e}"));
}
