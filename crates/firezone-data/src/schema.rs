//! Serde data file structs for scenario definitions.
//!
//! These structs define the on-disk format for materials, rooms,
//! connections and run settings. They are deserialized from RON, JSON, or
//! TOML data files and then resolved into engine types by
//! [`crate::scenario`].

use firezone_core::run::RunConfig;
use serde::Deserialize;

// ===========================================================================
// Materials
// ===========================================================================

/// Combustion constants of one fuel load, keyed by `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct MaterialData {
    pub name: String,
    pub heat_of_combustion: f64,
    pub linear_flame_speed_rate: f64,
    pub specific_fuel_burn_rate: f64,
    pub smoke_forming_ability: f64,
    pub combustion_completeness_coefficient: f64,
    pub heat_absorption_coefficient: f64,
    #[serde(default = "default_start_temperature")]
    pub start_temperature: f64,
    #[serde(default = "default_initial_gas_density")]
    pub initial_gas_density: f64,
    #[serde(default = "default_specific_heat_capacity")]
    pub specific_heat_capacity: f64,
}

/// Ambient air at 20 °C, in kelvin.
fn default_start_temperature() -> f64 {
    293.0
}

fn default_initial_gas_density() -> f64 {
    1.21
}

fn default_specific_heat_capacity() -> f64 {
    1.03
}

// ===========================================================================
// Rooms and connections
// ===========================================================================

/// A room in a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct RoomData {
    pub id: u32,
    /// Name of an entry in the material table.
    pub material: String,
    /// Free volume of the room.
    pub volume: f64,
    /// Whether the fire starts here.
    #[serde(default)]
    pub source: bool,
    #[serde(default)]
    pub label: Option<String>,
}

/// A directed connection in a scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionData {
    pub from: u32,
    pub to: u32,
    pub strength: f64,
}

// ===========================================================================
// Scenario
// ===========================================================================

/// A complete scenario file.
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioData {
    #[serde(default)]
    pub name: Option<String>,
    /// Extra material list, relative to the scenario file.
    #[serde(default)]
    pub materials_file: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialData>,
    pub rooms: Vec<RoomData>,
    #[serde(default)]
    pub connections: Vec<ConnectionData>,
    #[serde(default)]
    pub run: Option<RunConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use firezone_core::run::{Aggregation, Propagation};

    #[test]
    fn deserialize_material_with_ambient_defaults() {
        let input = r#"(
            name: "wood",
            heat_of_combustion: 13800.0,
            linear_flame_speed_rate: 0.0108,
            specific_fuel_burn_rate: 0.0145,
            smoke_forming_ability: 270.0,
            combustion_completeness_coefficient: 0.87,
            heat_absorption_coefficient: 0.95,
        )"#;
        let material: MaterialData = ron::from_str(input).unwrap();
        assert_eq!(material.name, "wood");
        assert_eq!(material.start_temperature, 293.0);
        assert_eq!(material.initial_gas_density, 1.21);
        assert_eq!(material.specific_heat_capacity, 1.03);
    }

    #[test]
    fn deserialize_scenario_ron() {
        let input = r#"(
            name: Some("two rooms"),
            materials: [],
            rooms: [
                (id: 1, material: "wood", volume: 270.0, source: true),
                (id: 2, material: "wood", volume: 500.0, label: Some("corridor")),
            ],
            connections: [(from: 1, to: 2, strength: 0.2)],
        )"#;
        let scenario: ScenarioData = ron::from_str(input).unwrap();
        assert_eq!(scenario.rooms.len(), 2);
        assert!(scenario.rooms[0].source);
        assert!(!scenario.rooms[1].source);
        assert_eq!(scenario.rooms[1].label.as_deref(), Some("corridor"));
        assert_eq!(scenario.connections[0].strength, 0.2);
        assert!(scenario.run.is_none());
    }

    #[test]
    fn deserialize_run_config_json() {
        let input = r#"{
            "rooms": [],
            "run": {
                "end_time": 120.0,
                "time_step": 5.0,
                "propagation": {
                    "kind": "converging",
                    "depth_limit": 10,
                    "change_threshold": 1e-5
                },
                "aggregation": "running_partial"
            }
        }"#;
        let scenario: ScenarioData = serde_json::from_str(input).unwrap();
        let run = scenario.run.unwrap();
        assert_eq!(run.end_time, 120.0);
        assert_eq!(
            run.propagation,
            Propagation::Converging {
                depth_limit: 10,
                change_threshold: 1e-5,
            }
        );
        assert_eq!(run.aggregation, Aggregation::RunningPartial);
    }

    #[test]
    fn deserialize_scenario_toml() {
        let input = r#"
            name = "toml scenario"

            [[rooms]]
            id = 1
            material = "wood"
            volume = 270.0
            source = true

            [[connections]]
            from = 1
            to = 1
            strength = 0.5

            [run]
            end_time = 60.0
            time_step = 10.0
            cycles = "tolerate"
        "#;
        let scenario: ScenarioData = toml::from_str(input).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("toml scenario"));
        assert_eq!(scenario.rooms[0].id, 1);
        let run = scenario.run.unwrap();
        assert_eq!(run.time_step, 10.0);
        assert_eq!(run.propagation, Propagation::FixedStep);
    }
}
