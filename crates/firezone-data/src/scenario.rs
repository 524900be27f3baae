//! Scenario loading: resolve a [`ScenarioData`] file into a ready-to-run
//! [`RoomGraph`] plus its [`RunConfig`].

use crate::loader::{DataLoadError, deserialize_file};
use crate::materials::MaterialTable;
use crate::schema::ScenarioData;
use firezone_core::graph::RoomGraph;
use firezone_core::id::RoomId;
use firezone_core::room::Room;
use firezone_core::run::RunConfig;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// A resolved building scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    /// Rooms with empty histories, source flag set.
    pub graph: RoomGraph,
    /// Run settings from the file, or [`RunConfig::default`].
    pub run: RunConfig,
    /// Display names of rooms that carry one.
    pub labels: BTreeMap<RoomId, String>,
}

impl Scenario {
    /// Label of a room, falling back to its id.
    pub fn label(&self, id: RoomId) -> String {
        self.labels
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Load a scenario file (RON, JSON or TOML).
///
/// A `materials_file` entry is resolved relative to the scenario file's
/// directory and merged with the inline `materials`.
pub fn load_scenario(path: &Path) -> Result<Scenario, DataLoadError> {
    let data: ScenarioData = deserialize_file(path)?;

    let mut materials = MaterialTable::new();
    if let Some(relative) = &data.materials_file {
        let materials_path = path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(relative);
        debug!(path = %materials_path.display(), "loading material table");
        materials = MaterialTable::load(&materials_path)?;
    }

    let scenario = resolve(data, materials, path)?;
    info!(
        scenario = %scenario.name,
        rooms = scenario.graph.room_count(),
        connections = scenario.graph.connection_count(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Resolve already-deserialized scenario data using only its inline
/// materials. `file` is only used for error messages and the default name.
pub fn build_scenario(data: ScenarioData, file: &Path) -> Result<Scenario, DataLoadError> {
    resolve(data, MaterialTable::new(), file)
}

fn resolve(
    data: ScenarioData,
    mut materials: MaterialTable,
    file: &Path,
) -> Result<Scenario, DataLoadError> {
    materials.extend_from(&data.materials, file)?;

    let graph_error = |source| DataLoadError::Graph {
        file: file.to_path_buf(),
        source,
    };

    let mut graph = RoomGraph::new();
    let mut labels = BTreeMap::new();
    for room_data in &data.rooms {
        let id = RoomId(room_data.id);
        let initial = materials.initial_parameters(&room_data.material, room_data.volume, file)?;
        let room = if room_data.source {
            Room::source(id, initial)
        } else {
            Room::new(id, initial)
        };
        graph.add_room(room).map_err(graph_error)?;
        if let Some(label) = &room_data.label {
            labels.insert(id, label.clone());
        }
    }

    for connection in &data.connections {
        graph
            .add_connection(RoomId(connection.from), RoomId(connection.to), connection.strength)
            .map_err(graph_error)?;
    }

    let name = data.name.unwrap_or_else(|| {
        file.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scenario")
            .to_string()
    });

    Ok(Scenario {
        name,
        graph,
        run: data.run.unwrap_or_default(),
        labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::tests::{cleanup, make_test_dir};
    use firezone_core::graph::GraphError;
    use firezone_core::test_utils::{reference_parameters, reference_parameters_with_volume};
    use std::fs;
    use std::path::PathBuf;

    const WOOD: &str = r#"(
        name: "wood",
        heat_of_combustion: 13800.0,
        linear_flame_speed_rate: 0.0108,
        specific_fuel_burn_rate: 0.0145,
        smoke_forming_ability: 270.0,
        combustion_completeness_coefficient: 0.87,
        heat_absorption_coefficient: 0.95,
    )"#;

    fn scenario_ron(rooms: &str, connections: &str) -> String {
        format!("(materials: [{WOOD}], rooms: [{rooms}], connections: [{connections}])")
    }

    fn build(text: &str) -> Result<Scenario, DataLoadError> {
        let file = Path::new("inline.ron");
        let data: ScenarioData = ron::from_str(text).unwrap();
        build_scenario(data, file)
    }

    #[test]
    fn builds_graph_from_inline_materials() {
        let text = scenario_ron(
            r#"(id: 1, material: "wood", volume: 270.0, source: true, label: Some("hall")),
               (id: 2, material: "wood", volume: 500.0)"#,
            "(from: 1, to: 2, strength: 0.2)",
        );
        let scenario = build(&text).unwrap();

        assert_eq!(scenario.name, "inline");
        assert_eq!(scenario.graph.room_count(), 2);
        assert_eq!(scenario.graph.connection_count(), 1);
        assert_eq!(scenario.graph.source_rooms(), vec![RoomId(1)]);
        assert_eq!(
            scenario.graph.room(RoomId(2)).unwrap().initial_parameters(),
            reference_parameters_with_volume(500.0)
        );
        assert_eq!(scenario.label(RoomId(1)), "hall");
        assert_eq!(scenario.label(RoomId(2)), "room 2");
        assert_eq!(scenario.run, RunConfig::default());
    }

    #[test]
    fn unknown_material_fails() {
        let text = scenario_ron(r#"(id: 1, material: "steel", volume: 10.0, source: true)"#, "");
        let err = build(&text).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::UnresolvedRef {
                expected_kind: "material",
                ref name,
                ..
            } if name == "steel"
        ));
    }

    #[test]
    fn duplicate_room_is_graph_error() {
        let text = scenario_ron(
            r#"(id: 1, material: "wood", volume: 10.0, source: true),
               (id: 1, material: "wood", volume: 20.0)"#,
            "",
        );
        let err = build(&text).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Graph { source: GraphError::DuplicateRoomId(RoomId(1)), .. }
        ));
    }

    #[test]
    fn dangling_connection_is_graph_error() {
        let text = scenario_ron(
            r#"(id: 1, material: "wood", volume: 10.0, source: true)"#,
            "(from: 1, to: 9, strength: 0.5)",
        );
        let err = build(&text).unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::Graph { source: GraphError::UnknownRoomReference { .. }, .. }
        ));
    }

    #[test]
    fn load_with_external_material_file() {
        let dir = make_test_dir("scenario_external");
        fs::write(dir.join("materials.ron"), format!("[{WOOD}]")).unwrap();
        fs::write(
            dir.join("office.json"),
            r#"{
                "name": "office",
                "materials_file": "materials.ron",
                "rooms": [
                    { "id": 1, "material": "wood", "volume": 270.0, "source": true },
                    { "id": 2, "material": "wood", "volume": 270.0 }
                ],
                "connections": [ { "from": 1, "to": 2, "strength": 0.3 } ],
                "run": { "end_time": 60.0, "time_step": 5.0 }
            }"#,
        )
        .unwrap();

        let scenario = load_scenario(&dir.join("office.json")).unwrap();
        assert_eq!(scenario.name, "office");
        assert_eq!(scenario.run, RunConfig::fixed_step(60.0, 5.0));
        assert_eq!(
            scenario.graph.room(RoomId(1)).unwrap().initial_parameters(),
            reference_parameters()
        );

        cleanup(&dir);
    }

    #[test]
    fn material_defined_twice_is_duplicate() {
        let dir = make_test_dir("scenario_duplicate_material");
        fs::write(dir.join("materials.ron"), format!("[{WOOD}]")).unwrap();
        fs::write(
            dir.join("dup.ron"),
            format!(
                r#"(materials_file: Some("materials.ron"), materials: [{WOOD}],
                    rooms: [(id: 1, material: "wood", volume: 1.0, source: true)])"#
            ),
        )
        .unwrap();

        let err = load_scenario(&dir.join("dup.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateName { ref name, .. } if name == "wood"));

        cleanup(&dir);
    }

    #[test]
    fn shipped_scenarios_load_and_run() {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for file in ["three_rooms.ron", "apartment.toml"] {
            let mut scenario = load_scenario(&dir.join(file)).unwrap();
            let run = scenario.run;
            let summary = scenario.graph.run(&run).unwrap();
            for room in scenario.graph.rooms().values() {
                assert_eq!(
                    room.fire_dynamics_history().len() as u64,
                    summary.entries_per_room()
                );
            }
        }
    }
}
