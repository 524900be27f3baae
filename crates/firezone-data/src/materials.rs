//! Material lookup table.
//!
//! Maps a material key to the combustion constants of a fuel load. The
//! table is an ordinary value owned by the caller and passed to whatever
//! needs it; there is no process-wide registry.

use crate::loader::{DataLoadError, deserialize_list};
use crate::schema::MaterialData;
use firezone_core::room::InitialParameters;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Every [`InitialParameters`] field except the room volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub heat_of_combustion: f64,
    pub linear_flame_speed_rate: f64,
    pub specific_fuel_burn_rate: f64,
    pub smoke_forming_ability: f64,
    pub combustion_completeness_coefficient: f64,
    pub heat_absorption_coefficient: f64,
    pub start_temperature: f64,
    pub initial_gas_density: f64,
    pub specific_heat_capacity: f64,
}

impl MaterialProperties {
    /// Complete the parameter set for a room of the given volume.
    pub fn with_volume(&self, room_volume: f64) -> InitialParameters {
        InitialParameters {
            heat_of_combustion: self.heat_of_combustion,
            linear_flame_speed_rate: self.linear_flame_speed_rate,
            specific_fuel_burn_rate: self.specific_fuel_burn_rate,
            smoke_forming_ability: self.smoke_forming_ability,
            combustion_completeness_coefficient: self.combustion_completeness_coefficient,
            heat_absorption_coefficient: self.heat_absorption_coefficient,
            start_temperature: self.start_temperature,
            initial_gas_density: self.initial_gas_density,
            specific_heat_capacity: self.specific_heat_capacity,
            room_volume,
        }
    }
}

impl From<&MaterialData> for MaterialProperties {
    fn from(data: &MaterialData) -> Self {
        Self {
            heat_of_combustion: data.heat_of_combustion,
            linear_flame_speed_rate: data.linear_flame_speed_rate,
            specific_fuel_burn_rate: data.specific_fuel_burn_rate,
            smoke_forming_ability: data.smoke_forming_ability,
            combustion_completeness_coefficient: data.combustion_completeness_coefficient,
            heat_absorption_coefficient: data.heat_absorption_coefficient,
            start_temperature: data.start_temperature,
            initial_gas_density: data.initial_gas_density,
            specific_heat_capacity: data.specific_heat_capacity,
        }
    }
}

/// Material key -> combustion constants.
#[derive(Debug, Clone, Default)]
pub struct MaterialTable {
    entries: HashMap<String, MaterialProperties>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a material list from a RON, JSON or TOML (`[[materials]]`) file.
    pub fn load(path: &Path) -> Result<Self, DataLoadError> {
        let list: Vec<MaterialData> = deserialize_list(path, "materials")?;
        let mut table = Self::new();
        table.extend_from(&list, path)?;
        Ok(table)
    }

    /// Add every entry of `list`, failing on the first name already present.
    /// `file` is only used for error messages.
    pub fn extend_from(&mut self, list: &[MaterialData], file: &Path) -> Result<(), DataLoadError> {
        for data in list {
            self.insert(&data.name, MaterialProperties::from(data), file)?;
        }
        Ok(())
    }

    /// Add one material. Names are unique.
    pub fn insert(
        &mut self,
        name: &str,
        properties: MaterialProperties,
        file: &Path,
    ) -> Result<(), DataLoadError> {
        if self.entries.contains_key(name) {
            return Err(DataLoadError::DuplicateName {
                file: file.to_path_buf(),
                name: name.to_string(),
            });
        }
        debug!(material = name, "material registered");
        self.entries.insert(name.to_string(), properties);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&MaterialProperties> {
        self.entries.get(name)
    }

    /// Fully populated room inputs for `name` in a room of `room_volume`.
    pub fn initial_parameters(
        &self,
        name: &str,
        room_volume: f64,
        file: &Path,
    ) -> Result<InitialParameters, DataLoadError> {
        self.get(name)
            .map(|properties| properties.with_volume(room_volume))
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                file: file.to_path_buf(),
                name: name.to_string(),
                expected_kind: "material",
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
