//! Data files for the Firezone engine: material tables and building
//! scenarios in RON, TOML or JSON, resolved into a ready-to-run
//! [`firezone_core::graph::RoomGraph`].

pub mod loader;
pub mod materials;
pub mod scenario;
pub mod schema;

pub use loader::{DataLoadError, Format};
pub use materials::{MaterialProperties, MaterialTable};
pub use scenario::{Scenario, build_scenario, load_scenario};
