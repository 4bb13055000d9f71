//! Scene files for the Voltaic engine.
//!
//! A scene lists named nodes with their behaviors and the wires between
//! them as `"node.plug"` references. Files may be RON, TOML or JSON; the
//! format is taken from the extension. The engine trusts the topology it is
//! given, so the builder only checks that references resolve.

pub mod builder;
pub mod loader;
pub mod schema;

pub use builder::{BuiltScene, build_scene, component_from_data};
pub use loader::{Format, SceneError, detect_format, load_scene, parse_scene};
pub use schema::{ComponentData, SceneData, SceneNode, WireData};
