//! Format detection and parsing of scene files.

use std::path::{Path, PathBuf};

use voltaic_core::CircuitError;

use crate::schema::SceneData;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or building a scene.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {origin}: {detail}")]
    Parse { origin: String, detail: String },

    /// Two nodes share a name.
    #[error("duplicate node name '{name}'")]
    DuplicateName { name: String },

    /// A wire endpoint is not of the form `node.plug`.
    #[error("malformed plug reference '{reference}' (expected node.plug)")]
    MalformedRef { reference: String },

    /// A wire names a node that is not in the scene.
    #[error("unresolved node in '{reference}'")]
    UnresolvedNode { reference: String },

    /// A wire names a plug its node does not have.
    #[error("unresolved plug in '{reference}'")]
    UnresolvedPlug { reference: String },

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported scene file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, SceneError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(SceneError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Parsing
// ===========================================================================

/// Parse scene text in the given format.
pub fn parse_scene(content: &str, format: Format) -> Result<SceneData, SceneError> {
    parse_named(content, format, "<inline>")
}

/// Read and parse a scene file, format taken from the extension.
pub fn load_scene(path: &Path) -> Result<SceneData, SceneError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let scene = parse_named(&content, format, &path.display().to_string())?;
    tracing::debug!(
        file = %path.display(),
        nodes = scene.nodes.len(),
        wires = scene.wires.len(),
        "scene loaded"
    );
    Ok(scene)
}

fn parse_named(content: &str, format: Format, origin: &str) -> Result<SceneData, SceneError> {
    let parse_error = |detail: String| SceneError::Parse {
        origin: origin.to_string(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
