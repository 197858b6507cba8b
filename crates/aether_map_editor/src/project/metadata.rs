//! `metadata.json`: project info, grid dimensions, tileset reference and per-layer properties

use std::path::{Path, PathBuf};

use aether_map_core::{Layer, LayerKind, Project, Tileset};
use serde::{Deserialize, Serialize};

use super::binary::LAYER_FILE_EXTENSION;
use crate::error::ProjectError;

pub const METADATA_FILE: &str = "metadata.json";
pub const METADATA_VERSION: &str = "1.0";
pub const EDITOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project: ProjectInfo,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub tileset: Option<TilesetInfo>,
    #[serde(default)]
    pub layers: Vec<LayerInfo>,
    /// Free-form project metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// ISO-8601 time the file was written
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub editor_version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub grid_width: u32,
    pub grid_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetInfo {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub tile_width: u32,
    #[serde(default)]
    pub tile_height: u32,
    #[serde(default)]
    pub tile_count: usize,
}

/// Stored properties of one layer. Missing optional keys take the layer defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: LayerKind,
    /// Layer file name inside `layers/`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub file: String,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default = "default_true")]
    pub interacts_with_layers: bool,
}

fn default_version() -> String {
    METADATA_VERSION.to_string()
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> f32 {
    1.0
}

/// Layer names become file and archive entry names, so path separators are refused
pub fn layer_file_name(name: &str) -> Result<String, ProjectError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(ProjectError::format(format!(
            "layer name '{name}' cannot be used as a file name"
        )));
    }
    Ok(format!("{name}.{LAYER_FILE_EXTENSION}"))
}

impl LayerInfo {
    pub fn from_layer(layer: &Layer) -> Result<Self, ProjectError> {
        Ok(Self {
            name: layer.name.clone(),
            kind: layer.kind,
            file: layer_file_name(&layer.name)?,
            visible: layer.visible,
            locked: layer.locked,
            opacity: layer.opacity(),
            z_index: layer.z_index,
            interacts_with_layers: layer.interacts_with_layers,
        })
    }

    /// File holding the grid, defaulting to `<name>.layer`
    pub fn file_name(&self) -> Result<String, ProjectError> {
        if self.file.is_empty() {
            layer_file_name(&self.name)
        } else if self.file.contains(['/', '\\']) || self.file == ".." {
            Err(ProjectError::format(format!("layer file '{}' escapes the layers directory", self.file)))
        } else {
            Ok(self.file.clone())
        }
    }

    /// Copy the stored properties onto a freshly loaded layer
    pub fn apply_to(&self, layer: &mut Layer) {
        layer.name = self.name.clone();
        layer.kind = self.kind;
        layer.visible = self.visible;
        layer.locked = self.locked;
        layer.set_opacity(self.opacity);
        layer.z_index = self.z_index;
        layer.interacts_with_layers = self.interacts_with_layers;
    }
}

impl TilesetInfo {
    pub fn from_tileset(tileset: &Tileset) -> Self {
        Self {
            name: tileset.name.clone(),
            path: tileset.image_path.clone(),
            tile_width: tileset.tile_width,
            tile_height: tileset.tile_height,
            tile_count: tileset.tile_count(),
        }
    }

    /// Fixed tile size, or `None` to auto-detect from the image
    pub fn tile_size(&self) -> Option<(u32, u32)> {
        (self.tile_width > 0 && self.tile_height > 0).then_some((self.tile_width, self.tile_height))
    }
}

impl ProjectMetadata {
    /// Snapshot of a project, stamped with the current time
    pub fn from_project(project: &Project) -> Result<Self, ProjectError> {
        let layers = project
            .layers()
            .iter()
            .map(LayerInfo::from_layer)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            project: ProjectInfo {
                name: project.name.clone(),
                version: METADATA_VERSION.to_string(),
                created: Some(chrono::Local::now().to_rfc3339()),
                editor_version: Some(EDITOR_VERSION.to_string()),
            },
            dimensions: Dimensions {
                grid_width: project.grid_width(),
                grid_height: project.grid_height(),
                tile_width: project.tile_width,
                tile_height: project.tile_height,
            },
            tileset: project.tileset.as_ref().map(TilesetInfo::from_tileset),
            layers,
            custom: project.metadata.clone(),
        })
    }

    /// Empty project with this metadata's name and dimensions
    pub fn to_empty_project(&self) -> Project {
        let dims = self.dimensions;
        let mut project = Project::new(
            self.project.name.clone(),
            dims.grid_width,
            dims.grid_height,
            dims.tile_width,
            dims.tile_height,
        );
        project.metadata = self.custom.clone();
        project
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProjectError> {
        Ok(serde_json::from_str(text)?)
    }
}

pub fn save_metadata(metadata: &ProjectMetadata, path: &Path) -> Result<(), ProjectError> {
    std::fs::write(path, metadata.to_json()?)?;
    Ok(())
}

pub fn load_metadata(path: &Path) -> Result<ProjectMetadata, ProjectError> {
    if !path.exists() {
        return Err(ProjectError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    ProjectMetadata::from_json(&text)
}
