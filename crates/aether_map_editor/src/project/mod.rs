//! Project persistence
//!
//! A saved project is a directory:
//!
//! ```text
//! my_map/
//!   metadata.json
//!   layers/
//!     Background.layer
//!     Ground.layer
//! ```
//!
//! [`container`] bundles the same content into a single archive file.

pub mod binary;
pub mod container;
pub mod metadata;

use std::path::{Path, PathBuf};

use aether_map_core::{Project, Tileset};

use crate::error::ProjectError;
use binary::{load_layer, save_layer};
use metadata::{load_metadata, save_metadata, ProjectMetadata, TilesetInfo, METADATA_FILE};

pub const LAYERS_DIR: &str = "layers";

/// Write `project` into `dir`, creating it if needed.
///
/// On success the project remembers `dir` as its location and is marked clean.
pub fn save_project(
    project: &mut Project,
    dir: &Path,
    compression: Option<u32>,
) -> Result<PathBuf, ProjectError> {
    let metadata = ProjectMetadata::from_project(project)?;

    let layers_dir = dir.join(LAYERS_DIR);
    std::fs::create_dir_all(&layers_dir)?;
    for (layer, info) in project.layers().iter().zip(&metadata.layers) {
        save_layer(layer, &layers_dir.join(&info.file), compression)?;
    }
    save_metadata(&metadata, &dir.join(METADATA_FILE))?;

    project.path = Some(dir.to_path_buf());
    project.mark_clean();
    tracing::info!(
        "Saved project '{}' ({} layers) to {}",
        project.name,
        project.layers().len(),
        dir.display()
    );
    Ok(dir.to_path_buf())
}

/// Read a project directory written by [`save_project`]
pub fn load_project(dir: &Path) -> Result<Project, ProjectError> {
    let metadata = load_metadata(&dir.join(METADATA_FILE))?;
    let mut project = metadata.to_empty_project();

    if let Some(info) = &metadata.tileset {
        let tileset = open_tileset(info, dir)?;
        tracing::debug!(
            "Loaded tileset '{}' with {} tiles",
            tileset.name,
            tileset.tile_count()
        );
        project.set_tileset(tileset);
    }

    let layers_dir = dir.join(LAYERS_DIR);
    for info in &metadata.layers {
        let path = layers_dir.join(info.file_name()?);
        let mut layer = load_layer(&path).inspect_err(|e| {
            tracing::warn!("Failed to load layer '{}' from {}: {e}", info.name, path.display());
        })?;
        info.apply_to(&mut layer);
        project.push_layer(layer)?;
    }
    project.sort_layers_by_z();

    project.path = Some(dir.to_path_buf());
    project.mark_clean();
    tracing::info!(
        "Opened project '{}' ({}x{}, {} layers) from {}",
        project.name,
        project.grid_width(),
        project.grid_height(),
        project.layers().len(),
        dir.display()
    );
    Ok(project)
}

/// Locate and slice the tileset image.
///
/// A stored path that no longer exists falls back to the same file name next to the
/// metadata file.
fn open_tileset(info: &TilesetInfo, dir: &Path) -> Result<Tileset, ProjectError> {
    let path = if info.path.exists() {
        info.path.clone()
    } else {
        let fallback = info.path.file_name().map(|name| dir.join(name));
        match fallback {
            Some(candidate) if candidate.exists() => candidate,
            _ => return Err(ProjectError::NotFound(info.path.clone())),
        }
    };
    Ok(Tileset::open(info.name.clone(), path, info.tile_size())?)
}


#[cfg(test)]
mod tests {
    use super::test_util::write_tileset_png;
    use super::*;
    use aether_map_core::LayerKind;

    fn sample_project(tileset_path: &Path) -> Project {
        let mut project = Project::new("Dungeon", 6, 5, 8, 8);
        let floor = project.add_layer("Floor", LayerKind::Actual).unwrap();
        let walls = project.add_layer("Walls", LayerKind::Collision).unwrap();
        project.layer_mut(floor).unwrap().set_tile(0, 0, 3);
        project.layer_mut(floor).unwrap().set_tile(5, 4, 16);
        {
            let walls = project.layer_mut(walls).unwrap();
            walls.set_tile(2, 2, 9);
            walls.locked = true;
            walls.set_opacity(0.5);
        }
        project.set_tileset(Tileset::open("tiles", tileset_path, Some((8, 8))).unwrap());
        project
    }

    #[test]
    fn test_directory_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_tileset_png(dir.path(), "tiles.png");
        let mut project = sample_project(&png);
        let out = dir.path().join("dungeon");

        save_project(&mut project, &out, Some(6)).unwrap();
        assert!(!project.is_dirty());
        assert_eq!(project.path.as_deref(), Some(out.as_path()));
        assert!(out.join("metadata.json").exists());
        assert!(out.join("layers/Floor.layer").exists());

        let loaded = load_project(&out).unwrap();
        assert_eq!(loaded.name, "Dungeon");
        assert_eq!((loaded.grid_width(), loaded.grid_height()), (6, 5));
        assert_eq!(loaded.layers().len(), 2);
        for (a, b) in project.layers().iter().zip(loaded.layers()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.grid(), b.grid());
            assert_eq!(a.locked, b.locked);
            assert_eq!(a.opacity(), b.opacity());
            assert_eq!(a.z_index, b.z_index);
        }
        assert_eq!(loaded.tileset.as_ref().unwrap().tile_count(), 16);
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_uncompressed_save_loads() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_tileset_png(dir.path(), "tiles.png");
        let mut project = sample_project(&png);

        save_project(&mut project, dir.path(), None).unwrap();
        let loaded = load_project(dir.path()).unwrap();
        assert_eq!(loaded.layers()[0].get_tile(5, 4), 16);
    }

    #[test]
    fn test_layers_sorted_by_z_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_tileset_png(dir.path(), "tiles.png");
        let mut project = sample_project(&png);
        project.layers_mut().for_each(|layer| layer.z_index = 1 - layer.z_index);

        save_project(&mut project, dir.path(), Some(6)).unwrap();
        let loaded = load_project(dir.path()).unwrap();
        let names: Vec<_> = loaded.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Walls", "Floor"]);
    }

    #[test]
    fn test_moved_tileset_falls_back_to_project_dir() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let png = write_tileset_png(elsewhere.path(), "tiles.png");
        let mut project = sample_project(&png);
        let out = dir.path().join("map");

        save_project(&mut project, &out, Some(6)).unwrap();
        std::fs::copy(&png, out.join("tiles.png")).unwrap();
        drop(elsewhere);

        let loaded = load_project(&out).unwrap();
        let tileset = loaded.tileset.as_ref().unwrap();
        assert_eq!(tileset.image_path, out.join("tiles.png"));
        assert_eq!(tileset.tile_count(), 16);
    }

    #[test]
    fn test_missing_pieces_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_project(dir.path()), Err(ProjectError::NotFound(_))));

        let png = write_tileset_png(dir.path(), "tiles.png");
        let mut project = sample_project(&png);
        save_project(&mut project, dir.path(), Some(6)).unwrap();

        std::fs::remove_file(dir.path().join("layers/Walls.layer")).unwrap();
        assert!(matches!(load_project(dir.path()), Err(ProjectError::NotFound(_))));
    }

    #[test]
    fn test_missing_tileset_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        let png = write_tileset_png(elsewhere.path(), "tiles.png");
        let mut project = sample_project(&png);
        save_project(&mut project, dir.path(), Some(6)).unwrap();
        drop(elsewhere);

        assert!(matches!(load_project(dir.path()), Err(ProjectError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_layer_aborts_load() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_tileset_png(dir.path(), "tiles.png");
        let mut project = sample_project(&png);
        save_project(&mut project, dir.path(), Some(6)).unwrap();

        std::fs::write(dir.path().join("layers/Floor.layer"), b"garbage").unwrap();
        assert!(matches!(load_project(dir.path()), Err(ProjectError::Format(_))));
    }
}
