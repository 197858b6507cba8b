//! Host-facing editing session: one open project plus the window state acting on it

use std::path::{Path, PathBuf};

use aether_map_core::{Layer, LayerId, LayerKind, Project, TileId, Tileset};
use image::RgbaImage;

use crate::config::EditorConfig;
use crate::editor_state::EditorState;
use crate::error::ProjectError;
use crate::project::{self, container};
use crate::tools::{PointerButton, ToolController, ToolKind};
use crate::viewport::{Camera, RenderStats, TileRenderer};

/// Everything one editor window needs.
///
/// The host shell forwards menu actions and raw pointer events here; every fallible
/// operation reports a [`ProjectError`] instead of exiting.
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
#[derive(Debug)]
pub struct EditorSession {
    config: EditorConfig,
    project: Project,
    state: EditorState,
    tools: ToolController,
    camera: Camera,
    renderer: TileRenderer,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Start with an empty "Untitled" project
    pub fn new(config: EditorConfig) -> Self {
        let config = config.sanitized();
        let mut state = EditorState::new();
        state.show_grid = config.show_grid;
        let mut session = Self {
            project: Project::new(
                "Untitled",
                config.default_grid_width,
                config.default_grid_height,
                config.default_tile_size,
                config.default_tile_size,
            ),
            state,
            tools: ToolController::new(),
            camera: Camera::from_config(&config),
            renderer: TileRenderer::new(&config),
            config,
        };
        if let Err(e) = session.add_default_layers() {
            tracing::warn!("Could not create default layers: {e}");
        }
        session
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Direct access for layer property edits (visibility, lock, opacity, rename)
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tools.active_tool()
    }

    pub fn cursor(&self) -> &'static str {
        self.tools.cursor()
    }

    // Project lifecycle

    /// Replace the open project with an empty one using the configured defaults
    pub fn new_project(&mut self, name: &str) -> Result<(), ProjectError> {
        let size = self.config.default_tile_size;
        self.new_project_sized(
            name,
            self.config.default_grid_width,
            self.config.default_grid_height,
            size,
        )
    }

    pub fn new_project_sized(
        &mut self,
        name: &str,
        grid_width: u32,
        grid_height: u32,
        tile_size: u32,
    ) -> Result<(), ProjectError> {
        self.project = Project::new(name, grid_width, grid_height, tile_size, tile_size);
        self.reset_view();
        self.add_default_layers()?;
        tracing::info!("Created project '{name}' ({grid_width}x{grid_height})");
        Ok(())
    }

    fn add_default_layers(&mut self) -> Result<(), ProjectError> {
        for default in &self.config.default_layers {
            self.project.add_layer(default.name.clone(), default.kind)?;
        }
        if let Some(first) = self.project.layers().first().map(Layer::id) {
            self.state.set_active_layer(&self.project, first);
        }
        self.project.mark_clean();
        Ok(())
    }

    /// Open a project directory
    pub fn open_project(&mut self, dir: &Path) -> Result<(), ProjectError> {
        let project = project::load_project(dir)?;
        self.install(project);
        Ok(())
    }

    /// Save to `dir` and remember it as the project location
    pub fn save_project(&mut self, dir: &Path) -> Result<PathBuf, ProjectError> {
        project::save_project(&mut self.project, dir, self.config.layer_compression())
    }

    /// Save to the location the project was last saved to or opened from
    pub fn save(&mut self) -> Result<PathBuf, ProjectError> {
        let dir = self.project.path.clone().ok_or(ProjectError::NoPath)?;
        self.save_project(&dir)
    }

    pub fn export_container(&self, path: &Path) -> Result<(), ProjectError> {
        container::export_container(&self.project, path, self.config.compression_level)
    }

    /// Replace the open project with the contents of an archive
    pub fn import_container(&mut self, path: &Path) -> Result<(), ProjectError> {
        let project = container::import_container(path)?;
        self.install(project);
        Ok(())
    }

    /// Write the whole map at zoom 1, without grid or highlight, in the format implied
    /// by the file extension
    pub fn export_render_to_image(&self, path: &Path) -> Result<(), ProjectError> {
        let image = self.renderer.render_full_map(&self.project);
        image
            .save(path)
            .map_err(|e| ProjectError::Encode(e.to_string()))?;
        tracing::info!(
            "Exported {}x{} map image to {}",
            image.width(),
            image.height(),
            path.display()
        );
        Ok(())
    }

    fn install(&mut self, project: Project) {
        self.project = project;
        self.reset_view();
        let first_unlocked = self
            .project
            .layers()
            .iter()
            .find(|layer| !layer.locked)
            .map(Layer::id);
        if let Some(id) = first_unlocked {
            self.state.set_active_layer(&self.project, id);
        }
    }

    fn reset_view(&mut self) {
        self.state.clear_active_layer();
        self.state.clear_selected_tile();
        self.state.pointer_cell = (0, 0);
        self.camera = Camera::from_config(&self.config);
    }

    // Tileset

    /// Load an image as the project tileset, auto-detecting the tile size.
    ///
    /// The tileset is named after the file stem. If its tile size differs from the
    /// project's, the project adopts it. Returns the number of tiles.
    pub fn import_tileset(&mut self, path: &Path) -> Result<usize, ProjectError> {
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tileset".to_string());
        let tileset = Tileset::open(name, path, None)?;
        let count = tileset.tile_count();

        if (self.project.tile_width, self.project.tile_height)
            != (tileset.tile_width, tileset.tile_height)
        {
            self.project.tile_width = tileset.tile_width;
            self.project.tile_height = tileset.tile_height;
        }
        tracing::info!(
            "Imported tileset '{}' ({}x{}, {count} tiles)",
            tileset.name,
            tileset.tile_width,
            tileset.tile_height
        );
        self.project.set_tileset(tileset);
        Ok(count)
    }

    /// Re-slice the tileset into `tile_size` square tiles.
    ///
    /// Refused while any layer holds a painted cell, since tile IDs are renumbered.
    pub fn subdivide_tileset(&mut self, tile_size: u32) -> Result<usize, ProjectError> {
        if self.project.tileset.is_none() {
            return Err(ProjectError::NoTileset);
        }
        if let Some(layer) = self.project.layers().iter().find(|l| !l.is_empty()) {
            return Err(ProjectError::TilesInUse {
                layer: layer.name.clone(),
            });
        }
        let tileset = self.project.tileset.as_mut().ok_or(ProjectError::NoTileset)?;
        let count = tileset.subdivide(tile_size, tile_size)?;

        self.project.tile_width = tile_size;
        self.project.tile_height = tile_size;
        self.project.mark_dirty();
        self.state.clear_selected_tile();
        tracing::info!("Subdivided tileset into {count} tiles of {tile_size}x{tile_size}");
        Ok(count)
    }

    // Layers and selection

    pub fn add_layer(&mut self, name: &str, kind: LayerKind) -> Result<LayerId, ProjectError> {
        Ok(self.project.add_layer(name, kind)?)
    }

    /// Remove a layer; an active-layer handle pointing at it is cleared
    pub fn remove_layer(&mut self, id: LayerId) -> Option<Layer> {
        let removed = self.project.remove_layer(id);
        self.state.refresh_active_layer(&self.project);
        removed
    }

    pub fn set_active_layer(&mut self, id: LayerId) -> bool {
        self.state.set_active_layer(&self.project, id)
    }

    pub fn active_layer(&mut self) -> Option<&Layer> {
        self.state.active_layer(&self.project)
    }

    pub fn select_tile(&mut self, id: TileId) {
        self.state.select_tile(id);
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tools.set_active_tool(kind, &mut self.state);
    }

    /// Switch tools by name (`paint`, `erase`, `fill`, `picker`); unknown names are ignored
    pub fn set_tool_by_name(&mut self, name: &str) -> bool {
        self.tools.set_active_tool_by_name(name, &mut self.state)
    }

    pub fn toggle_grid(&mut self) {
        self.state.toggle_grid();
    }

    // Pointer input, in viewport pixels

    pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32) -> (i32, i32) {
        self.camera.screen_to_grid(
            screen_x,
            screen_y,
            self.project.tile_width,
            self.project.tile_height,
        )
    }

    pub fn pointer_down(&mut self, screen_x: f32, screen_y: f32, button: PointerButton) {
        let (x, y) = self.screen_to_grid(screen_x, screen_y);
        self.tools
            .pointer_down(&mut self.project, &mut self.state, x, y, button);
    }

    pub fn pointer_move(&mut self, screen_x: f32, screen_y: f32) {
        let (x, y) = self.screen_to_grid(screen_x, screen_y);
        self.tools.pointer_move(&mut self.project, &mut self.state, x, y);
    }

    pub fn pointer_up(&mut self, screen_x: f32, screen_y: f32, button: PointerButton) {
        let (x, y) = self.screen_to_grid(screen_x, screen_y);
        self.tools
            .pointer_up(&mut self.project, &mut self.state, x, y, button);
    }

    // View

    pub fn set_zoom(&mut self, zoom: f32) {
        self.camera.set_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.camera.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.camera.zoom_out();
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.camera.pan(dx, dy);
    }

    /// Draw one frame; `target` is the viewport surface
    pub fn render(&self, target: &mut RgbaImage) -> RenderStats {
        self.renderer
            .render(target, &self.project, &self.state, &self.camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::test_util::write_tileset_png;

    fn session_20x20() -> EditorSession {
        let config = EditorConfig {
            default_grid_width: 20,
            default_grid_height: 20,
            ..EditorConfig::default()
        };
        EditorSession::new(config)
    }

    /// Session with the 32x32 test tileset sliced into sixteen 8x8 tiles
    fn session_with_tiles(dir: &Path) -> EditorSession {
        let mut session = session_20x20();
        session.new_project("Scenario").unwrap();
        let png = write_tileset_png(dir, "tiles.png");
        // 32x32 auto-detects as a single 32 px tile
        assert_eq!(session.import_tileset(&png).unwrap(), 1);
        assert_eq!(session.subdivide_tileset(8).unwrap(), 16);
        session
    }

    fn active_tile(session: &mut EditorSession, x: i32, y: i32) -> TileId {
        session.active_layer().map(|l| l.get_tile(x, y)).unwrap_or(0)
    }

    #[test]
    fn test_new_project_defaults() {
        let mut session = session_20x20();
        session.new_project("Fresh").unwrap();

        let project = session.project();
        assert_eq!(project.name, "Fresh");
        assert_eq!((project.grid_width(), project.grid_height()), (20, 20));
        let names: Vec<_> = project.layers().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Background", "Ground"]);
        assert_eq!(session.state().active_layer_id(), Some(project.layers()[0].id()));
        assert!(!session.project().is_dirty());
    }

    #[test]
    fn test_paint_then_erase_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        assert_eq!(session.project().tile_width, 8);

        session.select_tile(3);
        session.pointer_down(5.0 * 8.0 + 1.0, 5.0 * 8.0 + 1.0, PointerButton::Primary);
        session.pointer_up(5.0 * 8.0 + 1.0, 5.0 * 8.0 + 1.0, PointerButton::Primary);
        assert_eq!(active_tile(&mut session, 5, 5), 3);

        session.set_tool(ToolKind::Erase);
        session.pointer_down(41.0, 41.0, PointerButton::Primary);
        session.pointer_up(41.0, 41.0, PointerButton::Primary);
        assert_eq!(active_tile(&mut session, 5, 5), 0);
    }

    #[test]
    fn test_screen_to_grid_follows_zoom() {
        let mut session = session_20x20();
        session.new_project_sized("Zoom", 20, 20, 16).unwrap();
        session.set_zoom(2.0);
        assert_eq!(session.screen_to_grid(40.0, 0.0), (1, 0));
    }

    #[test]
    fn test_subdivide_refused_with_painted_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        session.select_tile(2);
        session.pointer_down(1.0, 1.0, PointerButton::Primary);

        assert!(matches!(
            session.subdivide_tileset(16),
            Err(ProjectError::TilesInUse { .. })
        ));
        assert_eq!(session.project().tileset.as_ref().unwrap().tile_count(), 16);
    }

    #[test]
    fn test_subdivide_without_tileset() {
        let mut session = session_20x20();
        assert!(matches!(session.subdivide_tileset(8), Err(ProjectError::NoTileset)));
    }

    #[test]
    fn test_locked_layer_cannot_become_active_or_be_painted() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        let ground = session.project().layers()[1].id();
        session.project_mut().layer_mut(ground).unwrap().locked = true;

        assert!(!session.set_active_layer(ground));
        let background = session.project().layers()[0].id();
        assert_eq!(session.state().active_layer_id(), Some(background));

        // Locking the active layer after selection still blocks edits
        session.project_mut().layer_mut(background).unwrap().locked = true;
        session.select_tile(5);
        for tool in ToolKind::ALL {
            session.set_tool(tool);
            session.pointer_down(9.0, 9.0, PointerButton::Primary);
            session.pointer_up(9.0, 9.0, PointerButton::Primary);
        }
        assert!(!session.project().has_painted_tiles());
    }

    #[test]
    fn test_picker_then_fill() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        session.select_tile(7);
        session.pointer_down(0.0, 0.0, PointerButton::Primary);
        session.pointer_up(0.0, 0.0, PointerButton::Primary);

        session.select_tile(1);
        assert!(session.set_tool_by_name("picker"));
        session.pointer_down(0.0, 0.0, PointerButton::Primary);
        assert_eq!(session.state().selected_tile(), Some(7));

        assert!(session.set_tool_by_name("fill"));
        session.pointer_down(80.0, 80.0, PointerButton::Primary);
        let layer = session.active_layer().unwrap();
        assert_eq!(layer.grid().painted_count(), 400);
    }

    #[test]
    fn test_removing_active_layer_clears_it() {
        let mut session = session_20x20();
        let active = session.state().active_layer_id().unwrap();
        assert!(session.remove_layer(active).is_some());
        assert_eq!(session.state().active_layer_id(), None);

        session.select_tile(1);
        session.pointer_down(0.0, 0.0, PointerButton::Primary);
        assert!(!session.project().has_painted_tiles());
    }

    #[test]
    fn test_save_open_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        session.select_tile(4);
        session.pointer_down(17.0, 9.0, PointerButton::Primary);

        assert!(matches!(session.save(), Err(ProjectError::NoPath)));
        let out = dir.path().join("saved");
        session.save_project(&out).unwrap();
        session.pointer_move(25.0, 9.0);
        session.pointer_up(25.0, 9.0, PointerButton::Primary);
        assert!(session.project().is_dirty());
        session.save().unwrap();

        let mut reopened = session_20x20();
        reopened.open_project(&out).unwrap();
        assert_eq!(active_tile(&mut reopened, 2, 1), 4);
        assert_eq!(active_tile(&mut reopened, 3, 1), 4);
        assert_eq!(reopened.project().tileset.as_ref().unwrap().tile_count(), 16);
    }

    #[test]
    fn test_container_and_image_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        session.select_tile(16);
        session.pointer_down(0.0, 0.0, PointerButton::Primary);

        let archive = dir.path().join("map.aemap");
        session.export_container(&archive).unwrap();
        let png = dir.path().join("map.png");
        session.export_render_to_image(&png).unwrap();

        let mut imported = session_20x20();
        imported.import_container(&archive).unwrap();
        assert_eq!(active_tile(&mut imported, 0, 0), 16);

        let rendered = image::open(&png).unwrap().to_rgba8();
        assert_eq!(rendered.dimensions(), (160, 160));
    }

    #[test]
    fn test_render_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_with_tiles(dir.path());
        session.select_tile(1);
        session.pointer_down(0.0, 0.0, PointerButton::Primary);

        let mut frame = RgbaImage::new(64, 48);
        let stats = session.render(&mut frame);
        assert_eq!(stats.tiles_drawn, 1);
        assert!(stats.highlight_drawn);
    }

    #[test]
    fn test_zoom_steps() {
        let mut session = session_20x20();
        session.zoom_in();
        assert_eq!(session.camera().zoom(), 1.25);
        session.zoom_out();
        session.zoom_out();
        assert_eq!(session.camera().zoom(), 0.75);
        session.pan(-10.0, 4.0);
        assert_eq!((session.camera().x(), session.camera().y()), (0.0, 4.0));
    }

    #[test]
    fn test_inverted_zoom_limits_are_repaired() {
        let mut session = EditorSession::new(EditorConfig {
            zoom_min: 5.0,
            ..EditorConfig::default()
        });
        assert!(session.config().zoom_min <= session.config().zoom_max);
        session.zoom_in();
        session.set_zoom(0.5);
        assert_eq!(session.camera().zoom(), 5.0);
    }
}
