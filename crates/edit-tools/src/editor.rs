//! Editor façade
//!
//! Owns the scene, history, tool stack, viewports and input state, and
//! builds the [`EditorContext`] tools run against. The host feeds pointer
//! and modifier state in, raises signals, calls [`Editor::update`] once per
//! frame, then drains overlays and pointer warps.

use edit_core::{Camera, Scene, Viewport, ViewportKind};
use glam::{Vec2, Vec3};

use crate::actions::ActionManager;
use crate::anchor_handle::AnchorHandle;
use crate::config::{EditorSettings, SharedConfig, create_shared_config, load_shared_config};
use crate::context::EditorContext;
use crate::fsm::StateType;
use crate::gizmo::Gizmo;
use crate::input::InputState;
use crate::overlay::Overlay;
use crate::signal::Signal;
use crate::status::StatusLog;
use crate::tools::{ToolId, ToolManager};

/// Size of the viewport every editor starts with
const DEFAULT_VIEWPORT_SIZE: Vec2 = Vec2::new(1280.0, 720.0);

pub struct Editor {
    scene: Scene,
    actions: ActionManager,
    tools: ToolManager,
    viewports: Vec<Viewport>,
    active_viewport: usize,
    input: InputState,
    config: SharedConfig,
    status: StatusLog,
    overlays: Vec<Overlay>,
    /// World location of the 3D cursor
    cursor: Vec3,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorSettings::default())
    }
}

impl Editor {
    /// Editor over in-memory settings that are never written to disk
    pub fn new(settings: EditorSettings) -> Self {
        Self::with_config(create_shared_config(settings))
    }

    /// Editor whose settings are loaded from and saved to `path`
    pub fn with_settings_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::with_config(load_shared_config(path))
    }

    /// Editor reading its settings from a shared configuration
    pub fn with_config(config: SharedConfig) -> Self {
        let max_actions = config.read().settings().max_undo_depth;
        Self {
            scene: Scene::new(),
            actions: ActionManager::new(max_actions),
            tools: ToolManager::new(),
            viewports: vec![Viewport::new(
                "Perspective",
                ViewportKind::Scene3d,
                Camera::default(),
                DEFAULT_VIEWPORT_SIZE,
            )],
            active_viewport: 0,
            input: InputState::new(),
            config,
            status: StatusLog::new(),
            overlays: Vec::new(),
            cursor: Vec3::ZERO,
        }
    }

    /// Run `f` against a context over the editor services.
    ///
    /// Settings are snapshotted from the shared configuration and written
    /// back only when a tool changed them.
    fn with_context<R>(&mut self, f: impl FnOnce(&mut ToolManager, &mut EditorContext) -> R) -> R {
        let snapshot = self.config.read().settings().clone();
        let mut settings = snapshot.clone();

        if self.actions.max_actions() != settings.max_undo_depth {
            self.actions.set_max_actions(settings.max_undo_depth);
        }

        let result = {
            let mut ctx = EditorContext {
                scene: &mut self.scene,
                actions: &mut self.actions,
                viewport: &mut self.viewports[self.active_viewport],
                input: &mut self.input,
                settings: &mut settings,
                status: &mut self.status,
                overlays: &mut self.overlays,
                cursor: &mut self.cursor,
            };
            f(&mut self.tools, &mut ctx)
        };

        if settings != snapshot {
            *self.config.write().settings_mut() = settings;
        }
        result
    }

    /// Install the tool stack with the Select tool active
    pub fn init(&mut self) {
        if self.tools.is_initialized() {
            return;
        }
        self.tools.init();
        self.set_tool(ToolId::Select);
        tracing::info!("Editor initialized");
    }

    /// Tear down the tool stack and save changed file-backed settings
    pub fn shutdown(&mut self) {
        self.with_context(|tools, ctx| tools.uninit(ctx));
        let mut config = self.config.write();
        if config.is_persistent()
            && let Err(e) = config.save()
        {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    /// Per-frame update of the active tool
    pub fn update(&mut self, dt: f32) {
        self.overlays.clear();
        self.with_context(|tools, ctx| tools.update(ctx, dt));
    }

    pub fn dispatch_signal(&mut self, signal: Signal) {
        self.with_context(|tools, ctx| tools.dispatch_signal(ctx, signal));
    }

    pub fn set_tool(&mut self, id: ToolId) {
        self.with_context(|tools, ctx| tools.set_tool(ctx, true, id));
    }

    pub fn undo(&mut self) -> bool {
        self.actions.undo(&mut self.scene)
    }

    pub fn redo(&mut self) -> bool {
        self.actions.redo(&mut self.scene)
    }

    /// Drop every entity along with the history
    pub fn new_scene(&mut self) {
        self.scene.clear();
        self.actions.clear_all_actions();
        if let Some(id) = self.tools.active_id().filter(|id| *id != ToolId::Base) {
            // Restart the tool so no state holds on to old entities.
            self.set_tool(id);
        }
    }

    // Input
    //////////////////////////////////////////

    /// Record the pointer position, in active viewport pixels and in global
    /// desktop coordinates
    pub fn pointer_moved(&mut self, viewport_pos: Vec2, global_pos: Vec2) {
        self.viewports[self.active_viewport].set_last_mouse_pos(viewport_pos);
        self.input.global_pointer = global_pos;
    }

    pub fn set_modifiers(&mut self, shift: bool, ctrl: bool) {
        self.input.shift = shift;
        self.input.ctrl = ctrl;
    }

    pub fn set_keyboard_captured(&mut self, captured: bool) {
        self.input.keyboard_captured = captured;
    }

    /// Pointer warp requested by the tools, if any
    pub fn take_pointer_warp(&mut self) -> Option<Vec2> {
        self.input.take_warp()
    }

    /// Overlays emitted since the last update
    pub fn take_overlays(&mut self) -> Vec<Overlay> {
        std::mem::take(&mut self.overlays)
    }

    // Viewports
    //////////////////////////////////////////

    pub fn add_viewport(&mut self, viewport: Viewport) -> usize {
        self.viewports.push(viewport);
        self.viewports.len() - 1
    }

    /// Route pointer interaction to another viewport
    pub fn set_active_viewport(&mut self, index: usize) -> bool {
        if index >= self.viewports.len() {
            tracing::warn!("No viewport at index {}", index);
            return false;
        }
        self.active_viewport = index;
        true
    }

    pub fn active_viewport(&self) -> &Viewport {
        &self.viewports[self.active_viewport]
    }

    pub fn active_viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewports[self.active_viewport]
    }

    pub fn viewports(&self) -> &[Viewport] {
        &self.viewports
    }

    // Accessors
    //////////////////////////////////////////

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn cursor(&self) -> Vec3 {
        self.cursor
    }

    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    pub fn settings(&self) -> EditorSettings {
        self.config.read().settings().clone()
    }

    pub fn active_tool(&self) -> Option<ToolId> {
        self.tools.active_id()
    }

    pub fn active_state(&self) -> Option<StateType> {
        self.tools.active_state()
    }

    pub fn gizmo(&self) -> Option<&Gizmo> {
        self.tools.gizmo()
    }

    pub fn anchor_handle(&self) -> Option<&AnchorHandle> {
        self.tools.anchor_handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransformSpace;
    use edit_core::{Entity, EntityKind};

    #[test]
    fn test_init_activates_select() {
        let mut editor = Editor::default();
        editor.init();
        editor.init();
        assert_eq!(editor.active_tool(), Some(ToolId::Select));
        assert_eq!(editor.active_state(), Some(StateType::BeginPick));
    }

    #[test]
    fn test_tool_settings_reach_shared_config() {
        let mut editor = Editor::default();
        editor.init();
        editor.set_tool(ToolId::Scale);
        assert_eq!(editor.settings().transform_space, TransformSpace::Local);
        assert!(editor.config().read().is_dirty());

        editor.set_tool(ToolId::Move);
        assert_eq!(editor.settings().transform_space, TransformSpace::World);
    }

    #[test]
    fn test_shutdown_writes_only_file_backed_settings() {
        let mut editor = Editor::default();
        editor.init();
        editor.set_tool(ToolId::Scale);
        editor.shutdown();
        assert!(!editor.config().read().is_persistent());
        assert!(editor.config().read().is_dirty());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.ron");
        let mut editor = Editor::with_settings_file(&path);
        editor.init();
        editor.set_tool(ToolId::Scale);
        editor.shutdown();
        assert!(path.exists());
        assert!(!editor.config().read().is_dirty());
    }

    #[test]
    fn test_undo_depth_follows_settings() {
        let settings = EditorSettings {
            max_undo_depth: 7,
            ..Default::default()
        };
        let mut editor = Editor::new(settings);
        assert_eq!(editor.actions().max_actions(), 7);

        editor.config().write().settings_mut().max_undo_depth = 3;
        editor.update(0.016);
        assert_eq!(editor.actions().max_actions(), 3);
    }

    #[test]
    fn test_new_scene_drops_history() {
        let mut editor = Editor::default();
        editor.init();
        let id = editor
            .scene_mut()
            .add_entity(Entity::new("cube", EntityKind::Mesh));
        editor.scene_mut().add_to_selection(id, false);
        editor.set_modifiers(false, true);
        editor.dispatch_signal(Signal::Duplicate);
        editor.update(0.016);
        assert!(editor.actions().can_undo());

        editor.new_scene();
        assert!(editor.scene().is_empty());
        assert!(!editor.actions().can_undo());
        assert_eq!(editor.active_tool(), Some(ToolId::Select));
    }

    #[test]
    fn test_active_viewport_bounds() {
        let mut editor = Editor::default();
        let index = editor.add_viewport(Viewport::new(
            "Layout",
            ViewportKind::Layout2d,
            Camera::orthographic(10.0),
            Vec2::new(640.0, 480.0),
        ));
        assert!(editor.set_active_viewport(index));
        assert!(editor.active_viewport().is_2d());
        assert!(!editor.set_active_viewport(5));
    }
}
