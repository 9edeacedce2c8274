//! Shared fixture for unit tests

use edit_core::{Camera, Scene, Viewport, ViewportKind};
use glam::{Vec2, Vec3};

use crate::actions::ActionManager;
use crate::config::EditorSettings;
use crate::context::EditorContext;
use crate::input::InputState;
use crate::overlay::Overlay;
use crate::status::StatusLog;

/// Owns one of every service a state needs, with an 800x600 perspective
/// viewport looking down -Z from (0, 0, 10)
pub(crate) struct TestRig {
    pub scene: Scene,
    pub actions: ActionManager,
    pub viewport: Viewport,
    pub input: InputState,
    pub settings: EditorSettings,
    pub status: StatusLog,
    pub overlays: Vec<Overlay>,
    pub cursor: Vec3,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            actions: ActionManager::default(),
            viewport: Viewport::new(
                "Scene",
                ViewportKind::Scene3d,
                Camera::perspective(45.0).with_position(Vec3::new(0.0, 0.0, 10.0)),
                Vec2::new(800.0, 600.0),
            ),
            input: InputState::new(),
            settings: EditorSettings::default(),
            status: StatusLog::new(),
            overlays: Vec::new(),
            cursor: Vec3::ZERO,
        }
    }

    pub fn context(&mut self) -> EditorContext<'_> {
        EditorContext {
            scene: &mut self.scene,
            actions: &mut self.actions,
            viewport: &mut self.viewport,
            input: &mut self.input,
            settings: &mut self.settings,
            status: &mut self.status,
            overlays: &mut self.overlays,
            cursor: &mut self.cursor,
        }
    }
}
