//! Per-frame view of the editor services handed to tools and states

use edit_core::{Scene, Viewport};
use glam::Vec3;

use crate::actions::ActionManager;
use crate::config::EditorSettings;
use crate::input::InputState;
use crate::overlay::Overlay;
use crate::status::StatusLog;

/// Borrowed editor services.
///
/// Built by [`crate::Editor`] for every update and signal dispatch; tools and
/// states never hold on to any of it between calls.
pub struct EditorContext<'a> {
    pub scene: &'a mut Scene,
    pub actions: &'a mut ActionManager,
    /// Viewport the pointer is interacting with
    pub viewport: &'a mut Viewport,
    pub input: &'a mut InputState,
    pub settings: &'a mut EditorSettings,
    pub status: &'a mut StatusLog,
    pub overlays: &'a mut Vec<Overlay>,
    /// World location of the 3D cursor
    pub cursor: &'a mut Vec3,
}
