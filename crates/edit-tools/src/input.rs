//! Input state the host feeds in every frame

use glam::Vec2;

/// Pointer and keyboard state as seen by the tools.
///
/// Pointer warps requested by the tools are queued here for the host to
/// apply to the real cursor.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Pointer position in global (desktop) coordinates
    pub global_pointer: Vec2,
    pub shift: bool,
    pub ctrl: bool,
    /// A text field owns the keyboard
    pub keyboard_captured: bool,
    warp: Option<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the host to move the pointer to a global position
    pub fn request_warp(&mut self, global: Vec2) {
        self.warp = Some(global);
    }

    pub fn pending_warp(&self) -> Option<Vec2> {
        self.warp
    }

    pub fn take_warp(&mut self) -> Option<Vec2> {
        self.warp.take()
    }
}
