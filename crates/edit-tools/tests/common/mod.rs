//! Host harness shared by the integration tests

#![allow(dead_code)]

use edit_tools::{AxisLabel, Editor, Signal};
use glam::{Vec2, Vec3};

pub const FRAME: f32 = 1.0 / 60.0;

/// Plays the windowing host: owns the real pointer and applies the warps
/// the editor asks for
pub struct Host {
    pub global: Vec2,
}

impl Host {
    /// Put the pointer at a position in the active viewport
    pub fn at(editor: &mut Editor, viewport_pos: Vec2) -> Self {
        let host = Self {
            global: viewport_pos + editor.active_viewport().content_origin,
        };
        host.sync(editor);
        host
    }

    pub fn sync(&self, editor: &mut Editor) {
        let origin = editor.active_viewport().content_origin;
        editor.pointer_moved(self.global - origin, self.global);
    }

    pub fn frame(&mut self, editor: &mut Editor) {
        editor.update(FRAME);
        if let Some(warp) = editor.take_pointer_warp() {
            self.global = warp;
            self.sync(editor);
        }
    }

    pub fn press(&mut self, editor: &mut Editor) {
        self.sync(editor);
        editor.dispatch_signal(Signal::LeftMouseDown);
        self.frame(editor);
    }

    pub fn drag(&mut self, editor: &mut Editor, motion: Vec2) {
        self.global += motion;
        self.sync(editor);
        editor.dispatch_signal(Signal::LeftMouseDrag);
        self.frame(editor);
    }

    pub fn release(&mut self, editor: &mut Editor) {
        editor.dispatch_signal(Signal::LeftMouseUp);
        self.frame(editor);
    }
}

/// Screen position on a handle part, `along` handle lengths from the pivot
pub fn handle_point(editor: &Editor, axis: AxisLabel, along: f32) -> Vec2 {
    let gizmo = editor.gizmo().expect("active tool has a handle");
    let offset = match axis {
        AxisLabel::X | AxisLabel::Y | AxisLabel::Z => gizmo.axis_direction(axis) * along,
        AxisLabel::XYZ => Vec3::ZERO,
        plane => {
            let k = plane.normal_index();
            (gizmo.normal_vectors[(k + 1) % 3] + gizmo.normal_vectors[(k + 2) % 3]) * along
        }
    };
    editor
        .active_viewport()
        .world_to_screen(gizmo.world_location + offset * gizmo.handle_scale)
        .expect("handle in front of the camera")
}

/// Pixels per world unit on the z = 0 plane of the active viewport
pub fn pixels_per_unit(editor: &Editor) -> f32 {
    1.0 / editor.active_viewport().world_units_per_pixel(Vec3::ZERO)
}
