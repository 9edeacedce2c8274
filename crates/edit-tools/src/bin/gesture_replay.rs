//! Replays a scripted move gesture against a headless editor
//!
//! Grabs the X arm of the move handle on a unit cube, drags it to the
//! right, releases, then undoes and redoes the edit. Run with
//! `RUST_LOG=debug` to see every state transition.

use edit_core::{Entity, EntityKind};
use edit_tools::{Editor, EditorSettings, Signal, ToolId};
use glam::Vec2;

const FRAME: f32 = 1.0 / 60.0;

/// Stand-in for the windowing host: tracks the real pointer and honours
/// warp requests
struct Host {
    global: Vec2,
}

impl Host {
    fn sync(&self, editor: &mut Editor) {
        let origin = editor.active_viewport().content_origin;
        editor.pointer_moved(self.global - origin, self.global);
    }

    fn frame(&mut self, editor: &mut Editor) {
        editor.update(FRAME);
        if let Some(warp) = editor.take_pointer_warp() {
            self.global = warp;
            self.sync(editor);
        }
    }

    fn press(&mut self, editor: &mut Editor) {
        self.sync(editor);
        editor.dispatch_signal(Signal::LeftMouseDown);
        self.frame(editor);
    }

    fn drag(&mut self, editor: &mut Editor, motion: Vec2) {
        self.global += motion;
        self.sync(editor);
        editor.dispatch_signal(Signal::LeftMouseDrag);
        self.frame(editor);
    }

    fn release(&mut self, editor: &mut Editor) {
        editor.dispatch_signal(Signal::LeftMouseUp);
        self.frame(editor);
    }
}

fn main() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut editor = Editor::new(EditorSettings {
        show_state_transitions: true,
        ..Default::default()
    });
    editor.init();

    let cube = editor
        .scene_mut()
        .add_entity(Entity::new("cube", EntityKind::Mesh));
    editor.scene_mut().add_to_selection(cube, false);
    editor.set_tool(ToolId::Move);
    editor.update(FRAME);

    let Some(gizmo) = editor.gizmo() else {
        tracing::error!("Move tool has no handle");
        return;
    };
    let grip = gizmo.world_location + gizmo.normal_vectors[0] * gizmo.handle_scale * 0.6;
    let Some(start) = editor.active_viewport().world_to_screen(grip) else {
        tracing::error!("Handle is behind the camera");
        return;
    };

    let mut host = Host {
        global: start + editor.active_viewport().content_origin,
    };
    host.press(&mut editor);
    host.drag(&mut editor, Vec2::ZERO);
    for _ in 0..10 {
        host.drag(&mut editor, Vec2::new(12.0, 0.0));
    }
    host.release(&mut editor);

    let moved = editor.scene().world_translation(cube);
    tracing::info!("After drag: {:?}", moved);

    editor.undo();
    tracing::info!("After undo: {:?}", editor.scene().world_translation(cube));
    editor.redo();
    tracing::info!("After redo: {:?}", editor.scene().world_translation(cube));

    for line in editor.status().lines() {
        tracing::info!("[{}] {}", line.tag, line.message);
    }
}
