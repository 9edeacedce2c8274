//! End-to-end gestures driven through the editor façade

mod common;

use approx::assert_relative_eq;
use common::{Host, handle_point, pixels_per_unit};
use edit_core::{Entity, EntityKind};
use edit_tools::{AxisLabel, Editor, Signal, StateType, ToolId};
use glam::{Quat, Vec2, Vec3};
use uuid::Uuid;

fn editor_with_tool(tool: ToolId) -> Editor {
    let mut editor = Editor::default();
    editor.init();
    editor.set_tool(tool);
    editor
}

fn select(editor: &mut Editor, ids: &[Uuid]) {
    editor.scene_mut().add_ids_to_selection(ids, false);
}

#[test]
fn test_drag_x_handle_moves_entity_by_two() {
    let mut editor = editor_with_tool(ToolId::Move);
    let cube = editor
        .scene_mut()
        .add_entity(Entity::new("cube", EntityKind::Mesh));
    select(&mut editor, &[cube]);
    editor.update(common::FRAME);

    let grab = handle_point(&editor, AxisLabel::X, 0.6);
    let mut host = Host::at(&mut editor, grab);
    host.press(&mut editor);
    assert_eq!(editor.gizmo().and_then(|g| g.grabbed), Some(AxisLabel::X));

    // The first drag only enters the transform state.
    host.drag(&mut editor, Vec2::ZERO);
    assert_eq!(editor.active_state(), Some(StateType::TransformTo));

    let step = pixels_per_unit(&editor) * 0.5;
    for _ in 0..4 {
        host.drag(&mut editor, Vec2::new(step, 3.0));
    }
    host.release(&mut editor);

    let pos = editor.scene().world_translation(cube).unwrap();
    assert_relative_eq!(pos.x, 2.0, epsilon = 1e-3);
    assert_eq!(pos.y, 0.0);
    assert_eq!(pos.z, 0.0);

    assert_eq!(editor.actions().len(), 1);
    assert_eq!(editor.actions().last_action().unwrap().name(), "Transform");
    assert_eq!(editor.active_state(), Some(StateType::TransformBegin));
    assert!(editor.gizmo().unwrap().grabbed.is_none());
}

#[test]
fn test_drag_recentres_pointer_and_restores_on_release() {
    let mut editor = editor_with_tool(ToolId::Move);
    let cube = editor
        .scene_mut()
        .add_entity(Entity::new("cube", EntityKind::Mesh));
    select(&mut editor, &[cube]);
    editor.update(common::FRAME);

    let grab = handle_point(&editor, AxisLabel::X, 0.6);
    let mut host = Host::at(&mut editor, grab);
    host.press(&mut editor);
    host.drag(&mut editor, Vec2::ZERO);
    host.drag(&mut editor, Vec2::new(40.0, 0.0));
    assert_eq!(host.global, grab);

    editor.dispatch_signal(Signal::LeftMouseUp);
    let warp = editor.take_pointer_warp().unwrap();
    assert_relative_eq!(warp.x, grab.x + 40.0, epsilon = 1e-3);
    assert_relative_eq!(warp.y, grab.y, epsilon = 1e-3);
}

#[test]
fn test_move_follows_primary_pivot() {
    let mut editor = editor_with_tool(ToolId::Move);
    let other = editor.scene_mut().add_entity(
        Entity::new("other", EntityKind::Mesh).with_translation(Vec3::new(-3.0, 1.0, 0.0)),
    );
    let primary = editor
        .scene_mut()
        .add_entity(Entity::new("primary", EntityKind::Mesh));
    select(&mut editor, &[other, primary]);
    editor.update(common::FRAME);

    let grab = handle_point(&editor, AxisLabel::X, 0.6);
    let mut host = Host::at(&mut editor, grab);
    host.press(&mut editor);
    host.drag(&mut editor, Vec2::ZERO);
    let ppu = pixels_per_unit(&editor);
    host.drag(&mut editor, Vec2::new(ppu, 0.0));
    host.release(&mut editor);

    let moved = editor.scene().world_translation(other).unwrap();
    assert_relative_eq!(moved.x, -2.0, epsilon = 1e-3);
    assert_relative_eq!(moved.y, 1.0, epsilon = 1e-5);
    assert_eq!(editor.scene().parent(other), None);

    // Both roots are recorded as one step.
    let last = editor.actions().last_action().unwrap();
    assert_eq!(last.name(), "Transform");
    assert_eq!(last.children().len(), 2);

    editor.undo();
    assert_eq!(
        editor.scene().world_translation(other),
        Some(Vec3::new(-3.0, 1.0, 0.0))
    );
    assert_eq!(editor.scene().world_translation(primary), Some(Vec3::ZERO));
}

#[test]
fn test_duplicate_three_entities() {
    let mut editor = editor_with_tool(ToolId::Select);
    let mut originals = Vec::new();
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
        let mut entity = Entity::new(name, EntityKind::Mesh)
            .with_translation(Vec3::new(i as f32 * 2.0, 1.0, -1.0));
        entity.local.rotation = Quat::from_rotation_y(0.3 * i as f32);
        originals.push(editor.scene_mut().add_entity(entity));
    }
    let mut child = Entity::new("a_child", EntityKind::Mesh);
    child.parent = Some(originals[0]);
    editor.scene_mut().add_entity(child);
    select(&mut editor, &originals);

    editor.set_modifiers(false, true);
    editor.dispatch_signal(Signal::Duplicate);
    editor.update(common::FRAME);
    assert_eq!(editor.active_state(), Some(StateType::BeginPick));

    assert_eq!(editor.actions().len(), 1);
    let group = editor.actions().last_action().unwrap();
    assert_eq!(group.name(), "Duplicate");
    assert_eq!(group.children().len(), 3);
    assert!(group.children().iter().all(|a| a.name() == "Create"));

    let selection = editor.scene().selection().to_vec();
    assert_eq!(selection.len(), 3);
    for original in &originals {
        assert!(!selection.contains(original));
        let name = format!("{}_copy", editor.scene().get(*original).unwrap().name);
        let copy = *selection
            .iter()
            .find(|id| editor.scene().get(**id).unwrap().name == name)
            .unwrap();

        let a = editor.scene().world_matrix(*original).unwrap();
        let b = editor.scene().world_matrix(copy).unwrap();
        assert!(a.abs_diff_eq(b, 1e-5));
    }
    assert_eq!(editor.scene().len(), 8);

    editor.undo();
    assert_eq!(editor.scene().len(), 4);
    editor.redo();
    assert_eq!(editor.scene().len(), 8);
}

#[test]
fn test_delete_root_with_two_children() {
    let mut editor = editor_with_tool(ToolId::Select);
    let root = editor.scene_mut().add_entity(
        Entity::new("root", EntityKind::Mesh).with_translation(Vec3::new(1.0, 0.0, 0.0)),
    );
    let mut children = Vec::new();
    for name in ["left", "right"] {
        let mut child =
            Entity::new(name, EntityKind::Mesh).with_translation(Vec3::new(0.0, 1.0, 0.0));
        child.parent = Some(root);
        children.push(editor.scene_mut().add_entity(child));
    }
    select(&mut editor, &[root]);

    editor.dispatch_signal(Signal::Delete);
    editor.update(common::FRAME);
    assert!(editor.scene().is_empty());

    let group = editor.actions().last_action().unwrap();
    assert_eq!(group.name(), "Delete");
    assert_eq!(group.children().len(), 3);

    editor.undo();
    let scene = editor.scene();
    assert_eq!(scene.len(), 3);
    assert_eq!(scene.children(root), children.as_slice());
    for child in &children {
        assert_eq!(scene.parent(*child), Some(root));
        assert_eq!(
            scene.world_translation(*child),
            Some(Vec3::new(1.0, 1.0, 0.0))
        );
    }

    editor.redo();
    assert!(editor.scene().is_empty());
}

#[test]
fn test_delete_ignored_while_typing() {
    let mut editor = editor_with_tool(ToolId::Move);
    let cube = editor
        .scene_mut()
        .add_entity(Entity::new("cube", EntityKind::Mesh));
    select(&mut editor, &[cube]);

    editor.set_keyboard_captured(true);
    editor.dispatch_signal(Signal::Delete);
    editor.update(common::FRAME);

    assert!(editor.scene().contains(cube));
    assert!(editor.actions().is_empty());
    assert!(editor.status().status().is_some());
    assert_eq!(editor.active_state(), Some(StateType::TransformBegin));
}

#[test]
fn test_box_select_in_move_tool() {
    let mut editor = editor_with_tool(ToolId::Move);
    let a = editor.scene_mut().add_entity(
        Entity::new("a", EntityKind::Mesh).with_translation(Vec3::new(-1.5, 0.0, 0.0)),
    );
    let b = editor.scene_mut().add_entity(
        Entity::new("b", EntityKind::Mesh).with_translation(Vec3::new(1.5, 0.0, 0.0)),
    );
    editor.update(common::FRAME);

    let ppu = pixels_per_unit(&editor);
    let center = editor.active_viewport().size * 0.5;
    let mut host = Host::at(&mut editor, center - Vec2::splat(2.5 * ppu));
    host.press(&mut editor);
    assert_eq!(editor.active_state(), Some(StateType::BeginPick));
    host.drag(&mut editor, Vec2::splat(5.0 * ppu));
    assert_eq!(editor.active_state(), Some(StateType::BeginBoxPick));
    host.release(&mut editor);

    let mut selection = editor.scene().selection().to_vec();
    selection.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(selection, expected);
    assert_eq!(editor.active_state(), Some(StateType::TransformBegin));
}
