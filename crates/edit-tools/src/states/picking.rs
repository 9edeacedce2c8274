//! Picking family: single pick, box pick, end pick, delete and duplicate

use edit_core::{EntityKind, Frustum, PickData, Scene, Transform, Viewport};
use glam::{Vec2, Vec3};
use uuid::Uuid;

use crate::actions::{CreateAction, DeleteAction};
use crate::context::EditorContext;
use crate::fsm::{State, StateType};
use crate::overlay::Overlay;
use crate::signal::Signal;

/// Depth of the far rectangle of a box-pick frustum
pub const BOX_PICK_DEPTH: f32 = 1000.0;

/// Marquees thinner than this (in pixels) fall back to a single pick
const MIN_BOX_SIZE: f32 = 1.0;

const PICKING_TAG: &str = "Picking";

/// Context shared by every picking state
#[derive(Debug, Clone, Default)]
pub struct PickingContext {
    /// Press position and latest position, in viewport pixels
    pub mouse_data: [Vec2; 2],
    /// Picks of the current gesture, in pick order
    pub pick_data: Vec<PickData>,
    pub ignore_list: Vec<Uuid>,
}

impl PickingContext {
    /// Entities hit by the current gesture
    pub fn picked_entities(&self) -> Vec<Uuid> {
        self.pick_data.iter().filter_map(|p| p.entity).collect()
    }

    /// Position of the most recent pick
    pub fn last_position(&self) -> Option<Vec3> {
        self.pick_data.last().map(|p| p.position)
    }

    /// Copy the shared fields to `next`. Picks move along unless `keep_picks`
    /// is false, in which case they are dropped.
    pub fn hand_off(&mut self, next: &mut PickingContext, keep_picks: bool) {
        next.mouse_data = self.mouse_data;
        next.ignore_list = self.ignore_list.clone();
        if keep_picks {
            next.pick_data = std::mem::take(&mut self.pick_data);
        } else {
            self.pick_data.clear();
        }
    }
}

fn picking_transition_out(picking: &mut PickingContext, next: &mut dyn State) {
    // A fresh begin state starts a new gesture.
    let keep_picks = next.state_type() != StateType::BeginPick;
    match next.picking_mut() {
        Some(next_picking) => picking.hand_off(next_picking, keep_picks),
        None => picking.pick_data.clear(),
    }
}

/// Entities that cannot be picked in `viewport`
fn build_ignore_list(scene: &Scene, viewport: &Viewport) -> Vec<Uuid> {
    let is_2d = viewport.is_2d();
    scene.filter(|e| match e.kind {
        EntityKind::Grid => true,
        EntityKind::Surface { .. } => !is_2d,
        _ => is_2d,
    })
}

fn single_pick(ctx: &mut EditorContext, picking: &mut PickingContext, screen: Vec2) {
    let ray = ctx.viewport.ray_from_screen_point(screen);
    let pick = ctx.scene.pick_ray(&ray, &picking.ignore_list);
    if ctx.settings.show_picking_debug {
        *ctx.cursor = pick.position;
    }
    picking.pick_data.push(pick);
}

fn pick_rect(mouse_data: &[Vec2; 2]) -> (Vec2, Vec2) {
    (mouse_data[0].min(mouse_data[1]), mouse_data[0].max(mouse_data[1]))
}

/// Frustum through a screen rectangle of the viewport
pub fn box_frustum(viewport: &Viewport, min: Vec2, max: Vec2) -> (Frustum, [Vec3; 4], [Vec3; 4]) {
    let screen = [
        Vec2::new(min.x, min.y),
        Vec2::new(max.x, min.y),
        Vec2::new(max.x, max.y),
        Vec2::new(min.x, max.y),
    ];

    let camera = &viewport.camera;
    let near = screen.map(|p| viewport.screen_to_world(p));
    let far = near.map(|p| {
        let dir = if camera.is_orthographic() {
            camera.forward()
        } else {
            (p - camera.position).normalize_or(camera.forward())
        };
        p + dir * BOX_PICK_DEPTH
    });

    (Frustum::from_corners(near, far), near, far)
}

// BeginPick
//////////////////////////////////////////

/// Idle picking state: records the press and picks on release
#[derive(Default)]
pub struct BeginPick {
    picking: PickingContext,
}

impl BeginPick {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for BeginPick {
    fn state_type(&self) -> StateType {
        StateType::BeginPick
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDown => {
                self.picking.mouse_data[0] = ctx.viewport.last_mouse_pos();
                self.picking.mouse_data[1] = self.picking.mouse_data[0];
                self.picking.ignore_list = build_ignore_list(ctx.scene, ctx.viewport);
                None
            }
            Signal::LeftMouseUp => {
                let pos = ctx.viewport.last_mouse_pos();
                self.picking.mouse_data[1] = pos;
                single_pick(ctx, &mut self.picking, pos);
                Some(StateType::EndPick)
            }
            Signal::LeftMouseDrag => Some(StateType::BeginBoxPick),
            Signal::Delete => Some(StateType::DeletePick),
            Signal::Duplicate => Some(StateType::Duplicate),
            Signal::BackToStart => None,
        }
    }

    fn transition_in(&mut self, ctx: &mut EditorContext, _previous: &mut dyn State) {
        self.picking.pick_data.clear();
        self.picking.ignore_list = build_ignore_list(ctx.scene, ctx.viewport);
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        picking_transition_out(&mut self.picking, next);
    }

    fn picking(&self) -> Option<&PickingContext> {
        Some(&self.picking)
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        Some(&mut self.picking)
    }
}

// BeginBoxPick
//////////////////////////////////////////

/// Marquee drag; picks everything inside the rectangle on release
#[derive(Default)]
pub struct BeginBoxPick {
    picking: PickingContext,
}

impl BeginBoxPick {
    pub fn new() -> Self {
        Self::default()
    }

    fn pick(&mut self, ctx: &mut EditorContext) {
        let (min, max) = pick_rect(&self.picking.mouse_data);
        let size = max - min;
        if size.x < MIN_BOX_SIZE || size.y < MIN_BOX_SIZE {
            let pos = self.picking.mouse_data[1];
            single_pick(ctx, &mut self.picking, pos);
            return;
        }

        let (frustum, near, far) = box_frustum(ctx.viewport, min, max);
        let picks = ctx.scene.pick_frustum(&frustum, &self.picking.ignore_list);
        tracing::debug!("Box pick {:?}..{:?}: {} hit(s)", min, max, picks.len());

        if ctx.settings.show_picking_debug {
            for i in 0..4 {
                let j = (i + 1) % 4;
                ctx.status.log(
                    PICKING_TAG,
                    format!(
                        "near {:?} -> {:?}, far {:?} -> {:?}, edge {:?} -> {:?}",
                        near[i], near[j], far[i], far[j], near[i], far[i]
                    ),
                );
            }
        }

        self.picking.pick_data.extend(picks);
    }
}

impl State for BeginBoxPick {
    fn state_type(&self) -> StateType {
        StateType::BeginBoxPick
    }

    fn update(&mut self, ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        self.picking.mouse_data[1] = ctx.viewport.last_mouse_pos();
        let (min, max) = pick_rect(&self.picking.mouse_data);
        if max.x - min.x >= MIN_BOX_SIZE || max.y - min.y >= MIN_BOX_SIZE {
            ctx.overlays.push(Overlay::SelectionRect { min, max });
        }
        None
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDrag => {
                self.picking.mouse_data[1] = ctx.viewport.last_mouse_pos();
                None
            }
            Signal::LeftMouseUp => {
                self.picking.mouse_data[1] = ctx.viewport.last_mouse_pos();
                self.pick(ctx);
                Some(StateType::EndPick)
            }
            _ => None,
        }
    }

    fn transition_in(&mut self, _ctx: &mut EditorContext, _previous: &mut dyn State) {}

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        picking_transition_out(&mut self.picking, next);
    }

    fn picking(&self) -> Option<&PickingContext> {
        Some(&self.picking)
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        Some(&mut self.picking)
    }
}

// EndPick
//////////////////////////////////////////

/// Holds the finished gesture until the owning tool consumes it
#[derive(Default)]
pub struct EndPick {
    picking: PickingContext,
}

impl EndPick {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for EndPick {
    fn state_type(&self) -> StateType {
        StateType::EndPick
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        picking_transition_out(&mut self.picking, next);
    }

    fn picking(&self) -> Option<&PickingContext> {
        Some(&self.picking)
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        Some(&mut self.picking)
    }
}

// DeletePick
//////////////////////////////////////////

/// Deletes the selected roots and their descendants as one history step
#[derive(Default)]
pub struct DeletePick {
    picking: PickingContext,
}

impl DeletePick {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Selected roots, each followed by its descendants (prefabs take theirs along)
fn deletion_order(scene: &Scene) -> Vec<Uuid> {
    let mut ids = Vec::new();
    for root in scene.root_entities(scene.selection()) {
        ids.push(root);
        if !scene.get(root).is_some_and(|e| e.kind.is_prefab()) {
            ids.extend(scene.descendants(root));
        }
    }
    // Children go first so undo restores parents before them.
    ids.reverse();
    ids
}

impl State for DeletePick {
    fn state_type(&self) -> StateType {
        StateType::DeletePick
    }

    fn transition_in(&mut self, ctx: &mut EditorContext, _previous: &mut dyn State) {
        if ctx.input.keyboard_captured {
            tracing::warn!("Delete ignored while a text field has focus");
            ctx.status.set_status("Delete ignored while editing text.");
            return;
        }

        let ids = deletion_order(ctx.scene);
        if ids.is_empty() {
            return;
        }

        ctx.actions.begin_action_group();
        let mut count = 0;
        for id in ids {
            if let Some(action) = DeleteAction::new(ctx.scene, id) {
                ctx.actions.add_action(Box::new(action));
                count += 1;
            }
        }
        ctx.actions.group_last_actions(count, "Delete");
        tracing::debug!("Deleted {} entities", count);
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        picking_transition_out(&mut self.picking, next);
    }

    fn picking(&self) -> Option<&PickingContext> {
        Some(&self.picking)
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        Some(&mut self.picking)
    }
}

// Duplicate
//////////////////////////////////////////

/// Copies the selected roots while the copy modifier is held
#[derive(Default)]
pub struct Duplicate {
    picking: PickingContext,
}

impl Duplicate {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for Duplicate {
    fn state_type(&self) -> StateType {
        StateType::Duplicate
    }

    fn transition_in(&mut self, ctx: &mut EditorContext, _previous: &mut dyn State) {
        if !ctx.input.ctrl {
            return;
        }

        let roots = ctx.scene.root_entities(ctx.scene.selection());
        if roots.is_empty() {
            return;
        }

        ctx.actions.begin_action_group();
        let mut copies = Vec::with_capacity(roots.len());
        for root in roots {
            let Some(world) = ctx.scene.world_matrix(root) else {
                continue;
            };
            let mut entities = ctx.scene.deep_copy(root);
            let Some(copy_root) = entities.first_mut() else {
                continue;
            };
            // Copies are inserted unparented, so local equals world.
            copy_root.local = Transform::from_mat4(&world);
            let copy_id = copy_root.id;

            if let Some(action) = CreateAction::new(ctx.scene, entities) {
                ctx.actions.add_action(Box::new(action));
                copies.push(copy_id);
            }
        }
        ctx.actions.group_last_actions(copies.len(), "Duplicate");

        ctx.scene.clear_selection();
        for id in &copies {
            ctx.scene.add_to_selection(*id, true);
        }
        ctx.status.set_status(format!("{} entities copied", copies.len()));
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        picking_transition_out(&mut self.picking, next);
    }

    fn picking(&self) -> Option<&PickingContext> {
        Some(&self.picking)
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        Some(&mut self.picking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fsm::StateMachine;
    use crate::testing::TestRig;
    use edit_core::{AnchorRatios, Entity};

    fn picking_machine() -> StateMachine {
        let mut machine = StateMachine::new();
        machine.push_state(Box::new(BeginPick::new()));
        machine.push_state(Box::new(BeginBoxPick::new()));
        machine.push_state(Box::new(EndPick::new()));
        machine.push_state(Box::new(DeletePick::new()));
        machine.push_state(Box::new(Duplicate::new()));
        for state in [StateType::EndPick, StateType::DeletePick, StateType::Duplicate] {
            machine.link(state, Signal::BackToStart, StateType::BeginPick);
        }
        machine.set_initial(StateType::BeginPick);
        machine
    }

    fn current_picks(machine: &StateMachine) -> Vec<Uuid> {
        machine
            .current_state()
            .and_then(|s| s.picking())
            .map(|p| p.picked_entities())
            .unwrap_or_default()
    }

    #[test]
    fn test_click_picks_entity_under_pointer() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut machine = picking_machine();

        rig.viewport.set_last_mouse_pos(rig.viewport.size * 0.5);
        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::LeftMouseDown);
        machine.signal(&mut ctx, Signal::LeftMouseUp);

        assert_eq!(machine.current_type(), Some(StateType::EndPick));
        assert_eq!(current_picks(&machine), vec![cube]);
    }

    #[test]
    fn test_end_pick_receives_context_unchanged() {
        let mut rig = TestRig::new();
        rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut machine = picking_machine();

        rig.viewport.set_last_mouse_pos(Vec2::new(400.0, 300.0));
        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::LeftMouseDown);
        machine.signal(&mut ctx, Signal::LeftMouseUp);

        let end = machine.state(StateType::EndPick).and_then(|s| s.picking()).unwrap();
        let begin = machine.state(StateType::BeginPick).and_then(|s| s.picking()).unwrap();
        assert_eq!(end.pick_data.len(), 1);
        assert_eq!(end.mouse_data, [Vec2::new(400.0, 300.0); 2]);
        assert!(begin.pick_data.is_empty());
    }

    #[test]
    fn test_ignore_list_depends_on_viewport() {
        let mut rig = TestRig::new();
        let grid = rig.scene.add_entity(Entity::new("grid", EntityKind::Grid));
        let mesh = rig.scene.add_entity(Entity::new("mesh", EntityKind::Mesh));
        let surface = rig.scene.add_entity(Entity::new(
            "button",
            EntityKind::Surface {
                anchor: AnchorRatios::default(),
            },
        ));

        let ignored = build_ignore_list(&rig.scene, &rig.viewport);
        assert!(ignored.contains(&grid));
        assert!(ignored.contains(&surface));
        assert!(!ignored.contains(&mesh));

        rig.viewport.kind = edit_core::ViewportKind::Layout2d;
        let ignored = build_ignore_list(&rig.scene, &rig.viewport);
        assert!(ignored.contains(&grid));
        assert!(ignored.contains(&mesh));
        assert!(!ignored.contains(&surface));
    }

    #[test]
    fn test_box_pick_collects_entities_inside() {
        let mut rig = TestRig::new();
        let left = rig.scene.add_entity(
            Entity::new("left", EntityKind::Mesh).with_translation(Vec3::new(-2.0, 0.0, 0.0)),
        );
        let right = rig.scene.add_entity(
            Entity::new("right", EntityKind::Mesh).with_translation(Vec3::new(2.0, 0.0, 0.0)),
        );
        let far_away = rig.scene.add_entity(
            Entity::new("far_away", EntityKind::Mesh).with_translation(Vec3::new(0.0, 40.0, 0.0)),
        );
        let mut machine = picking_machine();

        rig.viewport.set_last_mouse_pos(Vec2::new(100.0, 100.0));
        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::LeftMouseDown);
        ctx.viewport.set_last_mouse_pos(Vec2::new(700.0, 500.0));
        machine.signal(&mut ctx, Signal::LeftMouseDrag);
        assert_eq!(machine.current_type(), Some(StateType::BeginBoxPick));

        machine.update(&mut ctx, 0.016);
        assert!(matches!(ctx.overlays.last(), Some(Overlay::SelectionRect { .. })));

        machine.signal(&mut ctx, Signal::LeftMouseUp);
        let picks = current_picks(&machine);
        assert!(picks.contains(&left));
        assert!(picks.contains(&right));
        assert!(!picks.contains(&far_away));
    }

    #[test]
    fn test_zero_area_box_matches_single_pick() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut machine = picking_machine();

        rig.viewport.set_last_mouse_pos(Vec2::new(400.0, 300.0));
        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::LeftMouseDown);
        machine.signal(&mut ctx, Signal::LeftMouseDrag);
        machine.signal(&mut ctx, Signal::LeftMouseUp);

        assert_eq!(machine.current_type(), Some(StateType::EndPick));
        assert_eq!(current_picks(&machine), vec![cube]);
    }

    #[test]
    fn test_delete_orders_children_first() {
        let mut rig = TestRig::new();
        let root = rig.scene.add_entity(Entity::new("root", EntityKind::Mesh));
        let a = rig.scene.add_entity(Entity::new("a", EntityKind::Mesh));
        let b = rig.scene.add_entity(Entity::new("b", EntityKind::Mesh));
        rig.scene.set_parent(a, Some(root), false).unwrap();
        rig.scene.set_parent(b, Some(root), false).unwrap();
        rig.scene.add_to_selection(root, false);
        rig.scene.add_to_selection(a, true);

        assert_eq!(deletion_order(&rig.scene), vec![b, a, root]);
    }

    #[test]
    fn test_delete_skipped_while_keyboard_captured() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        rig.scene.add_to_selection(cube, false);
        rig.input.keyboard_captured = true;
        let mut machine = picking_machine();

        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::Delete);
        machine.signal(&mut ctx, Signal::BackToStart);
        drop(ctx);

        assert!(rig.scene.contains(cube));
        assert!(rig.actions.is_empty());
        assert_eq!(machine.current_type(), Some(StateType::BeginPick));
    }

    #[test]
    fn test_duplicate_requires_copy_modifier() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        rig.scene.add_to_selection(cube, false);
        let mut machine = picking_machine();

        let mut ctx = rig.context();
        machine.signal(&mut ctx, Signal::Duplicate);
        drop(ctx);
        assert_eq!(rig.scene.len(), 1);
        assert_eq!(rig.scene.selection(), &[cube]);
    }
}
