//! Transform family: grabbing a handle part and dragging it
//!
//! `TransformBegin` hit-tests the handle and picks the drag plane,
//! `TransformTo` turns pointer motion on that plane into translation,
//! rotation or scale of the selection, and `TransformEnd` hands control
//! back to `TransformBegin` with a clean grab.

use edit_core::{MIN_SCALE, Plane, Scene, SceneError};
use glam::{Quat, Vec2, Vec3};
use uuid::Uuid;

use crate::actions::TransformAction;
use crate::context::EditorContext;
use crate::fsm::{State, StateType};
use crate::gizmo::{AxisLabel, Gizmo, GizmoKind};
use crate::overlay::Overlay;
use crate::signal::Signal;

/// Degrees of rotation per handle-length of drag along the ring tangent
pub const ROTATION_DEGREES_PER_UNIT: f32 = 180.0 / std::f32::consts::PI;

/// Smallest bounding extent used to normalize scale drags
const MIN_SCALE_EXTENT: f32 = 0.0001;

const LOCKED_STATUS: &str = "Transform failed. Transform locked.";

/// Context shared by the transform states
#[derive(Debug, Clone)]
pub struct TransformContext {
    pub gizmo: Gizmo,
    /// Previous and current pointer sample, in viewport pixels
    pub mouse_data: [Vec2; 2],
    /// Plane drag deltas are measured on
    pub intersection_plane: Plane,
}

impl TransformContext {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            gizmo: Gizmo::new(kind),
            mouse_data: [Vec2::ZERO; 2],
            intersection_plane: Plane::default(),
        }
    }

    pub fn kind(&self) -> GizmoKind {
        self.gizmo.kind
    }
}

fn transform_transition_out(transform: &TransformContext, next: &mut dyn State) {
    if let Some(next_transform) = next.transform_mut() {
        *next_transform = transform.clone();
    }
    if let Some(next_picking) = next.picking_mut() {
        next_picking.mouse_data = transform.mouse_data;
    }
}

/// Drag plane for a grabbed part.
///
/// Rings use their own plane. Single axes use the plane containing the axis
/// that faces the viewer most. Coordinate planes use themselves, and the
/// uniform part uses the coordinate plane facing the viewer most.
pub fn intersection_plane(gizmo: &Gizmo, axis: AxisLabel, view_dir: Vec3) -> Plane {
    let pivot = gizmo.world_location;

    if gizmo.kind == GizmoKind::Rotate {
        return Plane::from_point_normal(pivot, gizmo.axis_direction(axis));
    }

    let normal = match axis {
        AxisLabel::X | AxisLabel::Y | AxisLabel::Z => {
            let px = gizmo.axis_direction(axis);
            let py = px.cross(view_dir).normalize_or_zero();
            let pz = py.cross(px).normalize_or_zero();
            if pz == Vec3::ZERO {
                px.any_orthonormal_vector()
            } else {
                pz
            }
        }
        AxisLabel::XYZ => gizmo
            .normal_vectors
            .into_iter()
            .max_by(|a, b| a.dot(view_dir).abs().total_cmp(&b.dot(view_dir).abs()))
            .unwrap_or(Vec3::Z),
        plane => gizmo.normal_vectors[plane.normal_index()],
    };

    Plane::from_point_normal(pivot, normal)
}

/// Selected entities that follow the primary's pivot: everything selected
/// and unlocked apart from the primary itself, ancestors included.
fn pivot_followers(scene: &Scene, primary: Uuid) -> Vec<Uuid> {
    scene
        .selection()
        .iter()
        .copied()
        .filter(|id| *id != primary)
        .filter(|id| scene.get(*id).is_some_and(|e| !e.transform_locked))
        .collect()
}

/// Run `edit` on the primary selection with every other selected entity
/// temporarily parented under it, so the whole selection follows the
/// primary's pivot. Original parents and sibling positions are restored.
pub fn with_selection_pivot(
    scene: &mut Scene,
    primary: Uuid,
    edit: impl FnOnce(&mut Scene) -> Result<(), SceneError>,
) {
    let followers = pivot_followers(scene, primary);
    // A selected ancestor can only hang under the primary once the primary
    // is lifted out of its subtree.
    let lift_primary = followers.iter().any(|id| scene.is_ancestor(*id, primary));

    let mut moved: Vec<(Uuid, Option<Uuid>, Option<usize>)> = lift_primary
        .then_some(primary)
        .into_iter()
        .chain(followers)
        .map(|id| (id, scene.parent(id), scene.sibling_index(id)))
        .collect();

    if lift_primary && let Err(e) = scene.set_parent(primary, None, true) {
        tracing::warn!("Cannot lift {} for pivot: {}", primary, e);
    }
    for (id, _, _) in moved.iter().filter(|(id, _, _)| *id != primary) {
        if let Err(e) = scene.set_parent(*id, Some(primary), true) {
            tracing::warn!("Cannot attach {} to pivot: {}", id, e);
        }
    }

    if let Err(e) = edit(scene) {
        tracing::warn!("Transform not applied: {}", e);
    }

    for (id, _, _) in moved.iter().filter(|(id, _, _)| *id != primary) {
        if let Err(e) = scene.set_parent(*id, None, true) {
            tracing::warn!("Cannot detach {} from pivot: {}", id, e);
        }
    }
    moved.sort_by_key(|(_, _, index)| index.unwrap_or(usize::MAX));
    for (id, parent, index) in moved {
        if let Err(e) = scene.set_parent_at(id, parent, index, true) {
            tracing::warn!("Cannot restore parent of {}: {}", id, e);
        }
    }
}

// TransformBegin
//////////////////////////////////////////

/// Idle transform state: follows the selection, hovers and grabs handle parts
pub struct TransformBegin {
    transform: TransformContext,
}

impl TransformBegin {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            transform: TransformContext::new(kind),
        }
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> bool {
        let gizmo = &mut self.transform.gizmo;
        if !gizmo.update_pose(ctx.scene, ctx.settings.transform_space) {
            gizmo.last_hovered = None;
            return false;
        }
        gizmo.look_at(ctx.viewport);
        if gizmo.grabbed.is_none() {
            let view_dir = gizmo.view_direction(ctx.viewport);
            gizmo.update_locks(view_dir);
        }
        true
    }

    fn grab(&mut self, ctx: &mut EditorContext) -> bool {
        let ray = ctx.viewport.ray_from_screen_point(self.transform.mouse_data[0]);
        let gizmo = &mut self.transform.gizmo;
        let Some(axis) = gizmo.hit_test(&ray) else {
            return false;
        };

        gizmo.grab(axis);
        let view_dir = gizmo.view_direction(ctx.viewport);
        let plane = intersection_plane(gizmo, axis, view_dir);
        let hit = plane.intersect_point(&ray).unwrap_or(gizmo.world_location);

        gizmo.initial_point = hit;
        gizmo.grab_point = match gizmo.kind {
            GizmoKind::Rotate => (hit - gizmo.world_location)
                .normalize_or(gizmo.axis_direction(axis).any_orthonormal_vector()),
            GizmoKind::Move | GizmoKind::Scale => hit,
        };
        self.transform.intersection_plane = plane;

        tracing::debug!("Grabbed {} {}", gizmo.kind.name(), axis.name());
        true
    }
}

impl State for TransformBegin {
    fn state_type(&self) -> StateType {
        StateType::TransformBegin
    }

    fn update(&mut self, ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        if self.refresh(ctx) && self.transform.gizmo.grabbed.is_none() {
            let ray = ctx.viewport.ray_from_mouse();
            self.transform.gizmo.last_hovered = self.transform.gizmo.hit_test(&ray);
        }
        None
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDown => {
                let pos = ctx.viewport.last_mouse_pos();
                self.transform.mouse_data = [pos; 2];

                if !self.refresh(ctx) || !self.grab(ctx) {
                    return Some(StateType::BeginPick);
                }
                None
            }
            Signal::LeftMouseUp => {
                self.transform.gizmo.release();
                None
            }
            Signal::LeftMouseDrag => self
                .transform
                .gizmo
                .grabbed
                .map(|_| StateType::TransformTo),
            Signal::Delete => Some(StateType::DeletePick),
            Signal::Duplicate => Some(StateType::Duplicate),
            Signal::BackToStart => None,
        }
    }

    fn transition_in(&mut self, _ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(transform) = previous.transform() {
            self.transform = transform.clone();
        }
        self.transform.gizmo.release();
        self.transform.mouse_data = [Vec2::ZERO; 2];
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        transform_transition_out(&self.transform, next);
    }

    fn transform(&self) -> Option<&TransformContext> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut TransformContext> {
        Some(&mut self.transform)
    }
}

// TransformTo
//////////////////////////////////////////

/// Active drag: converts pointer motion into edits of the selection
pub struct TransformTo {
    transform: TransformContext,
    /// World translation of the primary selection when the drag started
    initial_location: Vec3,
    /// Global pointer position the pointer is recentred to
    initial_pointer: Vec2,
    /// Delta computed from the last drag, not yet applied
    pending: Vec3,
    /// Translation or scale delta accumulated for snapping
    accumulated: Vec3,
    /// Degrees accumulated for snapping
    accumulated_angle: f32,
    /// History entries recorded for this drag
    recorded: usize,
    changed: bool,
    lock_reported: bool,
}

impl TransformTo {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            transform: TransformContext::new(kind),
            initial_location: Vec3::ZERO,
            initial_pointer: Vec2::ZERO,
            pending: Vec3::ZERO,
            accumulated: Vec3::ZERO,
            accumulated_angle: 0.0,
            recorded: 0,
            changed: false,
            lock_reported: false,
        }
    }

    fn record_actions(&mut self, ctx: &mut EditorContext) {
        self.recorded = 0;
        let Some(primary) = ctx.scene.current_selection() else {
            return;
        };
        let mut moved = pivot_followers(ctx.scene, primary);
        if ctx.scene.get(primary).is_some_and(|e| !e.transform_locked) {
            moved.insert(0, primary);
        }

        let actions: Vec<TransformAction> = moved
            .iter()
            .filter_map(|id| TransformAction::new(ctx.scene, *id))
            .collect();

        match actions.len() {
            0 => {}
            1 => {
                for action in actions {
                    ctx.actions.add_action(Box::new(action));
                }
                self.recorded = 1;
            }
            count => {
                ctx.actions.begin_action_group();
                for action in actions {
                    ctx.actions.add_action(Box::new(action));
                }
                ctx.actions.group_last_actions(count, "Transform");
                self.recorded = 1;
            }
        }
    }

    /// World delta between the previous and current pointer samples.
    ///
    /// The pointer is recentred on every drag so it never hits the screen
    /// edge; the samples track where it would have been.
    fn calculate_delta(&mut self, ctx: &mut EditorContext) -> Vec3 {
        let global = ctx.input.global_pointer;
        let motion = global - self.initial_pointer;
        let md = &mut self.transform.mouse_data;
        md[1] = md[0] + motion;
        if motion != Vec2::ZERO {
            ctx.input.request_warp(self.initial_pointer);
        }

        let plane = self.transform.intersection_plane;
        let before = plane.intersect_point(&ctx.viewport.ray_from_screen_point(md[0]));
        let after = plane.intersect_point(&ctx.viewport.ray_from_screen_point(md[1]));
        md[0] = md[1];

        match (before, after) {
            (Some(a), Some(b)) => b - a,
            // Parallel to the drag plane: hold still this frame.
            _ => Vec3::ZERO,
        }
    }

    fn apply(&mut self, ctx: &mut EditorContext, delta: Vec3) {
        let Some(primary) = ctx.scene.current_selection() else {
            return;
        };
        let Some(axis) = self.transform.gizmo.grabbed else {
            return;
        };

        if ctx.scene.get(primary).is_some_and(|e| e.transform_locked) {
            if !self.lock_reported {
                tracing::warn!("Primary selection {} is transform locked", primary);
                ctx.status.set_status(LOCKED_STATUS);
                self.lock_reported = true;
            }
            return;
        }

        let applied = match self.transform.kind() {
            GizmoKind::Move => self.translate(ctx, primary, axis, delta),
            GizmoKind::Rotate => self.rotate(ctx, primary, axis, delta),
            GizmoKind::Scale => self.scale(ctx, primary, axis, delta),
        };
        self.changed |= applied;
    }

    fn translate(&mut self, ctx: &mut EditorContext, primary: Uuid, axis: AxisLabel, delta: Vec3) -> bool {
        let delta = if axis.is_plane() {
            delta
        } else {
            let dir = self.transform.gizmo.axis_direction(axis);
            dir * delta.dot(dir)
        };
        self.accumulated += delta;

        let Some(current) = ctx.scene.world_translation(primary) else {
            return false;
        };
        let mut target = current + delta;

        let spacing = ctx.settings.move_delta;
        if ctx.settings.snaps_enabled && spacing > 0.0 && axis != AxisLabel::XYZ {
            let snapped = ((self.initial_location + self.accumulated) / spacing).round() * spacing;
            for c in 0..3 {
                let locked = if axis.is_plane() {
                    c != axis.normal_index()
                } else {
                    c == axis.index()
                };
                if locked {
                    target[c] = snapped[c];
                }
            }
        }

        if target == current {
            return false;
        }
        with_selection_pivot(ctx.scene, primary, |scene| {
            scene.set_world_translation(primary, target)
        });
        true
    }

    fn rotate(&mut self, ctx: &mut EditorContext, primary: Uuid, axis: AxisLabel, delta: Vec3) -> bool {
        let gizmo = &self.transform.gizmo;
        let ring_axis = gizmo.axis_direction(axis);
        let tangent = ring_axis.cross(gizmo.grab_point).normalize_or_zero();
        let along = delta.dot(tangent);
        self.accumulated_angle +=
            along / gizmo.handle_scale.max(f32::EPSILON) * ROTATION_DEGREES_PER_UNIT;

        let step = ctx.settings.rotate_delta;
        let degrees = if ctx.settings.snaps_enabled && step > 0.0 {
            // Whole steps only; the remainder carries over.
            let committed = (self.accumulated_angle / step).trunc() * step;
            self.accumulated_angle -= committed;
            committed
        } else {
            std::mem::take(&mut self.accumulated_angle)
        };

        if degrees == 0.0 {
            return false;
        }
        let rotation = Quat::from_axis_angle(ring_axis, degrees.to_radians());
        with_selection_pivot(ctx.scene, primary, |scene| scene.rotate_world(primary, rotation));
        true
    }

    fn scale(&mut self, ctx: &mut EditorContext, primary: Uuid, axis: AxisLabel, delta: Vec3) -> bool {
        let n = self.transform.gizmo.normal_vectors;
        let mask = axis.mask();
        let projected = Vec3::new(delta.dot(n[0]), delta.dot(n[1]), delta.dot(n[2])) * mask;

        let Some(entity) = ctx.scene.get(primary) else {
            return false;
        };
        let extent = (entity.local_bounds.size() * entity.local.scale.abs())
            .max(Vec3::splat(MIN_SCALE_EXTENT));

        // Outward grows, inward shrinks, whatever the view angle.
        let sign = if axis.is_plane() {
            projected
                .to_array()
                .into_iter()
                .max_by(|a, b| a.abs().total_cmp(&b.abs()))
                .unwrap_or(0.0)
                .signum()
        } else {
            projected[axis.index()].signum()
        };
        let magnitude = projected.length() / (extent * mask).length();
        self.accumulated += mask.normalize() * magnitude * sign;

        let step = ctx.settings.scale_delta;
        let committed = if ctx.settings.snaps_enabled && step > 0.0 {
            let threshold = if axis.is_plane() {
                Vec2::splat(step).length()
            } else {
                step
            };
            if self.accumulated.length() < threshold {
                Vec3::ZERO
            } else {
                let committed = (self.accumulated / step).round() * step;
                self.accumulated -= committed;
                committed
            }
        } else {
            std::mem::take(&mut self.accumulated)
        };

        if committed == Vec3::ZERO {
            return false;
        }
        let factor = (Vec3::ONE + committed).max(Vec3::splat(MIN_SCALE));
        with_selection_pivot(ctx.scene, primary, |scene| scene.scale_local(primary, factor));
        true
    }

    fn flush(&mut self, ctx: &mut EditorContext) {
        let pending = std::mem::take(&mut self.pending);
        if pending != Vec3::ZERO {
            self.apply(ctx, pending);
        }
    }
}

impl State for TransformTo {
    fn state_type(&self) -> StateType {
        StateType::TransformTo
    }

    fn update(&mut self, ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        self.flush(ctx);

        let gizmo = &mut self.transform.gizmo;
        gizmo.update_pose(ctx.scene, ctx.settings.transform_space);
        gizmo.look_at(ctx.viewport);

        let position = ctx.viewport.clamp_to_content(self.transform.mouse_data[0]);
        ctx.overlays.push(Overlay::MoveCursor { position });
        None
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDrag => {
                let delta = self.calculate_delta(ctx);
                self.pending += delta;
                None
            }
            Signal::LeftMouseUp => {
                let release = ctx.viewport.clamp_to_content(self.transform.mouse_data[0]);
                ctx.input.request_warp(ctx.viewport.content_origin + release);
                Some(StateType::TransformEnd)
            }
            _ => None,
        }
    }

    fn transition_in(&mut self, ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(transform) = previous.transform() {
            self.transform = transform.clone();
        }
        self.pending = Vec3::ZERO;
        self.accumulated = Vec3::ZERO;
        self.accumulated_angle = 0.0;
        self.changed = false;
        self.lock_reported = false;

        self.record_actions(ctx);
        self.initial_location = ctx
            .scene
            .current_selection()
            .and_then(|id| ctx.scene.world_translation(id))
            .unwrap_or(self.transform.gizmo.world_location);
        self.initial_pointer = ctx.input.global_pointer;
    }

    fn transition_out(&mut self, ctx: &mut EditorContext, next: &mut dyn State) {
        self.flush(ctx);

        if !self.changed {
            for _ in 0..self.recorded {
                ctx.actions.remove_last_action();
            }
        }
        self.recorded = 0;

        transform_transition_out(&self.transform, next);
    }

    fn transform(&self) -> Option<&TransformContext> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut TransformContext> {
        Some(&mut self.transform)
    }
}

// TransformEnd
//////////////////////////////////////////

/// One-frame pass-through back to `TransformBegin`
pub struct TransformEnd {
    transform: TransformContext,
}

impl TransformEnd {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            transform: TransformContext::new(kind),
        }
    }
}

impl State for TransformEnd {
    fn state_type(&self) -> StateType {
        StateType::TransformEnd
    }

    fn signaled(&mut self, _ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::BackToStart => Some(StateType::TransformBegin),
            _ => None,
        }
    }

    fn transition_in(&mut self, _ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(transform) = previous.transform() {
            self.transform = transform.clone();
        }
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        self.transform.gizmo.release();
        self.transform.mouse_data = [Vec2::ZERO; 2];
        transform_transition_out(&self.transform, next);
    }

    fn transform(&self) -> Option<&TransformContext> {
        Some(&self.transform)
    }

    fn transform_mut(&mut self) -> Option<&mut TransformContext> {
        Some(&mut self.transform)
    }
}
