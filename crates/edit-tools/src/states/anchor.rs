//! Anchor family: dragging the anchor grips of a canvas surface

use edit_core::{AnchorRatios, Plane};
use glam::{Vec2, Vec3};
use uuid::Uuid;

use crate::actions::AnchorAction;
use crate::anchor_handle::{AnchorHandle, anchored_surface, drag_ratios};
use crate::context::EditorContext;
use crate::fsm::{State, StateType};
use crate::signal::Signal;

/// Context shared by the anchor states
#[derive(Debug, Clone, Default)]
pub struct AnchorContext {
    pub handle: AnchorHandle,
    pub mouse_data: [Vec2; 2],
    /// Canvas plane drag deltas are measured on
    pub intersection_plane: Plane,
}

fn anchor_transition_out(anchor: &AnchorContext, next: &mut dyn State) {
    if let Some(next_anchor) = next.anchor_mut() {
        *next_anchor = anchor.clone();
    }
    if let Some(next_picking) = next.picking_mut() {
        next_picking.mouse_data = anchor.mouse_data;
    }
}

// AnchorBegin
//////////////////////////////////////////

#[derive(Default)]
pub struct AnchorBegin {
    anchor: AnchorContext,
}

impl AnchorBegin {
    pub fn new() -> Self {
        Self::default()
    }

    fn refresh(&mut self, ctx: &mut EditorContext) -> bool {
        let handle = &mut self.anchor.handle;
        if !handle.update_pose(ctx.scene) {
            handle.last_hovered = None;
            return false;
        }
        handle.look_at(ctx.viewport);
        true
    }

    fn grab(&mut self, ctx: &mut EditorContext) -> bool {
        let ray = ctx.viewport.ray_from_screen_point(self.anchor.mouse_data[0]);
        let handle = &mut self.anchor.handle;
        let Some(direction) = handle.hit_test(&ray) else {
            return false;
        };

        handle.grab(direction);
        let plane = Plane::from_point_normal(handle.canvas_bounds.center(), Vec3::Z);
        handle.grab_point = plane.intersect_point(&ray).unwrap_or(handle.canvas_bounds.center());
        self.anchor.intersection_plane = plane;

        tracing::debug!("Grabbed anchor {}", direction.name());
        true
    }
}

impl State for AnchorBegin {
    fn state_type(&self) -> StateType {
        StateType::AnchorBegin
    }

    fn update(&mut self, ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        if self.refresh(ctx) && self.anchor.handle.grabbed.is_none() {
            let ray = ctx.viewport.ray_from_mouse();
            self.anchor.handle.last_hovered = self.anchor.handle.hit_test(&ray);
        }
        None
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDown => {
                let pos = ctx.viewport.last_mouse_pos();
                self.anchor.mouse_data = [pos; 2];

                if !self.refresh(ctx) || !self.grab(ctx) {
                    return Some(StateType::BeginPick);
                }
                None
            }
            Signal::LeftMouseUp => {
                self.anchor.handle.release();
                None
            }
            Signal::LeftMouseDrag => self.anchor.handle.grabbed.map(|_| StateType::AnchorTo),
            Signal::Delete => Some(StateType::DeletePick),
            Signal::Duplicate => Some(StateType::Duplicate),
            Signal::BackToStart => None,
        }
    }

    fn transition_in(&mut self, _ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(anchor) = previous.anchor() {
            self.anchor = anchor.clone();
        }
        self.anchor.handle.release();
        self.anchor.mouse_data = [Vec2::ZERO; 2];
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        anchor_transition_out(&self.anchor, next);
    }

    fn anchor(&self) -> Option<&AnchorContext> {
        Some(&self.anchor)
    }

    fn anchor_mut(&mut self) -> Option<&mut AnchorContext> {
        Some(&mut self.anchor)
    }
}

// AnchorTo
//////////////////////////////////////////

#[derive(Default)]
pub struct AnchorTo {
    anchor: AnchorContext,
    surface: Option<Uuid>,
    initial_ratios: AnchorRatios,
    recorded: bool,
}

impl AnchorTo {
    pub fn new() -> Self {
        Self::default()
    }

    fn drag(&mut self, ctx: &mut EditorContext) {
        let Some(surface) = self.surface else {
            return;
        };
        let Some(direction) = self.anchor.handle.grabbed else {
            return;
        };

        let md = &mut self.anchor.mouse_data;
        md[1] = ctx.viewport.last_mouse_pos();
        let plane = self.anchor.intersection_plane;
        let before = plane.intersect_point(&ctx.viewport.ray_from_screen_point(md[0]));
        let after = plane.intersect_point(&ctx.viewport.ray_from_screen_point(md[1]));
        md[0] = md[1];

        let (Some(before), Some(after)) = (before, after) else {
            return;
        };
        let bounds = self.anchor.handle.canvas_bounds;
        let Some(ratios) = ctx.scene.get_mut(surface).and_then(|e| e.anchor_mut()) else {
            return;
        };
        *ratios = drag_ratios(*ratios, direction, after - before, bounds.width(), bounds.height());
        self.anchor.handle.ratios = *ratios;
    }
}

impl State for AnchorTo {
    fn state_type(&self) -> StateType {
        StateType::AnchorTo
    }

    fn update(&mut self, ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        self.anchor.handle.update_pose(ctx.scene);
        self.anchor.handle.look_at(ctx.viewport);
        None
    }

    fn signaled(&mut self, ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::LeftMouseDrag => {
                self.drag(ctx);
                None
            }
            Signal::LeftMouseUp => Some(StateType::AnchorEnd),
            _ => None,
        }
    }

    fn transition_in(&mut self, ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(anchor) = previous.anchor() {
            self.anchor = anchor.clone();
        }

        self.surface = anchored_surface(ctx.scene).map(|(surface, _)| surface);
        self.recorded = false;
        if let Some(surface) = self.surface
            && let Some(action) = AnchorAction::new(ctx.scene, surface)
        {
            self.initial_ratios = action.before();
            ctx.actions.add_action(Box::new(action));
            self.recorded = true;
        }
    }

    fn transition_out(&mut self, ctx: &mut EditorContext, next: &mut dyn State) {
        let current = self
            .surface
            .and_then(|id| ctx.scene.get(id))
            .and_then(|e| e.anchor().copied());
        if self.recorded && current == Some(self.initial_ratios) {
            ctx.actions.remove_last_action();
        }
        self.recorded = false;

        anchor_transition_out(&self.anchor, next);
    }

    fn anchor(&self) -> Option<&AnchorContext> {
        Some(&self.anchor)
    }

    fn anchor_mut(&mut self) -> Option<&mut AnchorContext> {
        Some(&mut self.anchor)
    }
}

// AnchorEnd
//////////////////////////////////////////

#[derive(Default)]
pub struct AnchorEnd {
    anchor: AnchorContext,
}

impl AnchorEnd {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for AnchorEnd {
    fn state_type(&self) -> StateType {
        StateType::AnchorEnd
    }

    fn signaled(&mut self, _ctx: &mut EditorContext, signal: Signal) -> Option<StateType> {
        match signal {
            Signal::BackToStart => Some(StateType::AnchorBegin),
            _ => None,
        }
    }

    fn transition_in(&mut self, _ctx: &mut EditorContext, previous: &mut dyn State) {
        if let Some(anchor) = previous.anchor() {
            self.anchor = anchor.clone();
        }
    }

    fn transition_out(&mut self, _ctx: &mut EditorContext, next: &mut dyn State) {
        self.anchor.handle.release();
        self.anchor.mouse_data = [Vec2::ZERO; 2];
        anchor_transition_out(&self.anchor, next);
    }

    fn anchor(&self) -> Option<&AnchorContext> {
        Some(&self.anchor)
    }

    fn anchor_mut(&mut self) -> Option<&mut AnchorContext> {
        Some(&mut self.anchor)
    }
}
