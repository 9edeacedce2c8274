//! Tools and the tool stack
//!
//! A tool owns one [`StateMachine`] wired for its interaction mode. The
//! [`ToolManager`] keeps an inert base tool at the bottom of a stack and at
//! most one active tool above it; only the top tool is updated and receives
//! signals.

use crate::anchor_handle::AnchorHandle;
use crate::config::TransformSpace;
use crate::context::EditorContext;
use crate::fsm::{StateMachine, StateType};
use crate::gizmo::{Gizmo, GizmoKind};
use crate::signal::Signal;
use crate::states::{
    AnchorBegin, AnchorEnd, AnchorTo, BeginBoxPick, BeginPick, DeletePick, Duplicate, EndPick,
    TransformBegin, TransformEnd, TransformTo,
};
use crate::status::TRANSITION_TAG;

/// Identity of a tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    Base,
    Select,
    Cursor,
    Move,
    Rotate,
    Scale,
    Anchor,
}

impl ToolId {
    pub fn name(&self) -> &'static str {
        match self {
            ToolId::Base => "Base",
            ToolId::Select => "Select",
            ToolId::Cursor => "Cursor",
            ToolId::Move => "Move",
            ToolId::Rotate => "Rotate",
            ToolId::Scale => "Scale",
            ToolId::Anchor => "Anchor",
        }
    }
}

impl std::fmt::Display for ToolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An interaction mode driving one state machine
pub trait Tool {
    fn id(&self) -> ToolId;

    /// Build states and wiring. Called once, right after construction.
    fn init(&mut self, _ctx: &mut EditorContext) {}

    /// Release whatever `init` changed outside the tool
    fn uninit(&mut self, _ctx: &mut EditorContext) {}

    fn update(&mut self, ctx: &mut EditorContext, dt: f32);

    fn signal(&mut self, ctx: &mut EditorContext, signal: Signal);

    fn state_machine(&self) -> &StateMachine;

    /// Transform handle, for tools that have one
    fn gizmo(&self) -> Option<&Gizmo> {
        let machine = self.state_machine();
        machine
            .current_state()
            .and_then(|s| s.transform())
            .or_else(|| machine.state(StateType::TransformBegin)?.transform())
            .map(|t| &t.gizmo)
    }

    /// Anchor handle, for tools that have one
    fn anchor_handle(&self) -> Option<&AnchorHandle> {
        let machine = self.state_machine();
        machine
            .current_state()
            .and_then(|s| s.anchor())
            .or_else(|| machine.state(StateType::AnchorBegin)?.anchor())
            .map(|a| &a.handle)
    }
}

/// Register the picking family, routing its finishing states back to `start`
fn register_picking_states(machine: &mut StateMachine, start: StateType) {
    machine.push_state(Box::new(BeginPick::new()));
    machine.push_state(Box::new(BeginBoxPick::new()));
    machine.push_state(Box::new(EndPick::new()));
    machine.push_state(Box::new(DeletePick::new()));
    machine.push_state(Box::new(Duplicate::new()));

    for state in [StateType::EndPick, StateType::DeletePick, StateType::Duplicate] {
        machine.link(state, Signal::BackToStart, start);
    }
    if start != StateType::BeginPick {
        machine.link(StateType::BeginPick, Signal::BackToStart, start);
    }
}

/// What a finished pick does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PickUse {
    Select,
    PlaceCursor,
}

/// Consume finished gestures and send the machine back to its start state
fn finish_gestures(machine: &mut StateMachine, ctx: &mut EditorContext, pick_use: PickUse) {
    match machine.current_type() {
        Some(StateType::EndPick) => {
            let picking = machine.current_state().and_then(|s| s.picking());
            match pick_use {
                PickUse::Select => {
                    let hits = picking.map(|p| p.picked_entities()).unwrap_or_default();
                    // A pick that hit nothing leaves the selection alone.
                    if !hits.is_empty() {
                        ctx.scene.add_ids_to_selection(&hits, ctx.input.shift);
                    }
                }
                PickUse::PlaceCursor => {
                    if let Some(position) = picking.and_then(|p| p.last_position()) {
                        *ctx.cursor = position;
                    }
                }
            }
            machine.signal(ctx, Signal::BackToStart);
        }
        Some(
            StateType::DeletePick
            | StateType::Duplicate
            | StateType::TransformEnd
            | StateType::AnchorEnd,
        ) => machine.signal(ctx, Signal::BackToStart),
        _ => {}
    }
}

// Tools
//////////////////////////////////////////

/// Always at the bottom of the stack. Does nothing.
#[derive(Default)]
pub struct BaseTool {
    machine: StateMachine,
}

impl Tool for BaseTool {
    fn id(&self) -> ToolId {
        ToolId::Base
    }

    fn update(&mut self, _ctx: &mut EditorContext, _dt: f32) {}

    fn signal(&mut self, _ctx: &mut EditorContext, _signal: Signal) {}

    fn state_machine(&self) -> &StateMachine {
        &self.machine
    }
}

/// Click and marquee selection
#[derive(Default)]
pub struct SelectTool {
    machine: StateMachine,
}

impl Tool for SelectTool {
    fn id(&self) -> ToolId {
        ToolId::Select
    }

    fn init(&mut self, _ctx: &mut EditorContext) {
        register_picking_states(&mut self.machine, StateType::BeginPick);
        self.machine.set_initial(StateType::BeginPick);
    }

    fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        self.machine.update(ctx, dt);
        finish_gestures(&mut self.machine, ctx, PickUse::Select);
    }

    fn signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        self.machine.signal(ctx, signal);
    }

    fn state_machine(&self) -> &StateMachine {
        &self.machine
    }
}

/// Places the 3D cursor where the user clicks
#[derive(Default)]
pub struct CursorTool {
    machine: StateMachine,
}

impl Tool for CursorTool {
    fn id(&self) -> ToolId {
        ToolId::Cursor
    }

    fn init(&mut self, _ctx: &mut EditorContext) {
        register_picking_states(&mut self.machine, StateType::BeginPick);
        self.machine.set_initial(StateType::BeginPick);
    }

    fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        self.machine.update(ctx, dt);
        finish_gestures(&mut self.machine, ctx, PickUse::PlaceCursor);
    }

    fn signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        self.machine.signal(ctx, signal);
    }

    fn state_machine(&self) -> &StateMachine {
        &self.machine
    }
}

/// Move, rotate or scale through the transform handle
pub struct TransformTool {
    id: ToolId,
    machine: StateMachine,
    /// Space to restore on uninit, set when the tool forced its own
    restore_space: Option<TransformSpace>,
}

impl TransformTool {
    pub fn new(kind: GizmoKind) -> Self {
        let id = match kind {
            GizmoKind::Move => ToolId::Move,
            GizmoKind::Rotate => ToolId::Rotate,
            GizmoKind::Scale => ToolId::Scale,
        };
        Self {
            id,
            machine: StateMachine::new(),
            restore_space: None,
        }
    }

    pub fn kind(&self) -> GizmoKind {
        match self.id {
            ToolId::Rotate => GizmoKind::Rotate,
            ToolId::Scale => GizmoKind::Scale,
            _ => GizmoKind::Move,
        }
    }
}

impl Tool for TransformTool {
    fn id(&self) -> ToolId {
        self.id
    }

    fn init(&mut self, ctx: &mut EditorContext) {
        let kind = self.kind();
        self.machine.push_state(Box::new(TransformBegin::new(kind)));
        self.machine.push_state(Box::new(TransformTo::new(kind)));
        self.machine.push_state(Box::new(TransformEnd::new(kind)));
        register_picking_states(&mut self.machine, StateType::TransformBegin);
        self.machine.set_initial(StateType::TransformBegin);

        // Scaling is only meaningful along the entity's own axes.
        if kind == GizmoKind::Scale {
            self.restore_space = Some(ctx.settings.transform_space);
            ctx.settings.transform_space = TransformSpace::Local;
        }
    }

    fn uninit(&mut self, ctx: &mut EditorContext) {
        if let Some(space) = self.restore_space.take() {
            ctx.settings.transform_space = space;
        }
    }

    fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        self.machine.update(ctx, dt);
        finish_gestures(&mut self.machine, ctx, PickUse::Select);
    }

    fn signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        self.machine.signal(ctx, signal);
    }

    fn state_machine(&self) -> &StateMachine {
        &self.machine
    }
}

/// Edits the anchor of a canvas surface
#[derive(Default)]
pub struct AnchorTool {
    machine: StateMachine,
}

impl Tool for AnchorTool {
    fn id(&self) -> ToolId {
        ToolId::Anchor
    }

    fn init(&mut self, _ctx: &mut EditorContext) {
        self.machine.push_state(Box::new(AnchorBegin::new()));
        self.machine.push_state(Box::new(AnchorTo::new()));
        self.machine.push_state(Box::new(AnchorEnd::new()));
        register_picking_states(&mut self.machine, StateType::AnchorBegin);
        self.machine.set_initial(StateType::AnchorBegin);
    }

    fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        self.machine.update(ctx, dt);
        finish_gestures(&mut self.machine, ctx, PickUse::Select);
    }

    fn signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        self.machine.signal(ctx, signal);
    }

    fn state_machine(&self) -> &StateMachine {
        &self.machine
    }
}

fn create_tool(id: ToolId) -> Option<Box<dyn Tool>> {
    match id {
        ToolId::Base => None,
        ToolId::Select => Some(Box::new(SelectTool::default())),
        ToolId::Cursor => Some(Box::new(CursorTool::default())),
        ToolId::Move => Some(Box::new(TransformTool::new(GizmoKind::Move))),
        ToolId::Rotate => Some(Box::new(TransformTool::new(GizmoKind::Rotate))),
        ToolId::Scale => Some(Box::new(TransformTool::new(GizmoKind::Scale))),
        ToolId::Anchor => Some(Box::new(AnchorTool::default())),
    }
}

// ToolManager
//////////////////////////////////////////

/// Stack of tools with the base tool at the bottom
#[derive(Default)]
pub struct ToolManager {
    stack: Vec<Box<dyn Tool>>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the base tool. Calling it again does nothing.
    pub fn init(&mut self) {
        if self.stack.is_empty() {
            self.stack.push(Box::new(BaseTool::default()));
        }
    }

    /// Uninit and drop every tool, base included
    pub fn uninit(&mut self, ctx: &mut EditorContext) {
        while let Some(mut tool) = self.stack.pop() {
            tool.uninit(ctx);
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.stack.is_empty()
    }

    /// Replace the active tool with a fresh `id` tool. Does nothing unless `set`.
    pub fn set_tool(&mut self, ctx: &mut EditorContext, set: bool, id: ToolId) {
        if !set {
            return;
        }
        let Some(mut next) = create_tool(id) else {
            tracing::error!("Tool {} cannot be activated", id);
            debug_assert!(false, "tool {} cannot be activated", id);
            return;
        };

        self.init();
        if self.stack.len() > 1
            && let Some(mut previous) = self.stack.pop()
        {
            previous.uninit(ctx);
        }

        next.init(ctx);
        self.stack.push(next);

        // Overlays point into the previous tool's states.
        ctx.overlays.clear();

        if ctx.settings.show_state_transitions {
            let line = format!("Mod: {}", id);
            tracing::debug!("{}", line);
            ctx.status.log(TRANSITION_TAG, line);
        }
    }

    pub fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        if let Some(tool) = self.stack.last_mut() {
            tool.update(ctx, dt);
        }
    }

    pub fn dispatch_signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        if let Some(tool) = self.stack.last_mut() {
            tool.signal(ctx, signal);
        }
    }

    pub fn active_tool(&self) -> Option<&dyn Tool> {
        self.stack.last().map(|t| t.as_ref())
    }

    pub fn active_id(&self) -> Option<ToolId> {
        self.active_tool().map(|t| t.id())
    }

    pub fn active_state(&self) -> Option<StateType> {
        self.active_tool()?.state_machine().current_type()
    }

    pub fn gizmo(&self) -> Option<&Gizmo> {
        self.active_tool()?.gizmo()
    }

    pub fn anchor_handle(&self) -> Option<&AnchorHandle> {
        self.active_tool()?.anchor_handle()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Overlay;
    use crate::testing::TestRig;
    use edit_core::{Entity, EntityKind};
    use glam::{Vec2, Vec3};

    fn click(manager: &mut ToolManager, rig: &mut TestRig, pos: Vec2) {
        rig.viewport.set_last_mouse_pos(pos);
        manager.dispatch_signal(&mut rig.context(), Signal::LeftMouseDown);
        manager.dispatch_signal(&mut rig.context(), Signal::LeftMouseUp);
        manager.update(&mut rig.context(), 0.016);
    }

    #[test]
    fn test_init_is_idempotent() {
        let mut manager = ToolManager::new();
        manager.init();
        manager.init();
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.active_id(), Some(ToolId::Base));
    }

    #[test]
    fn test_set_tool_replaces_top_only() {
        let mut rig = TestRig::new();
        let mut manager = ToolManager::new();
        manager.init();

        manager.set_tool(&mut rig.context(), true, ToolId::Select);
        manager.set_tool(&mut rig.context(), true, ToolId::Move);
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.active_id(), Some(ToolId::Move));
        assert_eq!(manager.active_state(), Some(StateType::TransformBegin));

        manager.set_tool(&mut rig.context(), false, ToolId::Rotate);
        assert_eq!(manager.active_id(), Some(ToolId::Move));
    }

    #[test]
    fn test_set_tool_clears_overlays_and_logs() {
        let mut rig = TestRig::new();
        rig.settings.show_state_transitions = true;
        rig.overlays.push(Overlay::MoveCursor {
            position: Vec2::ZERO,
        });

        let mut manager = ToolManager::new();
        manager.init();
        manager.set_tool(&mut rig.context(), true, ToolId::Cursor);

        assert!(rig.overlays.is_empty());
        assert_eq!(
            rig.status.lines_tagged(TRANSITION_TAG).collect::<Vec<_>>(),
            vec!["Mod: Cursor"]
        );
    }

    #[test]
    fn test_scale_tool_forces_local_space() {
        let mut rig = TestRig::new();
        let mut manager = ToolManager::new();
        manager.init();

        manager.set_tool(&mut rig.context(), true, ToolId::Scale);
        assert_eq!(rig.settings.transform_space, TransformSpace::Local);

        manager.set_tool(&mut rig.context(), true, ToolId::Select);
        assert_eq!(rig.settings.transform_space, TransformSpace::World);
    }

    #[test]
    fn test_select_tool_click_selects_and_returns() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut manager = ToolManager::new();
        manager.init();
        manager.set_tool(&mut rig.context(), true, ToolId::Select);

        click(&mut manager, &mut rig, Vec2::new(400.0, 300.0));
        assert_eq!(rig.scene.selection(), &[cube]);
        assert_eq!(manager.active_state(), Some(StateType::BeginPick));

        // Clicking empty space keeps the selection.
        click(&mut manager, &mut rig, Vec2::new(10.0, 10.0));
        assert_eq!(rig.scene.selection(), &[cube]);
    }

    #[test]
    fn test_select_tool_click_on_billboard_selects_owner() {
        let mut rig = TestRig::new();
        let light = rig.scene.add_entity(
            Entity::new("light", EntityKind::Light).with_translation(Vec3::new(5.0, 0.0, 0.0)),
        );
        let icon = rig.scene.add_entity(Entity::new(
            "light_icon",
            EntityKind::Billboard { target: Some(light) },
        ));
        let mut manager = ToolManager::new();
        manager.init();
        manager.set_tool(&mut rig.context(), true, ToolId::Select);

        click(&mut manager, &mut rig, Vec2::new(400.0, 300.0));
        assert_eq!(rig.scene.selection(), &[light]);
        assert!(!rig.scene.is_selected(icon));
    }

    #[test]
    fn test_cursor_tool_places_cursor() {
        let mut rig = TestRig::new();
        rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut manager = ToolManager::new();
        manager.init();
        manager.set_tool(&mut rig.context(), true, ToolId::Cursor);

        click(&mut manager, &mut rig, Vec2::new(400.0, 300.0));
        assert!((rig.cursor.z - 0.5).abs() < 1e-4);
        assert!(rig.scene.selection().is_empty());
        assert_eq!(manager.active_state(), Some(StateType::BeginPick));
    }

    #[test]
    fn test_transform_tool_click_off_handle_selects() {
        let mut rig = TestRig::new();
        let cube = rig.scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        let mut manager = ToolManager::new();
        manager.init();
        manager.set_tool(&mut rig.context(), true, ToolId::Move);

        click(&mut manager, &mut rig, Vec2::new(400.0, 300.0));
        assert_eq!(rig.scene.selection(), &[cube]);
        assert_eq!(manager.active_state(), Some(StateType::TransformBegin));
        assert!(manager.gizmo().is_some());
    }
}
