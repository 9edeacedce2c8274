//! Finite state machine engine.
//!
//! A [`StateMachine`] owns one long-lived instance of every state it can be
//! in and tracks which one is current. States are not recreated on
//! transitions; instead the outgoing state hands its in-flight context (pick
//! lists, mouse samples, handle, intersection plane) to the incoming one
//! through [`State::transition_out`] and [`State::transition_in`].

use std::collections::HashMap;

use crate::context::EditorContext;
use crate::signal::Signal;
use crate::states::{AnchorContext, PickingContext, TransformContext};
use crate::status::TRANSITION_TAG;

/// Identity of a state inside a machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateType {
    BeginPick,
    BeginBoxPick,
    EndPick,
    DeletePick,
    Duplicate,
    TransformBegin,
    TransformTo,
    TransformEnd,
    AnchorBegin,
    AnchorTo,
    AnchorEnd,
}

impl StateType {
    pub fn name(&self) -> &'static str {
        match self {
            StateType::BeginPick => "BeginPick",
            StateType::BeginBoxPick => "BeginBoxPick",
            StateType::EndPick => "EndPick",
            StateType::DeletePick => "DeletePick",
            StateType::Duplicate => "Duplicate",
            StateType::TransformBegin => "TransformBegin",
            StateType::TransformTo => "TransformTo",
            StateType::TransformEnd => "TransformEnd",
            StateType::AnchorBegin => "AnchorBegin",
            StateType::AnchorTo => "AnchorTo",
            StateType::AnchorEnd => "AnchorEnd",
        }
    }
}

impl std::fmt::Display for StateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A unit of behavior inside a [`StateMachine`].
///
/// States sharing a family context expose it through the capability
/// accessors (`picking`, `transform`, `anchor`) so their neighbours can copy
/// it across a transition without knowing the concrete type.
pub trait State {
    fn state_type(&self) -> StateType;

    /// Per-frame work. A returned signal is routed through the machine
    /// exactly as if it had been dispatched from outside.
    fn update(&mut self, _ctx: &mut EditorContext, _dt: f32) -> Option<Signal> {
        None
    }

    /// Decide the next state for a signal not covered by the link table.
    /// `None` keeps the current state.
    fn signaled(&mut self, _ctx: &mut EditorContext, _signal: Signal) -> Option<StateType> {
        None
    }

    /// Called on the incoming state after the outgoing one handed off
    fn transition_in(&mut self, _ctx: &mut EditorContext, _previous: &mut dyn State) {}

    /// Called on the outgoing state before the incoming one takes over
    fn transition_out(&mut self, _ctx: &mut EditorContext, _next: &mut dyn State) {}

    fn picking(&self) -> Option<&PickingContext> {
        None
    }

    fn picking_mut(&mut self) -> Option<&mut PickingContext> {
        None
    }

    fn transform(&self) -> Option<&TransformContext> {
        None
    }

    fn transform_mut(&mut self) -> Option<&mut TransformContext> {
        None
    }

    fn anchor(&self) -> Option<&AnchorContext> {
        None
    }

    fn anchor_mut(&mut self) -> Option<&mut AnchorContext> {
        None
    }
}

/// Registry of states with a single current state.
///
/// The same state type can be wired differently per machine through
/// [`StateMachine::link`]; links are consulted before [`State::signaled`].
#[derive(Default)]
pub struct StateMachine {
    states: Vec<Box<dyn State>>,
    links: HashMap<(StateType, Signal), StateType>,
    current: Option<usize>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a state. Registering the same type twice is a programmer error.
    pub fn push_state(&mut self, state: Box<dyn State>) {
        let state_type = state.state_type();
        if self.index_of(state_type).is_some() {
            tracing::error!("State {} registered twice", state_type);
            debug_assert!(false, "state {} registered twice", state_type);
            return;
        }
        self.states.push(state);
    }

    /// Route `signal` received in state `from` to state `to`
    pub fn link(&mut self, from: StateType, signal: Signal, to: StateType) {
        self.links.insert((from, signal), to);
    }

    /// Make `state_type` current without running any transition hooks
    pub fn set_initial(&mut self, state_type: StateType) {
        match self.index_of(state_type) {
            Some(index) => self.current = Some(index),
            None => {
                tracing::error!("Initial state {} is not registered", state_type);
                debug_assert!(false, "initial state {} is not registered", state_type);
            }
        }
    }

    pub fn contains(&self, state_type: StateType) -> bool {
        self.index_of(state_type).is_some()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn index_of(&self, state_type: StateType) -> Option<usize> {
        self.states.iter().position(|s| s.state_type() == state_type)
    }

    pub fn current_type(&self) -> Option<StateType> {
        self.current.map(|i| self.states[i].state_type())
    }

    pub fn current_state(&self) -> Option<&dyn State> {
        self.current.map(|i| self.states[i].as_ref())
    }

    pub fn state(&self, state_type: StateType) -> Option<&dyn State> {
        self.index_of(state_type).map(|i| self.states[i].as_ref())
    }

    /// Run the current state's update, then any signal it raised
    pub fn update(&mut self, ctx: &mut EditorContext, dt: f32) {
        let Some(current) = self.current else {
            return;
        };
        if let Some(signal) = self.states[current].update(ctx, dt) {
            self.signal(ctx, signal);
        }
    }

    /// Deliver a signal to the current state and transition if it resolves
    /// to a different registered state.
    pub fn signal(&mut self, ctx: &mut EditorContext, signal: Signal) {
        let Some(current) = self.current else {
            return;
        };
        let current_type = self.states[current].state_type();

        let next_type = match self.links.get(&(current_type, signal)) {
            Some(linked) => Some(*linked),
            None => self.states[current].signaled(ctx, signal),
        };

        let Some(next_type) = next_type else {
            return;
        };
        if next_type == current_type {
            return;
        }

        let Some(next) = self.index_of(next_type) else {
            tracing::error!(
                "{} -> {} on {}: target state is not registered",
                current_type,
                next_type,
                signal
            );
            debug_assert!(false, "transition to unregistered state {}", next_type);
            return;
        };

        let (outgoing, incoming) = pair_mut(&mut self.states, current, next);
        outgoing.transition_out(ctx, incoming.as_mut());
        incoming.transition_in(ctx, outgoing.as_mut());
        self.current = Some(next);

        if ctx.settings.show_state_transitions {
            let line = format!("\t{} -> {}", current_type, next_type);
            tracing::debug!("{}", line);
            ctx.status.log(TRANSITION_TAG, line);
        }
    }
}

/// Two distinct mutable elements of a slice
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
