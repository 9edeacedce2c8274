//! Scene Editor Tools
//!
//! Interactive manipulation core of the editor: turns pointer and keyboard
//! signals into scene edits and keeps every edit reversible.
//! - Signal / FSM: signal vocabulary and the state machine engine
//! - States: picking, transform and anchor state families
//! - Tools: Select, Cursor, Move/Rotate/Scale and Anchor, on a tool stack
//! - Gizmo / AnchorHandle: handle poses and hit-testing
//! - Actions: bounded undo/redo history with action groups
//! - Editor: façade owning one of each service

pub mod actions;
pub mod anchor_handle;
pub mod config;
pub mod context;
pub mod editor;
pub mod fsm;
pub mod gizmo;
pub mod input;
pub mod overlay;
pub mod signal;
pub mod states;
pub mod status;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{
    Action, ActionGroup, ActionManager, AnchorAction, CreateAction, DeleteAction, TransformAction,
};
pub use anchor_handle::{AnchorDirection, AnchorHandle};
pub use config::{EditorSettings, TransformSpace};
pub use context::EditorContext;
pub use editor::Editor;
pub use fsm::{State, StateMachine, StateType};
pub use gizmo::{AxisLabel, Gizmo, GizmoKind};
pub use input::InputState;
pub use overlay::Overlay;
pub use signal::Signal;
pub use status::StatusLog;
pub use tools::{Tool, ToolId, ToolManager};
