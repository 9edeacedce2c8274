//! Transient draw commands emitted by the tools
//!
//! The host drains these once per frame. They reference tool state, so they
//! are dropped whenever the active tool changes.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Overlay {
    /// Marquee rectangle in viewport pixels
    SelectionRect { min: Vec2, max: Vec2 },
    /// Drag cursor drawn in place of the hidden pointer, in viewport pixels
    MoveCursor { position: Vec2 },
}
