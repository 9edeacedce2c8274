//! Tool states
//!
//! Three families share context through the [`State`](crate::fsm::State)
//! capability accessors:
//! - picking: single pick, box pick, end pick, delete and duplicate
//! - transform: begin, to and end of a handle drag
//! - anchor: begin, to and end of an anchor handle drag

mod anchor;
mod picking;
mod transform;

pub use anchor::{AnchorBegin, AnchorContext, AnchorEnd, AnchorTo};
pub use picking::{BeginBoxPick, BeginPick, DeletePick, Duplicate, EndPick, PickingContext};
pub use transform::{
    ROTATION_DEGREES_PER_UNIT, TransformBegin, TransformContext, TransformEnd, TransformTo,
};
