//! Scene Editor Core
//!
//! Scene-side services consumed by the interactive editing tools:
//! - Entity: scene objects, kinds, local transforms and anchor ratios
//! - Scene: hierarchy, world transforms, selection, copy and subtree removal
//! - Geometry: rays, planes, bounding boxes and six-plane frustums
//! - Picking: ray and frustum picks with billboard resolution
//! - Camera / Viewport: projections and screen-space conversions

pub mod camera;
pub mod entity;
pub mod geometry;
pub mod picking;
pub mod scene;
pub mod viewport;

pub use camera::*;
pub use entity::*;
pub use geometry::*;
pub use picking::*;
pub use scene::*;
pub use viewport::*;
