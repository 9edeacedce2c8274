//! Scene entity definitions

use glam::{Mat3, Mat4, Quat, Vec3};
use uuid::Uuid;

use crate::geometry::BoundingBox;

/// What an entity is, as far as the editor core cares
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntityKind {
    /// Plain 3D object
    Mesh,
    /// Aggregate that expands its own children when copied or deleted
    Prefab,
    /// 2D canvas panel hosting surfaces
    Canvas,
    /// 2D UI element, anchored inside its parent canvas
    Surface { anchor: AnchorRatios },
    /// Light source; usually picked through its billboard
    Light,
    /// Camera object placed in the scene
    Camera,
    /// Screen-facing proxy standing in for another entity
    Billboard { target: Option<Uuid> },
    /// Ground grid and other editor scaffolding
    Grid,
}

impl EntityKind {
    /// Entities that only live in 2D views
    pub fn is_2d(&self) -> bool {
        matches!(self, EntityKind::Surface { .. } | EntityKind::Canvas)
    }

    pub fn is_prefab(&self) -> bool {
        matches!(self, EntityKind::Prefab)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Mesh => "Mesh",
            EntityKind::Prefab => "Prefab",
            EntityKind::Canvas => "Canvas",
            EntityKind::Surface { .. } => "Surface",
            EntityKind::Light => "Light",
            EntityKind::Camera => "Camera",
            EntityKind::Billboard { .. } => "Billboard",
            EntityKind::Grid => "Grid",
        }
    }
}

/// Anchor ratios of a surface inside its canvas.
///
/// Each value is a fraction of the canvas extent measured inward from the
/// named edge; `left + right <= 1` and `top + bottom <= 1` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorRatios {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Default for AnchorRatios {
    fn default() -> Self {
        // Centered, non-stretching anchor.
        Self {
            left: 0.5,
            right: 0.5,
            top: 0.5,
            bottom: 0.5,
        }
    }
}

impl AnchorRatios {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        let mut ratios = Self {
            left,
            right,
            top,
            bottom,
        };
        ratios.clamp();
        ratios
    }

    /// Keep ratios inside the canvas and prevent opposite edges from crossing
    pub fn clamp(&mut self) {
        self.left = self.left.clamp(0.0, 1.0);
        self.right = self.right.clamp(0.0, 1.0 - self.left);
        self.top = self.top.clamp(0.0, 1.0);
        self.bottom = self.bottom.clamp(0.0, 1.0 - self.top);
    }

    /// Whether the anchor spans some horizontal extent of the canvas
    pub fn stretches_horizontally(&self) -> bool {
        self.left + self.right < 0.99
    }

    /// Whether the anchor spans some vertical extent of the canvas
    pub fn stretches_vertically(&self) -> bool {
        self.top + self.bottom < 0.99
    }
}

/// Local transform relative to the parent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn is_finite(&self) -> bool {
        self.translation.is_finite() && self.rotation.is_finite() && self.scale.is_finite()
    }

    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation: rotation.normalize(),
            scale,
        }
    }
}

/// An object in the editor scene
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    pub kind: EntityKind,
    /// Transform relative to `parent`
    pub local: Transform,
    /// Bounds in object space
    pub local_bounds: BoundingBox,
    /// Locked entities refuse interactive transforms
    pub transform_locked: bool,
    pub parent: Option<Uuid>,
    pub children: Vec<Uuid>,
}

impl Entity {
    /// Create a new unit-sized entity at the origin
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            local: Transform::IDENTITY,
            local_bounds: BoundingBox::default(),
            transform_locked: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.local.translation = translation;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundingBox) -> Self {
        self.local_bounds = bounds;
        self
    }

    pub fn with_transform_lock(mut self, locked: bool) -> Self {
        self.transform_locked = locked;
        self
    }

    /// Billboard target, if this entity is a proxy bound to another entity
    pub fn billboard_target(&self) -> Option<Uuid> {
        match self.kind {
            EntityKind::Billboard { target } => target,
            _ => None,
        }
    }

    pub fn anchor(&self) -> Option<&AnchorRatios> {
        match &self.kind {
            EntityKind::Surface { anchor } => Some(anchor),
            _ => None,
        }
    }

    pub fn anchor_mut(&mut self) -> Option<&mut AnchorRatios> {
        match &mut self.kind {
            EntityKind::Surface { anchor } => Some(anchor),
            _ => None,
        }
    }
}

/// Orthonormal axes of a world matrix as columns
pub fn transform_axes(world: &Mat4) -> Mat3 {
    let (_, rotation, _) = world.to_scale_rotation_translation();
    Mat3::from_quat(rotation.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_clamp_keeps_edges_apart() {
        let ratios = AnchorRatios::new(0.8, 0.6, -0.2, 0.4);
        assert_eq!(ratios.left, 0.8);
        assert!((ratios.right - 0.2).abs() < 1e-6);
        assert_eq!(ratios.top, 0.0);
        assert_eq!(ratios.bottom, 0.4);
        assert!(ratios.stretches_vertically());
        assert!(!ratios.stretches_horizontally());
    }

    #[test]
    fn test_transform_matrix_roundtrip() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::new(2.0, 1.0, 1.0),
        };
        let back = Transform::from_mat4(&transform.to_mat4());
        assert!((back.translation - transform.translation).length() < 1e-5);
        assert!((back.scale - transform.scale).length() < 1e-5);
        assert!(back.rotation.angle_between(transform.rotation) < 1e-4);
    }
}
