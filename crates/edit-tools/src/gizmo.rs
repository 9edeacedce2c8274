//! Transform handle: pose, axis locks and hit-testing
//!
//! Only the interaction side of the handle lives here. Drawing it is up to
//! the host, which reads the pose fields every frame.

use edit_core::{Plane, Ray, Scene, Viewport, ray_segment_distance, transform_axes};
use glam::Vec3;

use crate::config::TransformSpace;

/// On-screen length of a handle arm in pixels
pub const HANDLE_SCREEN_SIZE: f32 = 100.0;

/// Axes closer than this (cos 5 degrees) to the view direction are locked
pub const AXIS_LOCK_THRESHOLD: f32 = 0.996_194_7;

/// Planes whose normal is closer than this (cos 85 degrees) to perpendicular
/// to the view direction are locked
pub const PLANE_LOCK_THRESHOLD: f32 = 0.087_155_74;

// Hit shapes, as fractions of the handle scale.
const AXIS_PICK_RADIUS: f32 = 0.1;
const PLANE_QUAD_MIN: f32 = 0.25;
const PLANE_QUAD_MAX: f32 = 0.5;
const CENTER_HALF_SIZE: f32 = 0.1;
const RING_TOLERANCE: f32 = 0.08;

/// Grabbable part of the handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisLabel {
    X,
    Y,
    Z,
    YZ,
    ZX,
    XY,
    XYZ,
}

impl AxisLabel {
    pub const ALL: [AxisLabel; 7] = [
        AxisLabel::X,
        AxisLabel::Y,
        AxisLabel::Z,
        AxisLabel::YZ,
        AxisLabel::ZX,
        AxisLabel::XY,
        AxisLabel::XYZ,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Anything that is not a single axis
    pub fn is_plane(self) -> bool {
        self.index() > 2
    }

    /// Axis index normal to the plane (or the axis itself for single axes)
    pub fn normal_index(self) -> usize {
        self.index() % 3
    }

    /// Component mask of the axes this part drives
    pub fn mask(self) -> Vec3 {
        match self {
            AxisLabel::X => Vec3::X,
            AxisLabel::Y => Vec3::Y,
            AxisLabel::Z => Vec3::Z,
            AxisLabel::YZ => Vec3::new(0.0, 1.0, 1.0),
            AxisLabel::ZX => Vec3::new(1.0, 0.0, 1.0),
            AxisLabel::XY => Vec3::new(1.0, 1.0, 0.0),
            AxisLabel::XYZ => Vec3::ONE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AxisLabel::X => "X",
            AxisLabel::Y => "Y",
            AxisLabel::Z => "Z",
            AxisLabel::YZ => "YZ",
            AxisLabel::ZX => "ZX",
            AxisLabel::XY => "XY",
            AxisLabel::XYZ => "XYZ",
        }
    }
}

/// Which transform the handle performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoKind {
    Move,
    Rotate,
    Scale,
}

impl GizmoKind {
    pub fn name(self) -> &'static str {
        match self {
            GizmoKind::Move => "Move",
            GizmoKind::Rotate => "Rotate",
            GizmoKind::Scale => "Scale",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Gizmo {
    pub kind: GizmoKind,
    /// False while nothing is selected
    pub visible: bool,
    pub world_location: Vec3,
    /// Handle axes in world space
    pub normal_vectors: [Vec3; 3],
    /// World length of a handle arm
    pub handle_scale: f32,
    /// Grab position (rotation: unit direction from the pivot)
    pub grab_point: Vec3,
    /// Grab position when the drag started
    pub initial_point: Vec3,
    pub grabbed: Option<AxisLabel>,
    pub last_hovered: Option<AxisLabel>,
    locked: [bool; 7],
}

impl Gizmo {
    pub fn new(kind: GizmoKind) -> Self {
        Self {
            kind,
            visible: false,
            world_location: Vec3::ZERO,
            normal_vectors: [Vec3::X, Vec3::Y, Vec3::Z],
            handle_scale: 1.0,
            grab_point: Vec3::ZERO,
            initial_point: Vec3::ZERO,
            grabbed: None,
            last_hovered: None,
            locked: [false; 7],
        }
    }

    /// Follow the primary selection. Returns false when nothing is selected.
    pub fn update_pose(&mut self, scene: &Scene, space: TransformSpace) -> bool {
        let Some(world) = scene.current_selection().and_then(|id| scene.world_matrix(id)) else {
            self.visible = false;
            return false;
        };

        self.visible = true;
        self.world_location = world.w_axis.truncate();
        self.normal_vectors = match space {
            TransformSpace::World => [Vec3::X, Vec3::Y, Vec3::Z],
            TransformSpace::Local => {
                let axes = transform_axes(&world);
                [axes.x_axis, axes.y_axis, axes.z_axis]
            }
        };
        true
    }

    /// Keep a constant on-screen size in `viewport`
    pub fn look_at(&mut self, viewport: &Viewport) {
        self.handle_scale =
            viewport.world_units_per_pixel(self.world_location) * HANDLE_SCREEN_SIZE;
    }

    /// Direction from the eye towards the handle
    pub fn view_direction(&self, viewport: &Viewport) -> Vec3 {
        let camera = &viewport.camera;
        if camera.is_orthographic() {
            camera.forward()
        } else {
            (self.world_location - camera.position).normalize_or(camera.forward())
        }
    }

    /// Lock parts seen edge-on. Rotation rings are never locked.
    pub fn update_locks(&mut self, view_dir: Vec3) {
        self.locked = [false; 7];
        if self.kind == GizmoKind::Rotate {
            return;
        }
        for axis in AxisLabel::ALL {
            let alignment = view_dir.dot(self.normal_vectors[axis.normal_index()]).abs();
            self.locked[axis.index()] = match axis {
                AxisLabel::X | AxisLabel::Y | AxisLabel::Z => alignment > AXIS_LOCK_THRESHOLD,
                AxisLabel::YZ | AxisLabel::ZX | AxisLabel::XY => alignment < PLANE_LOCK_THRESHOLD,
                AxisLabel::XYZ => false,
            };
        }
    }

    pub fn is_locked(&self, axis: AxisLabel) -> bool {
        self.locked[axis.index()]
    }

    pub fn axis_direction(&self, axis: AxisLabel) -> Vec3 {
        self.normal_vectors[axis.normal_index()]
    }

    pub fn grab(&mut self, axis: AxisLabel) {
        self.grabbed = Some(axis);
    }

    pub fn release(&mut self) {
        self.grabbed = None;
    }

    /// Nearest unlocked part under the ray
    pub fn hit_test(&self, ray: &Ray) -> Option<AxisLabel> {
        if !self.visible {
            return None;
        }

        let hits = match self.kind {
            GizmoKind::Rotate => self.hit_rings(ray),
            GizmoKind::Move | GizmoKind::Scale => self.hit_arms(ray),
        };

        hits.into_iter()
            .filter(|(axis, _)| !self.is_locked(*axis))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(axis, _)| axis)
    }

    fn hit_arms(&self, ray: &Ray) -> Vec<(AxisLabel, f32)> {
        let s = self.handle_scale;
        let origin = self.world_location;
        let mut hits = Vec::new();

        for axis in [AxisLabel::X, AxisLabel::Y, AxisLabel::Z] {
            let tip = origin + self.axis_direction(axis) * s;
            let (distance, t) = ray_segment_distance(ray, origin, tip);
            if distance < AXIS_PICK_RADIUS * s {
                hits.push((axis, t));
            }
        }

        for axis in [AxisLabel::YZ, AxisLabel::ZX, AxisLabel::XY] {
            let k = axis.normal_index();
            let u_dir = self.normal_vectors[(k + 1) % 3];
            let v_dir = self.normal_vectors[(k + 2) % 3];
            let plane = Plane::from_point_normal(origin, self.normal_vectors[k]);
            let Some(t) = plane.intersect_ray(ray).filter(|t| *t >= 0.0) else {
                continue;
            };
            let local = ray.point_at(t) - origin;
            let (u, v) = (local.dot(u_dir), local.dot(v_dir));
            let range = PLANE_QUAD_MIN * s..=PLANE_QUAD_MAX * s;
            if range.contains(&u) && range.contains(&v) {
                hits.push((axis, t));
            }
        }

        let center = edit_core::BoundingBox::new(
            origin - Vec3::splat(CENTER_HALF_SIZE * s),
            origin + Vec3::splat(CENTER_HALF_SIZE * s),
        );
        if let Some(t) = center.intersect_ray(ray) {
            hits.push((AxisLabel::XYZ, t));
        }

        hits
    }

    fn hit_rings(&self, ray: &Ray) -> Vec<(AxisLabel, f32)> {
        let s = self.handle_scale;
        [AxisLabel::X, AxisLabel::Y, AxisLabel::Z]
            .into_iter()
            .filter_map(|axis| {
                let plane = Plane::from_point_normal(self.world_location, self.axis_direction(axis));
                let t = plane.intersect_ray(ray).filter(|t| *t >= 0.0)?;
                let radius = ray.point_at(t).distance(self.world_location);
                ((radius - s).abs() < RING_TOLERANCE * s).then_some((axis, t))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edit_core::{Camera, Entity, EntityKind, ViewportKind};
    use glam::{Quat, Vec2};

    fn front_viewport() -> Viewport {
        Viewport::new(
            "Scene",
            ViewportKind::Scene3d,
            Camera::perspective(60.0).with_position(Vec3::new(0.0, 0.0, 10.0)),
            Vec2::new(800.0, 600.0),
        )
    }

    fn posed(kind: GizmoKind) -> Gizmo {
        let mut scene = Scene::new();
        let id = scene.add_entity(Entity::new("cube", EntityKind::Mesh));
        scene.add_to_selection(id, false);

        let mut gizmo = Gizmo::new(kind);
        assert!(gizmo.update_pose(&scene, TransformSpace::World));
        gizmo.handle_scale = 2.0;
        gizmo
    }

    #[test]
    fn test_axis_label_indices() {
        assert_eq!(AxisLabel::XY.normal_index(), 2);
        assert_eq!(AxisLabel::YZ.normal_index(), 0);
        assert_eq!(AxisLabel::ZX.normal_index(), 1);
        assert!(AxisLabel::XYZ.is_plane());
        assert!(!AxisLabel::Z.is_plane());
    }

    #[test]
    fn test_pose_follows_local_axes() {
        let mut scene = Scene::new();
        let mut entity = Entity::new("cube", EntityKind::Mesh);
        entity.local.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let id = scene.add_entity(entity);
        scene.add_to_selection(id, false);

        let mut gizmo = Gizmo::new(GizmoKind::Move);
        gizmo.update_pose(&scene, TransformSpace::Local);
        assert!((gizmo.normal_vectors[0] - Vec3::Y).length() < 1e-5);

        gizmo.update_pose(&scene, TransformSpace::World);
        assert_eq!(gizmo.normal_vectors[0], Vec3::X);
    }

    #[test]
    fn test_pose_hidden_without_selection() {
        let mut gizmo = Gizmo::new(GizmoKind::Move);
        assert!(!gizmo.update_pose(&Scene::new(), TransformSpace::World));
        assert!(!gizmo.visible);
        assert!(gizmo.hit_test(&Ray::new(Vec3::Z, -Vec3::Z)).is_none());
    }

    #[test]
    fn test_edge_on_parts_are_locked() {
        let mut gizmo = posed(GizmoKind::Move);
        gizmo.update_locks(-Vec3::Z);
        assert!(gizmo.is_locked(AxisLabel::Z));
        assert!(!gizmo.is_locked(AxisLabel::X));
        assert!(gizmo.is_locked(AxisLabel::YZ));
        assert!(!gizmo.is_locked(AxisLabel::XY));
        assert!(!gizmo.is_locked(AxisLabel::XYZ));

        let mut rotate = posed(GizmoKind::Rotate);
        rotate.update_locks(-Vec3::Z);
        assert!(!rotate.is_locked(AxisLabel::Z));
    }

    #[test]
    fn test_hit_test_arms_and_planes() {
        let gizmo = posed(GizmoKind::Move);
        let down = |x: f32, y: f32| Ray::new(Vec3::new(x, y, 10.0), -Vec3::Z);

        assert_eq!(gizmo.hit_test(&down(1.2, 0.0)), Some(AxisLabel::X));
        assert_eq!(gizmo.hit_test(&down(0.0, 1.5)), Some(AxisLabel::Y));
        assert_eq!(gizmo.hit_test(&down(0.75, 0.75)), Some(AxisLabel::XY));
        assert_eq!(gizmo.hit_test(&down(0.0, 0.0)), Some(AxisLabel::XYZ));
        assert_eq!(gizmo.hit_test(&down(3.0, 3.0)), None);
    }

    #[test]
    fn test_locked_parts_are_not_hit() {
        let mut gizmo = posed(GizmoKind::Move);
        let ray = Ray::new(Vec3::new(1.2, 0.0, 10.0), -Vec3::Z);
        assert_eq!(gizmo.hit_test(&ray), Some(AxisLabel::X));

        gizmo.update_locks(-Vec3::X);
        assert!(gizmo.is_locked(AxisLabel::X));
        assert_eq!(gizmo.hit_test(&ray), None);
    }

    #[test]
    fn test_hit_test_rings() {
        let gizmo = posed(GizmoKind::Rotate);
        let ray = Ray::new(Vec3::new(2.0, 0.0, 10.0), -Vec3::Z);
        assert_eq!(gizmo.hit_test(&ray), Some(AxisLabel::Z));

        let inside = Ray::new(Vec3::new(1.0, 0.0, 10.0), -Vec3::Z);
        assert_eq!(gizmo.hit_test(&inside), None);
    }

    #[test]
    fn test_look_at_keeps_screen_size() {
        let viewport = front_viewport();
        let mut gizmo = posed(GizmoKind::Move);
        gizmo.look_at(&viewport);
        let near = gizmo.handle_scale;

        gizmo.world_location = Vec3::new(0.0, 0.0, -10.0);
        gizmo.look_at(&viewport);
        assert!((gizmo.handle_scale / near - 2.0).abs() < 1e-4);
    }
}
