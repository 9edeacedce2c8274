//! Anchor handle: layout and hit-testing of the nine anchor grips
//!
//! The grips sit on the anchor rectangle a surface keeps inside its parent
//! canvas. Like the transform handle, drawing is left to the host.

use edit_core::{AnchorRatios, BoundingBox, EntityKind, Ray, Scene, Viewport};
use glam::{Vec2, Vec3};
use uuid::Uuid;

/// On-screen size of a grip in pixels
pub const GRIP_PIXELS: f32 = 15.0;

/// Grab direction of an anchor grip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorDirection {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
    Center,
}

impl AnchorDirection {
    pub const ALL: [AnchorDirection; 9] = [
        AnchorDirection::N,
        AnchorDirection::S,
        AnchorDirection::E,
        AnchorDirection::W,
        AnchorDirection::NE,
        AnchorDirection::NW,
        AnchorDirection::SE,
        AnchorDirection::SW,
        AnchorDirection::Center,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnchorDirection::N => "N",
            AnchorDirection::S => "S",
            AnchorDirection::E => "E",
            AnchorDirection::W => "W",
            AnchorDirection::NE => "NE",
            AnchorDirection::NW => "NW",
            AnchorDirection::SE => "SE",
            AnchorDirection::SW => "SW",
            AnchorDirection::Center => "Center",
        }
    }

    /// Direction the grip is pushed out of the rectangle, in canvas XY
    fn outward(self) -> Vec2 {
        match self {
            AnchorDirection::N => Vec2::Y,
            AnchorDirection::S => Vec2::NEG_Y,
            AnchorDirection::E => Vec2::X,
            AnchorDirection::W => Vec2::NEG_X,
            AnchorDirection::NE => Vec2::new(1.0, 1.0).normalize(),
            AnchorDirection::NW => Vec2::new(-1.0, 1.0).normalize(),
            AnchorDirection::SE => Vec2::new(1.0, -1.0).normalize(),
            AnchorDirection::SW => Vec2::new(-1.0, -1.0).normalize(),
            AnchorDirection::Center => Vec2::ZERO,
        }
    }

    /// Whether this grip is shown for the given ratios.
    ///
    /// Corners are always shown. Edge grips disappear along a stretched
    /// dimension and the center grip only exists for a point anchor.
    pub fn is_shown(self, ratios: &AnchorRatios) -> bool {
        match self {
            AnchorDirection::NE | AnchorDirection::NW | AnchorDirection::SE | AnchorDirection::SW => {
                true
            }
            AnchorDirection::N | AnchorDirection::S => !ratios.stretches_horizontally(),
            AnchorDirection::E | AnchorDirection::W => !ratios.stretches_vertically(),
            AnchorDirection::Center => {
                !ratios.stretches_horizontally() && !ratios.stretches_vertically()
            }
        }
    }
}

/// Surface being anchored and its canvas, when the primary selection is a
/// surface parented to a canvas
pub fn anchored_surface(scene: &Scene) -> Option<(Uuid, Uuid)> {
    let surface = scene.current_selection()?;
    scene.get(surface)?.anchor()?;
    let canvas = scene.parent(surface)?;
    matches!(scene.get(canvas)?.kind, EntityKind::Canvas).then_some((surface, canvas))
}

/// New ratios after dragging `direction` by a world delta on a canvas of
/// the given size
pub fn drag_ratios(
    ratios: AnchorRatios,
    direction: AnchorDirection,
    delta: Vec3,
    width: f32,
    height: f32,
) -> AnchorRatios {
    let dx = if width > f32::EPSILON { delta.x / width } else { 0.0 };
    let dy = if height > f32::EPSILON { delta.y / height } else { 0.0 };
    let mut r = ratios;

    let (left, right, top, bottom) = match direction {
        AnchorDirection::N => (false, false, true, false),
        AnchorDirection::S => (false, false, false, true),
        AnchorDirection::E => (false, true, false, false),
        AnchorDirection::W => (true, false, false, false),
        AnchorDirection::NE => (false, true, true, false),
        AnchorDirection::NW => (true, false, true, false),
        AnchorDirection::SE => (false, true, false, true),
        AnchorDirection::SW => (true, false, false, true),
        AnchorDirection::Center => (true, true, true, true),
    };

    // Ratios are insets from each canvas edge, Y grows upwards.
    if left {
        r.left += dx;
    }
    if right {
        r.right -= dx;
    }
    if top {
        r.top -= dy;
    }
    if bottom {
        r.bottom += dy;
    }
    r.clamp();
    r
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorGrip {
    pub direction: AnchorDirection,
    /// Point on the anchor rectangle the grip is attached to
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnchorHandle {
    /// False while no anchored surface is selected
    pub visible: bool,
    pub canvas_bounds: BoundingBox,
    pub ratios: AnchorRatios,
    pub grips: Vec<AnchorGrip>,
    /// World size of one grip
    pub grip_size: f32,
    pub grab_point: Vec3,
    pub grabbed: Option<AnchorDirection>,
    pub last_hovered: Option<AnchorDirection>,
}

impl Default for AnchorHandle {
    fn default() -> Self {
        Self {
            visible: false,
            canvas_bounds: BoundingBox::default(),
            ratios: AnchorRatios::default(),
            grips: Vec::new(),
            grip_size: 1.0,
            grab_point: Vec3::ZERO,
            grabbed: None,
            last_hovered: None,
        }
    }
}

impl AnchorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay the grips out around the selected surface's anchor rectangle.
    /// Returns false when nothing anchorable is selected.
    pub fn update_pose(&mut self, scene: &Scene) -> bool {
        let layout = anchored_surface(scene).and_then(|(surface, canvas)| {
            let ratios = *scene.get(surface)?.anchor()?;
            let bounds = scene.world_bounds(canvas)?;
            Some((ratios, bounds))
        });
        let Some((ratios, bounds)) = layout else {
            self.visible = false;
            self.grips.clear();
            return false;
        };

        self.visible = true;
        self.ratios = ratios;
        self.canvas_bounds = bounds;

        let (w, h) = (bounds.width(), bounds.height());
        let z = bounds.center().z;
        let left = bounds.min.x + ratios.left * w;
        let right = bounds.max.x - ratios.right * w;
        let top = bounds.max.y - ratios.top * h;
        let bottom = bounds.min.y + ratios.bottom * h;
        let mid_x = (left + right) * 0.5;
        let mid_y = (top + bottom) * 0.5;

        self.grips = AnchorDirection::ALL
            .into_iter()
            .filter(|d| d.is_shown(&ratios))
            .map(|direction| {
                let (x, y) = match direction {
                    AnchorDirection::N => (mid_x, top),
                    AnchorDirection::S => (mid_x, bottom),
                    AnchorDirection::E => (right, mid_y),
                    AnchorDirection::W => (left, mid_y),
                    AnchorDirection::NE => (right, top),
                    AnchorDirection::NW => (left, top),
                    AnchorDirection::SE => (right, bottom),
                    AnchorDirection::SW => (left, bottom),
                    AnchorDirection::Center => (left, top),
                };
                AnchorGrip {
                    direction,
                    position: Vec3::new(x, y, z),
                }
            })
            .collect();
        true
    }

    /// Keep a constant on-screen grip size in `viewport`
    pub fn look_at(&mut self, viewport: &Viewport) {
        self.grip_size = viewport.world_units_per_pixel(self.canvas_bounds.center()) * GRIP_PIXELS;
    }

    /// World box a grip can be grabbed in
    pub fn grip_bounds(&self, grip: &AnchorGrip) -> BoundingBox {
        let center = grip.position + (grip.direction.outward() * self.grip_size).extend(0.0);
        let half = Vec3::splat(self.grip_size * 0.5);
        BoundingBox::new(center - half, center + half)
    }

    /// Nearest grip under the ray
    pub fn hit_test(&self, ray: &Ray) -> Option<AnchorDirection> {
        if !self.visible {
            return None;
        }
        self.grips
            .iter()
            .filter_map(|grip| {
                self.grip_bounds(grip)
                    .intersect_ray(ray)
                    .map(|t| (grip.direction, t))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(direction, _)| direction)
    }

    pub fn grab(&mut self, direction: AnchorDirection) {
        self.grabbed = Some(direction);
    }

    pub fn release(&mut self) {
        self.grabbed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use edit_core::Entity;

    fn canvas_scene(ratios: AnchorRatios) -> (Scene, Uuid) {
        let mut scene = Scene::new();
        let canvas = scene.add_entity(Entity::new("canvas", EntityKind::Canvas).with_bounds(
            BoundingBox::new(Vec3::new(-4.0, -3.0, 0.0), Vec3::new(4.0, 3.0, 0.0)),
        ));
        let mut surface = Entity::new("button", EntityKind::Surface { anchor: ratios });
        surface.parent = Some(canvas);
        let surface = scene.add_entity(surface);
        scene.add_to_selection(surface, false);
        (scene, surface)
    }

    fn shown(handle: &AnchorHandle) -> Vec<AnchorDirection> {
        handle.grips.iter().map(|g| g.direction).collect()
    }

    #[test]
    fn test_point_anchor_shows_every_grip() {
        let (scene, _) = canvas_scene(AnchorRatios::default());
        let mut handle = AnchorHandle::new();
        assert!(handle.update_pose(&scene));
        assert_eq!(handle.grips.len(), 9);

        let center = handle
            .grips
            .iter()
            .find(|g| g.direction == AnchorDirection::Center)
            .unwrap();
        assert_relative_eq!(center.position.x, 0.0);
        assert_relative_eq!(center.position.y, 0.0);
    }

    #[test]
    fn test_stretched_anchor_hides_grips() {
        let (scene, _) = canvas_scene(AnchorRatios::new(0.1, 0.1, 0.5, 0.5));
        let mut handle = AnchorHandle::new();
        handle.update_pose(&scene);

        let grips = shown(&handle);
        assert!(!grips.contains(&AnchorDirection::Center));
        assert!(!grips.contains(&AnchorDirection::N));
        assert!(grips.contains(&AnchorDirection::E));
        assert!(grips.contains(&AnchorDirection::SW));

        let ne = handle
            .grips
            .iter()
            .find(|g| g.direction == AnchorDirection::NE)
            .unwrap();
        assert_relative_eq!(ne.position.x, 4.0 - 0.8, epsilon = 1e-5);
    }

    #[test]
    fn test_hidden_without_canvas_parent() {
        let mut scene = Scene::new();
        let lone = scene.add_entity(Entity::new(
            "lone",
            EntityKind::Surface {
                anchor: AnchorRatios::default(),
            },
        ));
        scene.add_to_selection(lone, false);

        let mut handle = AnchorHandle::new();
        assert!(!handle.update_pose(&scene));
        assert!(handle.hit_test(&Ray::new(Vec3::Z, -Vec3::Z)).is_none());
    }

    #[test]
    fn test_hit_test_finds_grip() {
        let (scene, _) = canvas_scene(AnchorRatios::new(0.25, 0.25, 0.25, 0.25));
        let mut handle = AnchorHandle::new();
        handle.update_pose(&scene);
        handle.grip_size = 0.5;

        // NW corner at (-2, 1.5), pushed out along (-1, 1).
        let offset = Vec2::new(-1.0, 1.0).normalize() * 0.5;
        let ray = Ray::new(Vec3::new(-2.0 + offset.x, 1.5 + offset.y, 5.0), -Vec3::Z);
        assert_eq!(handle.hit_test(&ray), Some(AnchorDirection::NW));
        assert_eq!(handle.hit_test(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z)), None);
    }

    #[test]
    fn test_drag_maps_to_ratios() {
        let start = AnchorRatios::new(0.25, 0.25, 0.25, 0.25);

        let w = drag_ratios(start, AnchorDirection::W, Vec3::new(0.8, 0.0, 0.0), 8.0, 6.0);
        assert_relative_eq!(w.left, 0.35, epsilon = 1e-6);
        assert_relative_eq!(w.right, 0.25);

        let ne = drag_ratios(start, AnchorDirection::NE, Vec3::new(0.8, 0.6, 0.0), 8.0, 6.0);
        assert_relative_eq!(ne.right, 0.15, epsilon = 1e-6);
        assert_relative_eq!(ne.top, 0.15, epsilon = 1e-6);

        let moved = drag_ratios(start, AnchorDirection::Center, Vec3::new(0.0, -0.6, 0.0), 8.0, 6.0);
        assert_relative_eq!(moved.top, 0.35, epsilon = 1e-6);
        assert_relative_eq!(moved.bottom, 0.15, epsilon = 1e-6);

        let clamped = drag_ratios(start, AnchorDirection::W, Vec3::new(-8.0, 0.0, 0.0), 8.0, 6.0);
        assert_eq!(clamped.left, 0.0);
    }
}
