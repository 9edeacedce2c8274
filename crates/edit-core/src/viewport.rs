//! Viewports: a camera plus the screen area it renders into
//!
//! Screen positions are in pixels relative to the viewport's top-left
//! corner, with y growing downwards.

use glam::{Vec2, Vec3, Vec4Swizzles};

use crate::camera::Camera;
use crate::geometry::Ray;

/// What a viewport shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportKind {
    /// Free 3D scene view
    Scene3d,
    /// Orthographic view of the 2D canvas layer
    Layout2d,
}

#[derive(Debug, Clone)]
pub struct Viewport {
    pub name: String,
    pub kind: ViewportKind,
    pub camera: Camera,
    /// Size of the content area in pixels
    pub size: Vec2,
    /// Top-left of the content area in global pointer coordinates
    pub content_origin: Vec2,
    mouse_pos: Vec2,
}

impl Viewport {
    pub fn new(name: impl Into<String>, kind: ViewportKind, camera: Camera, size: Vec2) -> Self {
        Self {
            name: name.into(),
            kind,
            camera,
            size,
            content_origin: Vec2::ZERO,
            mouse_pos: Vec2::ZERO,
        }
    }

    pub fn is_2d(&self) -> bool {
        self.kind == ViewportKind::Layout2d
    }

    pub fn aspect(&self) -> f32 {
        if self.size.y > 0.0 {
            self.size.x / self.size.y
        } else {
            1.0
        }
    }

    /// Last pointer position inside this viewport
    pub fn last_mouse_pos(&self) -> Vec2 {
        self.mouse_pos
    }

    pub fn set_last_mouse_pos(&mut self, pos: Vec2) {
        self.mouse_pos = pos;
    }

    /// Clamp a screen position to the content area
    pub fn clamp_to_content(&self, pos: Vec2) -> Vec2 {
        pos.clamp(Vec2::ZERO, self.size.max(Vec2::ZERO))
    }

    fn to_ndc(&self, screen: Vec2) -> Vec2 {
        let size = self.size.max(Vec2::ONE);
        Vec2::new(2.0 * screen.x / size.x - 1.0, 1.0 - 2.0 * screen.y / size.y)
    }

    /// Ray from the near plane through a screen position
    pub fn ray_from_screen_point(&self, screen: Vec2) -> Ray {
        let ndc = self.to_ndc(screen);
        let inv = self.camera.view_projection(self.aspect()).inverse();
        let near = inv.project_point3(ndc.extend(0.0));
        let far = inv.project_point3(ndc.extend(1.0));
        Ray::new(near, far - near)
    }

    /// Ray under the last recorded pointer position
    pub fn ray_from_mouse(&self) -> Ray {
        self.ray_from_screen_point(self.mouse_pos)
    }

    /// Point on the near plane under a screen position
    pub fn screen_to_world(&self, screen: Vec2) -> Vec3 {
        let ndc = self.to_ndc(screen);
        let inv = self.camera.view_projection(self.aspect()).inverse();
        inv.project_point3(ndc.extend(0.0))
    }

    /// Screen position of a world point, `None` when behind the camera
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.camera.view_projection(self.aspect()) * point.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.size.x,
            (1.0 - ndc.y) * 0.5 * self.size.y,
        ))
    }

    /// World units spanned by one pixel at the depth of `point`
    pub fn world_units_per_pixel(&self, point: Vec3) -> f32 {
        self.camera.view_height_at(point) / self.size.y.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn viewport() -> Viewport {
        Viewport::new(
            "Scene",
            ViewportKind::Scene3d,
            Camera::perspective(60.0),
            Vec2::new(800.0, 600.0),
        )
    }

    #[test]
    fn test_center_ray_follows_camera_forward() {
        let vp = viewport();
        let ray = vp.ray_from_screen_point(Vec2::new(400.0, 300.0));
        assert_relative_eq!(ray.direction.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(ray.origin.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_world_to_screen_inverts_ray() {
        let vp = viewport();
        let screen = Vec2::new(610.0, 140.0);
        let ray = vp.ray_from_screen_point(screen);
        let back = vp.world_to_screen(ray.point_at(7.0)).unwrap();
        assert_relative_eq!(back.x, screen.x, epsilon = 1e-2);
        assert_relative_eq!(back.y, screen.y, epsilon = 1e-2);
    }

    #[test]
    fn test_point_behind_camera_has_no_screen_position() {
        let vp = viewport();
        assert!(vp.world_to_screen(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn test_orthographic_rays_are_parallel() {
        let vp = Viewport::new(
            "Layout",
            ViewportKind::Layout2d,
            Camera::orthographic(10.0),
            Vec2::new(400.0, 400.0),
        );
        let a = vp.ray_from_screen_point(Vec2::new(0.0, 0.0));
        let b = vp.ray_from_screen_point(Vec2::new(400.0, 400.0));
        assert_relative_eq!(a.direction.dot(b.direction), 1.0, epsilon = 1e-5);
        assert_relative_eq!(b.origin.x - a.origin.x, 10.0, epsilon = 1e-4);
    }
}
