//! Viewport camera

use glam::{Mat4, Quat, Vec3};

/// Camera projection
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians
    Perspective { fov_y: f32 },
    /// Height of the view volume in world units
    Orthographic { height: f32 },
}

/// Camera pose and projection. Looks down its local -Z axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(45.0)
    }
}

impl Camera {
    pub fn perspective(fov_y_degrees: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            orientation: Quat::IDENTITY,
            projection: Projection::Perspective {
                fov_y: fov_y_degrees.to_radians(),
            },
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn orthographic(height: f32) -> Self {
        Self {
            projection: Projection::Orthographic { height },
            ..Self::perspective(45.0)
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Orient the camera towards `target`
    pub fn looking_at(mut self, target: Vec3, up: Vec3) -> Self {
        let view = Mat4::look_at_rh(self.position, target, up);
        let (_, rotation, _) = view.inverse().to_scale_rotation_translation();
        self.orientation = rotation.normalize();
        self
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn up(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation, self.position).inverse()
    }

    /// Projection with a 0..1 depth range
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov_y } => {
                Mat4::perspective_rh(fov_y, aspect, self.near, self.far)
            }
            Projection::Orthographic { height } => {
                let half_h = height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, self.near, self.far)
            }
        }
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// World units covered by the full view height at the depth of `point`
    pub fn view_height_at(&self, point: Vec3) -> f32 {
        match self.projection {
            Projection::Perspective { fov_y } => {
                let depth = (point - self.position).dot(self.forward()).max(self.near);
                2.0 * depth * (fov_y * 0.5).tan()
            }
            Projection::Orthographic { height } => height,
        }
    }
}
