//! Geometry primitives used by picking and manipulation
//!
//! Rays, planes, axis-aligned boxes and six-plane frustums, plus the
//! intersection tests the editor needs.

use glam::{Mat4, Vec3};

/// Tolerance under which a ray is treated as parallel to a plane
pub const PARALLEL_EPSILON: f32 = 1e-6;

/// A half line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Plane in Hessian normal form: `normal.dot(p) + d == 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Default for Plane {
    fn default() -> Self {
        Self {
            normal: Vec3::Z,
            d: 0.0,
        }
    }
}

impl Plane {
    /// Plane through `point` with the given normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane through three points, normal follows the (b - a) x (c - a) winding
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let normal = (b - a).cross(c - a);
        Self::from_point_normal(a, normal)
    }

    /// Signed distance of a point to the plane
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }

    /// Same plane with the normal flipped
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            d: -self.d,
        }
    }

    /// Ray parameter of the intersection, if the ray is not parallel to the plane.
    ///
    /// Intersections behind the ray origin are reported too; the manipulation
    /// code relies on the unclamped parameter to keep drags continuous.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }

        let t = -(self.normal.dot(ray.origin) + self.d) / denom;
        if t.is_finite() { Some(t) } else { None }
    }

    /// World point where the ray meets the plane
    pub fn intersect_point(&self, ray: &Ray) -> Option<Vec3> {
        self.intersect_ray(ray).map(|t| ray.point_at(t))
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }
}

impl BoundingBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ]
    }

    /// World-space box enclosing this box after `transform`
    pub fn transformed(&self, transform: &Mat4) -> Self {
        let corners = self.corners().map(|c| transform.transform_point3(c));

        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            min = min.min(*corner);
            max = max.max(*corner);
        }

        Self { min, max }
    }

    /// Ray-AABB slab test, returning the distance to the first hit
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let inv_dir = ray.direction.recip();

        let t1 = (self.min - ray.origin) * inv_dir;
        let t2 = (self.max - ray.origin) * inv_dir;

        let tmin = t1.min(t2).max_element();
        let tmax = t1.max(t2).min_element();

        if tmax < 0.0 || tmin > tmax || tmin.is_nan() || tmax.is_nan() {
            return None;
        }

        Some(if tmin < 0.0 { tmax } else { tmin })
    }
}

/// Six planes with normals pointing into the enclosed volume.
///
/// Plane order: left, right, top, bottom, near, far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Build a frustum from a near rectangle and a far rectangle.
    ///
    /// Both rectangles list their corners in the same rotational order.
    /// Normals are oriented towards the centroid of the eight corners, so
    /// the winding of the input does not matter.
    pub fn from_corners(near: [Vec3; 4], far: [Vec3; 4]) -> Self {
        let centroid = (near.iter().sum::<Vec3>() + far.iter().sum::<Vec3>()) / 8.0;

        let inward = |a: Vec3, b: Vec3, c: Vec3| {
            let plane = Plane::from_points(a, b, c);
            if plane.signed_distance(centroid) < 0.0 {
                plane.flipped()
            } else {
                plane
            }
        };

        Self {
            planes: [
                inward(near[3], far[3], far[0]),
                inward(near[2], far[1], far[2]),
                inward(near[1], far[0], far[1]),
                inward(near[2], far[2], far[3]),
                inward(near[3], near[1], near[2]),
                inward(far[3], far[2], far[1]),
            ],
        }
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }

    /// Conservative box test: rejects only when every corner lies outside a single plane
    pub fn intersects_box(&self, bbox: &BoundingBox) -> bool {
        let corners = bbox.corners();
        for plane in &self.planes {
            if corners.iter().all(|c| plane.signed_distance(*c) < 0.0) {
                return false;
            }
        }
        true
    }
}

/// Distance between a ray and a segment along with the ray parameter of the closest point
pub fn ray_segment_distance(ray: &Ray, a: Vec3, b: Vec3) -> (f32, f32) {
    let seg = b - a;
    let w0 = ray.origin - a;

    let aa = ray.direction.dot(ray.direction);
    let bb = ray.direction.dot(seg);
    let cc = seg.dot(seg);
    let dd = ray.direction.dot(w0);
    let ee = seg.dot(w0);

    let denom = aa * cc - bb * bb;
    let parallel = denom.abs() < PARALLEL_EPSILON;
    let (mut t, mut s) = if parallel {
        (0.0, 0.0)
    } else {
        ((bb * ee - cc * dd) / denom, (aa * ee - bb * dd) / denom)
    };

    if parallel || !(0.0..=1.0).contains(&s) {
        s = s.clamp(0.0, 1.0);
        // Re-project onto the ray for the clamped segment point.
        t = (a + seg * s - ray.origin).dot(ray.direction) / aa;
    }
    t = t.max(0.0);

    let closest_ray = ray.point_at(t);
    let closest_seg = a + seg * s;
    (closest_ray.distance(closest_seg), t)
}
