//! Ray intersection helpers for pointer picking

use glam::Vec3;

/// Denominators smaller than this are treated as a ray parallel to a plane
const PARALLEL_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Direction, not required to be unit length
    pub dir: Vec3,
}

/// Where a ray met a sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereHit {
    pub t: f32,
    pub point: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Same ray expressed relative to `origin`
    pub fn relative_to(&self, origin: Vec3) -> Self {
        Self {
            origin: self.origin - origin,
            dir: self.dir,
        }
    }

    /// Nearest positive intersection with a sphere
    pub fn hit_sphere(&self, center: Vec3, radius: f32) -> Option<SphereHit> {
        let offset = self.origin - center;
        let a = self.dir.dot(self.dir);
        let b = 2.0 * self.dir.dot(offset);
        let c = offset.dot(offset) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant <= 0.0 || a == 0.0 {
            return None;
        }
        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        (t > 0.0).then(|| SphereHit {
            t,
            point: self.at(t),
        })
    }

    /// Intersection with the plane through `point` with normal `normal`.
    /// `None` when the ray runs parallel to the plane.
    pub fn hit_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = normal.dot(self.dir);
        if denom.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = -normal.dot(self.origin - point) / denom;
        Some(self.at(t))
    }

    /// Forward intersection with the horizontal plane `y = height`
    pub fn hit_horizontal(&self, height: f32) -> Option<Vec3> {
        if self.dir.y.abs() < PARALLEL_EPSILON {
            return None;
        }
        let t = (height - self.origin.y) / self.dir.y;
        (t > 0.0).then(|| self.at(t))
    }
}
