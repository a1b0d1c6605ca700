//! Frustum culling of batch boxes.

pub use super::*;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum.
    pub normal: Vec3,
    pub constant: f32,
}

impl Plane {
    /// Normalizes the plane `a * x + b * y + c * z + d = 0`.
    #[inline]
    pub fn new(coefficients: Vec4) -> Self {
        let normal = coefficients.truncate();
        let length = normal.length();
        Self {
            normal: normal / length,
            constant: coefficients.w / length,
        }
    }

    /// Signed distance, positive inside.
    #[inline]
    pub fn distance_to_point(
        &self,
        point: Vec3,
    ) -> f32 {
        self.normal.dot(point) + self.constant
    }
}

/// Extracts the planes bounding the clip volume of `transform`.
///
/// The order is right, left, bottom, top, far and near.
pub fn frustum_planes(transform: &Mat4) -> [Plane; 6] {
    let [r0, r1, r2, r3] = [0, 1, 2, 3].map(|index| transform.row(index));
    [r3 - r0, r3 + r0, r3 + r1, r3 - r1, r3 - r2, r3 + r2].map(Plane::new)
}

/// Returns `false` if the box `[min, max]` lies entirely outside one plane.
///
/// Boxes crossing a frustum corner may still pass.
pub fn intersects_frustum(
    transform: &Mat4,
    min: Vec3,
    max: Vec3,
) -> bool {
    frustum_planes(transform).iter().all(|plane| {
        // The corner farthest along the normal
        let corner = Vec3::select(plane.normal.cmpgt(Vec3::ZERO), max, min);
        plane.distance_to_point(corner) >= 0.0
    })
}
