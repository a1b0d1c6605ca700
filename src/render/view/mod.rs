pub use glam::{Mat4, Vec2, Vec3};

/// A camera for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    /// Image height.
    pub image_height: u32,
    /// Image width.
    pub image_width: u32,
    /// Clip space transformation, OpenGL depth range.
    ///
    /// It is in **column-major order**, i.e., `M[col][row]`.
    pub projection: Mat4,
    /// Affine transformation from world space to view space.
    ///
    /// It is in **column-major order**, i.e., `M[col][row]`.
    pub view: Mat4,
}

/// The near plane distance used by [`View::look_at`].
pub const DEPTH_NEAR: f32 = 0.1;
/// The far plane distance used by [`View::look_at`].
pub const DEPTH_FAR: f32 = 1.0e6;

impl View {
    /// A right-handed perspective camera at `eye` looking at `target`.
    ///
    /// `field_of_view_y` is the vertical field of view in radians.
    pub fn look_at(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        field_of_view_y: f32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let aspect_ratio = image_width as f32 / image_height.max(1) as f32;
        Self {
            image_height,
            image_width,
            projection: Mat4::perspective_rh_gl(
                field_of_view_y,
                aspect_ratio,
                DEPTH_NEAR,
                DEPTH_FAR,
            ),
            view: Mat4::look_at_rh(eye, target, up),
        }
    }

    /// Returns the aspect ratio (`width / height`).
    #[inline]
    pub const fn aspect_ratio(&self) -> f32 {
        self.image_width as f32 / self.image_height as f32
    }

    /// `(I_x, I_y)`
    #[inline]
    pub fn image_size(&self) -> Vec2 {
        Vec2::new(self.image_width as f32, self.image_height as f32)
    }

    /// `I_x * I_y`
    #[inline]
    pub const fn pixel_count(&self) -> u64 {
        self.image_width as u64 * self.image_height as u64
    }

    /// Returns `projection * view * world`.
    #[inline]
    pub fn transform(
        &self,
        world: &Mat4,
    ) -> Mat4 {
        self.projection * self.view * *world
    }
}
