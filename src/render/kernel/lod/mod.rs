//! Precision level selection from the screen footprint of a batch.

pub use super::*;

/// The count of precision levels.
pub const LEVEL_COUNT: u32 = 5;

/// Upper footprint bounds in pixels, exclusive, of levels 4 to 1.
pub const LEVEL_FOOTPRINT_BOUNDS: [f32; 4] = [100.0, 200.0, 500.0, 10000.0];

/// Maps a footprint in pixels to a precision level.
///
/// Small footprints map to high levels, which decode with less precision.
#[inline]
pub fn level_for_footprint(footprint: f32) -> u32 {
    LEVEL_FOOTPRINT_BOUNDS
        .iter()
        .position(|&bound| footprint < bound)
        .map_or(0, |index| LEVEL_COUNT - 1 - index as u32)
}

/// Returns the projected size in pixels of the box `[min, max]`.
///
/// The radius is the diagonal of the box, which overestimates the bounding
/// sphere. It is offset along the view space X axis of the box center.
pub fn footprint(
    min: Vec3,
    max: Vec3,
    world: &Mat4,
    view: &Mat4,
    projection: &Mat4,
    image_size: Vec2,
) -> f32 {
    let center = (min + max) / 2.0;
    let radius = min.distance(max);

    let view_center = *view * *world * center.extend(1.0);
    let view_edge = view_center + Vec4::new(radius, 0.0, 0.0, 0.0);

    let to_screen = |position: Vec4| {
        let clip = *projection * position;
        let ndc = Vec2::new(clip.x, clip.y) / clip.w;
        image_size * (ndc + 1.0) / 2.0
    };

    to_screen(view_edge).distance(to_screen(view_center))
}

/// Returns the precision level of the box `[min, max]`.
pub fn precision_level(
    min: Vec3,
    max: Vec3,
    world: &Mat4,
    view: &Mat4,
    projection: &Mat4,
    image_size: Vec2,
) -> u32 {
    level_for_footprint(footprint(min, max, world, view, projection, image_size))
}

#[cfg(test)]
mod tests {
    #[test]
    fn level_for_footprint_bounds() {
        use super::*;

        let cases = [
            (0.0, 4),
            (99.99, 4),
            (100.0, 3),
            (199.99, 3),
            (200.0, 2),
            (499.99, 2),
            (500.0, 1),
            (9999.0, 1),
            (10000.0, 0),
            (f32::INFINITY, 0),
        ];
        cases.iter().for_each(|&(footprint, target)| {
            assert_eq!(level_for_footprint(footprint), target, "footprint: {footprint}");
        });
    }

    #[test]
    fn footprint_from_distance() {
        use super::*;
        use crate::render::view::View;

        let view = View::look_at(
            Vec3::new(5.0, 5.0, 55.0),
            Vec3::splat(5.0),
            Vec3::Y,
            90f32.to_radians(),
            512,
            512,
        );
        let (min, max) = (Vec3::ZERO, Vec3::splat(10.0));

        // radius / distance * I_x / 2
        let target = 300f32.sqrt() / 50.0 * 256.0;
        let output = footprint(
            min,
            max,
            &Mat4::IDENTITY,
            &view.view,
            &view.projection,
            view.image_size(),
        );
        assert!((output - target).abs() < 1e-2, "output: {output}, target: {target}");

        let level = precision_level(
            min,
            max,
            &Mat4::IDENTITY,
            &view.view,
            &view.projection,
            view.image_size(),
        );
        assert_eq!(level, 4);

        // Closer boxes look larger.
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, 45.0));
        let level = precision_level(
            min,
            max,
            &world,
            &view.view,
            &view.projection,
            view.image_size(),
        );
        assert!(level < 4, "level: {level}");
    }
}
