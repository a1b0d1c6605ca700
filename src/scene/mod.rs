//! Point cloud scenes laid out for the compute kernels.

pub mod encode;

pub use crate::error::Error;
pub use encode::*;
pub use glam::{Mat4, Vec3};

use bytemuck::{Pod, Zeroable};
use humansize::{format_size, BINARY};
use std::{fmt, mem::size_of};

/// A contiguous range of points sharing a bounding box and a source file.
///
/// The layout matches the 64-byte record read by the render kernel.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Batch {
    /// LOD or processing state owned by the host.
    pub state: i32,
    /// Minimum corner in the local space of the file.
    pub min: [f32; 3],
    /// Maximum corner in the local space of the file.
    pub max: [f32; 3],
    /// `P_b`
    pub point_count: u32,
    /// Global index of the first point.
    pub point_offset: u32,
    /// Index into the file transforms.
    pub file_index: u32,
    pub padding: [u32; 6],
}

/// The transforms of a source file for one frame.
///
/// All matrices are in **column-major order**, i.e., `M[col][row]`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct File {
    /// `projection * view * world`
    pub transform: [[f32; 4]; 4],
    /// The transform whose planes bound the frustum culling.
    pub transform_frustum: [[f32; 4]; 4],
    /// Local space to world space.
    pub world: [[f32; 4]; 4],
    pub padding: [[f32; 4]; 4],
}

/// The quantized coordinate streams and the color stream.
///
/// All streams are indexed by the global point index.
#[derive(Clone, Default, PartialEq)]
pub struct PointBuffers {
    /// Bits 20 to 30 of each axis.
    pub coarse: Vec<u32>,
    /// Bits 10 to 20 of each axis.
    pub medium: Vec<u32>,
    /// Bits 0 to 10 of each axis.
    pub fine: Vec<u32>,
    /// `0x00BBGGRR`
    pub colors: Vec<u32>,
}

/// Batches, file transforms and points, immutable once built.
#[derive(Clone, Default, PartialEq)]
pub struct Scene {
    batches: Vec<Batch>,
    worlds: Vec<Mat4>,
    points: PointBuffers,
}

impl Batch {
    #[inline]
    pub fn min(&self) -> Vec3 {
        Vec3::from(self.min)
    }

    #[inline]
    pub fn max(&self) -> Vec3 {
        Vec3::from(self.max)
    }

    /// `max - min`
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }
}

impl File {
    pub fn new(
        transform: Mat4,
        transform_frustum: Mat4,
        world: Mat4,
    ) -> Self {
        Self {
            transform: transform.to_cols_array_2d(),
            transform_frustum: transform_frustum.to_cols_array_2d(),
            world: world.to_cols_array_2d(),
            padding: Default::default(),
        }
    }

    #[inline]
    pub fn transform(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform)
    }

    #[inline]
    pub fn transform_frustum(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.transform_frustum)
    }

    #[inline]
    pub fn world(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.world)
    }
}

impl PointBuffers {
    /// `P`
    #[inline]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Size of all streams in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        (self.coarse.len() + self.medium.len() + self.fine.len() + self.colors.len())
            * size_of::<u32>()
    }
}

impl Scene {
    /// Validates the records and wraps them into a scene.
    ///
    /// `worlds` maps the local space of each file to world space.
    pub fn new(
        batches: Vec<Batch>,
        worlds: Vec<Mat4>,
        points: PointBuffers,
    ) -> Result<Self, Error> {
        let point_count = points.len();

        for (name, len) in [
            ("points.coarse.len()", points.coarse.len()),
            ("points.medium.len()", points.medium.len()),
            ("points.fine.len()", points.fine.len()),
        ] {
            if len != point_count {
                return Err(Error::Validation(
                    format!("{name} ({len})"),
                    format!("equal to points.colors.len() ({point_count})"),
                ));
            }
        }
        if point_count > u32::MAX as usize {
            return Err(Error::Validation(
                format!("point count ({point_count})"),
                format!("no more than {}", u32::MAX),
            ));
        }

        for (index, batch) in batches.iter().enumerate() {
            if batch.file_index as usize >= worlds.len() {
                return Err(Error::Validation(
                    format!("batches[{index}].file_index ({})", batch.file_index),
                    format!("less than the file count ({})", worlds.len()),
                ));
            }

            let end = batch.point_offset as usize + batch.point_count as usize;
            if end > point_count {
                return Err(Error::Validation(
                    format!("the end of batches[{index}] ({end})"),
                    format!("no more than the point count ({point_count})"),
                ));
            }

            let is_box_valid = (0..3).all(|axis| {
                batch.min[axis].is_finite()
                    && batch.max[axis].is_finite()
                    && batch.min[axis] <= batch.max[axis]
            });
            if !is_box_valid {
                return Err(Error::Validation(
                    format!(
                        "the box of batches[{index}] ({:?}, {:?})",
                        batch.min, batch.max
                    ),
                    "finite and ordered".into(),
                ));
            }
        }

        let scene = Self {
            batches,
            worlds,
            points,
        };

        log::debug!(target: "gigapoint::scene", "new > {scene:?}");

        Ok(scene)
    }

    #[inline]
    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    /// Local to world transforms indexed by [`Batch::file_index`].
    #[inline]
    pub fn worlds(&self) -> &[Mat4] {
        &self.worlds
    }

    #[inline]
    pub fn points(&self) -> &PointBuffers {
        &self.points
    }

    /// `B`
    #[inline]
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// `P`
    #[inline]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Size of the batches and the point streams in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.batches.len() * size_of::<Batch>() + self.points.size()
    }

    /// Readable size of the batches and the point streams.
    #[inline]
    pub fn size_readable(&self) -> String {
        format_size(self.size(), BINARY.decimal_places(1))
    }
}

impl fmt::Debug for PointBuffers {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("PointBuffers")
            .field("len()", &self.len())
            .field("size()", &format_size(self.size(), BINARY))
            .finish()
    }
}

impl fmt::Debug for Scene {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("Scene")
            .field("batch_count()", &self.batch_count())
            .field("file_count", &self.worlds.len())
            .field("point_count()", &self.point_count())
            .field("size_readable()", &self.size_readable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn record_layouts() {
        use super::*;

        assert_eq!(size_of::<Batch>(), 64);
        assert_eq!(size_of::<File>(), 256);
    }

    #[test]
    fn file_transforms_round_trip() {
        use super::*;

        let transform = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let world = Mat4::from_scale(Vec3::splat(2.0));
        let file = File::new(transform, Mat4::IDENTITY, world);

        assert_eq!(file.transform(), transform);
        assert_eq!(file.transform_frustum(), Mat4::IDENTITY);
        assert_eq!(file.world(), world);
        // Column-major: the translation lives in the last column.
        assert_eq!(file.transform[3], [1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn new_rejects_invalid_records() {
        use super::*;

        let points = PointBuffers {
            coarse: vec![0; 4],
            medium: vec![0; 4],
            fine: vec![0; 4],
            colors: vec![0; 4],
        };
        let batch = Batch {
            max: [1.0; 3],
            point_count: 4,
            ..Default::default()
        };

        let scene =
            Scene::new(vec![batch], vec![Mat4::IDENTITY], points.to_owned());
        assert_eq!(scene.unwrap().point_count(), 4);

        let scene = Scene::new(vec![batch], vec![], points.to_owned());
        assert!(matches!(scene, Err(Error::Validation(..))));

        let overflowing = Batch {
            point_offset: 1,
            ..batch
        };
        let scene = Scene::new(
            vec![overflowing],
            vec![Mat4::IDENTITY],
            points.to_owned(),
        );
        assert!(matches!(scene, Err(Error::Validation(..))));

        let inverted = Batch {
            min: [2.0; 3],
            ..batch
        };
        let scene =
            Scene::new(vec![inverted], vec![Mat4::IDENTITY], points.to_owned());
        assert!(matches!(scene, Err(Error::Validation(..))));

        let mut uneven = points;
        uneven.fine.pop();
        let scene = Scene::new(vec![batch], vec![Mat4::IDENTITY], uneven);
        assert!(matches!(scene, Err(Error::Validation(..))));
    }
}
