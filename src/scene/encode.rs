//! Quantization of point positions, the contract with the decoder.
//!
//! A position is stored as 30-bit integers per axis relative to the
//! bounding box of its batch. The 30 bits are split into three 10-bit
//! fields, each packed with the other axes into one word:
//!
//! ```plaintext
//! word   = x | y << 10 | z << 20
//! coarse = q30 >> 20
//! medium = q30 >> 10
//! fine   = q30
//! ```
//!
//! Reading `coarse` alone yields 10 bits of precision, `coarse` and
//! `medium` yield 20 bits, and all three yield 30 bits.

pub use super::*;

use crate::preset::render::POINTS_PER_BATCH;

/// `2 ^ 10`
pub const STEPS_10BIT: u32 = 1 << 10;
/// `2 ^ 20`
pub const STEPS_20BIT: u32 = 1 << 20;
/// `2 ^ 30`
pub const STEPS_30BIT: u32 = 1 << 30;
/// `2 ^ 10 - 1`
pub const MASK_10BIT: u32 = STEPS_10BIT - 1;

/// Builds a [`Scene`] from the decoded points of source files.
///
/// Consecutive points of a file are grouped into batches of at most
/// `points_per_batch` points. This is a flat batching, not a spatial
/// hierarchy.
#[derive(Clone, Debug)]
pub struct SceneBuilder {
    points_per_batch: u32,
    batches: Vec<Batch>,
    worlds: Vec<Mat4>,
    points: PointBuffers,
}

/// Quantizes `value` in `[min, min + size]` to 30 bits.
///
/// A degenerate axis (`size <= 0`) always quantizes to `0`.
pub fn quantize(
    value: f64,
    min: f64,
    size: f64,
) -> u32 {
    if size <= 0.0 {
        return 0;
    }

    let steps = ((value - min) / size * STEPS_30BIT as f64).floor();
    steps.clamp(0.0, (STEPS_30BIT - 1) as f64) as u32
}

/// Splits 30-bit integers into the `[coarse, medium, fine]` words.
#[inline]
pub const fn pack_words(q30: [u32; 3]) -> [u32; 3] {
    const fn word(
        q30: [u32; 3],
        shift: u32,
    ) -> u32 {
        (q30[0] >> shift & MASK_10BIT)
            | (q30[1] >> shift & MASK_10BIT) << 10
            | (q30[2] >> shift & MASK_10BIT) << 20
    }
    [word(q30, 20), word(q30, 10), word(q30, 0)]
}

/// Quantizes a position in the box `[min, max]` into `[coarse, medium, fine]`.
pub fn encode_position(
    position: [f64; 3],
    min: [f64; 3],
    max: [f64; 3],
) -> [u32; 3] {
    pack_words([0, 1, 2].map(|axis| {
        quantize(position[axis], min[axis], max[axis] - min[axis])
    }))
}

/// Packs RGB channels into `0x00BBGGRR`.
///
/// Channels of 16-bit sources are scaled down to 8 bits. Values below 256
/// are taken as 8-bit already.
#[inline]
pub const fn encode_color(rgb: [u16; 3]) -> u32 {
    const fn channel(c: u16) -> u32 {
        if c < 256 {
            c as u32
        } else {
            c as u32 / 256
        }
    }
    channel(rgb[0]) | channel(rgb[1]) << 8 | channel(rgb[2]) << 16
}

impl SceneBuilder {
    pub fn new(points_per_batch: u32) -> Result<Self, Error> {
        if points_per_batch == 0 {
            return Err(Error::Validation(
                "points_per_batch".into(),
                "greater than 0".into(),
            ));
        }

        Ok(Self {
            points_per_batch,
            batches: Vec::new(),
            worlds: Vec::new(),
            points: Default::default(),
        })
    }

    /// Appends the points of a file and returns its file index.
    ///
    /// `positions` are in the local space of the file, `world` maps them
    /// to world space, and `colors` are `0x00BBGGRR`.
    pub fn add_file(
        &mut self,
        world: Mat4,
        positions: &[[f64; 3]],
        colors: &[u32],
    ) -> Result<u32, Error> {
        if positions.len() != colors.len() {
            return Err(Error::Validation(
                format!("colors.len() ({})", colors.len()),
                format!("equal to positions.len() ({})", positions.len()),
            ));
        }
        if let Some(index) = positions
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(Error::Validation(
                format!("positions[{index}] ({:?})", positions[index]),
                "finite".into(),
            ));
        }

        let point_count_end = self.points.len() + positions.len();
        if point_count_end > u32::MAX as usize {
            return Err(Error::Validation(
                format!("point count ({point_count_end})"),
                format!("no more than {}", u32::MAX),
            ));
        }

        let file_index = self.worlds.len() as u32;
        self.worlds.push(world);

        let chunk_size = self.points_per_batch as usize;
        for (positions, colors) in
            positions.chunks(chunk_size).zip(colors.chunks(chunk_size))
        {
            let (min, max) = positions.iter().fold(
                ([f64::INFINITY; 3], [f64::NEG_INFINITY; 3]),
                |(min, max), p| {
                    (
                        [0, 1, 2].map(|axis| min[axis].min(p[axis])),
                        [0, 1, 2].map(|axis| max[axis].max(p[axis])),
                    )
                },
            );

            // The kernel reads the box in single precision.
            let min = min.map(|c| c as f32);
            let max = max.map(|c| c as f32);
            let min_64 = min.map(f64::from);
            let max_64 = max.map(f64::from);

            self.batches.push(Batch {
                min,
                max,
                point_count: positions.len() as u32,
                point_offset: self.points.len() as u32,
                file_index,
                ..Default::default()
            });

            for (&position, &color) in positions.iter().zip(colors) {
                let [coarse, medium, fine] =
                    encode_position(position, min_64, max_64);
                self.points.coarse.push(coarse);
                self.points.medium.push(medium);
                self.points.fine.push(fine);
                self.points.colors.push(color);
            }
        }

        Ok(file_index)
    }

    pub fn build(self) -> Result<Scene, Error> {
        Scene::new(self.batches, self.worlds, self.points)
    }
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            points_per_batch: POINTS_PER_BATCH,
            batches: Vec::new(),
            worlds: Vec::new(),
            points: Default::default(),
        }
    }
}
