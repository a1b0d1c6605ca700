//! Decoding quantized positions at a chosen precision.
//!
//! See [`crate::scene::encode`] for the layout of the words.

pub use super::*;

use crate::scene::encode::{MASK_10BIT, STEPS_10BIT, STEPS_30BIT};

/// The precision bands of decoding.
///
/// Coarser bands skip the reads of the finer words.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Precision {
    /// 30 bits per axis, 3 words.
    Fine,
    /// 20 bits per axis, 2 words.
    Medium,
    /// 10 bits per axis, 1 word.
    Coarse,
}

impl Precision {
    /// Collapses a precision level into a band.
    ///
    /// Level `0` is [`Precision::Fine`], level `1` is [`Precision::Medium`]
    /// and every level above is [`Precision::Coarse`].
    #[inline]
    pub const fn from_level(level: u32) -> Self {
        match level {
            0 => Self::Fine,
            1 => Self::Medium,
            _ => Self::Coarse,
        }
    }

    /// Bits per axis.
    #[inline]
    pub const fn bit_count(&self) -> u32 {
        match self {
            Self::Fine => 30,
            Self::Medium => 20,
            Self::Coarse => 10,
        }
    }

    /// Words read per point.
    #[inline]
    pub const fn word_count(&self) -> u32 {
        self.bit_count() / 10
    }
}

/// Splits a word into its `[x, y, z]` 10-bit fields.
#[inline]
pub const fn unpack_word(word: u32) -> [u32; 3] {
    [word & MASK_10BIT, word >> 10 & MASK_10BIT, word >> 20 & MASK_10BIT]
}

/// Decodes the point at the global `index` inside the box at `min` of
/// extent `size`.
pub fn decode(
    precision: Precision,
    index: usize,
    min: Vec3,
    size: Vec3,
    points: &PointBuffers,
) -> Vec3 {
    let coarse = unpack_word(points.coarse[index]);

    match precision {
        Precision::Coarse => {
            let steps = Vec3::from(coarse.map(|c| c as f32));
            steps * (size / STEPS_10BIT as f32) + min
        },
        Precision::Medium => {
            let medium = unpack_word(points.medium[index]);
            let steps = Vec3::from([0, 1, 2].map(|axis| {
                (coarse[axis] << 20 | medium[axis] << 10) as f32
            }));
            steps * (size / STEPS_30BIT as f32) + min
        },
        Precision::Fine => {
            let medium = unpack_word(points.medium[index]);
            let fine = unpack_word(points.fine[index]);
            let steps = Vec3::from([0, 1, 2].map(|axis| {
                (coarse[axis] << 20 | medium[axis] << 10 | fine[axis]) as f32
            }));
            steps * (size / STEPS_30BIT as f32) + min
        },
    }
}
