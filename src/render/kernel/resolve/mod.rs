pub use super::*;
pub use bytemuck::{Pod, Zeroable};

use crate::preset::render::{
    BACKGROUND_COLOR, CONTRAST_DEPTH_SCALE, CONTRAST_STRENGTH, CONTRAST_WINDOW,
    RESOLVE_GROUP_SIZE_X, RESOLVE_GROUP_SIZE_Y, SPECTRAL,
};
use accumulator::{unpack, Accumulator, CLEARED};
use debug::{Counter, DebugCounters};
use std::sync::atomic::{AtomicU32, Ordering};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Arguments {
    /// `I_x`
    pub image_size_x: u32,
    /// `I_y`
    pub image_size_y: u32,

    /// `I_x / T_x`
    pub tile_count_x: u32,
    /// `I_y / T_y`
    pub tile_count_y: u32,

    pub colorize_batches: u32,
    pub colorize_overdraw: u32,
    pub enable_contrast_shading: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Inputs<'a> {
    /// `[I_y, I_x]`
    pub accumulator: &'a Accumulator,
    /// `[P]`
    pub colors: &'a [u32],
    pub counters: &'a DebugCounters,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Outputs {
    /// `[I_y, I_x]`, `0x00BBGGRR`
    pub colors: Vec<u32>,
}

/// `T_x`
pub const TILE_SIZE_X: u32 = RESOLVE_GROUP_SIZE_X;
/// `T_y`
pub const TILE_SIZE_Y: u32 = RESOLVE_GROUP_SIZE_Y;

struct Resolve<'a> {
    arguments: &'a Arguments,
    inputs: &'a Inputs<'a>,
    image: &'a [AtomicU32],
}

/// Resolving the accumulator into colors.
///
/// One work-group processes one tile of the image.
pub fn main(
    client: &ComputeClient,
    arguments: Arguments,
    inputs: Inputs,
) -> Outputs {
    // Specifying the parameters

    // I_x * I_y
    let pixel_count =
        arguments.image_size_x as usize * arguments.image_size_y as usize;

    debug_assert_eq!(inputs.accumulator.len(), pixel_count);
    debug_assert_eq!(
        arguments.tile_count_x,
        arguments.image_size_x.div_ceil(TILE_SIZE_X)
    );
    debug_assert_eq!(
        arguments.tile_count_y,
        arguments.image_size_y.div_ceil(TILE_SIZE_Y)
    );

    // [I_y, I_x]
    let image = (0..pixel_count)
        .map(|_| AtomicU32::new(BACKGROUND_COLOR))
        .collect::<Vec<_>>();

    // Launching the kernel

    client.execute(
        &Resolve {
            arguments: &arguments,
            inputs: &inputs,
            image: &image,
        },
        CubeCount::Static(arguments.tile_count_x, arguments.tile_count_y, 1),
    );

    Outputs {
        colors: image.into_iter().map(AtomicU32::into_inner).collect(),
    }
}

/// Maps the count of points projected onto a pixel to a color.
///
/// Every doubling of the count moves one step along [`SPECTRAL`].
#[inline]
pub fn overdraw_color(count: u32) -> u32 {
    match count {
        0 => BACKGROUND_COLOR,
        count => SPECTRAL[(count.ilog2() as usize).min(SPECTRAL.len() - 1)],
    }
}

/// Scales the RGB channels of `color` by `shade`.
#[inline]
pub fn shade_color(
    color: u32,
    shade: f32,
) -> u32 {
    [0, 8, 16]
        .iter()
        .map(|&shift| {
            let channel = (color >> shift & 0xFF) as f32 * shade;
            (channel as u32).min(0xFF) << shift
        })
        .fold(0, |color, channel| color | channel)
}

impl Resolve<'_> {
    /// The shade of the pixel at `(x, y)` of `depth` from the depth
    /// differences to its neighbours.
    fn contrast_shade(
        &self,
        x: u32,
        y: u32,
        depth: f32,
    ) -> f32 {
        let accumulator = self.inputs.accumulator;
        let x_max = self.arguments.image_size_x as i64 - 1;
        let y_max = self.arguments.image_size_y as i64 - 1;
        let window = CONTRAST_WINDOW as i64;

        let mut sum = 0.0;
        for offset_y in -window..=window {
            for offset_x in -window..=window {
                let neighbour_x = (x as i64 + offset_x).clamp(0, x_max);
                let neighbour_y = (y as i64 + offset_y).clamp(0, y_max);
                let neighbour = (neighbour_x + neighbour_y * (x_max + 1)) as usize;
                if let Some(neighbour_depth) = accumulator.depth(neighbour) {
                    sum += (depth - neighbour_depth).max(0.0);
                }
            }
        }

        // (2 * W + 1) ^ 2
        let sample_count = ((2 * window + 1) * (2 * window + 1)) as f32;
        (-(sum / sample_count) * CONTRAST_DEPTH_SCALE * CONTRAST_STRENGTH).exp()
    }

    fn color(
        &self,
        x: u32,
        y: u32,
    ) -> u32 {
        let Inputs {
            accumulator,
            colors,
            counters,
        } = *self.inputs;
        let arguments = self.arguments;
        let pixel = x as usize + y as usize * arguments.image_size_x as usize;

        let entry = accumulator.entry(pixel);
        let color = if entry == CLEARED {
            BACKGROUND_COLOR
        } else {
            counters.count(Counter::PointsVisible);

            let (depth, payload) = unpack(entry);
            let color = if arguments.colorize_batches != 0 {
                payload & 0x00FF_FFFF
            } else {
                colors[payload as usize]
            };

            if arguments.enable_contrast_shading != 0 {
                shade_color(color, self.contrast_shade(x, y, depth))
            } else {
                color
            }
        };

        match accumulator.overdraw(pixel) {
            Some(count) if arguments.colorize_overdraw != 0 => overdraw_color(count),
            _ => color,
        }
    }
}

impl Kernel for Resolve<'_> {
    fn cube_dim(&self) -> CubeDim {
        CubeDim {
            x: TILE_SIZE_X,
            y: TILE_SIZE_Y,
            z: 1,
        }
    }

    fn cube(
        &self,
        cube: CubePosition,
    ) {
        let arguments = self.arguments;

        for unit in self.cube_dim().units() {
            let x = cube.x * TILE_SIZE_X + unit.x;
            let y = cube.y * TILE_SIZE_Y + unit.y;
            if x >= arguments.image_size_x || y >= arguments.image_size_y {
                continue;
            }

            let pixel = x as usize + y as usize * arguments.image_size_x as usize;
            self.image[pixel].store(self.color(x, y), Ordering::Relaxed);
        }
    }
}
