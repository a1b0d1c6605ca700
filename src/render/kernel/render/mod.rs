pub use super::*;
pub use bytemuck::{Pod, Zeroable};

use crate::preset::render::{BATCH_COLOR_FACTOR, RENDER_GROUP_SIZE, SPECTRAL};
use accumulator::{pack, Accumulator};
use debug::{BoundingBox, BoundingBoxes, Counter, DebugCounters};
use decode::Precision;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Arguments {
    /// World space to view space, column-major.
    pub view: [[f32; 4]; 4],
    /// View space to clip space, column-major.
    pub projection: [[f32; 4]; 4],

    /// `I_x`
    pub image_size_x: u32,
    /// `I_y`
    pub image_size_y: u32,

    /// `N`
    pub points_per_thread: u32,
    /// `0` for the strided access, otherwise the roll of the consecutive
    /// access.
    pub access_roll: u32,

    pub enable_frustum_culling: u32,
    pub show_bounding_boxes: u32,
    pub colorize_batches: u32,
    pub colorize_overdraw: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct Inputs<'a> {
    /// `[B]`
    pub batches: &'a [Batch],
    /// `[F]`
    pub files: &'a [File],
    /// `[P]`
    pub points: &'a PointBuffers,
    pub counters: &'a DebugCounters,
}

#[derive(Debug)]
pub struct Outputs {
    /// `[I_y, I_x]`
    pub accumulator: Accumulator,
    /// `[B]` at most
    pub bounding_boxes: Option<BoundingBoxes>,
}

/// `G`
pub const GROUP_SIZE: u32 = RENDER_GROUP_SIZE;

struct Render<'a> {
    arguments: &'a Arguments,
    inputs: &'a Inputs<'a>,
    accumulator: &'a Accumulator,
    bounding_boxes: Option<&'a BoundingBoxes>,
    image_size: Vec2,
    projection: Mat4,
    view: Mat4,
}

/// Rasterizing the points of every batch into the accumulator.
///
/// One work-group processes one batch.
pub fn main(
    client: &ComputeClient,
    arguments: Arguments,
    inputs: Inputs,
) -> Outputs {
    // Specifying the parameters

    // B
    let batch_count = inputs.batches.len() as u32;
    // I_x
    let image_size_x = arguments.image_size_x;
    // I_y
    let image_size_y = arguments.image_size_y;

    debug_assert_ne!(arguments.points_per_thread, 0);
    debug_assert!(
        arguments.access_roll == 0
            || arguments.points_per_thread % arguments.access_roll == 0,
        "access_roll should divide points_per_thread",
    );

    // [I_y, I_x]
    let accumulator = Accumulator::new(
        image_size_x,
        image_size_y,
        arguments.colorize_overdraw != 0,
    );
    // [B]
    let bounding_boxes = (arguments.show_bounding_boxes != 0)
        .then(|| BoundingBoxes::new(batch_count as usize));

    // Launching the kernel

    client.execute(
        &Render {
            arguments: &arguments,
            inputs: &inputs,
            accumulator: &accumulator,
            bounding_boxes: bounding_boxes.as_ref(),
            image_size: Vec2::new(image_size_x as f32, image_size_y as f32),
            projection: Mat4::from_cols_array_2d(&arguments.projection),
            view: Mat4::from_cols_array_2d(&arguments.view),
        },
        CubeCount::Static(batch_count, 1, 1),
    );

    Outputs {
        accumulator,
        bounding_boxes,
    }
}

impl Render<'_> {
    /// The local point index loaded by `unit` at `iteration`.
    #[inline]
    fn local_index(
        &self,
        unit: u32,
        iteration: u32,
    ) -> usize {
        let (unit, iteration) = (unit as usize, iteration as usize);
        let group_size = GROUP_SIZE as usize;

        match self.arguments.access_roll as usize {
            0 => iteration * group_size + unit,
            roll => {
                let jump = iteration / roll;
                jump * roll * group_size + roll * unit + iteration % roll
            },
        }
    }
}

impl Kernel for Render<'_> {
    fn cube_dim(&self) -> CubeDim {
        CubeDim {
            x: GROUP_SIZE,
            y: 1,
            z: 1,
        }
    }

    fn cube(
        &self,
        cube: CubePosition,
    ) {
        let Inputs {
            batches,
            files,
            points,
            counters,
        } = *self.inputs;
        let arguments = self.arguments;

        // Loading the batch

        let batch_index = cube.x;
        let batch = &batches[batch_index as usize];
        let file = &files[batch.file_index as usize];
        let min = batch.min();
        let max = batch.max();

        counters.count(Counter::BatchesProcessed);

        if arguments.enable_frustum_culling != 0
            && !frustum::intersects_frustum(&file.transform_frustum(), min, max)
        {
            return;
        }

        // Selecting the precision

        let world = file.world();
        let level = lod::precision_level(
            min,
            max,
            &world,
            &self.view,
            &self.projection,
            self.image_size,
        );
        let precision = Precision::from_level(level);

        if let Some(bounding_boxes) = self.bounding_boxes {
            let min_world = world.transform_point3(min);
            let max_world = world.transform_point3(max);
            bounding_boxes.push(BoundingBox {
                position: ((min_world + max_world) / 2.0).extend(0.0).to_array(),
                size: (max_world - min_world).abs().extend(0.0).to_array(),
                color: SPECTRAL[level as usize],
                padding: Default::default(),
            });
        }

        counters.count(Counter::BatchesRendered);

        // Rasterizing the points

        // P_b
        let point_count = batch.point_count as usize;
        let point_offset = batch.point_offset as usize;
        let size = batch.size();
        let transform = file.transform();
        // (I_x - 1, I_y - 1)
        let pixel_max = (
            arguments.image_size_x - 1,
            arguments.image_size_y - 1,
        );

        for unit in self.cube_dim().units() {
            for iteration in 0..arguments.points_per_thread {
                let local_index = self.local_index(unit.x, iteration);
                if local_index >= point_count {
                    break;
                }
                counters.count(Counter::PointsProcessed);

                let point_index = point_offset + local_index;
                let position =
                    decode::decode(precision, point_index, min, size, points);
                let position_clip = transform * position.extend(1.0);

                // Behind the camera or invalid
                if !(position_clip.w > 0.0) {
                    continue;
                }

                let position_ndc =
                    Vec2::new(position_clip.x, position_clip.y) / position_clip.w;
                let is_inside = (-1.0..=1.0).contains(&position_ndc.x)
                    && (-1.0..=1.0).contains(&position_ndc.y);
                if !is_inside {
                    continue;
                }

                let position_2d = (position_ndc * 0.5 + 0.5) * self.image_size;
                let pixel_x = (position_2d.x as u32).min(pixel_max.0);
                let pixel_y = (position_2d.y as u32).min(pixel_max.1);
                let pixel =
                    pixel_x as usize + pixel_y as usize * arguments.image_size_x as usize;

                let payload = if arguments.colorize_batches != 0 {
                    batch_index.wrapping_mul(BATCH_COLOR_FACTOR)
                } else {
                    point_index as u32
                };

                if self
                    .accumulator
                    .depth_test(pixel, pack(position_clip.w, payload))
                {
                    counters.count(Counter::PointsRendered);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{render::view::View, scene::SceneBuilder};

    fn arguments(view: &View) -> Arguments {
        Arguments {
            view: view.view.to_cols_array_2d(),
            projection: view.projection.to_cols_array_2d(),
            image_size_x: view.image_width,
            image_size_y: view.image_height,
            points_per_thread: 4,
            access_roll: 0,
            enable_frustum_culling: 1,
            show_bounding_boxes: 0,
            colorize_batches: 0,
            colorize_overdraw: 0,
        }
    }

    fn view() -> View {
        View::look_at(
            Vec3::new(0.5, 0.5, 10.0),
            Vec3::new(0.5, 0.5, 0.0),
            Vec3::Y,
            90f32.to_radians(),
            64,
            64,
        )
    }

    #[test]
    fn local_index_covers_batch() {
        let view = view();
        let points = PointBuffers::default();
        let counters = DebugCounters::default();
        let inputs = Inputs {
            batches: &[],
            files: &[],
            points: &points,
            counters: &counters,
        };
        let accumulator = Accumulator::new(1, 1, false);

        for access_roll in [0, 1, 2, 4] {
            let arguments = Arguments {
                access_roll,
                ..arguments(&view)
            };
            let kernel = Render {
                arguments: &arguments,
                inputs: &inputs,
                accumulator: &accumulator,
                bounding_boxes: None,
                image_size: view.image_size(),
                projection: view.projection,
                view: view.view,
            };

            let mut indices = (0..GROUP_SIZE)
                .flat_map(|unit| {
                    (0..arguments.points_per_thread)
                        .map(move |iteration| (unit, iteration))
                })
                .map(|(unit, iteration)| kernel.local_index(unit, iteration))
                .collect::<Vec<_>>();
            indices.sort_unstable();

            let target = (0..(GROUP_SIZE * arguments.points_per_thread) as usize)
                .collect::<Vec<_>>();
            assert_eq!(indices, target, "access_roll: {access_roll}");
        }

        let arguments = Arguments {
            access_roll: 2,
            ..arguments(&view)
        };
        let kernel = Render {
            arguments: &arguments,
            inputs: &inputs,
            accumulator: &accumulator,
            bounding_boxes: None,
            image_size: view.image_size(),
            projection: view.projection,
            view: view.view,
        };
        // jump * roll * G + roll * unit + i % roll
        assert_eq!(kernel.local_index(3, 0), 6);
        assert_eq!(kernel.local_index(3, 1), 7);
        assert_eq!(kernel.local_index(3, 2), 2 * GROUP_SIZE as usize + 6);
    }

    #[test]
    fn main_nearest_point_wins() {
        let view = view();
        let mut builder = SceneBuilder::new(2).unwrap();
        // Two points on the view axis, the second one nearer.
        builder
            .add_file(
                Mat4::IDENTITY,
                &[[0.5, 0.5, 0.0], [0.5, 0.5, 1.0]],
                &[0x11, 0x22],
            )
            .unwrap();
        let scene = builder.build().unwrap();
        let files = scene
            .worlds()
            .iter()
            .map(|world| File::new(view.transform(world), view.transform(world), *world))
            .collect::<Vec<_>>();
        let counters = DebugCounters::new(true);

        let outputs = main(
            &ComputeClient::new(),
            arguments(&view),
            Inputs {
                batches: scene.batches(),
                files: &files,
                points: scene.points(),
                counters: &counters,
            },
        );

        let entries = outputs.accumulator.to_entries();
        let written = entries
            .iter()
            .copied()
            .filter(|&entry| entry != accumulator::CLEARED)
            .collect::<Vec<_>>();
        assert_eq!(written.len(), 1);

        let (depth, payload) = accumulator::unpack(written[0]);
        assert_eq!(payload, 1);
        assert!((depth - 9.0).abs() < 1e-2, "depth: {depth}");

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.batches_processed, 1);
        assert_eq!(snapshot.batches_rendered, 1);
        assert_eq!(snapshot.points_processed, 2);
        assert!(snapshot.points_rendered >= 1);
        assert!(outputs.bounding_boxes.is_none());
    }
}
