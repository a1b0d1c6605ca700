//! Frame rendering in two strictly ordered passes.
//!
//! The render pass rasterizes every batch into the [`Accumulator`], keeping
//! the nearest point of each pixel. The resolve pass turns the accumulator
//! into colors.

pub mod accumulator;
pub mod debug;
pub mod kernel;
pub mod options;
pub mod view;

pub use crate::{backend::ComputeClient, error::Error, scene::Scene};
pub use accumulator::Accumulator;
pub use debug::{BoundingBox, DebugCounters, DebugSnapshot, DrawIndirectArgs};
pub use options::{AccessPattern, RenderOptions};
pub use view::View;

use crate::{
    preset::render::{PIXEL_COUNT_MAX, RENDER_GROUP_SIZE},
    scene::File,
};
use kernel::{render, resolve};

/// Renders scenes frame by frame.
///
/// It owns the debug counters, so their values describe the last frame.
#[derive(Debug)]
pub struct Renderer {
    client: ComputeClient,
    counters: DebugCounters,
    frustum_view: Option<View>,
    options: RenderOptions,
}

/// The result of one frame.
#[derive(Debug)]
pub struct RenderOutput {
    /// `I_x`
    pub image_width: u32,
    /// `I_y`
    pub image_height: u32,
    /// `[I_y, I_x]`, `0x00BBGGRR`
    ///
    /// The first row is the bottom of the view.
    pub colors: Vec<u32>,
    /// `[I_y, I_x]`
    pub accumulator: Accumulator,
    /// The draw header and the boxes of the rendered batches.
    pub bounding_boxes: Option<(DrawIndirectArgs, Vec<BoundingBox>)>,
    pub counters: DebugSnapshot,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Result<Self, Error> {
        let options = options.validated()?;
        Ok(Self {
            client: ComputeClient::new(),
            counters: DebugCounters::new(options.debug_counters),
            frustum_view: None,
            options,
        })
    }

    /// Runs the kernels on `client`.
    pub fn with_client(
        mut self,
        client: ComputeClient,
    ) -> Self {
        self.client = client;
        self
    }

    #[inline]
    pub fn client(&self) -> &ComputeClient {
        &self.client
    }

    #[inline]
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn set_options(
        &mut self,
        options: RenderOptions,
    ) -> Result<(), Error> {
        self.options = options.validated()?;
        self.counters.set_enabled(self.options.debug_counters);
        Ok(())
    }

    /// Culls against the frustum of `view` instead of the rendered view.
    ///
    /// `None` makes the culling follow the rendered view again.
    pub fn freeze_frustum(
        &mut self,
        view: Option<View>,
    ) {
        self.frustum_view = view;
    }

    #[inline]
    pub fn frustum_view(&self) -> Option<&View> {
        self.frustum_view.as_ref()
    }

    /// The counters of the last frame.
    #[inline]
    pub fn counters(&self) -> DebugSnapshot {
        self.counters.snapshot()
    }

    pub fn render(
        &mut self,
        scene: &Scene,
        view: &View,
    ) -> Result<RenderOutput, Error> {
        #[cfg(debug_assertions)]
        log::debug!(target: "gigapoint::renderer", "start");

        // Specifying the arguments

        let options = &self.options;
        // I_x
        let image_size_x = view.image_width;
        // I_y
        let image_size_y = view.image_height;
        // I_x / T_x
        let tile_count_x = image_size_x.div_ceil(resolve::TILE_SIZE_X);
        // I_y / T_y
        let tile_count_y = image_size_y.div_ceil(resolve::TILE_SIZE_Y);

        if image_size_x == 0 || image_size_y == 0 {
            return Err(Error::Validation(
                format!("image size ({image_size_x}, {image_size_y})"),
                "greater than 0".into(),
            ));
        }
        if view.pixel_count() > PIXEL_COUNT_MAX as u64 {
            return Err(Error::Validation(
                format!("pixel count ({})", view.pixel_count()),
                format!("no more than {PIXEL_COUNT_MAX}"),
            ));
        }
        if scene.batch_count() > u32::MAX as usize {
            return Err(Error::Validation(
                format!("batch count ({})", scene.batch_count()),
                format!("no more than {}", u32::MAX),
            ));
        }
        if let Some((index, batch)) = scene.batches().iter().enumerate().find(
            |(_, batch)| {
                batch.point_count as u64
                    > options.points_per_thread as u64 * RENDER_GROUP_SIZE as u64
            },
        ) {
            log::warn!(
                target: "gigapoint::renderer",
                "batches[{index}] is truncated to {} of {} points",
                options.points_per_thread * RENDER_GROUP_SIZE,
                batch.point_count,
            );
        }

        let frustum_view = self.frustum_view.as_ref().unwrap_or(view);
        let files = scene
            .worlds()
            .iter()
            .map(|world| {
                File::new(
                    view.transform(world),
                    frustum_view.transform(world),
                    *world,
                )
            })
            .collect::<Vec<_>>();

        self.counters.reset();

        // Launching the kernels

        let outputs_render = render::main(
            &self.client,
            render::Arguments {
                view: view.view.to_cols_array_2d(),
                projection: view.projection.to_cols_array_2d(),
                image_size_x,
                image_size_y,
                points_per_thread: options.points_per_thread,
                access_roll: match options.access_pattern {
                    AccessPattern::Strided => 0,
                    AccessPattern::Consecutive { roll } => roll,
                },
                enable_frustum_culling: options.frustum_culling as u32,
                show_bounding_boxes: options.bounding_boxes as u32,
                colorize_batches: options.colorize_batches as u32,
                colorize_overdraw: options.colorize_overdraw as u32,
            },
            render::Inputs {
                batches: scene.batches(),
                files: &files,
                points: scene.points(),
                counters: &self.counters,
            },
        );
        #[cfg(debug_assertions)]
        log::debug!(target: "gigapoint::renderer::render", "render");

        let outputs_resolve = resolve::main(
            &self.client,
            resolve::Arguments {
                image_size_x,
                image_size_y,
                tile_count_x,
                tile_count_y,
                colorize_batches: options.colorize_batches as u32,
                colorize_overdraw: options.colorize_overdraw as u32,
                enable_contrast_shading: options.contrast_shading as u32,
            },
            resolve::Inputs {
                accumulator: &outputs_render.accumulator,
                colors: &scene.points().colors,
                counters: &self.counters,
            },
        );
        #[cfg(debug_assertions)]
        log::debug!(target: "gigapoint::renderer::resolve", "resolve");

        let counters = self.counters.snapshot();

        #[cfg(debug_assertions)]
        log::debug!(target: "gigapoint::renderer", "end > {counters:?}");

        Ok(RenderOutput {
            image_width: image_size_x,
            image_height: image_size_y,
            colors: outputs_resolve.colors,
            accumulator: outputs_render.accumulator,
            bounding_boxes: outputs_render
                .bounding_boxes
                .map(debug::BoundingBoxes::into_parts),
            counters,
        })
    }
}

impl RenderOutput {
    /// The index of the pixel at `(x, y)`.
    #[inline]
    pub const fn pixel_index(
        &self,
        x: u32,
        y: u32,
    ) -> usize {
        x as usize + y as usize * self.image_width as usize
    }

    /// The color at `(x, y)`, `0x00BBGGRR`.
    #[inline]
    pub fn color(
        &self,
        x: u32,
        y: u32,
    ) -> u32 {
        self.colors[self.pixel_index(x, y)]
    }

    /// Converts the colors to opaque RGBA bytes.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.colors
            .iter()
            .flat_map(|&color| {
                let [r, g, b, _] = color.to_le_bytes();
                [r, g, b, 0xFF]
            })
            .collect()
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            client: ComputeClient::new(),
            counters: DebugCounters::default(),
            frustum_view: None,
            options: RenderOptions::default(),
        }
    }
}
