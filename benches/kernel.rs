use divan::Bencher;
use gigapoint_renderer::{
    backend::ComputeClient,
    render::{kernel, DebugCounters},
    scene::File,
    RenderOptions, Renderer, Scene, SceneBuilder, View,
};

fn main() {
    divan::main();
}

mod cpu {
    use super::*;

    #[divan::bench(sample_count = 20, sample_size = 1)]
    fn render(bencher: Bencher) {
        use kernel::render::{main, Arguments, Inputs};

        let scene = data::random_scene();
        let view = data::view();
        let files = data::files(&scene, &view);
        let counters = DebugCounters::default();
        let client = ComputeClient::new();

        bencher.bench_local(|| {
            main(
                &client,
                Arguments {
                    view: view.view.to_cols_array_2d(),
                    projection: view.projection.to_cols_array_2d(),
                    image_size_x: view.image_width,
                    image_size_y: view.image_height,
                    points_per_thread: RenderOptions::default().points_per_thread,
                    access_roll: 0,
                    enable_frustum_culling: 1,
                    show_bounding_boxes: 0,
                    colorize_batches: 0,
                    colorize_overdraw: 0,
                },
                Inputs {
                    batches: scene.batches(),
                    files: &files,
                    points: scene.points(),
                    counters: &counters,
                },
            )
        });
    }

    #[divan::bench(sample_count = 20, sample_size = 1, args = [false, true])]
    fn resolve(
        bencher: Bencher,
        contrast_shading: bool,
    ) {
        use kernel::resolve::{main, Arguments, Inputs, TILE_SIZE_X, TILE_SIZE_Y};

        let scene = data::random_scene();
        let view = data::view();
        let output = Renderer::default().render(&scene, &view).unwrap();
        let counters = DebugCounters::default();
        let client = ComputeClient::new();

        bencher.bench_local(|| {
            main(
                &client,
                Arguments {
                    image_size_x: view.image_width,
                    image_size_y: view.image_height,
                    tile_count_x: view.image_width.div_ceil(TILE_SIZE_X),
                    tile_count_y: view.image_height.div_ceil(TILE_SIZE_Y),
                    colorize_batches: 0,
                    colorize_overdraw: 0,
                    enable_contrast_shading: contrast_shading as u32,
                },
                Inputs {
                    accumulator: &output.accumulator,
                    colors: &scene.points().colors,
                    counters: &counters,
                },
            )
        });
    }

    #[divan::bench(sample_count = 20, sample_size = 1)]
    fn frame(bencher: Bencher) {
        let scene = data::random_scene();
        let view = data::view();
        let mut renderer = Renderer::default();

        bencher.bench_local(|| renderer.render(&scene, &view).unwrap());
    }
}

mod data {
    use super::*;
    use glam::{Mat4, Vec3};
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use rand_distr::Normal;

    pub fn random_scene() -> Scene {
        let mut rng = StdRng::seed_from_u64(0x0123);
        let normal = Normal::new(0.0, 20.0).unwrap();
        let point_count = 1 << 20;

        let positions = (0..point_count)
            .map(|_| [rng.sample(normal), rng.sample(normal), rng.sample(normal)])
            .collect::<Vec<[f64; 3]>>();
        let colors = (0..point_count)
            .map(|_| rng.gen::<u32>() & 0x00FF_FFFF)
            .collect::<Vec<_>>();

        let mut builder = SceneBuilder::default();
        builder.add_file(Mat4::IDENTITY, &positions, &colors).unwrap();
        builder.build().unwrap()
    }

    pub fn view() -> View {
        View::look_at(
            Vec3::new(0.0, 0.0, 120.0),
            Vec3::ZERO,
            Vec3::Y,
            60f32.to_radians(),
            1920,
            1080,
        )
    }

    pub fn files(
        scene: &Scene,
        view: &View,
    ) -> Vec<File> {
        scene
            .worlds()
            .iter()
            .map(|world| File::new(view.transform(world), view.transform(world), *world))
            .collect()
    }
}
