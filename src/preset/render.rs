/// Units in a render work-group. One work-group rasterizes one batch.
pub const RENDER_GROUP_SIZE: u32 = 128;
/// Units in a resolve work-group.
pub const RESOLVE_GROUP_SIZE: u32 = RESOLVE_GROUP_SIZE_X * RESOLVE_GROUP_SIZE_Y;
pub const RESOLVE_GROUP_SIZE_X: u32 = 16;
pub const RESOLVE_GROUP_SIZE_Y: u32 = 16;
/// Maximum of `I_y * I_x`
pub const PIXEL_COUNT_MAX: u32 = RESOLVE_GROUP_SIZE * TILE_COUNT_MAX;
pub const TILE_COUNT_MAX: u32 = 1 << 16;

/// Points loaded by each render unit.
pub const POINTS_PER_THREAD: u32 = 80;
/// Points grouped into one batch by the scene builder.
pub const POINTS_PER_BATCH: u32 = RENDER_GROUP_SIZE * POINTS_PER_THREAD;

/// Color of pixels that no point has won, `0x00BBGGRR`.
pub const BACKGROUND_COLOR: u32 = 0x0044_3322;

/// Bounding box colors indexed by the precision level, `0x00BBGGRR`.
pub const SPECTRAL: [u32; 5] = [
    0x00ba_832b,
    0x00a4_ddab,
    0x00bf_ffff,
    0x0061_aefd,
    0x001c_19d7,
];

/// Vertices per bounding box instance, drawn as a line list.
pub const BOUNDING_BOX_VERTEX_COUNT: u32 = 24;

/// Multiplier turning a batch index into a pseudo color.
pub const BATCH_COLOR_FACTOR: u32 = 1_234_567;

/// Strength of the depth contrast shading.
pub const CONTRAST_STRENGTH: f32 = 0.0005;
/// Neighbourhood radius of the depth contrast shading.
pub const CONTRAST_WINDOW: i32 = 1;
/// Scale of depth differences in the contrast shading.
pub const CONTRAST_DEPTH_SCALE: f32 = 300.0;
