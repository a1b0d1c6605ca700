//! A compute device running work-groups on the host.
//!
//! Launches follow the GPU dispatch model: a kernel declares its
//! [`CubeDim`], the caller chooses a [`CubeCount`], and every cube runs
//! independently on a rayon worker. Units of one cube run in ascending
//! order on the same worker, so state shared by a whole cube may be kept
//! in locals. Anything shared across cubes must go through atomics.

pub use crate::error::Error;

use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// The size of a work-group.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct CubeDim {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// The count of work-groups in a launch.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CubeCount {
    Static(u32, u32, u32),
}

/// The position of a work-group in a launch.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct CubePosition {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// The position of a unit inside its work-group.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct UnitPosition {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

/// A compute kernel.
pub trait Kernel: Sync {
    /// The work-group size.
    fn cube_dim(&self) -> CubeDim;

    /// Runs every unit of the work-group at `cube`.
    fn cube(
        &self,
        cube: CubePosition,
    );
}

/// A handle to the compute device.
#[derive(Clone, Debug, Default)]
pub struct ComputeClient {
    pool: Option<Arc<ThreadPool>>,
}

impl CubeDim {
    /// `x * y * z`
    #[inline]
    pub const fn unit_count(&self) -> u32 {
        self.x * self.y * self.z
    }

    /// Iterates over the units in row-major order, `x` varying fastest.
    pub fn units(&self) -> impl Iterator<Item = UnitPosition> {
        let Self { x, y, z } = *self;
        (0..z).flat_map(move |uz| {
            (0..y).flat_map(move |uy| {
                (0..x).map(move |ux| UnitPosition {
                    x: ux,
                    y: uy,
                    z: uz,
                })
            })
        })
    }
}

impl CubeCount {
    /// `x * y * z`
    #[inline]
    pub const fn cube_count(&self) -> u64 {
        let Self::Static(x, y, z) = *self;
        x as u64 * y as u64 * z as u64
    }

    /// Returns the position of the `index`-th cube, `x` varying fastest.
    #[inline]
    pub const fn position(
        &self,
        index: u64,
    ) -> CubePosition {
        let Self::Static(x, y, _) = *self;
        let (x, y) = (x as u64, y as u64);
        CubePosition {
            x: (index % x) as u32,
            y: (index / x % y) as u32,
            z: (index / (x * y)) as u32,
        }
    }
}

impl ComputeClient {
    /// Runs on the global rayon thread pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs on a dedicated pool of `thread_count` workers.
    pub fn with_thread_count(thread_count: usize) -> Result<Self, Error> {
        if thread_count == 0 {
            return Err(Error::Validation(
                "thread_count".into(),
                "greater than 0".into(),
            ));
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|index| format!("gigapoint-worker-{index}"))
            .build()?;

        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    /// The count of workers executing cubes.
    pub fn thread_count(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    /// Launches `kernel` and blocks until every cube has completed.
    ///
    /// Writes made by the launch are visible to the caller and to any
    /// later launch.
    pub fn execute<K: Kernel>(
        &self,
        kernel: &K,
        count: CubeCount,
    ) {
        let run = || {
            (0..count.cube_count())
                .into_par_iter()
                .for_each(|index| kernel.cube(count.position(index)));
        };

        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}
