//! The per-pixel nearest point accumulator.
//!
//! Each pixel holds one 64-bit entry:
//!
//! ```plaintext
//! [depth bits (32) | payload (32)]
//! ```
//!
//! The bits of a non-negative float are ordered like the float itself, so
//! the integer minimum of the entries is the nearest depth, ties going to
//! the smaller payload. Entries only ever decrease through an atomic
//! minimum, which makes the winner independent of the write order.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// The entry of a pixel that no point has won.
pub const CLEARED: u64 = u64::MAX;

#[derive(Debug)]
pub struct Accumulator {
    entries: Vec<AtomicU64>,
    overdraws: Option<Vec<AtomicU32>>,
    image_width: u32,
    image_height: u32,
}

/// Packs a non-negative `depth` and a `payload` into an entry.
#[inline]
pub fn pack(
    depth: f32,
    payload: u32,
) -> u64 {
    debug_assert!(depth >= 0.0, "depth should be non-negative: {depth}");
    (depth.to_bits() as u64) << 32 | payload as u64
}

/// Unpacks an entry into `(depth, payload)`.
#[inline]
pub fn unpack(entry: u64) -> (f32, u32) {
    (f32::from_bits((entry >> 32) as u32), entry as u32)
}

impl Accumulator {
    /// A cleared accumulator of `I_x * I_y` entries.
    ///
    /// With `overdraw`, it also counts the points projected onto each pixel.
    pub fn new(
        image_width: u32,
        image_height: u32,
        overdraw: bool,
    ) -> Self {
        let pixel_count = image_width as usize * image_height as usize;
        Self {
            entries: (0..pixel_count).map(|_| AtomicU64::new(CLEARED)).collect(),
            overdraws: overdraw
                .then(|| (0..pixel_count).map(|_| AtomicU32::new(0)).collect()),
            image_width,
            image_height,
        }
    }

    /// Resets every entry to [`CLEARED`] and every overdraw count to `0`.
    pub fn clear(&mut self) {
        self.entries
            .iter_mut()
            .for_each(|entry| *entry.get_mut() = CLEARED);
        if let Some(overdraws) = &mut self.overdraws {
            overdraws.iter_mut().for_each(|count| *count.get_mut() = 0);
        }
    }

    /// Atomically keeps the minimum of the entry at `pixel` and `value`.
    ///
    /// Returns `true` if `value` is less than the previous entry.
    #[inline]
    pub fn depth_test(
        &self,
        pixel: usize,
        value: u64,
    ) -> bool {
        if let Some(overdraws) = &self.overdraws {
            overdraws[pixel].fetch_add(1, Ordering::Relaxed);
        }
        value < self.entries[pixel].fetch_min(value, Ordering::Relaxed)
    }

    #[inline]
    pub fn entry(
        &self,
        pixel: usize,
    ) -> u64 {
        self.entries[pixel].load(Ordering::Relaxed)
    }

    /// The depth at `pixel`, `None` if no point has won it.
    #[inline]
    pub fn depth(
        &self,
        pixel: usize,
    ) -> Option<f32> {
        match self.entry(pixel) {
            CLEARED => None,
            entry => Some(unpack(entry).0),
        }
    }

    /// The count of points projected onto `pixel`, `None` without overdraw
    /// counting.
    #[inline]
    pub fn overdraw(
        &self,
        pixel: usize,
    ) -> Option<u32> {
        self.overdraws
            .as_ref()
            .map(|overdraws| overdraws[pixel].load(Ordering::Relaxed))
    }

    #[inline]
    pub fn has_overdraw(&self) -> bool {
        self.overdraws.is_some()
    }

    /// Copies the entries in row-major order.
    pub fn to_entries(&self) -> Vec<u64> {
        self.entries
            .iter()
            .map(|entry| entry.load(Ordering::Relaxed))
            .collect()
    }

    /// `I_x`
    #[inline]
    pub const fn image_width(&self) -> u32 {
        self.image_width
    }

    /// `I_y`
    #[inline]
    pub const fn image_height(&self) -> u32 {
        self.image_height
    }

    /// `I_x * I_y`
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
