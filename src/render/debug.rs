//! Debug counters and the bounding box overlay buffer.

use crate::preset::render::BOUNDING_BOX_VERTEX_COUNT;
use bytemuck::{Pod, Zeroable};
use std::sync::{
    atomic::{AtomicU32, AtomicU64, Ordering},
    OnceLock,
};

/// Frame statistics shared by both passes.
///
/// The host owns the counters, resets them at frame start and reads them
/// after the resolve pass. Counting is a no-op unless enabled.
#[derive(Debug, Default)]
pub struct DebugCounters {
    enabled: bool,
    batches_processed: AtomicU64,
    batches_rendered: AtomicU64,
    points_processed: AtomicU64,
    points_rendered: AtomicU64,
    points_visible: AtomicU64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Counter {
    /// Batches reaching the render kernel.
    BatchesProcessed,
    /// Batches passing the frustum culling.
    BatchesRendered,
    /// Points loaded and decoded.
    PointsProcessed,
    /// Points winning the depth test when written.
    PointsRendered,
    /// Pixels resolved to a point.
    PointsVisible,
}

/// The values of [`DebugCounters`] at one moment.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DebugSnapshot {
    pub batches_processed: u64,
    pub batches_rendered: u64,
    pub points_processed: u64,
    pub points_rendered: u64,
    pub points_visible: u64,
}

/// The arguments of an indirect draw of the bounding boxes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Pod, Zeroable)]
pub struct DrawIndirectArgs {
    /// Vertices per instance.
    pub count: u32,
    pub instance_count: u32,
    pub first: u32,
    pub base_instance: u32,
}

/// A box of a rendered batch in world space.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BoundingBox {
    /// Center, `w` is unused.
    pub position: [f32; 4],
    /// Extent, `w` is unused.
    pub size: [f32; 4],
    /// `0x00BBGGRR`
    pub color: u32,
    pub padding: [u32; 3],
}

/// An append-only buffer of bounding boxes.
#[derive(Debug)]
pub struct BoundingBoxes {
    count: AtomicU32,
    instance_count: AtomicU32,
    boxes: Vec<OnceLock<BoundingBox>>,
}

impl DebugCounters {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(
        &mut self,
        enabled: bool,
    ) {
        self.enabled = enabled;
    }

    #[inline]
    fn counter(
        &self,
        counter: Counter,
    ) -> &AtomicU64 {
        match counter {
            Counter::BatchesProcessed => &self.batches_processed,
            Counter::BatchesRendered => &self.batches_rendered,
            Counter::PointsProcessed => &self.points_processed,
            Counter::PointsRendered => &self.points_rendered,
            Counter::PointsVisible => &self.points_visible,
        }
    }

    /// Increments `counter` by one if enabled.
    #[inline]
    pub fn count(
        &self,
        counter: Counter,
    ) {
        if self.enabled {
            self.counter(counter).fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn reset(&mut self) {
        for counter in [
            &mut self.batches_processed,
            &mut self.batches_rendered,
            &mut self.points_processed,
            &mut self.points_rendered,
            &mut self.points_visible,
        ] {
            *counter.get_mut() = 0;
        }
    }

    pub fn snapshot(&self) -> DebugSnapshot {
        let load = |counter| self.counter(counter).load(Ordering::Relaxed);
        DebugSnapshot {
            batches_processed: load(Counter::BatchesProcessed),
            batches_rendered: load(Counter::BatchesRendered),
            points_processed: load(Counter::PointsProcessed),
            points_rendered: load(Counter::PointsRendered),
            points_visible: load(Counter::PointsVisible),
        }
    }
}

impl BoundingBoxes {
    /// An empty buffer holding up to `capacity` boxes.
    pub fn new(capacity: usize) -> Self {
        Self {
            count: AtomicU32::new(0),
            instance_count: AtomicU32::new(0),
            boxes: (0..capacity).map(|_| OnceLock::new()).collect(),
        }
    }

    /// Appends `bounding_box` and returns its instance index.
    ///
    /// Returns `None` when the buffer is full.
    pub fn push(
        &self,
        bounding_box: BoundingBox,
    ) -> Option<u32> {
        let index = self.instance_count.fetch_add(1, Ordering::Relaxed);
        self.count
            .store(BOUNDING_BOX_VERTEX_COUNT, Ordering::Relaxed);

        let slot = self.boxes.get(index as usize)?;
        slot.set(bounding_box).ok()?;
        Some(index)
    }

    /// The draw header. The instance count never exceeds the capacity.
    pub fn args(&self) -> DrawIndirectArgs {
        DrawIndirectArgs {
            count: self.count.load(Ordering::Relaxed),
            instance_count: self
                .instance_count
                .load(Ordering::Relaxed)
                .min(self.boxes.len() as u32),
            first: 0,
            base_instance: 0,
        }
    }

    /// Takes the draw header and the appended boxes in instance order.
    pub fn into_parts(self) -> (DrawIndirectArgs, Vec<BoundingBox>) {
        let args = self.args();
        let boxes = self
            .boxes
            .into_iter()
            .take(args.instance_count as usize)
            .filter_map(OnceLock::into_inner)
            .collect();
        (args, boxes)
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn counters_disabled_by_default() {
        use super::*;

        let counters = DebugCounters::default();
        counters.count(Counter::PointsProcessed);
        assert_eq!(counters.snapshot(), DebugSnapshot::default());
    }

    #[test]
    fn counters_count_and_reset() {
        use super::*;
        use rayon::prelude::*;

        let mut counters = DebugCounters::new(true);
        (0..1000).into_par_iter().for_each(|_| {
            counters.count(Counter::PointsProcessed);
        });
        counters.count(Counter::BatchesRendered);

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.points_processed, 1000);
        assert_eq!(snapshot.batches_rendered, 1);
        assert_eq!(snapshot.points_visible, 0);

        counters.reset();
        assert_eq!(counters.snapshot(), DebugSnapshot::default());
        assert!(counters.is_enabled());
    }

    #[test]
    fn bounding_boxes_append() {
        use super::*;

        let boxes = BoundingBoxes::new(2);
        assert_eq!(boxes.args(), DrawIndirectArgs::default());

        let first = BoundingBox {
            color: 1,
            ..Default::default()
        };
        let second = BoundingBox {
            color: 2,
            ..Default::default()
        };
        assert_eq!(boxes.push(first), Some(0));
        assert_eq!(boxes.push(second), Some(1));
        assert_eq!(boxes.push(first), None);

        let (args, records) = boxes.into_parts();
        assert_eq!(
            args,
            DrawIndirectArgs {
                count: BOUNDING_BOX_VERTEX_COUNT,
                instance_count: 2,
                first: 0,
                base_instance: 0,
            }
        );
        assert_eq!(records, [first, second]);
    }

    #[test]
    fn record_layouts() {
        use super::*;

        assert_eq!(std::mem::size_of::<DrawIndirectArgs>(), 16);
        assert_eq!(std::mem::size_of::<BoundingBox>(), 48);
    }
}
