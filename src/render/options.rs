//! Render options.

pub use crate::error::Error;

use crate::preset::render::{POINTS_PER_THREAD, RENDER_GROUP_SIZE};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// How the units of a render work-group walk the points of a batch.
///
/// Every pattern visits the same points, only the memory access order
/// differs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum AccessPattern {
    /// Iteration `i` of unit `u` loads point `i * G + u`.
    #[default]
    Strided,
    /// Each unit loads `roll` consecutive points before jumping by `roll * G`.
    ///
    /// `roll` should divide `points_per_thread`.
    Consecutive { roll: u32 },
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Iterations of each render unit. Batches larger than
    /// `points_per_thread * 128` are truncated.
    pub points_per_thread: u32,
    pub access_pattern: AccessPattern,
    /// Skips batches outside the view frustum.
    pub frustum_culling: bool,
    /// Collects the boxes of rendered batches.
    pub bounding_boxes: bool,
    /// Colors every point by the batch it belongs to.
    pub colorize_batches: bool,
    /// Colors every pixel by the count of points projected onto it.
    pub colorize_overdraw: bool,
    /// Darkens pixels at depth discontinuities.
    pub contrast_shading: bool,
    /// Counts processed and rendered batches and points.
    pub debug_counters: bool,
}

impl RenderOptions {
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str::<Self>(json)?.validated()
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validated(self) -> Result<Self, Error> {
        if self.points_per_thread == 0 {
            return Err(Error::Validation(
                "points_per_thread".into(),
                "greater than 0".into(),
            ));
        }
        if self.points_per_thread > u32::MAX / RENDER_GROUP_SIZE {
            return Err(Error::Validation(
                format!("points_per_thread ({})", self.points_per_thread),
                format!("no more than {}", u32::MAX / RENDER_GROUP_SIZE),
            ));
        }
        if let AccessPattern::Consecutive { roll } = self.access_pattern {
            if roll == 0 || self.points_per_thread % roll != 0 {
                return Err(Error::Validation(
                    format!("access_pattern.roll ({roll})"),
                    format!(
                        "a divisor of points_per_thread ({})",
                        self.points_per_thread
                    ),
                ));
            }
        }
        Ok(self)
    }

    pub fn with_points_per_thread(
        mut self,
        points_per_thread: u32,
    ) -> Self {
        self.points_per_thread = points_per_thread;
        self
    }

    pub fn with_access_pattern(
        mut self,
        access_pattern: AccessPattern,
    ) -> Self {
        self.access_pattern = access_pattern;
        self
    }

    pub fn with_frustum_culling(
        mut self,
        frustum_culling: bool,
    ) -> Self {
        self.frustum_culling = frustum_culling;
        self
    }

    pub fn with_bounding_boxes(
        mut self,
        bounding_boxes: bool,
    ) -> Self {
        self.bounding_boxes = bounding_boxes;
        self
    }

    pub fn with_colorize_batches(
        mut self,
        colorize_batches: bool,
    ) -> Self {
        self.colorize_batches = colorize_batches;
        self
    }

    pub fn with_colorize_overdraw(
        mut self,
        colorize_overdraw: bool,
    ) -> Self {
        self.colorize_overdraw = colorize_overdraw;
        self
    }

    pub fn with_contrast_shading(
        mut self,
        contrast_shading: bool,
    ) -> Self {
        self.contrast_shading = contrast_shading;
        self
    }

    pub fn with_debug_counters(
        mut self,
        debug_counters: bool,
    ) -> Self {
        self.debug_counters = debug_counters;
        self
    }
}

impl Default for RenderOptions {
    #[inline]
    fn default() -> Self {
        Self {
            points_per_thread: POINTS_PER_THREAD,
            access_pattern: Default::default(),
            frustum_culling: true,
            bounding_boxes: false,
            colorize_batches: false,
            colorize_overdraw: false,
            contrast_shading: false,
            debug_counters: false,
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn from_json_str_defaults() {
        use super::*;

        let options = RenderOptions::from_json_str("{}").unwrap();
        assert_eq!(options, RenderOptions::default());

        let options = RenderOptions::from_json_str(
            r#"{
                "points_per_thread": 16,
                "access_pattern": { "kind": "consecutive", "roll": 4 },
                "contrast_shading": true
            }"#,
        )
        .unwrap();
        assert_eq!(options.points_per_thread, 16);
        assert_eq!(options.access_pattern, AccessPattern::Consecutive { roll: 4 });
        assert!(options.contrast_shading);
        assert!(options.frustum_culling);
    }

    #[test]
    fn from_json_str_invalid() {
        use super::*;

        let result = RenderOptions::from_json_str(r#"{ "points_per_thread": 0 }"#);
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = RenderOptions::from_json_str(
            r#"{ "access_pattern": { "kind": "consecutive", "roll": 0 } }"#,
        );
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = RenderOptions::from_json_str(
            r#"{
                "points_per_thread": 10,
                "access_pattern": { "kind": "consecutive", "roll": 4 }
            }"#,
        );
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = RenderOptions::from_json_str(r#"{ "points_per_thread": 4294967295 }"#);
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = RenderOptions::from_json_str("[");
        assert!(matches!(result, Err(Error::Json(..))));
    }

    #[test]
    fn json_round_trip() {
        use super::*;

        let options = RenderOptions::default()
            .with_access_pattern(AccessPattern::Consecutive { roll: 2 })
            .with_bounding_boxes(true)
            .with_debug_counters(true);
        let json = options.to_json_string().unwrap();
        assert_eq!(RenderOptions::from_json_str(&json).unwrap(), options);
    }
}
