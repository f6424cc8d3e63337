use serde::{Deserialize, Serialize};

/// Parameters of [`crate::validate_crop`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Channel carrying the giantin marker.
    pub marker_channel: usize,
    /// Channel skipped entirely (no subtraction, no checks).
    pub ignored_channel: Option<usize>,
    /// Marker contours with area at or below this are discarded.
    pub min_marker_area: f64,
    /// Minimum mean model probability inside the marker contour.
    pub probability_threshold: f64,
    /// Require every companion channel to overlap the marker signal.
    pub channels_overlap: bool,
    /// Cap on background subtraction rounds per channel.
    pub max_subtraction_rounds: usize,
    /// Lower bound of one escalation step.
    pub min_subtraction_step: u32,
    /// Perimeter over enclosing-circle circumference at which a marker is
    /// taken as-is without looking for its inner hole.
    pub roundness_ratio: f64,
    /// Minimum hole area over outer area of a ring-shaped marker.
    pub min_hole_ratio: f64,
    /// Largest accepted I1 distance to the circle or ellipse template.
    pub max_template_distance: f64,
    /// Largest tolerated convexity defect depth, 8.8 fixed point.
    pub max_defect_depth: i64,
    /// Nested contours beyond the ring itself may not exceed this area.
    pub max_residual_area: f64,
    /// Companion contours at or below this fraction of the largest one are
    /// discarded.
    pub companion_area_fraction: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            marker_channel: 0,
            ignored_channel: None,
            min_marker_area: 200.0,
            probability_threshold: 0.5,
            channels_overlap: true,
            max_subtraction_rounds: 256,
            min_subtraction_step: 50,
            roundness_ratio: 1.05,
            min_hole_ratio: 0.06,
            max_template_distance: 0.1,
            max_defect_depth: 500,
            max_residual_area: 50.0,
            companion_area_fraction: 0.2,
        }
    }
}

/// Parameters of [`crate::evaluate_contour`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Minimum side of the square crop around a candidate.
    pub rect_size: usize,
    pub validation: ValidationConfig,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            rect_size: 40,
            validation: ValidationConfig::default(),
        }
    }
}
