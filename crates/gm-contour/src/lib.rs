//! Closed-contour extraction and shape analysis on binary masks.
//!
//! Borders are traced with Suzuki–Abe border following over 8-connected
//! foreground (value `!= 0`). Contours are closed polygons through pixel
//! centers:
//! - [`RetrievalMode::External`] keeps outermost outer borders only.
//! - [`RetrievalMode::Tree`] keeps every border (outer and hole) with its
//!   parent link.
//!
//! Contours are emitted in raster discovery order, so an enclosing border
//! always precedes the borders nested inside it.
//!
//! Shape descriptors operate on the polygon: area (shoelace), closed arc
//! length, minimum enclosing circle, polygon moments with Hu invariants,
//! I1 shape distance, convex hull and convexity defects.

mod contour;
mod hull;
mod moments;
mod raster;
mod shape;
mod trace;

pub use contour::Contour;
pub use hull::{ConvexityDefect, convex_hull_indices, convexity_defects};
pub use moments::{CentralMoments, Moments};
pub use raster::{contour_mask, fill_contour};
pub use shape::{Circle, match_shapes, match_shapes_hu, min_enclosing_circle};
pub use trace::{ContourSet, Hierarchy, RetrievalMode, find_contours};
