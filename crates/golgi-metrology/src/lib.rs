//! Umbrella crate for the golgi-metrology workspace.
//!
//! Re-exports the image containers and the validation and measurement
//! entry points at the top level. Lower-level building blocks stay behind
//! their crate names.

pub use gm_core::*;
pub use gm_golgi::*;
pub use gm_measure::*;

pub use gm_contour as contour;
pub use gm_morph as morph;
pub use gm_threshold as threshold;
pub use gm_tile as tile;
