//! Giantin contour validation for multi-channel Golgi crops.
//!
//! ## Pipeline
//! - [`candidate_contours`] turns a stitched probability mask into candidate
//!   contours.
//! - [`evaluate_contour`] cuts a square crop around one candidate and
//!   derives which crop sides lie on the image border.
//! - [`validate_crop`] runs the background subtraction loop on the marker
//!   channel until exactly one ring-like (or convincingly open) contour
//!   remains, then checks every companion channel against it.
//!
//! ## Subtraction State
//! Each channel owns a cumulative background floor. The floor is applied at
//! the start of every crop and raised whenever a channel needs more
//! subtraction; [`SubtractionState`] is returned by value so a caller can
//! thread it through a stream of crops ([`evaluate_candidates`]).
//!
//! ## Escalation
//! Every subtraction loop is bounded by
//! [`ValidationConfig::max_subtraction_rounds`]. The size of each step comes
//! from an [`EscalationPolicy`]; [`MinPositiveFloor`] steps to the dimmest
//! remaining pixel.

mod config;
mod crop;
mod state;
mod templates;
mod validate;
mod verdict;

pub use config::{CropConfig, ValidationConfig};
pub use crop::{
    CropEvaluation, CropReport, candidate_contours, crop_window, evaluate_candidates,
    evaluate_contour,
};
pub use state::{EscalationPolicy, MinPositiveFloor, SubtractionState};
pub use templates::{CIRCLE_TEMPLATE, ELLIPSE_TEMPLATE};
pub use validate::{EdgeFlags, validate_crop};
pub use verdict::{RejectReason, ValidationResult, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GolgiError {
    #[error("probability mask is {actual:?}, expected {expected:?}")]
    MaskShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("subtraction state has {actual} floors for {expected} channels")]
    StateLength { expected: usize, actual: usize },
    #[error("marker channel {channel} is also the ignored channel")]
    MarkerIgnored { channel: usize },
    #[error(transparent)]
    Image(#[from] gm_core::Error),
}
