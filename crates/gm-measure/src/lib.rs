//! Geometric and radiometric descriptors of an accepted Golgi crop.
//!
//! All functions are pure numeric passes over `u16` intensity images:
//! - [`center_of_mass`] and [`gyradius`] round to 4 decimals and fail with
//!   [`MeasureError::ZeroMass`] instead of producing NaN.
//! - [`recenter_and_pad`] brings a crop onto a fixed square canvas with the
//!   marker centroid at a fixed coordinate.
//! - [`radial_intensity_profile`] bins pixels by `floor(distance)` from a
//!   fixed center, and [`estimate_radius`] reads a FWHM radius off a profile.
//!
//! [`describe`] chains these in the order used after a crop is accepted.

mod describe;
mod mass;
mod normalize;
mod profile;
mod recenter;

pub use describe::{DescribeConfig, GolgiDescriptors, describe};
pub use mass::{center_of_mass, gyradius};
pub use normalize::{normalize_stack_intensity, normalize_total_intensity};
pub use profile::{
    RadialBucket, RadialProfile, RadialProfileConfig, estimate_radius, radial_intensity_profile,
    radial_profile,
};
pub use recenter::{RecenterConfig, Recentered, recenter_and_pad};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("total intensity (m00) is zero")]
    ZeroMass,
    #[error("cropping {width}x{height} to {border_size} would discard non-zero intensity")]
    NoValidTransform {
        width: usize,
        height: usize,
        border_size: usize,
    },
    #[error("marker channel {channel} has no foreground contour")]
    NoMarkerContour { channel: usize },
    #[error(transparent)]
    Image(#[from] gm_core::Error),
}

pub(crate) fn round4(v: f64) -> f64 {
    (v * 1e4).round() / 1e4
}
