//! Global thresholding for 16-bit fluorescence channels.
//!
//! Intensities are first compressed into `u8` with the saturating map
//! `v -> floor(255 * v / (v + 1))`, so every non-zero pixel lands in the upper
//! half of the range and dim signal is not swallowed by a few hot pixels.
//! The Otsu level is then selected on the 256-bin histogram of the compressed
//! values and pixels strictly above it become foreground.
//!
//! Binary outputs hold `0` (background) or `1` (foreground).

mod floor;
mod otsu;

pub use floor::{min_positive, subtract_floor};
pub use otsu::{binarize_otsu, compress_to_u8, histogram_u8, otsu_level};
