//! Tiling utilities around a fixed-input segmentation model.
//!
//! Images are zero-padded to the smallest square side `patch + k * step`
//! (`k >= 0`) that covers the longer axis, cut into a regular grid of
//! `patch x patch` tiles every `step` pixels, and model outputs are merged
//! back with a per-pixel maximum wherever tiles overlap.
//!
//! Grid conventions:
//! - Patches are stored row-major: index `row * cols + col`.
//! - Patch `(row, col)` covers `x in col*step..col*step+patch` and
//!   `y in row*step..row*step+patch`.
//! - An odd padding difference puts the extra pixel on the leading
//!   (top / left) edge.

mod grid;
mod pad;

pub use grid::{PatchGrid, clear_edge_rois, extract_patches, predictions_to_mask, stitch};
pub use pad::{Padded, Padding, pad, padded_size, unpad};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TileError {
    #[error("patch size and step must be positive (patch {patch}, step {step})")]
    InvalidGeometry { patch: usize, step: usize },
    #[error("patch of {patch} px does not fit an image of {width}x{height}")]
    PatchLargerThanImage {
        patch: usize,
        width: usize,
        height: usize,
    },
    #[error("{count} patches do not form a square grid")]
    NotSquare { count: usize },
    #[error("patch {index} is {actual:?}, expected {expected:?}")]
    PatchShape {
        index: usize,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    #[error("padding {padding:?} exceeds image of {width}x{height}")]
    PaddingTooLarge {
        padding: Padding,
        width: usize,
        height: usize,
    },
    #[error(transparent)]
    Image(#[from] gm_core::Error),
}
