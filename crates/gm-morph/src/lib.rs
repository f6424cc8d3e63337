//! Minimal binary morphology helpers.
//!
//! Pixels are treated as binary with threshold `> 0`.
//! Outputs are `0` or `1` in `u8`. Out-of-image neighbors count as background.

use gm_core::{Image, ImageView};

/// 3x3 square dilation.
pub fn dilate3x3_binary_u8(src: &ImageView<'_, u8>) -> Image<u8> {
    let (w, h) = (src.width(), src.height());
    let mut out = Image::new_fill(w, h, 0u8);
    if w == 0 || h == 0 {
        return out;
    }

    for y in 0..h {
        let row = src.row(y);
        for (x, &v) in row.iter().enumerate() {
            if v == 0 {
                continue;
            }
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                let dst = out.row_mut(ny);
                for slot in &mut dst[x.saturating_sub(1)..=(x + 1).min(w - 1)] {
                    *slot = 1;
                }
            }
        }
    }

    out
}

/// Product of `mask` and `intensity`, summed over the image.
///
/// Used to test whether a foreground region overlaps signal in another
/// channel. Returns `None` when the shapes differ.
pub fn masked_sum(mask: &ImageView<'_, u8>, intensity: &ImageView<'_, u16>) -> Option<u64> {
    if mask.width() != intensity.width() || mask.height() != intensity.height() {
        return None;
    }

    let mut sum = 0u64;
    for y in 0..mask.height() {
        for (&m, &v) in mask.row(y).iter().zip(intensity.row(y)) {
            if m != 0 {
                sum += u64::from(v);
            }
        }
    }
    Some(sum)
}
