use gm_core::{Image, ImageView, Rect};

use crate::TileError;

/// Pixels added on each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Padding {
    fn split(diff: usize) -> (usize, usize) {
        (diff.div_ceil(2), diff / 2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Padded<T> {
    /// Side of the square output.
    pub target: usize,
    pub padding: Padding,
    pub image: Image<T>,
}

/// Smallest `patch + k * step >= max_side` with `k >= 0`.
pub fn padded_size(max_side: usize, patch: usize, step: usize) -> Result<usize, TileError> {
    if patch == 0 || step == 0 {
        return Err(TileError::InvalidGeometry { patch, step });
    }
    let k = max_side.saturating_sub(patch).div_ceil(step);
    Ok(patch + k * step)
}

/// Zero-pads `src` into a square that a `patch`/`step` grid tiles exactly.
pub fn pad<T: Copy + Default>(
    src: &ImageView<'_, T>,
    patch: usize,
    step: usize,
) -> Result<Padded<T>, TileError> {
    let (w, h) = (src.width(), src.height());
    let target = padded_size(w.max(h), patch, step)?;
    let (left, right) = Padding::split(target - w);
    let (top, bottom) = Padding::split(target - h);

    let mut image = Image::new_fill(target, target, T::default());
    for y in 0..h {
        image.row_mut(top + y)[left..left + w].copy_from_slice(src.row(y));
    }

    Ok(Padded {
        target,
        padding: Padding {
            left,
            top,
            right,
            bottom,
        },
        image,
    })
}

/// Removes `padding` from every side.
pub fn unpad<T: Clone>(img: &Image<T>, padding: &Padding) -> Result<Image<T>, TileError> {
    let (w, h) = img.shape();
    let too_large = TileError::PaddingTooLarge {
        padding: *padding,
        width: w,
        height: h,
    };
    let inner_w = w
        .checked_sub(padding.left + padding.right)
        .ok_or(too_large.clone())?;
    let inner_h = h
        .checked_sub(padding.top + padding.bottom)
        .ok_or(too_large)?;
    Ok(img.crop(Rect::new(padding.left, padding.top, inner_w, inner_h))?)
}
