use gm_core::{Image, ImageView};

/// Lowers every pixel by `amount`, saturating at zero.
pub fn subtract_floor(img: &mut Image<u16>, amount: u32) {
    if amount == 0 {
        return;
    }
    let amount = u16::try_from(amount).unwrap_or(u16::MAX);
    for px in img.data_mut() {
        *px = px.saturating_sub(amount);
    }
}

/// Smallest strictly positive intensity, if any.
pub fn min_positive(img: &ImageView<'_, u16>) -> Option<u16> {
    (0..img.height())
        .flat_map(|y| img.row(y).iter().copied())
        .filter(|&v| v > 0)
        .min()
}
