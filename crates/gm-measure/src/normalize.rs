use gm_core::{ChannelStack, Image};

/// Rescales `img` so its summed intensity becomes `target`.
///
/// Values are rounded half-to-even and saturate at `u16::MAX`. An image with
/// zero total intensity is returned unchanged.
pub fn normalize_total_intensity(img: &Image<u16>, target: f64) -> Image<u16> {
    let total: u64 = img.data().iter().map(|&v| u64::from(v)).sum();
    if total == 0 {
        return img.clone();
    }
    let ratio = target / total as f64;
    img.map(|&v| (f64::from(v) * ratio).round_ties_even() as u16)
}

/// [`normalize_total_intensity`] applied to each channel independently.
pub fn normalize_stack_intensity(stack: &ChannelStack<u16>, target: f64) -> ChannelStack<u16> {
    let channels = stack
        .channels()
        .iter()
        .map(|c| normalize_total_intensity(c, target))
        .collect();
    ChannelStack::from_channels(channels).expect("normalization preserves channel shapes")
}
