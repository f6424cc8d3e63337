use gm_core::{Image, ImageView};

#[inline]
pub fn compress_to_u8(v: u16) -> u8 {
    let v = u32::from(v);
    (v * 255 / (v + 1)) as u8
}

pub fn histogram_u8(values: impl IntoIterator<Item = u8>) -> [u32; 256] {
    let mut hist = [0u32; 256];
    for v in values {
        hist[v as usize] += 1;
    }
    hist
}

/// Otsu level maximizing between-class variance.
///
/// Ties keep the lowest level. Histograms with a single populated bin (or no
/// samples) return `0`.
pub fn otsu_level(hist: &[u32; 256]) -> u8 {
    let total: u64 = hist.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0;
    }

    let scale = 1.0 / total as f64;
    let mu: f64 = hist
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * f64::from(c))
        .sum::<f64>()
        * scale;

    let eps = f64::from(f32::EPSILON);
    let mut q1 = 0.0f64;
    let mut mu1 = 0.0f64;
    let mut max_sigma = 0.0f64;
    let mut max_val = 0u8;

    for (i, &count) in hist.iter().enumerate() {
        let p_i = f64::from(count) * scale;
        mu1 *= q1;
        q1 += p_i;
        let q2 = 1.0 - q1;

        if q1.min(q2) < eps || q1.max(q2) > 1.0 - eps {
            continue;
        }

        mu1 = (mu1 + i as f64 * p_i) / q1;
        let mu2 = (mu - q1 * mu1) / q2;
        let sigma = q1 * q2 * (mu1 - mu2) * (mu1 - mu2);
        if sigma > max_sigma {
            max_sigma = sigma;
            max_val = i as u8;
        }
    }

    max_val
}

/// Compresses `src` to `u8`, selects the Otsu level and binarizes with
/// `compressed > level`.
pub fn binarize_otsu(src: &ImageView<'_, u16>) -> Image<u8> {
    let mut compressed = Vec::with_capacity(src.width() * src.height());
    for y in 0..src.height() {
        compressed.extend(src.row(y).iter().map(|&v| compress_to_u8(v)));
    }

    let level = otsu_level(&histogram_u8(compressed.iter().copied()));
    let data = compressed.iter().map(|&v| u8::from(v > level)).collect();
    Image::from_vec(src.width(), src.height(), data).expect("dimensions taken from the source view")
}
