use crate::image::ImageView;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BorderMode {
    Constant(f64),
    Clamp,
}

/// Bilinear sample at pixel-center coordinates `(x, y)`.
///
/// Empty images always yield the constant (or `0.0` when clamping).
pub fn sample_bilinear<T: Copy + Into<f64>>(
    img: &ImageView<'_, T>,
    x: f64,
    y: f64,
    border: BorderMode,
) -> f64 {
    if img.width() == 0 || img.height() == 0 {
        return match border {
            BorderMode::Constant(v) => v,
            BorderMode::Clamp => 0.0,
        };
    }

    let x0 = x.floor() as isize;
    let y0 = y.floor() as isize;
    let dx = x - x0 as f64;
    let dy = y - y0 as f64;

    let p00 = sample_at(img, x0, y0, border);
    let p10 = sample_at(img, x0 + 1, y0, border);
    let p01 = sample_at(img, x0, y0 + 1, border);
    let p11 = sample_at(img, x0 + 1, y0 + 1, border);

    let top = p00 * (1.0 - dx) + p10 * dx;
    let bottom = p01 * (1.0 - dx) + p11 * dx;
    top * (1.0 - dy) + bottom * dy
}

fn sample_at<T: Copy + Into<f64>>(
    img: &ImageView<'_, T>,
    x: isize,
    y: isize,
    border: BorderMode,
) -> f64 {
    let inside = x >= 0 && y >= 0 && (x as usize) < img.width() && (y as usize) < img.height();
    match border {
        BorderMode::Constant(c) if !inside => c,
        BorderMode::Constant(_) => img
            .get(x as usize, y as usize)
            .map_or(0.0, |&v| v.into()),
        BorderMode::Clamp => {
            let xi = x.clamp(0, img.width() as isize - 1) as usize;
            let yi = y.clamp(0, img.height() as isize - 1) as usize;
            img.get(xi, yi).map_or(0.0, |&v| v.into())
        }
    }
}
