use gm_contour::{Contour, Moments};
use gm_core::ImageView;

use crate::{MeasureError, round4};

/// Centroid `(x, y)` of `region`, or of the polygon when `contour` is given.
pub fn center_of_mass(
    region: &ImageView<'_, u16>,
    contour: Option<&Contour>,
) -> Result<(f64, f64), MeasureError> {
    let m = match contour {
        Some(c) => Moments::from_polygon(&c.points),
        None => Moments::from_image(region),
    };
    let c = m.centroid().ok_or(MeasureError::ZeroMass)?;
    Ok((round4(c.x), round4(c.y)))
}

/// Intensity-weighted RMS distance of `region` from `(mx, my)`.
pub fn gyradius(region: &ImageView<'_, u16>, mx: f64, my: f64) -> Result<f64, MeasureError> {
    let mut total = 0.0f64;
    let mut q = 0.0f64;
    for y in 0..region.height() {
        let dy2 = (y as f64 - my).powi(2);
        for (x, &v) in region.row(y).iter().enumerate() {
            if v == 0 {
                continue;
            }
            let v = f64::from(v);
            total += v;
            q += (dy2 + (x as f64 - mx).powi(2)) * v;
        }
    }

    if total == 0.0 {
        return Err(MeasureError::ZeroMass);
    }
    Ok(round4((q / total).sqrt()))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use gm_contour::{RetrievalMode, find_contours};
    use gm_core::Image;

    use super::{center_of_mass, gyradius};
    use crate::MeasureError;

    fn disk(size: usize, cx: f64, cy: f64, r: f64, value: u16) -> Image<u16> {
        let mut img = Image::new_fill(size, size, 0u16);
        for y in 0..size {
            for x in 0..size {
                if (x as f64 - cx).hypot(y as f64 - cy) <= r {
                    *img.get_mut(x, y).expect("in bounds") = value;
                }
            }
        }
        img
    }

    #[test]
    fn disk_center_of_mass_from_intensity_and_contour() {
        let img = disk(48, 21.0, 26.0, 10.0, 700);
        let (mx, my) = center_of_mass(&img.as_view(), None).expect("non-zero mass");
        assert_abs_diff_eq!(mx, 21.0, epsilon = 1e-4);
        assert_abs_diff_eq!(my, 26.0, epsilon = 1e-4);

        let binary = img.map(|&v| u8::from(v > 0));
        let set = find_contours(&binary.as_view(), RetrievalMode::External);
        let (px, py) =
            center_of_mass(&img.as_view(), Some(&set.contours[0])).expect("non-degenerate");
        assert_abs_diff_eq!(px, 21.0, epsilon = 1e-4);
        assert_abs_diff_eq!(py, 26.0, epsilon = 1e-4);
    }

    #[test]
    fn uniform_disk_gyradius_is_radius_over_sqrt2() {
        for (size, c, r) in [(41, 20.0, 10.0), (61, 30.0, 20.0)] {
            let img = disk(size, c, c, r, 1);
            let (mx, my) = center_of_mass(&img.as_view(), None).expect("non-zero mass");
            let g = gyradius(&img.as_view(), mx, my).expect("non-zero mass");
            assert_abs_diff_eq!(g, r / 2f64.sqrt(), epsilon = 0.1);
        }
    }

    #[test]
    fn zero_mass_is_an_error() {
        let img = Image::new_fill(8, 8, 0u16);
        assert_eq!(
            center_of_mass(&img.as_view(), None),
            Err(MeasureError::ZeroMass)
        );
        assert_eq!(
            gyradius(&img.as_view(), 4.0, 4.0),
            Err(MeasureError::ZeroMass)
        );
    }

    #[test]
    fn results_are_rounded_to_four_decimals() {
        let mut img = Image::new_fill(3, 1, 0u16);
        *img.get_mut(0, 0).expect("in bounds") = 2;
        *img.get_mut(1, 0).expect("in bounds") = 1;
        let (mx, _) = center_of_mass(&img.as_view(), None).expect("non-zero mass");
        assert_eq!(mx, 0.3333);
    }
}
