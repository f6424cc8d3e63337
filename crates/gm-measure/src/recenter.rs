use gm_contour::{RetrievalMode, find_contours};
use gm_core::{BorderMode, ChannelStack, Image, Rect, sample_bilinear};
use gm_threshold::binarize_otsu;
use serde::{Deserialize, Serialize};

use crate::{MeasureError, center_of_mass};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecenterConfig {
    /// Side of the square output canvas.
    pub border_size: usize,
    /// Where the marker centroid lands, `(x, y)`.
    pub center: (f64, f64),
    /// Add `(0.5, 0.5)` to the centroid before shifting, matching ImageJ's
    /// pixel-corner convention.
    pub imagej_compat: bool,
}

impl Default for RecenterConfig {
    fn default() -> Self {
        Self {
            border_size: 701,
            center: (350.0, 350.0),
            imagej_compat: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recentered {
    pub stack: ChannelStack<u16>,
    /// Marker centroid the shift was computed from, offset included.
    pub center_of_mass: (f64, f64),
    /// Applied `(dx, dy)` translation.
    pub shift: (f64, f64),
}

/// Fits `stack` onto a `border_size` square canvas and translates every
/// channel so the marker centroid lands on `cfg.center`.
///
/// Axes longer than the canvas are cropped symmetrically (the extra pixel of
/// an odd difference is taken from the trailing edge); this fails with
/// [`MeasureError::NoValidTransform`] if any channel has intensity in the
/// discarded margins. Shorter axes are zero-padded on the trailing edge.
/// The centroid is taken from the polygon moments of the largest external
/// contour of the Otsu-binarized marker channel.
pub fn recenter_and_pad(
    stack: &ChannelStack<u16>,
    marker_channel: usize,
    cfg: &RecenterConfig,
) -> Result<Recentered, MeasureError> {
    stack.try_channel(marker_channel)?;
    let canvas = fit_canvas(stack, cfg.border_size)?;

    let marker = canvas.try_channel(marker_channel)?;
    let binary = binarize_otsu(&marker.as_view());
    let largest = find_contours(&binary.as_view(), RetrievalMode::External)
        .into_contours()
        .into_iter()
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .ok_or(MeasureError::NoMarkerContour {
            channel: marker_channel,
        })?;

    let (mut mx, mut my) = center_of_mass(&marker.as_view(), Some(&largest))?;
    if cfg.imagej_compat {
        mx += 0.5;
        my += 0.5;
    }
    let shift = (cfg.center.0 - mx, cfg.center.1 - my);
    tracing::debug!(mx, my, dx = shift.0, dy = shift.1, "recentering marker");

    let channels = canvas
        .channels()
        .iter()
        .map(|c| translate(c, shift))
        .collect();
    Ok(Recentered {
        stack: ChannelStack::from_channels(channels)?,
        center_of_mass: (mx, my),
        shift,
    })
}

fn fit_canvas(stack: &ChannelStack<u16>, size: usize) -> Result<ChannelStack<u16>, MeasureError> {
    let (w, h) = stack.shape();
    let keep = |len: usize| -> (usize, usize) {
        if len > size {
            ((len - size) / 2, size)
        } else {
            (0, len)
        }
    };
    let (x0, kept_w) = keep(w);
    let (y0, kept_h) = keep(h);
    let inner = Rect::new(x0, y0, kept_w, kept_h);

    let discarded = stack.channels().iter().any(|c| {
        c.as_view().pixels().any(|(x, y, &v)| {
            v != 0 && !(x >= inner.x && x < inner.right() && y >= inner.y && y < inner.bottom())
        })
    });
    if discarded {
        return Err(MeasureError::NoValidTransform {
            width: w,
            height: h,
            border_size: size,
        });
    }

    let channels = stack
        .channels()
        .iter()
        .map(|c| {
            let mut out = Image::new_fill(size, size, 0u16);
            for y in 0..kept_h {
                let src = &c.row(y0 + y)[x0..x0 + kept_w];
                out.row_mut(y)[..kept_w].copy_from_slice(src);
            }
            out
        })
        .collect();
    Ok(ChannelStack::from_channels(channels)?)
}

fn translate(img: &Image<u16>, (dx, dy): (f64, f64)) -> Image<u16> {
    let view = img.as_view();
    let (w, h) = img.shape();
    let mut out = Image::new_fill(w, h, 0u16);
    for y in 0..h {
        let row = out.row_mut(y);
        for (x, px) in row.iter_mut().enumerate() {
            let v = sample_bilinear(
                &view,
                x as f64 - dx,
                y as f64 - dy,
                BorderMode::Constant(0.0),
            );
            *px = v.round() as u16;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use gm_core::{ChannelStack, Image};

    use super::{RecenterConfig, recenter_and_pad};
    use crate::{MeasureError, center_of_mass};

    fn disk(w: usize, h: usize, cx: f64, cy: f64, r: f64, value: u16) -> Image<u16> {
        let mut img = Image::new_fill(w, h, 0u16);
        for y in 0..h {
            for x in 0..w {
                if (x as f64 - cx).hypot(y as f64 - cy) <= r {
                    *img.get_mut(x, y).expect("in bounds") = value;
                }
            }
        }
        img
    }

    #[test]
    fn marker_centroid_lands_on_canvas_center() {
        let marker = disk(40, 40, 19.5, 19.5, 8.0, 1000);
        let companion = disk(40, 40, 19.5, 19.5, 4.0, 300);
        let stack = ChannelStack::from_channels(vec![marker, companion]).expect("same shape");
        let cfg = RecenterConfig {
            border_size: 60,
            center: (29.5, 29.5),
            imagej_compat: false,
        };

        let out = recenter_and_pad(&stack, 0, &cfg).expect("valid transform");
        assert_eq!(out.stack.shape(), (60, 60));
        assert_eq!(out.center_of_mass, (19.5, 19.5));
        assert_eq!(out.shift, (10.0, 10.0));

        let shifted = &out.stack.channels()[0];
        let (mx, my) = center_of_mass(&shifted.as_view(), None).expect("non-zero mass");
        assert_abs_diff_eq!(mx, 29.5, epsilon = 1e-4);
        assert_abs_diff_eq!(my, 29.5, epsilon = 1e-4);
        assert_eq!(out.stack.channels()[1].get(29, 29), Some(&300));
        assert_eq!(out.stack.channels()[1].get(19, 19), Some(&0));
    }

    #[test]
    fn imagej_offset_shifts_by_half_pixel() {
        let marker = disk(20, 20, 9.5, 9.5, 5.0, 100);
        let stack = ChannelStack::from_channels(vec![marker]).expect("one channel");
        let cfg = RecenterConfig {
            border_size: 20,
            center: (10.0, 10.0),
            imagej_compat: true,
        };
        let out = recenter_and_pad(&stack, 0, &cfg).expect("valid transform");
        assert_eq!(out.center_of_mass, (10.0, 10.0));
        assert_eq!(out.shift, (0.0, 0.0));
        assert_eq!(out.stack, stack);
    }

    #[test]
    fn oversized_crop_is_trimmed_when_margins_are_empty() {
        let marker = disk(80, 70, 40.0, 35.0, 10.0, 500);
        let stack = ChannelStack::from_channels(vec![marker]).expect("one channel");
        let cfg = RecenterConfig {
            border_size: 60,
            center: (30.0, 30.0),
            imagej_compat: false,
        };
        let out = recenter_and_pad(&stack, 0, &cfg).expect("margins are empty");
        assert_eq!(out.stack.shape(), (60, 60));
        assert_eq!(out.center_of_mass, (30.0, 30.0));
    }

    #[test]
    fn intensity_in_discarded_margin_is_rejected() {
        let mut marker = disk(80, 80, 40.0, 40.0, 10.0, 500);
        *marker.get_mut(2, 40).expect("in bounds") = 1;
        let stack = ChannelStack::from_channels(vec![marker]).expect("one channel");
        let cfg = RecenterConfig {
            border_size: 60,
            ..RecenterConfig::default()
        };
        assert_eq!(
            recenter_and_pad(&stack, 0, &cfg),
            Err(MeasureError::NoValidTransform {
                width: 80,
                height: 80,
                border_size: 60
            })
        );
    }

    #[test]
    fn empty_marker_has_no_contour() {
        let stack =
            ChannelStack::from_channels(vec![Image::new_fill(10, 10, 0u16)]).expect("one channel");
        assert_eq!(
            recenter_and_pad(&stack, 0, &RecenterConfig::default()),
            Err(MeasureError::NoMarkerContour { channel: 0 })
        );
    }
}
