use gm_core::ChannelStack;
use serde::{Deserialize, Serialize};

use crate::{
    MeasureError, RadialProfile, RadialProfileConfig, RecenterConfig, center_of_mass,
    estimate_radius, gyradius, normalize_stack_intensity, radial_intensity_profile,
    recenter_and_pad,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribeConfig {
    pub marker_channel: usize,
    pub recenter: RecenterConfig,
    /// Per-channel total intensity after recentering; `None` keeps raw values.
    pub target_total_intensity: Option<f64>,
    pub profile: RadialProfileConfig,
}

impl Default for DescribeConfig {
    fn default() -> Self {
        Self {
            marker_channel: 0,
            recenter: RecenterConfig::default(),
            target_total_intensity: None,
            profile: RadialProfileConfig::default(),
        }
    }
}

/// Descriptors of one accepted crop, measured on the recentered canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GolgiDescriptors {
    /// Intensity centroid of the marker channel.
    pub center_of_mass: (f64, f64),
    pub gyradius: f64,
    /// Translation applied while recentering.
    pub shift: (f64, f64),
    pub profiles: Vec<RadialProfile>,
    /// FWHM radius per channel, in buckets.
    pub radii: Vec<Option<usize>>,
}

/// Recenter, optionally normalize, then measure every channel.
pub fn describe(
    stack: &ChannelStack<u16>,
    cfg: &DescribeConfig,
) -> Result<GolgiDescriptors, MeasureError> {
    let recentered = recenter_and_pad(stack, cfg.marker_channel, &cfg.recenter)?;
    let canvas = match cfg.target_total_intensity {
        Some(target) => normalize_stack_intensity(&recentered.stack, target),
        None => recentered.stack,
    };

    let marker = canvas.try_channel(cfg.marker_channel)?.as_view();
    let (mx, my) = center_of_mass(&marker, None)?;
    let gyradius = gyradius(&marker, mx, my)?;

    let profiles = radial_intensity_profile(&canvas, &cfg.profile);
    let radii: Vec<Option<usize>> = profiles.iter().map(estimate_radius).collect();
    tracing::info!(mx, my, gyradius, ?radii, "described crop");

    Ok(GolgiDescriptors {
        center_of_mass: (mx, my),
        gyradius,
        shift: recentered.shift,
        profiles,
        radii,
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use gm_core::{ChannelStack, Image};

    use super::{DescribeConfig, describe};
    use crate::{RadialProfileConfig, RecenterConfig};

    fn disk(cx: f64, cy: f64, r: f64, value: u16) -> Image<u16> {
        let mut img = Image::new_fill(40, 40, 0u16);
        for y in 0..40 {
            for x in 0..40 {
                if (x as f64 - cx).hypot(y as f64 - cy) <= r {
                    *img.get_mut(x, y).expect("in bounds") = value;
                }
            }
        }
        img
    }

    fn small_canvas() -> DescribeConfig {
        DescribeConfig {
            marker_channel: 0,
            recenter: RecenterConfig {
                border_size: 60,
                center: (29.5, 29.5),
                imagej_compat: false,
            },
            target_total_intensity: None,
            profile: RadialProfileConfig {
                center: (29.5, 29.5),
                num_buckets: 30,
            },
        }
    }

    #[test]
    fn descriptors_of_concentric_disks() {
        let stack = ChannelStack::from_channels(vec![
            disk(19.5, 19.5, 8.0, 1000),
            disk(19.5, 19.5, 5.0, 400),
        ])
        .expect("same shape");

        let d = describe(&stack, &small_canvas()).expect("measurable crop");
        assert_eq!(d.center_of_mass, (29.5, 29.5));
        assert_eq!(d.shift, (10.0, 10.0));
        assert_abs_diff_eq!(d.gyradius, 8.0 / 2f64.sqrt(), epsilon = 0.1);
        assert_eq!(d.profiles.len(), 2);
        assert_eq!(d.radii, vec![Some(8), Some(5)]);
    }

    #[test]
    fn normalization_keeps_shape_descriptors() {
        let stack =
            ChannelStack::from_channels(vec![disk(19.5, 19.5, 8.0, 1000)]).expect("one channel");
        let cfg = DescribeConfig {
            target_total_intensity: Some(20_800.0),
            ..small_canvas()
        };
        let d = describe(&stack, &cfg).expect("measurable crop");
        // 208 pixels share the target evenly.
        assert_eq!(d.profiles[0].buckets[0].mean_intensity, Some(100.0));
        assert_eq!(d.radii, vec![Some(8)]);
    }
}
