use gm_core::{ChannelStack, ImageView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadialProfileConfig {
    /// Fixed bin origin `(x, y)`.
    pub center: (f64, f64),
    pub num_buckets: usize,
}

impl Default for RadialProfileConfig {
    fn default() -> Self {
        Self {
            center: (349.5, 349.5),
            num_buckets: 499,
        }
    }
}

/// One `floor(distance)` ring.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialBucket {
    pub index: usize,
    pub count: u64,
    pub total_intensity: u64,
    /// `None` for a ring with no pixels.
    pub mean_intensity: Option<f64>,
    /// Mean divided by the largest mean of the profile.
    pub normalized_mean_intensity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadialProfile {
    pub channel: usize,
    pub buckets: Vec<RadialBucket>,
}

impl RadialProfile {
    /// First bucket holding the largest mean intensity.
    pub fn peak(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for b in &self.buckets {
            if let Some(m) = b.mean_intensity
                && best.is_none_or(|(_, v)| m > v)
            {
                best = Some((b.index, m));
            }
        }
        best
    }
}

/// Radial profile of a single channel. Pixels at or beyond
/// `cfg.num_buckets` from the center are ignored.
pub fn radial_profile(
    img: &ImageView<'_, u16>,
    channel: usize,
    cfg: &RadialProfileConfig,
) -> RadialProfile {
    let n = cfg.num_buckets;
    let (cx, cy) = cfg.center;
    let mut counts = vec![0u64; n];
    let mut totals = vec![0u64; n];

    for y in 0..img.height() {
        let dy = y as f64 - cy;
        for (x, &v) in img.row(y).iter().enumerate() {
            let bucket = (x as f64 - cx).hypot(dy).floor() as usize;
            if bucket >= n {
                continue;
            }
            counts[bucket] += 1;
            totals[bucket] += u64::from(v);
        }
    }

    let means: Vec<Option<f64>> = counts
        .iter()
        .zip(&totals)
        .map(|(&c, &t)| (c > 0).then(|| t as f64 / c as f64))
        .collect();
    let peak = means.iter().flatten().copied().fold(f64::NAN, f64::max);

    let buckets = means
        .iter()
        .enumerate()
        .map(|(index, &mean)| RadialBucket {
            index,
            count: counts[index],
            total_intensity: totals[index],
            mean_intensity: mean,
            normalized_mean_intensity: mean.filter(|_| peak > 0.0).map(|m| m / peak),
        })
        .collect();

    RadialProfile { channel, buckets }
}

/// [`radial_profile`] of every channel.
pub fn radial_intensity_profile(
    stack: &ChannelStack<u16>,
    cfg: &RadialProfileConfig,
) -> Vec<RadialProfile> {
    stack
        .channels()
        .iter()
        .enumerate()
        .map(|(c, img)| radial_profile(&img.as_view(), c, cfg))
        .collect()
}

/// FWHM radius: scanning from the outermost bucket towards the peak, the
/// first adjacent pair with `inner >= peak / 2 >= outer` gives the radius,
/// choosing whichever of the two means is nearer to half the peak (the outer
/// one on ties).
///
/// Returns `None` for a profile without a positive peak or without a
/// crossing. Pairs involving an empty bucket are skipped.
pub fn estimate_radius(profile: &RadialProfile) -> Option<usize> {
    let (peak_index, peak) = profile.peak()?;
    if peak <= 0.0 {
        return None;
    }
    let half = peak / 2.0;

    let b = &profile.buckets;
    for i in (peak_index + 1..b.len()).rev() {
        let (Some(inner), Some(outer)) = (b[i - 1].mean_intensity, b[i].mean_intensity) else {
            continue;
        };
        if inner >= half && half >= outer {
            let radius = if inner - half >= half - outer { i } else { i - 1 };
            return Some(b[radius].index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use gm_core::Image;

    use super::{RadialBucket, RadialProfile, RadialProfileConfig, estimate_radius, radial_profile};

    fn profile_of(means: &[f64]) -> RadialProfile {
        RadialProfile {
            channel: 0,
            buckets: means
                .iter()
                .enumerate()
                .map(|(index, &m)| RadialBucket {
                    index,
                    count: 1,
                    total_intensity: m as u64,
                    mean_intensity: Some(m),
                    normalized_mean_intensity: None,
                })
                .collect(),
        }
    }

    #[test]
    fn step_profile_radius_is_step_position() {
        for r0 in [3usize, 12, 40] {
            let means: Vec<f64> = (0..60).map(|i| if i < r0 { 100.0 } else { 0.0 }).collect();
            assert_eq!(estimate_radius(&profile_of(&means)), Some(r0));
        }
    }

    #[test]
    fn crossing_picks_nearer_bucket() {
        // Half peak is 50: 80 is farther from it than 45.
        let p = profile_of(&[100.0, 90.0, 80.0, 45.0, 10.0]);
        assert_eq!(estimate_radius(&p), Some(3));
        // 55 is nearer than 5.
        let p = profile_of(&[100.0, 90.0, 55.0, 5.0, 0.0]);
        assert_eq!(estimate_radius(&p), Some(2));
    }

    #[test]
    fn flat_or_empty_profiles_have_no_radius() {
        assert_eq!(estimate_radius(&profile_of(&[0.0; 10])), None);
        assert_eq!(estimate_radius(&profile_of(&[10.0; 10])), None);
        assert_eq!(estimate_radius(&profile_of(&[])), None);
    }

    #[test]
    fn disk_profile_buckets_and_radius() {
        let mut img = Image::new_fill(60, 60, 0u16);
        for y in 0..60 {
            for x in 0..60 {
                if (x as f64 - 29.5).hypot(y as f64 - 29.5) <= 15.0 {
                    *img.get_mut(x, y).expect("in bounds") = 100;
                }
            }
        }
        let cfg = RadialProfileConfig {
            center: (29.5, 29.5),
            num_buckets: 40,
        };
        let p = radial_profile(&img.as_view(), 0, &cfg);

        assert_eq!(p.buckets.len(), 40);
        assert_eq!(p.buckets[0].count, 4);
        assert_eq!(p.buckets[0].mean_intensity, Some(100.0));
        assert_eq!(p.buckets[0].normalized_mean_intensity, Some(1.0));
        assert_eq!(p.buckets[20].mean_intensity, Some(0.0));
        assert_eq!(estimate_radius(&p), Some(15));
    }

    #[test]
    fn default_config_uses_fixed_canvas_center() {
        let cfg = RadialProfileConfig::default();
        assert_eq!(cfg.center, (349.5, 349.5));
        assert_eq!(cfg.num_buckets, 499);
    }
}
