use gm_contour::{
    Contour, RetrievalMode, contour_mask, convex_hull_indices, convexity_defects, fill_contour,
    find_contours, match_shapes, min_enclosing_circle,
};
use gm_core::{ChannelStack, Image, Sides};
use gm_morph::{dilate3x3_binary_u8, masked_sum};
use gm_threshold::{binarize_otsu, subtract_floor};

use crate::{
    CIRCLE_TEMPLATE, ELLIPSE_TEMPLATE, EscalationPolicy, GolgiError, RejectReason,
    SubtractionState, ValidationConfig, ValidationResult, Verdict,
};

/// Crop sides that coincide with the border of the full image.
pub type EdgeFlags = Sides;

/// Isolates a single giantin contour in `crop` and checks every companion
/// channel against it.
///
/// The marker channel is resolved first, then the remaining channels in
/// index order (`cfg.ignored_channel` is skipped). Each channel starts by
/// subtracting its floor from `state`; further subtraction steps come from
/// `policy`. The first rejection ends the evaluation, and the returned crop
/// and state reflect the subtraction done up to that point.
pub fn validate_crop(
    crop: &ChannelStack<u16>,
    crop_mask: &Image<f32>,
    edge_flags: EdgeFlags,
    state: &SubtractionState,
    cfg: &ValidationConfig,
    policy: &dyn EscalationPolicy,
) -> Result<ValidationResult, GolgiError> {
    let channels = crop.num_channels();
    let marker = cfg.marker_channel;
    crop.try_channel(marker)?;
    if cfg.ignored_channel == Some(marker) {
        return Err(GolgiError::MarkerIgnored { channel: marker });
    }
    if crop_mask.shape() != crop.shape() {
        return Err(GolgiError::MaskShape {
            expected: crop.shape(),
            actual: crop_mask.shape(),
        });
    }
    if state.floors.len() != channels {
        return Err(GolgiError::StateLength {
            expected: channels,
            actual: state.floors.len(),
        });
    }

    let mut work = crop.clone().into_channels();
    let mut floors = state.floors.clone();

    let verdict = match resolve_marker(
        &mut work[marker],
        crop_mask,
        &mut floors[marker],
        marker,
        cfg,
        policy,
    ) {
        Err(reason) => Verdict::Rejected(reason),
        Ok((contour, mask)) => {
            let marker_clean = work[marker].clone();
            let companions =
                (0..channels).filter(|&c| c != marker && Some(c) != cfg.ignored_channel);
            let mut rejection = None;
            for c in companions {
                let ctx = CompanionContext {
                    channel: c,
                    marker: &marker_clean,
                    edge_flags,
                };
                let outcome = resolve_companion(&mut work[c], state.floor(c), &ctx, cfg, policy);
                if let Err(reason) = outcome {
                    rejection = Some(reason);
                    break;
                }
            }
            match rejection {
                Some(reason) => Verdict::Rejected(reason),
                None => Verdict::Accepted { contour, mask },
            }
        }
    };

    match &verdict {
        Verdict::Accepted { contour, .. } => {
            tracing::info!(points = contour.len(), ?floors, "crop accepted");
        }
        Verdict::Rejected(reason) => tracing::debug!(%reason, ?floors, "crop rejected"),
    }

    Ok(ValidationResult {
        verdict,
        clean: ChannelStack::from_channels(work)?,
        state: SubtractionState { floors },
    })
}

/// Lowers `work` by a pending floor step. Steps raise the cumulative floor
/// only when `accumulate` holds; the floor carried in from a previous crop
/// (round zero) is already part of it.
///
/// Once the marker contour is found no step accumulates, so companion floors
/// only ever carry what was passed in.
fn apply_pending(work: &mut Image<u16>, pending: &mut u32, floor: &mut u32, accumulate: bool) {
    if *pending == 0 {
        return;
    }
    subtract_floor(work, *pending);
    if accumulate {
        *floor = floor.saturating_add(*pending);
    }
    *pending = 0;
}

fn external_contours(work: &Image<u16>) -> Vec<Contour> {
    let binary = binarize_otsu(&work.as_view());
    find_contours(&binary.as_view(), RetrievalMode::External).into_contours()
}

fn erase(work: &mut Image<u16>, contour: &Contour) {
    fill_contour(work, contour, 0);
}

enum Selection {
    Candidate(Contour),
    Escalate,
    Empty,
}

/// First marker pass over contours sorted by ascending area: small and
/// border-touching contours are erased along with all but the largest valid
/// one. A border-touching contour left on its own asks for more
/// subtraction instead.
fn select_candidate(work: &mut Image<u16>, contours: Vec<Contour>, min_area: f64) -> Selection {
    let (w, h) = work.shape();
    let total = contours.len();
    let mut remaining = total;
    for (i, contour) in contours.into_iter().enumerate() {
        if contour.area() <= min_area {
            erase(work, &contour);
            remaining -= 1;
            continue;
        }
        if contour.touches_border(w, h) {
            if remaining == 1 {
                return Selection::Escalate;
            }
            erase(work, &contour);
            remaining -= 1;
            continue;
        }
        if i + 1 == total {
            return Selection::Candidate(contour);
        }
        erase(work, &contour);
        remaining -= 1;
    }
    Selection::Empty
}

fn mean_probability(mask: &Image<f32>, contour: &Contour) -> f64 {
    let (w, h) = mask.shape();
    let inside = contour_mask(contour, w, h);
    let (mut sum, mut count) = (0.0f64, 0usize);
    for (&m, &p) in inside.data().iter().zip(mask.data()) {
        if m != 0 {
            sum += f64::from(p);
            count += 1;
        }
    }
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn resolve_marker(
    work: &mut Image<u16>,
    crop_mask: &Image<f32>,
    floor: &mut u32,
    channel: usize,
    cfg: &ValidationConfig,
    policy: &dyn EscalationPolicy,
) -> Result<(Contour, Image<u8>), RejectReason> {
    let (w, h) = work.shape();
    let mut pending = *floor;
    let mut found = false;
    let mut two_seen = false;
    let mut had_convex = false;

    for round in 0..cfg.max_subtraction_rounds {
        apply_pending(work, &mut pending, floor, !found && round > 0);

        let mut contours = external_contours(work);
        contours.sort_by(|a, b| a.area().total_cmp(&b.area()));
        tracing::debug!(channel, round, count = contours.len(), "marker contours");

        let candidate = if found {
            let Some(largest) = contours.pop() else {
                return Err(RejectReason::NoMarkerContour);
            };
            for c in &contours {
                erase(work, c);
            }
            largest
        } else {
            match select_candidate(work, contours, cfg.min_marker_area) {
                Selection::Candidate(c) => c,
                Selection::Escalate => {
                    pending = policy.next_step(&work.as_view());
                    tracing::debug!(channel, round, step = pending, "marker touches crop border");
                    continue;
                }
                Selection::Empty => return Err(RejectReason::NoMarkerContour),
            }
        };

        let probability = mean_probability(crop_mask, &candidate);
        if probability < cfg.probability_threshold {
            return Err(RejectReason::LowProbability { probability });
        }
        found = true;

        let circle = min_enclosing_circle(&candidate.points);
        let ratio = candidate.arc_length() / circle.circumference();
        if ratio >= cfg.roundness_ratio {
            if had_convex {
                return Err(RejectReason::ConvexDefectsPersist);
            }
            let mask = contour_mask(&candidate, w, h);
            return Ok((candidate, mask));
        }

        let binary = binarize_otsu(&work.as_view());
        let tree = find_contours(&binary.as_view(), RetrievalMode::Tree);
        match tree.len() {
            0 => return Err(RejectReason::NoMarkerContour),
            1 => {
                if two_seen {
                    let mask = contour_mask(&candidate, w, h);
                    return Ok((candidate, mask));
                }
            }
            2 => {
                two_seen = true;
                if tree.hierarchy[1].parent == Some(0) {
                    let (outer, inner) = (&tree.contours[0], &tree.contours[1]);
                    let ratio = inner.area() / outer.area();
                    if ratio < cfg.min_hole_ratio {
                        return Err(RejectReason::HoleTooSmall { ratio });
                    }

                    let circle = match_shapes(&outer.points, &CIRCLE_TEMPLATE);
                    if circle <= cfg.max_template_distance {
                        tracing::debug!(channel, circle, "ring matches circle template");
                        return Ok((candidate, binary));
                    }
                    let ellipse = match_shapes(&outer.points, &ELLIPSE_TEMPLATE);
                    if ellipse > cfg.max_template_distance {
                        return Err(RejectReason::ShapeMismatch { circle, ellipse });
                    }

                    let hull = convex_hull_indices(&outer.points);
                    let deep = convexity_defects(&outer.points, &hull)
                        .iter()
                        .any(|d| d.fixed_depth() > cfg.max_defect_depth);
                    if !deep {
                        tracing::debug!(channel, ellipse, "ring matches ellipse template");
                        return Ok((candidate, binary));
                    }
                    had_convex = true;
                }
            }
            count => {
                let mut areas: Vec<f64> = tree.contours.iter().map(Contour::area).collect();
                areas.sort_by(|a, b| b.total_cmp(a));
                if areas[1] > cfg.max_residual_area {
                    return Err(RejectReason::TooManyContours { count });
                }
            }
        }

        pending = policy.next_step(&work.as_view());
        tracing::debug!(channel, round, step = pending, "escalating marker floor");
    }

    Err(RejectReason::SubtractionLimit { channel })
}

struct CompanionContext<'a> {
    channel: usize,
    /// Cleaned marker channel.
    marker: &'a Image<u16>,
    edge_flags: EdgeFlags,
}

fn resolve_companion(
    work: &mut Image<u16>,
    floor: u32,
    ctx: &CompanionContext<'_>,
    cfg: &ValidationConfig,
    policy: &dyn EscalationPolicy,
) -> Result<(), RejectReason> {
    let channel = ctx.channel;
    let (w, h) = work.shape();
    let mut pending = floor;
    let mut floor = floor;

    for round in 0..cfg.max_subtraction_rounds {
        apply_pending(work, &mut pending, &mut floor, false);

        let mut contours = external_contours(work);
        contours.sort_by(|a, b| b.area().total_cmp(&a.area()));
        let largest = contours.first().map_or(0.0, Contour::area);

        let mut survivors = Vec::with_capacity(contours.len());
        let mut escalate = false;
        for (i, contour) in contours.into_iter().enumerate() {
            if i > 0 && contour.area() <= cfg.companion_area_fraction * largest {
                erase(work, &contour);
                continue;
            }
            let contact = contour.border_contact(w, h);
            if let Some(side) = contact.shared_with(ctx.edge_flags).next() {
                return Err(RejectReason::CompanionAtImageEdge { channel, side });
            }
            if contact.any() {
                if i == 0 {
                    escalate = true;
                    break;
                }
                erase(work, &contour);
                continue;
            }
            survivors.push(contour);
        }

        if escalate {
            pending = policy.next_step(&work.as_view());
            tracing::debug!(channel, round, step = pending, "companion touches crop border");
            continue;
        }
        if !cfg.channels_overlap {
            return Ok(());
        }

        let mut footprint = Image::new_fill(w, h, 0u8);
        for c in &survivors {
            fill_contour(&mut footprint, c, 1);
        }
        let dilated = dilate3x3_binary_u8(&footprint.as_view());
        let overlap = masked_sum(&dilated.as_view(), &ctx.marker.as_view()).unwrap_or(0);
        return if overlap > 0 {
            Ok(())
        } else {
            Err(RejectReason::NoOverlap { channel })
        };
    }

    Err(RejectReason::SubtractionLimit { channel })
}
