use gm_contour::{Contour, RetrievalMode, find_contours};
use gm_core::{ChannelStack, Image, Rect};
use serde::Serialize;

use crate::{
    CropConfig, EdgeFlags, GolgiError, MinPositiveFloor, RejectReason, SubtractionState, Verdict,
    validate_crop,
};

/// Outcome of one candidate contour.
#[derive(Debug, Clone, PartialEq)]
pub struct CropEvaluation {
    /// Top-left corner of the candidate's bounding box in the full image.
    pub origin: (usize, usize),
    /// Crop window in the full image; `None` when rejected before cropping.
    pub roi: Option<Rect>,
    pub clean: Option<ChannelStack<u16>>,
    pub crop_mask: Option<Image<f32>>,
    pub verdict: Verdict,
    pub state: SubtractionState,
    /// `"(x,y) : reason"`, with an empty reason on acceptance.
    pub message: String,
}

impl CropEvaluation {
    fn rejected_early(origin: (usize, usize), state: &SubtractionState, reason: RejectReason) -> Self {
        let message = format_message(origin, Some(&reason));
        Self {
            origin,
            roi: None,
            clean: None,
            crop_mask: None,
            verdict: Verdict::Rejected(reason),
            state: state.clone(),
            message,
        }
    }

    pub fn accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// Marker contour in crop coordinates.
    pub fn marker_contour(&self) -> Option<&Contour> {
        self.verdict.contour()
    }

    pub fn marker_mask(&self) -> Option<&Image<u8>> {
        self.verdict.mask()
    }

    /// Marker contour in full-image coordinates.
    pub fn image_contour(&self) -> Option<Contour> {
        let roi = self.roi?;
        let contour = self.marker_contour()?;
        Some(contour.translated(roi.x as i32, roi.y as i32))
    }

    pub fn report(&self) -> CropReport {
        CropReport {
            origin: self.origin,
            accepted: self.accepted(),
            roi: self.roi.map(|r| [r.x, r.y, r.width, r.height]),
            contour: self
                .image_contour()
                .map(|c| c.points.iter().map(|p| [p.x, p.y]).collect())
                .unwrap_or_default(),
            message: self.message.clone(),
        }
    }
}

/// Serializable summary of a [`CropEvaluation`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropReport {
    pub origin: (usize, usize),
    pub accepted: bool,
    /// `[x, y, width, height]`.
    pub roi: Option<[usize; 4]>,
    /// Marker contour in full-image coordinates.
    pub contour: Vec<[i32; 2]>,
    pub message: String,
}

fn format_message(origin: (usize, usize), reason: Option<&RejectReason>) -> String {
    match reason {
        Some(r) => format!("({},{}) : {r}", origin.0, origin.1),
        None => format!("({},{}) : ", origin.0, origin.1),
    }
}

/// Square crop window around `bbox` and the crop sides that coincide with the
/// image border.
///
/// The window is pushed inside the image at the top-left; past the
/// bottom-right border the side shrinks on both axes so the crop stays
/// square.
pub fn crop_window(bbox: Rect, width: usize, height: usize, rect_size: usize) -> (Rect, EdgeFlags) {
    let longest = bbox.width.max(bbox.height);
    let side = if longest >= rect_size {
        (longest / 10 + 1) * 10
    } else {
        rect_size
    };

    let x0 = bbox.x.saturating_sub((side - bbox.width).div_ceil(2));
    let y0 = bbox.y.saturating_sub((side - bbox.height).div_ceil(2));
    let side = side.min(width - x0).min(height - y0);
    let roi = Rect::new(x0, y0, side, side);

    let flags = EdgeFlags {
        left: x0 == 0,
        top: y0 == 0,
        right: roi.right() == width,
        bottom: roi.bottom() == height,
    };
    (roi, flags)
}

/// Crops the neighbourhood of `candidate` and validates it.
///
/// Candidates whose bounding box reaches the outermost pixel ring of the
/// image are rejected without cropping, and `state` is passed through.
pub fn evaluate_contour(
    image: &ChannelStack<u16>,
    pred_mask: &Image<f32>,
    candidate: &Contour,
    state: &SubtractionState,
    cfg: &CropConfig,
) -> Result<CropEvaluation, GolgiError> {
    if pred_mask.shape() != image.shape() {
        return Err(GolgiError::MaskShape {
            expected: image.shape(),
            actual: pred_mask.shape(),
        });
    }

    let (w, h) = image.shape();
    let bbox = candidate.bounding_rect();
    let origin = (bbox.x, bbox.y);
    if bbox.is_empty()
        || bbox.x == 0
        || bbox.y == 0
        || bbox.right() + 1 >= w
        || bbox.bottom() + 1 >= h
    {
        tracing::debug!(?bbox, "candidate at image edge");
        return Ok(CropEvaluation::rejected_early(
            origin,
            state,
            RejectReason::TouchesImageEdge,
        ));
    }

    let (roi, flags) = crop_window(bbox, w, h, cfg.rect_size);
    let crop = image.crop(roi)?;
    let crop_mask = pred_mask.crop(roi)?;
    let policy = MinPositiveFloor {
        min_step: cfg.validation.min_subtraction_step,
    };
    let result = validate_crop(&crop, &crop_mask, flags, state, &cfg.validation, &policy)?;

    let message = format_message(origin, result.verdict.reason());
    Ok(CropEvaluation {
        origin,
        roi: Some(roi),
        clean: Some(result.clean),
        crop_mask: Some(crop_mask),
        verdict: result.verdict,
        state: result.state,
        message,
    })
}

/// External contours of `pred_mask > threshold`.
pub fn candidate_contours(pred_mask: &Image<f32>, threshold: f32) -> Vec<Contour> {
    let binary = pred_mask.map(|&p| u8::from(p > threshold));
    find_contours(&binary.as_view(), RetrievalMode::External).into_contours()
}

/// Evaluates `candidates` in order, feeding each call the subtraction state
/// returned by the previous one. Returns every evaluation and the final
/// state.
pub fn evaluate_candidates(
    image: &ChannelStack<u16>,
    pred_mask: &Image<f32>,
    candidates: &[Contour],
    cfg: &CropConfig,
) -> Result<(Vec<CropEvaluation>, SubtractionState), GolgiError> {
    let mut state = SubtractionState::zeros(image.num_channels());
    let mut evaluations = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let eval = evaluate_contour(image, pred_mask, candidate, &state, cfg)?;
        if !eval.accepted() {
            tracing::warn!(message = %eval.message, "skipping candidate");
        }
        state = eval.state.clone();
        evaluations.push(eval);
    }

    let accepted = evaluations.iter().filter(|e| e.accepted()).count();
    tracing::info!(
        candidates = candidates.len(),
        accepted,
        floors = ?state.floors,
        "evaluated candidates"
    );
    Ok((evaluations, state))
}

#[cfg(test)]
mod tests {
    use gm_contour::Contour;
    use gm_core::{ChannelStack, Image, Point2i, Rect};

    use super::{candidate_contours, crop_window, evaluate_candidates, evaluate_contour};
    use crate::{CropConfig, EdgeFlags, RejectReason, SubtractionState, Verdict};

    const W: usize = 100;
    const H: usize = 80;

    fn scene(centers: &[(f64, f64)]) -> (ChannelStack<u16>, Image<f32>) {
        let mut marker = Image::new_fill(W, H, 0u16);
        let mut companion = Image::new_fill(W, H, 0u16);
        let mut mask = Image::new_fill(W, H, 0.0f32);
        for y in 0..H {
            for x in 0..W {
                for &(cx, cy) in centers {
                    let d = (x as f64 - cx).hypot(y as f64 - cy);
                    if d > 5.0 && d <= 12.0 {
                        *marker.get_mut(x, y).expect("in bounds") = 1000;
                    }
                    if d <= 8.0 {
                        *companion.get_mut(x, y).expect("in bounds") = 500;
                    }
                    if d <= 12.0 {
                        *mask.get_mut(x, y).expect("in bounds") = 0.9;
                    }
                }
            }
        }
        let stack = ChannelStack::from_channels(vec![marker, companion]).expect("same shape");
        (stack, mask)
    }

    fn square(x0: i32, y0: i32, x1: i32, y1: i32) -> Contour {
        Contour::new(vec![
            Point2i::new(x0, y0),
            Point2i::new(x1, y0),
            Point2i::new(x1, y1),
            Point2i::new(x0, y1),
        ])
    }

    #[test]
    fn crop_window_is_centered_and_clipped() {
        let (roi, flags) = crop_window(Rect::new(30, 20, 24, 24), W, H, 40);
        assert_eq!(roi, Rect::new(22, 12, 40, 40));
        assert_eq!(flags, EdgeFlags::default());

        // Grows to the next multiple of ten above the longest side.
        let (roi, _) = crop_window(Rect::new(30, 20, 45, 20), W, H, 40);
        assert_eq!((roi.width, roi.height), (50, 50));

        let (roi, flags) = crop_window(Rect::new(3, 50, 20, 20), W, H, 40);
        assert_eq!(roi, Rect::new(0, 40, 40, 40));
        assert!(flags.left && flags.bottom && !flags.top && !flags.right);

        let (roi, flags) = crop_window(Rect::new(85, 5, 10, 10), W, H, 40);
        assert_eq!(roi, Rect::new(70, 0, 30, 30));
        assert!(flags.right && flags.top && !flags.bottom);

        // Clipping one axis shrinks the other with it.
        let (roi, flags) = crop_window(Rect::new(85, 60, 10, 10), W, H, 40);
        assert_eq!(roi, Rect::new(70, 45, 30, 30));
        assert!(flags.right && !flags.bottom);

        let (roi, flags) = crop_window(Rect::new(85, 65, 10, 10), W, H, 40);
        assert_eq!(roi, Rect::new(70, 50, 30, 30));
        assert!(flags.right && flags.bottom);
    }

    #[test]
    fn candidate_at_image_edge_is_rejected_before_cropping() {
        let (stack, mask) = scene(&[(50.0, 40.0)]);
        let state = SubtractionState { floors: vec![5, 9] };
        for c in [square(0, 10, 20, 30), square(10, 10, 98, 30), square(10, 50, 20, 79)] {
            let eval = evaluate_contour(&stack, &mask, &c, &state, &CropConfig::default())
                .expect("valid inputs");
            assert_eq!(eval.verdict, Verdict::Rejected(RejectReason::TouchesImageEdge));
            assert!(eval.roi.is_none());
            assert_eq!(eval.state, state);
        }
        let eval = evaluate_contour(
            &stack,
            &mask,
            &square(0, 10, 20, 30),
            &state,
            &CropConfig::default(),
        )
        .expect("valid inputs");
        assert_eq!(eval.message, "(0,10) : Giantin is in the edge.");
    }

    #[test]
    fn ring_candidate_is_accepted_with_image_contour() {
        let (stack, mask) = scene(&[(50.5, 40.5)]);
        let candidates = candidate_contours(&mask, 0.5);
        assert_eq!(candidates.len(), 1);

        let eval = evaluate_contour(
            &stack,
            &mask,
            &candidates[0],
            &SubtractionState::zeros(2),
            &CropConfig::default(),
        )
        .expect("valid inputs");
        assert!(eval.accepted(), "{}", eval.message);
        assert_eq!(eval.message, "(39,29) : ");
        assert_eq!(eval.roi, Some(Rect::new(31, 21, 40, 40)));

        let contour = eval.image_contour().expect("accepted");
        assert_eq!(contour.bounding_rect(), Rect::new(39, 29, 24, 24));
        let report = eval.report();
        assert!(report.accepted);
        assert_eq!(report.roi, Some([31, 21, 40, 40]));
        assert_eq!(report.contour.len(), contour.len());
    }

    #[test]
    fn batch_threads_state_and_keeps_going() {
        let (stack, mask) = scene(&[(30.5, 40.5), (70.5, 40.5)]);
        let mut candidates = candidate_contours(&mask, 0.5);
        candidates.insert(0, square(0, 0, 5, 5));
        let (evals, state) =
            evaluate_candidates(&stack, &mask, &candidates, &CropConfig::default())
                .expect("valid inputs");

        assert_eq!(evals.len(), 3);
        assert!(!evals[0].accepted());
        assert!(evals[1].accepted() && evals[2].accepted());
        assert_eq!(state, SubtractionState::zeros(2));
    }
}
