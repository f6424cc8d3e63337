use core::fmt;

use gm_contour::Contour;
use gm_core::{ChannelStack, Image, Side};

use crate::SubtractionState;

/// Why a crop was rejected. Channels are reported 1-based in messages.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    TouchesImageEdge,
    NoMarkerContour,
    LowProbability { probability: f64 },
    HoleTooSmall { ratio: f64 },
    ShapeMismatch { circle: f64, ellipse: f64 },
    TooManyContours { count: usize },
    ConvexDefectsPersist,
    CompanionAtImageEdge { channel: usize, side: Side },
    NoOverlap { channel: usize },
    SubtractionLimit { channel: usize },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::TouchesImageEdge => f.write_str("Giantin is in the edge."),
            RejectReason::NoMarkerContour => f.write_str("no contour in giantin channel."),
            RejectReason::LowProbability { probability } => {
                write!(f, "low possibility: {probability}.")
            }
            RejectReason::HoleTooSmall { ratio } => {
                write!(f, "inner contour too small (area ratio {ratio:.3}).")
            }
            RejectReason::ShapeMismatch { circle, ellipse } => write!(
                f,
                "contour shape is not satisfied (circle {circle:.3}, ellipse {ellipse:.3})."
            ),
            RejectReason::TooManyContours { count } => {
                write!(f, "no. of contours > 2 ({count}).")
            }
            RejectReason::ConvexDefectsPersist => f.write_str("crop had convex, and not satisfied."),
            RejectReason::CompanionAtImageEdge { channel, side } => {
                write!(f, "Contour in channel {} close to the {side} edge.", channel + 1)
            }
            RejectReason::NoOverlap { channel } => write!(
                f,
                "Contour in channel {} does not overlap the giantin channel.",
                channel + 1
            ),
            RejectReason::SubtractionLimit { channel } => write!(
                f,
                "background subtraction did not settle in channel {}.",
                channel + 1
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// `mask` is a `{0, 1}` image of the crop: either the filled marker
    /// contour or the binarized ring.
    Accepted { contour: Contour, mask: Image<u8> },
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted { .. })
    }

    pub fn contour(&self) -> Option<&Contour> {
        match self {
            Verdict::Accepted { contour, .. } => Some(contour),
            Verdict::Rejected(_) => None,
        }
    }

    pub fn mask(&self) -> Option<&Image<u8>> {
        match self {
            Verdict::Accepted { mask, .. } => Some(mask),
            Verdict::Rejected(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Verdict::Accepted { .. } => None,
            Verdict::Rejected(r) => Some(r),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub verdict: Verdict,
    /// Background-subtracted crop, partially cleaned on rejection.
    pub clean: ChannelStack<u16>,
    pub state: SubtractionState,
}

#[cfg(test)]
mod tests {
    use gm_core::Side;

    use super::RejectReason;

    #[test]
    fn companion_messages_use_one_based_channels() {
        let r = RejectReason::CompanionAtImageEdge {
            channel: 1,
            side: Side::Right,
        };
        assert_eq!(r.to_string(), "Contour in channel 2 close to the right edge.");
        assert_eq!(
            RejectReason::TouchesImageEdge.to_string(),
            "Giantin is in the edge."
        );
    }
}
