use gm_core::ImageView;
use gm_threshold::min_positive;
use serde::{Deserialize, Serialize};

/// Cumulative background floor per channel.
///
/// A value is threaded from one crop evaluation to the next; validation
/// returns an updated copy and never mutates its input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubtractionState {
    pub floors: Vec<u32>,
}

impl SubtractionState {
    pub fn zeros(channels: usize) -> Self {
        Self {
            floors: vec![0; channels],
        }
    }

    pub fn floor(&self, channel: usize) -> u32 {
        self.floors.get(channel).copied().unwrap_or(0)
    }
}

/// Chooses the next floor increment once a channel needs more background
/// subtraction.
pub trait EscalationPolicy {
    fn next_step(&self, channel: &ImageView<'_, u16>) -> u32;
}

/// Step to the smallest remaining positive intensity, but at least
/// `min_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinPositiveFloor {
    pub min_step: u32,
}

impl Default for MinPositiveFloor {
    fn default() -> Self {
        Self { min_step: 50 }
    }
}

impl EscalationPolicy for MinPositiveFloor {
    fn next_step(&self, channel: &ImageView<'_, u16>) -> u32 {
        min_positive(channel).map_or(self.min_step, |v| u32::from(v).max(self.min_step))
    }
}
