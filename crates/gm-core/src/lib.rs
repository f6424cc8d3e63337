//! Foundational primitives for Golgi fluorescence metrology.
//!
//! ## Images and Channel Stacks
//! [`Image`] owns a single row-major channel. A [`ChannelStack`] owns `C`
//! channels of identical shape; intensity crops are `ChannelStack<u16>`,
//! probability masks are `Image<f32>` and binary masks are `Image<u8>` with
//! values in `{0, 1}`.
//!
//! ## Views and Stride
//! [`ImageView`] uses element stride (not byte stride) so a crop of a larger
//! image can be borrowed without copying.
//!
//! ## Coordinates
//! Integer coordinates refer to pixel centers. `x` grows to the right and `y`
//! grows downwards. Bilinear sampling uses the floor-based 2x2 neighborhood.

mod error;
mod geom;
mod image;
mod sample;
mod stack;

pub use error::Error;
pub use geom::{Point2d, Point2i, Rect, Side, Sides};
pub use image::{Image, ImageView};
pub use sample::{BorderMode, sample_bilinear};
pub use stack::ChannelStack;
