use crate::{Error, Image, Rect};

/// Channels of identical shape, indexed from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStack<T> {
    width: usize,
    height: usize,
    channels: Vec<Image<T>>,
}

impl<T> ChannelStack<T> {
    pub fn from_channels(channels: Vec<Image<T>>) -> Result<Self, Error> {
        let first = channels.first().ok_or(Error::EmptyStack)?;
        let expected = first.shape();
        if let Some(bad) = channels.iter().find(|c| c.shape() != expected) {
            return Err(Error::ShapeMismatch {
                expected,
                actual: bad.shape(),
            });
        }

        Ok(Self {
            width: expected.0,
            height: expected.1,
            channels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, index: usize) -> Option<&Image<T>> {
        self.channels.get(index)
    }

    /// Like [`Self::channel`] but reports the offending index.
    pub fn try_channel(&self, index: usize) -> Result<&Image<T>, Error> {
        self.channels.get(index).ok_or(Error::ChannelOutOfRange {
            index,
            channels: self.channels.len(),
        })
    }

    pub fn channels(&self) -> &[Image<T>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Image<T>> {
        self.channels
    }
}

impl<T: Clone> ChannelStack<T> {
    pub fn crop(&self, rect: Rect) -> Result<ChannelStack<T>, Error> {
        if !rect.fits_within(self.width, self.height) {
            return Err(Error::OutOfBounds);
        }
        let channels = self
            .channels
            .iter()
            .map(|c| c.crop(rect))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ChannelStack {
            width: rect.width,
            height: rect.height,
            channels,
        })
    }
}
