//! Caption-band regions of a frame.
//!
//! Captions and lower thirds sit in the middle column band near the top or
//! bottom of the picture, so those two windows are compared on their own in
//! addition to the whole frame.

use std::ops::Range;

use ndarray::{s, ArrayView2};

use crate::consts::MIN_REGION_FRAME_SIDE;
use crate::error::{FramesiftError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
    /// Rows `[0, H/3)` of the middle column band.
    TopThirdMiddle,
    /// Rows `[2*(H/3), H)` of the middle column band.
    BottomThirdMiddle,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::TopThirdMiddle, Region::BottomThirdMiddle];

    /// Row and column ranges of this region inside a `height` x `width` frame.
    pub fn bounds(self, height: usize, width: usize) -> Result<(Range<usize>, Range<usize>)> {
        if height < MIN_REGION_FRAME_SIDE || width < MIN_REGION_FRAME_SIDE {
            return Err(FramesiftError::FrameTooSmall { width, height });
        }
        let third_height = height / 3;
        let third_width = width / 3;
        let cols = third_width..2 * third_width;
        let rows = match self {
            Self::TopThirdMiddle => 0..third_height,
            Self::BottomThirdMiddle => 2 * third_height..height,
        };
        Ok((rows, cols))
    }

    /// Borrow this region of `data` without copying.
    pub fn view<'a, T>(self, data: &ArrayView2<'a, T>) -> Result<ArrayView2<'a, T>> {
        let (h, w) = data.dim();
        let (rows, cols) = self.bounds(h, w)?;
        Ok(data.clone().slice_move(s![rows, cols]))
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TopThirdMiddle => write!(f, "top third, middle band"),
            Self::BottomThirdMiddle => write!(f, "bottom third, middle band"),
        }
    }
}
