use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, ErrorKind};

/// Region of an image, encoded as 12 digits `xxxyyywwwhhh`.
///
/// Each triple is a per-mille fraction of the source image: `022004010015`
/// starts 2.2% from the left and 0.4% from the top, and is 1% wide and 1.5%
/// high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CropArea {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}
impl CropArea {
    /// Pixel rectangle `(x, y, width, height)` of this area inside an image of
    /// the given dimensions. The rectangle is at least one pixel and never
    /// extends past the image edge.
    pub fn to_pixels(&self, width: u32, height: u32) -> (u32, u32, u32, u32) {
        let scale = |permille: u16, total: u32| (u64::from(permille) * u64::from(total) / 1000) as u32;
        let x = scale(self.x, width).min(width.saturating_sub(1));
        let y = scale(self.y, height).min(height.saturating_sub(1));
        let w = scale(self.w, width).clamp(1, (width - x).max(1));
        let h = scale(self.h, height).clamp(1, (height - y).max(1));
        (x, y, w, h)
    }
}
impl FromStr for CropArea {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
            exn::bail!(ErrorKind::InvalidArea(s.to_string()));
        }
        let triple = |i: usize| s[i * 3..i * 3 + 3].parse::<u16>().ok().filter(|v| *v <= 1000);
        match (triple(0), triple(1), triple(2), triple(3)) {
            (Some(x), Some(y), Some(w), Some(h)) if w > 0 && h > 0 && x + w <= 1000 && y + h <= 1000 => {
                Ok(Self { x, y, w, h })
            },
            _ => exn::bail!(ErrorKind::InvalidArea(s.to_string())),
        }
    }
}
impl Display for CropArea {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:03}{:03}{:03}{:03}", self.x, self.y, self.w, self.h)
    }
}
