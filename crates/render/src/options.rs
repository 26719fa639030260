use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, ErrorKind};

/// Rendering option attached to a size class.
///
/// A size class carries an ordered list of these: exactly one resample method
/// (the first of them wins), then optional modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResampleOption {
    /// Scale down to fit inside the box, keeping the aspect ratio.
    Fit,
    /// Scale to cover the box, then cut the centre.
    FillCenter,
    /// Scale to cover the box, then cut from the top-left corner.
    FillTopLeft,
    /// Scale to cover the box, then cut from the bottom-right corner.
    FillBottomRight,
    /// Scale to exactly the box, ignoring the aspect ratio.
    Resize,
    /// Cut a region out of an already rendered artifact.
    Crop,
    /// Use nearest-neighbour sampling instead of the configured filter.
    NearestNeighbor,
    /// Use the configured filter.
    Default,
    /// Encode as PNG instead of JPEG.
    Png,
}
impl ResampleOption {
    pub fn is_method(&self) -> bool {
        matches!(
            self,
            Self::Fit | Self::FillCenter | Self::FillTopLeft | Self::FillBottomRight | Self::Resize | Self::Crop
        )
    }

    /// Short name used in artifact file names.
    pub fn method_name(&self) -> Option<&'static str> {
        Some(match self {
            Self::Fit => "fit",
            Self::FillCenter => "center",
            Self::FillTopLeft => "left",
            Self::FillBottomRight => "right",
            Self::Resize => "resize",
            Self::Crop => "crop",
            _ => return None,
        })
    }
}

/// First resample method in an option list; [`Fit`](ResampleOption::Fit) when
/// the list names none.
pub fn method_of(options: &[ResampleOption]) -> ResampleOption {
    options.iter().copied().find(ResampleOption::is_method).unwrap_or(ResampleOption::Fit)
}

/// Resampling filter used when scaling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    Lanczos,
    CatmullRom,
    Linear,
    Gaussian,
    Nearest,
}
impl From<Filter> for FilterType {
    fn from(filter: Filter) -> Self {
        match filter {
            Filter::Lanczos => FilterType::Lanczos3,
            Filter::CatmullRom => FilterType::CatmullRom,
            Filter::Linear => FilterType::Triangle,
            Filter::Gaussian => FilterType::Gaussian,
            Filter::Nearest => FilterType::Nearest,
        }
    }
}
impl FromStr for Filter {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "lanczos" | "lanczos3" => Self::Lanczos,
            "catmullrom" | "cubic" => Self::CatmullRom,
            "linear" | "triangle" => Self::Linear,
            "gaussian" | "blackman" => Self::Gaussian,
            "nearest" => Self::Nearest,
            _ => exn::bail!(ErrorKind::InvalidFilter(s.to_string())),
        })
    }
}
impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Lanczos => "lanczos",
            Self::CatmullRom => "catmullrom",
            Self::Linear => "linear",
            Self::Gaussian => "gaussian",
            Self::Nearest => "nearest",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResampleOption::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[Fit, Default], Fit)]
    #[case(&[Resize, NearestNeighbor, Png], Resize)]
    #[case(&[Default, FillTopLeft], FillTopLeft)]
    #[case(&[Crop, FillCenter], Crop)]
    #[case(&[Png], Fit)]
    #[case(&[], Fit)]
    fn test_method_of(#[case] options: &[ResampleOption], #[case] expected: ResampleOption) {
        assert_eq!(method_of(options), expected);
    }

    #[rstest]
    #[case("lanczos", Filter::Lanczos)]
    #[case("Cubic", Filter::CatmullRom)]
    #[case("triangle", Filter::Linear)]
    #[case("nearest", Filter::Nearest)]
    fn test_filter_parse(#[case] input: &str, #[case] expected: Filter) {
        assert_eq!(input.parse::<Filter>().unwrap(), expected);
    }

    #[test]
    fn test_filter_parse_unknown() {
        assert!("bicubic-ish".parse::<Filter>().is_err());
    }

    #[test]
    fn test_modifiers_have_no_method_name() {
        assert_eq!(Png.method_name(), None);
        assert_eq!(NearestNeighbor.method_name(), None);
        assert_eq!(FillBottomRight.method_name(), Some("right"));
    }
}
