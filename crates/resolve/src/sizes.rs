//! Size classes.
//!
//! The set of classes is fixed; only the `uncached` and `exceeds_limit` flags
//! depend on configuration, and are fixed when the registry is built.

use std::collections::BTreeMap;
use thumbs_render::ResampleOption::{
    self, Crop, Default, FillBottomRight, FillCenter, FillTopLeft, Fit, NearestNeighbor, Png, Resize,
};

pub const DEFAULT_PRECACHED: u32 = 2048;
pub const DEFAULT_MAX: u32 = 7680;

/// Rendering parameters for a named size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeClass {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub options: &'static [ResampleOption],
    /// Too large to render ahead of time or keep in the artifact store.
    pub uncached: bool,
    /// Above the largest size the renderer will produce.
    pub exceeds_limit: bool,
}
impl SizeClass {
    pub fn is_crop(&self) -> bool {
        self.options.first() == Some(&Crop)
    }

    /// Download name for a rendition of this size: `tile_224.jpg`.
    pub fn jpeg_name(&self) -> String {
        format!("{}.jpg", self.name)
    }
}

const CLASSES: &[(&str, u32, u32, &[ResampleOption])] = &[
    ("colors", 3, 3, &[Resize, NearestNeighbor, Png]),
    ("tile_50", 50, 50, &[FillCenter, Default]),
    ("tile_100", 100, 100, &[FillCenter, Default]),
    ("tile_224", 224, 224, &[FillCenter, Default]),
    ("tile_500", 500, 500, &[FillCenter, Default]),
    ("left_224", 224, 224, &[FillTopLeft, Default]),
    ("right_224", 224, 224, &[FillBottomRight, Default]),
    ("fit_224", 224, 224, &[Fit, Default]),
    ("fit_720", 720, 720, &[Fit, Default]),
    ("fit_1280", 1280, 1024, &[Fit, Default]),
    ("fit_1920", 1920, 1200, &[Fit, Default]),
    ("fit_2048", 2048, 2048, &[Fit, Default]),
    ("fit_2560", 2560, 1600, &[Fit, Default]),
    ("fit_3840", 3840, 2400, &[Fit, Default]),
    ("fit_4096", 4096, 4096, &[Fit, Default]),
    ("fit_7680", 7680, 4320, &[Fit, Default]),
    ("crop_160", 160, 160, &[Crop, Default]),
];

/// Candidates for [`SizeRegistry::find_precomputed()`], largest first.
const PRECOMPUTED: &[&str] = &[
    "fit_7680", "fit_4096", "fit_3840", "fit_2560", "fit_2048", "fit_1920", "fit_1280", "fit_720", "tile_500",
    "tile_224", "tile_100", "tile_50", "colors",
];

#[derive(Debug, Clone)]
pub struct SizeRegistry {
    classes: BTreeMap<&'static str, SizeClass>,
    precached: u32,
}

impl SizeRegistry {
    /// Build the registry. Classes wider or taller than `precached` are
    /// uncached; classes wider or taller than `max` exceed the limit.
    pub fn new(precached: u32, max: u32) -> Self {
        let classes = CLASSES
            .iter()
            .map(|&(name, width, height, options)| {
                let class = SizeClass {
                    name,
                    width,
                    height,
                    options,
                    uncached: width > precached || height > precached,
                    exceeds_limit: width > max || height > max,
                };
                (name, class)
            })
            .collect();
        Self { classes, precached }
    }

    pub fn resolve(&self, name: &str) -> Option<&SizeClass> {
        self.classes.get(name)
    }

    /// Largest precomputed class fitting within `limit` in both dimensions.
    pub fn find_precomputed(&self, limit: u32) -> Option<&SizeClass> {
        PRECOMPUTED
            .iter()
            .filter_map(|name| self.classes.get(name))
            .find(|class| class.width <= limit && class.height <= limit)
    }

    /// Dimension up to which classes are precomputed.
    pub fn precached(&self) -> u32 {
        self.precached
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeClass> {
        self.classes.values()
    }
}

impl std::default::Default for SizeRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_PRECACHED, DEFAULT_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("tile_224", 224, 224, false)]
    #[case("fit_1280", 1280, 1024, false)]
    #[case("fit_2048", 2048, 2048, false)]
    #[case("fit_2560", 2560, 1600, true)]
    #[case("fit_7680", 7680, 4320, true)]
    fn test_resolve(#[case] name: &str, #[case] width: u32, #[case] height: u32, #[case] uncached: bool) {
        let sizes = SizeRegistry::default();
        let class = sizes.resolve(name).unwrap();
        assert_eq!((class.width, class.height), (width, height));
        assert_eq!(class.uncached, uncached);
        assert!(!class.exceeds_limit);
    }

    #[test]
    fn test_resolve_unknown() {
        let sizes = SizeRegistry::default();
        assert!(sizes.resolve("fit_9999").is_none());
        assert!(sizes.resolve("").is_none());
        assert!(sizes.resolve("FIT_720").is_none());
    }

    #[test]
    fn test_exceeds_limit_follows_max() {
        let sizes = SizeRegistry::new(1024, 3840);
        assert!(sizes.resolve("fit_4096").unwrap().exceeds_limit);
        assert!(sizes.resolve("fit_7680").unwrap().exceeds_limit);
        assert!(!sizes.resolve("fit_3840").unwrap().exceeds_limit);
        assert!(sizes.resolve("fit_1280").unwrap().uncached);
    }

    #[rstest]
    #[case(2048, Some("fit_2048"))]
    #[case(4000, Some("fit_3840"))]
    #[case(1000, Some("fit_720"))]
    #[case(7680, Some("fit_7680"))]
    #[case(60, Some("tile_50"))]
    #[case(3, Some("colors"))]
    #[case(2, None)]
    fn test_find_precomputed(#[case] limit: u32, #[case] expected: Option<&str>) {
        let sizes = SizeRegistry::default();
        assert_eq!(sizes.find_precomputed(limit).map(|c| c.name), expected);
    }

    #[test]
    fn test_crop_classes() {
        let sizes = SizeRegistry::default();
        assert!(sizes.resolve("crop_160").unwrap().is_crop());
        assert!(!sizes.resolve("tile_160").is_some_and(SizeClass::is_crop));
        assert!(!sizes.resolve("tile_224").unwrap().is_crop());
        assert_eq!(sizes.resolve("crop_160").unwrap().jpeg_name(), "crop_160.jpg");
    }

    #[test]
    fn test_every_class_is_registered() {
        let sizes = SizeRegistry::default();
        assert_eq!(sizes.iter().count(), CLASSES.len());
        for name in PRECOMPUTED {
            assert!(sizes.resolve(name).is_some(), "{name} is not registered");
        }
    }
}
