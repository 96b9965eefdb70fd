pub mod color;
pub mod compression;
pub mod edges;
pub mod intensity;
pub mod noise;
pub mod texture;

use std::collections::BTreeMap;

use image::DynamicImage;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfig,
    error::{DetectionError, Result},
    image_utils::{self, ImagePlanes},
};

/// Named scalar statistics describing one image. Keys are the stable
/// interface between the extractor and the anomaly model; non-finite values
/// are coerced to 0.0 on insertion so every stored entry is a usable number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(BTreeMap<String, f64>);

impl FeatureVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        let sanitized = if value.is_finite() { value } else { 0.0 };
        self.0.insert(name.into(), sanitized);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<f64> {
        self.get(name)
            .ok_or_else(|| DetectionError::MissingFeature(name.into()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, &value)| (name.as_str(), value))
    }
}

/// One family of statistics computed from the shared preprocessed planes.
pub trait FeatureFamily: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)>;
}

pub struct FeatureExtractor {
    max_dimension: u32,
    families: Vec<Box<dyn FeatureFamily>>,
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        let families: Vec<Box<dyn FeatureFamily>> = vec![
            Box::new(noise::NoiseFamily::new(config.noise_sigma)),
            Box::new(intensity::IntensityFamily::new()),
            Box::new(edges::EdgeFamily::new(config.edge_threshold)),
            Box::new(texture::TextureFamily::new(config.texture_window)),
            Box::new(compression::CompressionFamily::new(config.texture_window)),
            Box::new(color::ColorFamily::new()),
        ];

        Self {
            max_dimension: config.max_dimension,
            families,
        }
    }

    pub fn extract_bytes(&self, bytes: &[u8]) -> Result<FeatureVector> {
        let image = image::load_from_memory(bytes)?;
        self.extract(&image)
    }

    pub fn extract(&self, image: &DynamicImage) -> Result<FeatureVector> {
        let planes = image_utils::prepare(image, self.max_dimension)?;

        let outputs: Vec<Vec<(&'static str, f64)>> = self
            .families
            .par_iter()
            .map(|family| family.extract(&planes))
            .collect();

        let mut features = FeatureVector::new();
        for family_output in outputs {
            for (name, value) in family_output {
                features.insert(name, value);
            }
        }

        log::debug!(
            "extracted {} features from {}x{} image",
            features.len(),
            planes.width(),
            planes.height()
        );

        Ok(features)
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const ALL_FEATURES: [&str; 32] = [
        "noise_std",
        "noise_variance",
        "noise_mean",
        "high_freq_variance",
        "mean_intensity",
        "intensity_std",
        "intensity_variance",
        "r_mean",
        "r_std",
        "g_mean",
        "g_std",
        "b_mean",
        "b_std",
        "pixel_entropy",
        "gradient_mean",
        "gradient_std",
        "edge_density",
        "edge_strength_mean",
        "edge_strength_std",
        "edge_coherence",
        "texture_variance",
        "texture_energy",
        "compression_consistency",
        "artifact_score",
        "channel_0_entropy",
        "channel_1_entropy",
        "channel_2_entropy",
        "color_entropy",
        "color_variance",
        "rg_correlation",
        "rb_correlation",
        "gb_correlation",
    ];

    fn textured_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let r = ((x * 7 + y * 13) % 256) as u8;
            let g = ((x * 3 + y * 5 + 40) % 256) as u8;
            let b = ((x * 11 + y * 2 + 90) % 256) as u8;
            *pixel = Rgb([r, g, b]);
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_all_keys_present_and_finite() {
        let extractor = FeatureExtractor::new();
        let features = extractor.extract(&textured_image(96, 64)).unwrap();

        assert_eq!(features.len(), ALL_FEATURES.len());
        for name in ALL_FEATURES {
            let value = features.get(name).unwrap_or_else(|| panic!("missing {name}"));
            assert!(value.is_finite(), "{name} is not finite");
        }
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = FeatureExtractor::new();
        let image = textured_image(120, 80);

        let first = extractor.extract(&image).unwrap();
        let second = extractor.extract(&image).unwrap();

        for (name, value) in first.iter() {
            let other = second.get(name).unwrap();
            assert!((value - other).abs() < 1e-9, "{name} drifted between runs");
        }
    }

    #[test]
    fn test_uniform_image_statistics() {
        let uniform = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            100,
            100,
            Rgb([255, 0, 0]),
        ));
        let features = FeatureExtractor::new().extract(&uniform).unwrap();

        assert_eq!(features.get("edge_density").unwrap(), 0.0);
        assert!(features.get("noise_std").unwrap().abs() < 1e-6);
        assert!(features.get("color_variance").unwrap().abs() < 1e-6);
        assert!(features.get("texture_variance").unwrap().abs() < 1e-6);
    }

    #[test]
    fn test_feature_vector_sanitizes_non_finite() {
        let mut features = FeatureVector::new();
        features.insert("bad", f64::NAN);
        features.insert("worse", f64::INFINITY);

        assert_eq!(features.get("bad"), Some(0.0));
        assert_eq!(features.get("worse"), Some(0.0));
    }

    #[test]
    fn test_require_reports_missing_key() {
        let features = FeatureVector::new();
        match features.require("edge_density") {
            Err(DetectionError::MissingFeature(name)) => assert_eq!(name, "edge_density"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_extract_bytes_rejects_garbage() {
        let extractor = FeatureExtractor::new();
        assert!(matches!(
            extractor.extract_bytes(b"not an image"),
            Err(DetectionError::ImageLoad(_))
        ));
    }
}
