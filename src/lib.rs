use std::path::Path;

use image::DynamicImage;
use serde::Serialize;

pub mod error;
pub mod features;
pub mod image_utils;
pub mod model;
pub mod report;
pub mod risk;

pub use error::{DetectionError, Result};
pub use features::{FeatureExtractor, FeatureVector};
pub use model::{DeepfakeDetector, DetectionResult};
pub use risk::{RiskAssessment, RiskLevel};

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Longer-side cap applied before extraction; inputs are never upsampled.
    pub max_dimension: u32,
    /// Gaussian sigma for the noise-residual estimate.
    pub noise_sigma: f32,
    /// Absolute gradient magnitude above which a pixel counts as an edge.
    pub edge_threshold: f64,
    /// Window size for the local-variance field (texture and compression).
    pub texture_window: usize,
    /// Synthetic baseline population size.
    pub population_size: usize,
    pub tree_count: usize,
    pub tree_sample_size: usize,
    /// Seed for baseline sampling and forest construction; fixed by default
    /// so every process fits the same model.
    pub seed: u64,
    /// Confidence at or above which an image is flagged.
    pub confidence_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: 512,
            noise_sigma: 1.0,
            edge_threshold: 50.0,
            texture_window: 8,
            population_size: 512,
            tree_count: 100,
            tree_sample_size: 256,
            seed: 0x00DE_FA7E,
            confidence_threshold: 0.5,
        }
    }
}

/// Everything one analysis produces: the verdict, its risk tier, and the
/// full extracted feature set.
#[derive(Debug, Clone, Serialize)]
pub struct ImageAnalysis {
    pub detection: DetectionResult,
    pub risk: RiskAssessment,
    pub features: FeatureVector,
}

/// Offline forensic pipeline for single still images: statistical feature
/// extraction followed by unsupervised anomaly scoring against a synthetic
/// authentic-image baseline. Construction fits the model; afterwards the
/// analyzer is read-only and can be shared across threads.
pub struct DeepfakeAnalyzer {
    extractor: FeatureExtractor,
    detector: DeepfakeDetector,
}

impl DeepfakeAnalyzer {
    pub fn new() -> Result<Self> {
        Self::with_config(AnalysisConfig::default())
    }

    pub fn with_config(config: AnalysisConfig) -> Result<Self> {
        let extractor = FeatureExtractor::with_config(&config);
        let detector = DeepfakeDetector::fitted(&config)?;

        Ok(Self { extractor, detector })
    }

    pub fn extract_features(&self, bytes: &[u8]) -> Result<FeatureVector> {
        self.extractor.extract_bytes(bytes)
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<DetectionResult> {
        self.detector.predict(features)
    }

    pub fn analyze_image(&self, image: &DynamicImage) -> Result<ImageAnalysis> {
        let features = self.extractor.extract(image)?;
        let detection = self.detector.predict(&features)?;
        let risk = risk::assess(detection.confidence);

        Ok(ImageAnalysis {
            detection,
            risk,
            features,
        })
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<ImageAnalysis> {
        let image = image::load_from_memory(bytes)?;
        self.analyze_image(&image)
    }

    pub fn analyze_path<P: AsRef<Path>>(&self, path: P) -> Result<ImageAnalysis> {
        let image = image::open(path)?;
        self.analyze_image(&image)
    }
}
