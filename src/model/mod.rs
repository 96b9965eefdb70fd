pub mod baseline;
pub mod forest;
pub mod scaler;

use std::{collections::BTreeMap, sync::Arc};

use ndarray::Axis;
use parking_lot::RwLock;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    AnalysisConfig,
    error::{DetectionError, Result},
    features::FeatureVector,
    model::{baseline::MODEL_FEATURES, forest::IsolationForest, scaler::MinMaxScaler},
};

// Sigmoid placement relative to the baseline score distribution: flag
// samples scoring past mean + 3 sigma.
const CENTER_SIGMAS: f64 = 3.0;
const MIN_SCORE_SCALE: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub prediction: bool,
    pub confidence: f64,
    pub anomaly_score: f64,
    pub feature_analysis: BTreeMap<String, f64>,
}

/// Scaler, forest, and the baseline statistics needed to interpret raw
/// scores. Immutable once fitted; shared behind an `Arc` by every caller.
struct AnomalyModel {
    scaler: MinMaxScaler,
    forest: IsolationForest,
    score_center: f64,
    score_scale: f64,
    feature_means: Vec<f64>,
    feature_stds: Vec<f64>,
}

impl AnomalyModel {
    fn fit(config: &AnalysisConfig) -> Result<Self> {
        let population = baseline::generate_population(config.population_size, config.seed)?;
        let scaler = MinMaxScaler::fit(&population)?;
        let scaled = scaler.transform_matrix(&population);

        let mut rng = StdRng::seed_from_u64(config.seed ^ 0x9E37_79B9_7F4A_7C15);
        let forest = IsolationForest::fit(
            &scaled,
            config.tree_count,
            config.tree_sample_size,
            &mut rng,
        )?;

        let scores: Vec<f64> = scaled
            .rows()
            .into_iter()
            .map(|row| forest.score(&row.to_vec()))
            .collect();
        let (score_mean, score_std) = mean_and_std(&scores);

        let mut feature_means = Vec::with_capacity(scaled.ncols());
        let mut feature_stds = Vec::with_capacity(scaled.ncols());
        for column in scaled.axis_iter(Axis(1)) {
            let (mean, std) = mean_and_std(&column.to_vec());
            feature_means.push(mean);
            feature_stds.push(std);
        }

        Ok(Self {
            scaler,
            forest,
            score_center: score_mean + CENTER_SIGMAS * score_std,
            score_scale: score_std.max(MIN_SCORE_SCALE),
            feature_means,
            feature_stds,
        })
    }

    fn predict(&self, features: &FeatureVector, threshold: f64) -> Result<DetectionResult> {
        let mut raw = Vec::with_capacity(MODEL_FEATURES.len());
        for range in &MODEL_FEATURES {
            raw.push(features.require(range.name)?);
        }

        let scaled = self.scaler.transform(&raw);
        let anomaly_score = self.forest.score(&scaled);
        let confidence = sigmoid((anomaly_score - self.score_center) / self.score_scale);
        let prediction = confidence >= threshold;

        // How far each scaled input sits from the baseline population,
        // normalized so the caller can see which signal drove the verdict.
        let mut feature_analysis = BTreeMap::new();
        for (i, range) in MODEL_FEATURES.iter().enumerate() {
            let spread = (4.0 * self.feature_stds[i]).max(1e-9);
            let deviation = ((scaled[i] - self.feature_means[i]).abs() / spread).min(1.0);
            feature_analysis.insert(range.name.to_string(), deviation);
        }

        Ok(DetectionResult {
            prediction,
            confidence,
            anomaly_score,
            feature_analysis,
        })
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

/// Anomaly scorer over extracted feature vectors. Fit once at service
/// startup; afterwards the fitted model is read-only and `predict` is safe
/// for unlimited concurrent callers.
pub struct DeepfakeDetector {
    config: AnalysisConfig,
    model: RwLock<Option<Arc<AnomalyModel>>>,
}

impl DeepfakeDetector {
    pub fn new() -> Self {
        Self::with_config(&AnalysisConfig::default())
    }

    pub fn with_config(config: &AnalysisConfig) -> Self {
        Self {
            config: config.clone(),
            model: RwLock::new(None),
        }
    }

    /// Construct and fit in one step.
    pub fn fitted(config: &AnalysisConfig) -> Result<Self> {
        let detector = Self::with_config(config);
        detector.fit()?;
        Ok(detector)
    }

    pub fn fit(&self) -> Result<()> {
        let model = AnomalyModel::fit(&self.config)?;
        log::info!(
            "fitted anomaly model on {} synthetic samples across {} trees",
            self.config.population_size,
            self.config.tree_count
        );
        *self.model.write() = Some(Arc::new(model));
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.model.read().is_some()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<DetectionResult> {
        let model = self
            .model
            .read()
            .as_ref()
            .cloned()
            .ok_or(DetectionError::ModelNotReady)?;

        let result = model.predict(features, self.config.confidence_threshold)?;
        log::debug!(
            "anomaly score {:.3} mapped to confidence {:.3}",
            result.anomaly_score,
            result.confidence
        );

        Ok(result)
    }
}

impl Default for DeepfakeDetector {
    fn default() -> Self {
        Self::new()
    }
}
