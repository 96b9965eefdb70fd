use serde::Serialize;
use std::fmt::Write;

use crate::{ImageAnalysis, features::FeatureVector, risk::RiskLevel};

/// Flattened, serializable view of one analysis, suitable for API payloads
/// or a downloadable report.
#[derive(Serialize)]
pub struct AnalysisReport {
    pub image_name: String,
    pub prediction: bool,
    pub confidence: f64,
    pub anomaly_score: f64,
    pub risk_level: RiskLevel,
    pub risk_description: &'static str,
    pub recommendations: &'static [&'static str],
    pub feature_analysis: Vec<FeatureEntry>,
    pub features: FeatureVector,
}

#[derive(Serialize)]
pub struct FeatureEntry {
    pub name: String,
    pub contribution: f64,
}

impl AnalysisReport {
    pub fn new(image_name: impl Into<String>, analysis: &ImageAnalysis) -> Self {
        let feature_analysis = analysis
            .detection
            .feature_analysis
            .iter()
            .map(|(name, &contribution)| FeatureEntry {
                name: name.clone(),
                contribution,
            })
            .collect();

        Self {
            image_name: image_name.into(),
            prediction: analysis.detection.prediction,
            confidence: analysis.detection.confidence,
            anomaly_score: analysis.detection.anomaly_score,
            risk_level: analysis.risk.level,
            risk_description: analysis.risk.description,
            recommendations: analysis.risk.recommendations,
            feature_analysis,
            features: analysis.features.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Plain-text rendering for humans.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "IMAGE MANIPULATION ANALYSIS");
        let _ = writeln!(out, "===========================");
        let _ = writeln!(out);
        let _ = writeln!(out, "Image: {}", self.image_name);
        let _ = writeln!(
            out,
            "Verdict: {}",
            if self.prediction {
                "POTENTIAL DEEPFAKE"
            } else {
                "APPEARS AUTHENTIC"
            }
        );
        let _ = writeln!(out, "Confidence: {:.1}%", self.confidence * 100.0);
        let _ = writeln!(out, "Anomaly score: {:.3}", self.anomaly_score);
        let _ = writeln!(out, "Risk level: {}", self.risk_level);
        let _ = writeln!(out, "{}", self.risk_description);
        let _ = writeln!(out);

        let _ = writeln!(out, "Signal breakdown:");
        for entry in &self.feature_analysis {
            let _ = writeln!(
                out,
                "  {:<24} {:>5.1}%",
                entry.name,
                entry.contribution * 100.0
            );
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Recommendations:");
        for recommendation in self.recommendations {
            let _ = writeln!(out, "  - {recommendation}");
        }

        out
    }
}
