use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_confidence(confidence: f64) -> Self {
        match confidence {
            c if c >= 0.8 => RiskLevel::High,
            c if c >= 0.5 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        write!(f, "{label}")
    }
}

/// Fixed guidance attached to a confidence tier. The content is static;
/// nothing here derives from the image itself.
#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    pub description: &'static str,
    pub recommendations: &'static [&'static str],
}

pub fn assess(confidence: f64) -> RiskAssessment {
    match RiskLevel::from_confidence(confidence) {
        RiskLevel::High => RiskAssessment {
            level: RiskLevel::High,
            description: "Strong indicators of manipulation detected. This image likely contains deepfake characteristics.",
            recommendations: &[
                "Exercise extreme caution before trusting this image",
                "Consider additional verification methods",
                "Check the source and context carefully",
            ],
        },
        RiskLevel::Medium => RiskAssessment {
            level: RiskLevel::Medium,
            description: "Some suspicious patterns detected. The image may have been manipulated.",
            recommendations: &[
                "Verify the source of the image",
                "Look for additional evidence of authenticity",
                "Consider the context and plausibility",
            ],
        },
        RiskLevel::Low => RiskAssessment {
            level: RiskLevel::Low,
            description: "The image appears to be authentic with no strong indicators of manipulation.",
            recommendations: &[
                "Image appears legitimate based on analysis",
                "Standard verification practices still apply",
                "Consider the source and context as always",
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(RiskLevel::from_confidence(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_confidence(0.49), RiskLevel::Low);
        assert_eq!(RiskLevel::from_confidence(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_confidence(0.79), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_confidence(0.8), RiskLevel::High);
        assert_eq!(RiskLevel::from_confidence(1.0), RiskLevel::High);
    }

    #[test]
    fn test_assessment_carries_recommendations() {
        let assessment = assess(0.92);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(assessment.recommendations.len(), 3);
    }
}
