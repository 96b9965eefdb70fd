use crate::{
    features::FeatureFamily,
    image_utils::{ImagePlanes, array_mean, array_std, gradient_magnitude, sobel_gradients},
};

/// Edge structure: density above a fixed magnitude threshold, magnitude
/// moments, and a single global orientation-coherence statistic.
pub struct EdgeFamily {
    threshold: f64,
}

impl EdgeFamily {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl FeatureFamily for EdgeFamily {
    fn name(&self) -> &'static str {
        "edges"
    }

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)> {
        let (grad_x, grad_y) = sobel_gradients(&image.gray);
        let magnitude = gradient_magnitude(&grad_x, &grad_y);

        let above = magnitude
            .iter()
            .filter(|&&value| value as f64 > self.threshold)
            .count();
        let edge_density = above as f64 / magnitude.len() as f64;

        // Magnitude of the mean second-harmonic orientation vector; doubling
        // the angle makes opposite gradient directions reinforce instead of
        // cancel.
        let mut cos_sum = 0.0f64;
        let mut sin_sum = 0.0f64;
        for (&gx, &gy) in grad_x.iter().zip(grad_y.iter()) {
            let angle = (gy as f64).atan2(gx as f64);
            cos_sum += (2.0 * angle).cos();
            sin_sum += (2.0 * angle).sin();
        }
        let n = grad_x.len() as f64;
        let coherence = ((cos_sum / n).powi(2) + (sin_sum / n).powi(2)).sqrt();

        vec![
            ("edge_density", edge_density),
            ("edge_strength_mean", array_mean(&magnitude) / 255.0),
            ("edge_strength_std", array_std(&magnitude) / 255.0),
            ("edge_coherence", coherence),
        ]
    }
}

impl Default for EdgeFamily {
    fn default() -> Self {
        Self::new(50.0)
    }
}
