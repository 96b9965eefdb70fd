use crate::{
    features::FeatureFamily,
    image_utils::{
        ImagePlanes, array_mean, array_std, gradient_magnitude, histogram, histogram_entropy,
        sobel_gradients,
    },
};

/// Global intensity distribution: overall and per-channel moments, the
/// pixel-value histogram entropy, and first-derivative magnitude statistics.
pub struct IntensityFamily;

impl IntensityFamily {
    pub fn new() -> Self {
        Self
    }
}

impl FeatureFamily for IntensityFamily {
    fn name(&self) -> &'static str {
        "intensity"
    }

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)> {
        let channels = image.channels();
        let count = (image.width() * image.height() * 3) as f64;

        let sum: f64 = channels
            .iter()
            .map(|plane| plane.iter().map(|&v| v as f64).sum::<f64>())
            .sum();
        let mean = sum / count;

        let squared_deviation: f64 = channels
            .iter()
            .map(|plane| {
                plane
                    .iter()
                    .map(|&v| (v as f64 - mean).powi(2))
                    .sum::<f64>()
            })
            .sum();
        let variance = squared_deviation / count;

        let counts = histogram(
            channels.iter().flat_map(|plane| plane.iter().copied()),
            50,
        );
        let pixel_entropy = histogram_entropy(&counts);

        let (grad_x, grad_y) = sobel_gradients(&image.gray);
        let magnitude = gradient_magnitude(&grad_x, &grad_y);

        vec![
            ("mean_intensity", mean / 255.0),
            ("intensity_std", variance.sqrt() / 255.0),
            ("intensity_variance", variance / (255.0 * 255.0)),
            ("r_mean", array_mean(&image.red) / 255.0),
            ("r_std", array_std(&image.red) / 255.0),
            ("g_mean", array_mean(&image.green) / 255.0),
            ("g_std", array_std(&image.green) / 255.0),
            ("b_mean", array_mean(&image.blue) / 255.0),
            ("b_std", array_std(&image.blue) / 255.0),
            ("pixel_entropy", pixel_entropy),
            ("gradient_mean", array_mean(&magnitude) / 255.0),
            ("gradient_std", array_std(&magnitude) / 255.0),
        ]
    }
}

impl Default for IntensityFamily {
    fn default() -> Self {
        Self::new()
    }
}
