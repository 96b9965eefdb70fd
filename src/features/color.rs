use ndarray::Array2;
use ndarray_stats::CorrelationExt;

use crate::{
    features::FeatureFamily,
    image_utils::{ImagePlanes, array_variance, histogram, histogram_entropy},
};

const CHANNEL_BINS: usize = 32;

/// Color distribution: per-channel histogram entropies, global pixel
/// variance, and inter-channel correlation strength.
pub struct ColorFamily;

impl ColorFamily {
    pub fn new() -> Self {
        Self
    }

    fn channel_correlations(image: &ImagePlanes) -> (f64, f64, f64) {
        let n = image.width() * image.height();
        let mut stacked = Vec::with_capacity(3 * n);
        for plane in image.channels() {
            stacked.extend(plane.iter().map(|&v| v as f64));
        }

        let observations = match Array2::from_shape_vec((3, n), stacked) {
            Ok(matrix) => matrix,
            Err(_) => return (0.0, 0.0, 0.0),
        };

        // A constant channel yields NaN coefficients here; the feature
        // vector's insertion guard turns those into 0.0.
        match observations.pearson_correlation() {
            Ok(correlation) => (
                correlation[[0, 1]].abs(),
                correlation[[0, 2]].abs(),
                correlation[[1, 2]].abs(),
            ),
            Err(_) => (0.0, 0.0, 0.0),
        }
    }
}

impl FeatureFamily for ColorFamily {
    fn name(&self) -> &'static str {
        "color"
    }

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)> {
        let channels = image.channels();

        let entropies: Vec<f64> = channels
            .iter()
            .map(|plane| {
                let counts = histogram(plane.iter().copied(), CHANNEL_BINS);
                histogram_entropy(&counts)
            })
            .collect();
        let color_entropy = entropies.iter().sum::<f64>() / entropies.len() as f64;

        // Averaged within-channel variance, so a solid color scores zero
        // even when the channels sit at different levels.
        let variance: f64 = channels
            .iter()
            .map(|plane| array_variance(plane))
            .sum::<f64>()
            / channels.len() as f64;

        let (rg, rb, gb) = Self::channel_correlations(image);

        vec![
            ("channel_0_entropy", entropies[0]),
            ("channel_1_entropy", entropies[1]),
            ("channel_2_entropy", entropies[2]),
            ("color_entropy", color_entropy),
            ("color_variance", variance / (255.0 * 255.0)),
            ("rg_correlation", rg),
            ("rb_correlation", rb),
            ("gb_correlation", gb),
        ]
    }
}

impl Default for ColorFamily {
    fn default() -> Self {
        Self::new()
    }
}
