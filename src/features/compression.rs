use ndarray::Array2;

use crate::{
    features::FeatureFamily,
    image_utils::{ImagePlanes, array_variance, local_variance},
};

const BLOCK_PERIOD: usize = 8;
const MIN_BLOCKING_DIMENSION: usize = 16;

/// Lossy-compression traces: how uniform the windowed variance field is, and
/// periodic discontinuities at 8-pixel block boundaries.
pub struct CompressionFamily {
    window: usize,
}

impl CompressionFamily {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    /// Mean absolute step across every 8th-pixel boundary (row 8k vs 8k-1,
    /// likewise for columns), normalized and clipped to [0, 1]. Images
    /// smaller than 16 px on either axis carry too few boundaries to score.
    fn blocking_score(gray: &Array2<f32>) -> f64 {
        let (height, width) = gray.dim();
        if height < MIN_BLOCKING_DIMENSION || width < MIN_BLOCKING_DIMENSION {
            return 0.0;
        }

        let mut row_sum = 0.0f64;
        let mut row_count = 0usize;
        let mut boundary = BLOCK_PERIOD;
        while boundary < height {
            for j in 0..width {
                row_sum += (gray[[boundary, j]] as f64 - gray[[boundary - 1, j]] as f64).abs();
                row_count += 1;
            }
            boundary += BLOCK_PERIOD;
        }

        let mut col_sum = 0.0f64;
        let mut col_count = 0usize;
        let mut boundary = BLOCK_PERIOD;
        while boundary < width {
            for i in 0..height {
                col_sum += (gray[[i, boundary]] as f64 - gray[[i, boundary - 1]] as f64).abs();
                col_count += 1;
            }
            boundary += BLOCK_PERIOD;
        }

        let row_mean = row_sum / row_count as f64;
        let col_mean = col_sum / col_count as f64;

        ((row_mean + col_mean) / 255.0).min(1.0)
    }
}

impl FeatureFamily for CompressionFamily {
    fn name(&self) -> &'static str {
        "compression"
    }

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)> {
        let variance_field = local_variance(&image.gray, self.window);
        let consistency = 1.0 / (1.0 + array_variance(&variance_field) / 10_000.0);

        vec![
            ("compression_consistency", consistency.min(1.0)),
            ("artifact_score", Self::blocking_score(&image.gray)),
        ]
    }
}

impl Default for CompressionFamily {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planes_from_gray(gray: Array2<f32>) -> ImagePlanes {
        ImagePlanes {
            red: gray.clone(),
            green: gray.clone(),
            blue: gray.clone(),
            gray,
        }
    }

    #[test]
    fn test_blocking_score_zero_below_minimum_size() {
        let tiny = Array2::from_elem((15, 64), 40.0f32);
        assert_eq!(CompressionFamily::blocking_score(&tiny), 0.0);

        let narrow = Array2::from_elem((64, 15), 40.0f32);
        assert_eq!(CompressionFamily::blocking_score(&narrow), 0.0);
    }

    #[test]
    fn test_blocked_image_scores_higher_than_flat() {
        let flat = Array2::from_elem((64, 64), 100.0f32);

        let mut blocked = Array2::zeros((64, 64));
        for ((i, j), value) in blocked.indexed_iter_mut() {
            let parity = (i / BLOCK_PERIOD + j / BLOCK_PERIOD) % 2;
            *value = if parity == 0 { 60.0 } else { 190.0 };
        }

        let flat_score = CompressionFamily::blocking_score(&flat);
        let blocked_score = CompressionFamily::blocking_score(&blocked);

        assert_eq!(flat_score, 0.0);
        assert!(blocked_score > flat_score);
        assert!(blocked_score <= 1.0);
    }

    #[test]
    fn test_scores_clipped_to_unit_interval() {
        let mut harsh = Array2::zeros((32, 32));
        for ((i, j), value) in harsh.indexed_iter_mut() {
            *value = if (i + j) % 2 == 0 { 0.0 } else { 255.0 };
        }

        let features: std::collections::HashMap<_, _> = CompressionFamily::default()
            .extract(&planes_from_gray(harsh))
            .into_iter()
            .collect();

        assert!((0.0..=1.0).contains(&features["compression_consistency"]));
        assert!((0.0..=1.0).contains(&features["artifact_score"]));
    }
}
