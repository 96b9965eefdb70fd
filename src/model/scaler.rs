use ndarray::{Array2, Axis};
use ndarray_stats::QuantileExt;

use crate::error::{DetectionError, Result};

/// Per-feature min-max normalization fitted on the baseline population.
/// Inference-time values may fall outside the fitted range and are left
/// unclipped; distance from [0, 1] is exactly the signal the forest needs.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    mins: Vec<f64>,
    maxs: Vec<f64>,
}

impl MinMaxScaler {
    pub fn fit(population: &Array2<f64>) -> Result<Self> {
        if population.nrows() == 0 {
            return Err(DetectionError::InvalidParameter(
                "cannot fit scaler on an empty population".into(),
            ));
        }

        let mut mins = Vec::with_capacity(population.ncols());
        let mut maxs = Vec::with_capacity(population.ncols());

        for column in population.axis_iter(Axis(1)) {
            let min = column.min().map_err(|_| {
                DetectionError::InvalidParameter("population column has no finite values".into())
            })?;
            let max = column.max().map_err(|_| {
                DetectionError::InvalidParameter("population column has no finite values".into())
            })?;
            mins.push(*min);
            maxs.push(*max);
        }

        Ok(Self { mins, maxs })
    }

    pub fn feature_count(&self) -> usize {
        self.mins.len()
    }

    pub fn transform(&self, sample: &[f64]) -> Vec<f64> {
        sample
            .iter()
            .enumerate()
            .map(|(i, &value)| self.scale_one(i, value))
            .collect()
    }

    pub fn transform_matrix(&self, data: &Array2<f64>) -> Array2<f64> {
        let mut scaled = data.clone();
        for ((_, j), value) in scaled.indexed_iter_mut() {
            *value = self.scale_one(j, *value);
        }
        scaled
    }

    fn scale_one(&self, index: usize, value: f64) -> f64 {
        let range = self.maxs[index] - self.mins[index];
        if range > f64::EPSILON {
            (value - self.mins[index]) / range
        } else {
            value - self.mins[index]
        }
    }
}
