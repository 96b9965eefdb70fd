use image::{DynamicImage, imageops::FilterType};
use ndarray::Array2;

use crate::error::{DetectionError, Result};

/// Float planes of a preprocessed image, values in [0, 255].
pub struct ImagePlanes {
    pub red: Array2<f32>,
    pub green: Array2<f32>,
    pub blue: Array2<f32>,
    pub gray: Array2<f32>,
}

impl ImagePlanes {
    pub fn width(&self) -> usize {
        self.gray.ncols()
    }

    pub fn height(&self) -> usize {
        self.gray.nrows()
    }

    pub fn channels(&self) -> [&Array2<f32>; 3] {
        [&self.red, &self.green, &self.blue]
    }
}

/// Decode-side preprocessing: force RGB, cap the longer side at
/// `max_dimension` (aspect preserved, never upsampled), split into float
/// planes plus the shared luminosity grayscale.
pub fn prepare(image: &DynamicImage, max_dimension: u32) -> Result<ImagePlanes> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DetectionError::InvalidImage("zero-dimension input".into()));
    }

    let resized = resize_to_limit(image, max_dimension);
    let rgb = resized.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut red = Array2::zeros((height as usize, width as usize));
    let mut green = Array2::zeros((height as usize, width as usize));
    let mut blue = Array2::zeros((height as usize, width as usize));
    let mut gray = Array2::zeros((height as usize, width as usize));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (row, col) = (y as usize, x as usize);
        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
        red[[row, col]] = r;
        green[[row, col]] = g;
        blue[[row, col]] = b;
        gray[[row, col]] = 0.2989 * r + 0.5870 * g + 0.1140 * b;
    }

    Ok(ImagePlanes { red, green, blue, gray })
}

pub fn resize_to_limit(image: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());

    if width.max(height) <= max_dimension {
        return image.clone();
    }

    let (new_width, new_height) = if width > height {
        let scaled = ((height as f64 * max_dimension as f64) / width as f64) as u32;
        (max_dimension, scaled.max(1))
    } else {
        let scaled = ((width as f64 * max_dimension as f64) / height as f64) as u32;
        (scaled.max(1), max_dimension)
    };

    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

// Reflect indexing (d c b a | a b c d | d c b a), the boundary mode the
// convolutions below assume.
fn reflect(index: isize, len: usize) -> usize {
    let len = len as isize;
    let mut i = index;
    loop {
        if i < 0 {
            i = -i - 1;
        } else if i >= len {
            i = 2 * len - 1 - i;
        } else {
            return i as usize;
        }
    }
}

/// Correlate a 1-D kernel along axis 0 (down the rows), centered at
/// `len / 2`, with reflected boundaries.
pub fn correlate_rows(src: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (height, width) = src.dim();
    let origin = kernel.len() as isize / 2;
    let mut out = Array2::zeros((height, width));

    for i in 0..height {
        for j in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let row = reflect(i as isize + k as isize - origin, height);
                sum += w * src[[row, j]];
            }
            out[[i, j]] = sum;
        }
    }

    out
}

/// Correlate a 1-D kernel along axis 1 (across the columns).
pub fn correlate_cols(src: &Array2<f32>, kernel: &[f32]) -> Array2<f32> {
    let (height, width) = src.dim();
    let origin = kernel.len() as isize / 2;
    let mut out = Array2::zeros((height, width));

    for i in 0..height {
        for j in 0..width {
            let mut sum = 0.0f32;
            for (k, &w) in kernel.iter().enumerate() {
                let col = reflect(j as isize + k as isize - origin, width);
                sum += w * src[[i, col]];
            }
            out[[i, j]] = sum;
        }
    }

    out
}

pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let mut kernel = Vec::with_capacity(2 * radius + 1);

    for offset in -(radius as isize)..=(radius as isize) {
        let x = offset as f32;
        kernel.push((-0.5 * (x / sigma).powi(2)).exp());
    }

    let sum: f32 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }

    kernel
}

pub fn gaussian_blur(src: &Array2<f32>, sigma: f32) -> Array2<f32> {
    let kernel = gaussian_kernel(sigma);
    correlate_cols(&correlate_rows(src, &kernel), &kernel)
}

/// Discrete Laplacian: sum of 1-D [1, -2, 1] responses along both axes.
pub fn laplacian(src: &Array2<f32>) -> Array2<f32> {
    let (height, width) = src.dim();
    let mut out = Array2::zeros((height, width));

    for i in 0..height {
        for j in 0..width {
            let up = src[[reflect(i as isize - 1, height), j]];
            let down = src[[reflect(i as isize + 1, height), j]];
            let left = src[[i, reflect(j as isize - 1, width)]];
            let right = src[[i, reflect(j as isize + 1, width)]];
            out[[i, j]] = up + down + left + right - 4.0 * src[[i, j]];
        }
    }

    out
}

/// Separable Sobel operator. Returns (horizontal, vertical) first-derivative
/// responses; the smoothing lobe is kept un-normalized so magnitudes stay on
/// the conventional 0..~1020 scale the edge threshold expects.
pub fn sobel_gradients(src: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    const DERIVATIVE: [f32; 3] = [-1.0, 0.0, 1.0];
    const SMOOTH: [f32; 3] = [1.0, 2.0, 1.0];

    let grad_x = correlate_rows(&correlate_cols(src, &DERIVATIVE), &SMOOTH);
    let grad_y = correlate_cols(&correlate_rows(src, &DERIVATIVE), &SMOOTH);

    (grad_x, grad_y)
}

pub fn gradient_magnitude(grad_x: &Array2<f32>, grad_y: &Array2<f32>) -> Array2<f32> {
    let mut out = Array2::zeros(grad_x.dim());

    for ((i, j), value) in out.indexed_iter_mut() {
        let gx = grad_x[[i, j]];
        let gy = grad_y[[i, j]];
        *value = (gx * gx + gy * gy).sqrt();
    }

    out
}

pub fn box_mean(src: &Array2<f32>, size: usize) -> Array2<f32> {
    let kernel = vec![1.0 / size as f32; size];
    correlate_cols(&correlate_rows(src, &kernel), &kernel)
}

/// Windowed variance via Var = E[x^2] - E[x]^2, floored at zero against
/// floating-point cancellation on flat patches.
pub fn local_variance(src: &Array2<f32>, size: usize) -> Array2<f32> {
    let squared = src.mapv(|v| v * v);
    let mean = box_mean(src, size);
    let mean_of_squares = box_mean(&squared, size);

    let mut out = Array2::zeros(src.dim());
    for ((i, j), value) in out.indexed_iter_mut() {
        *value = (mean_of_squares[[i, j]] - mean[[i, j]] * mean[[i, j]]).max(0.0);
    }

    out
}

/// Fixed-range histogram over [0, 255]; the top edge lands in the last bin.
pub fn histogram<I>(values: I, bins: usize) -> Vec<f64>
where
    I: Iterator<Item = f32>,
{
    let mut counts = vec![0.0f64; bins];
    let scale = bins as f32 / 255.0;

    for value in values {
        let bin = ((value * scale) as usize).min(bins - 1);
        counts[bin] += 1.0;
    }

    counts
}

/// Shannon entropy (natural log) of a count histogram, with the 1e-7
/// epsilon convention applied both to the normalizer and inside the log.
pub fn histogram_entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    let mut entropy = 0.0;

    for &count in counts {
        let p = count / (total + 1e-7);
        entropy -= p * (p + 1e-7).ln();
    }

    entropy
}

pub fn array_mean(arr: &Array2<f32>) -> f64 {
    let sum: f64 = arr.iter().map(|&v| v as f64).sum();
    sum / arr.len() as f64
}

/// Population variance (divides by n, not n - 1).
pub fn array_variance(arr: &Array2<f32>) -> f64 {
    let mean = array_mean(arr);
    let sum: f64 = arr.iter().map(|&v| (v as f64 - mean).powi(2)).sum();
    sum / arr.len() as f64
}

pub fn array_std(arr: &Array2<f32>) -> f64 {
    array_variance(arr).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn solid_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([120, 60, 30])))
    }

    #[test]
    fn test_resize_caps_longer_side() {
        let resized = resize_to_limit(&solid_image(1000, 700), 512);
        assert_eq!(resized.width(), 512);
        assert_eq!(resized.height(), 358);

        let portrait = resize_to_limit(&solid_image(700, 1000), 512);
        assert_eq!(portrait.width(), 358);
        assert_eq!(portrait.height(), 512);
    }

    #[test]
    fn test_resize_never_upsamples() {
        let resized = resize_to_limit(&solid_image(300, 200), 512);
        assert_eq!((resized.width(), resized.height()), (300, 200));
    }

    #[test]
    fn test_prepare_rejects_zero_dimension() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 10));
        assert!(matches!(
            prepare(&empty, 512),
            Err(DetectionError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_gaussian_kernel_normalized() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.len(), 9);
        let sum: f32 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reflect_boundaries() {
        assert_eq!(reflect(-1, 5), 0);
        assert_eq!(reflect(-2, 5), 1);
        assert_eq!(reflect(5, 5), 4);
        assert_eq!(reflect(6, 5), 3);
        assert_eq!(reflect(2, 5), 2);
    }

    #[test]
    fn test_local_variance_flat_patch() {
        let flat = Array2::from_elem((32, 32), 200.0f32);
        let var = local_variance(&flat, 8);
        assert!(var.iter().all(|&v| v >= 0.0 && v < 1e-3));
    }

    #[test]
    fn test_histogram_top_edge() {
        let counts = histogram([255.0f32, 0.0, 127.5].into_iter(), 50);
        assert_eq!(counts[49], 1.0);
        assert_eq!(counts[0], 1.0);
        assert_eq!(counts[25], 1.0);
    }
}
