use crate::{
    features::FeatureFamily,
    image_utils::{ImagePlanes, array_mean, gradient_magnitude, local_variance, sobel_gradients},
};

/// Patch-level texture statistics from a windowed variance field.
pub struct TextureFamily {
    window: usize,
}

impl TextureFamily {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl FeatureFamily for TextureFamily {
    fn name(&self) -> &'static str {
        "texture"
    }

    fn extract(&self, image: &ImagePlanes) -> Vec<(&'static str, f64)> {
        let variance_field = local_variance(&image.gray, self.window);
        let texture_variance = array_mean(&variance_field) / (255.0 * 255.0);

        let (grad_x, grad_y) = sobel_gradients(&image.gray);
        let energy = gradient_magnitude(&grad_x, &grad_y);

        vec![
            ("texture_variance", texture_variance),
            ("texture_energy", array_mean(&energy) / 255.0),
        ]
    }
}

impl Default for TextureFamily {
    fn default() -> Self {
        Self::new(8)
    }
}
