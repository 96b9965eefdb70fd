use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Image decoding error: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Missing required feature: {0}")]
    MissingFeature(String),

    #[error("Anomaly model has not been fitted")]
    ModelNotReady,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
