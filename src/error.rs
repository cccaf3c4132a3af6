use thiserror::Error;

/// Failure reported by an [`Encoder`](crate::qrcode::Encoder).
///
/// The message is kept exactly as the encoding engine produced it, so it can be
/// shown to the user without rewording.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EncodeError {
    message: String,
}

impl EncodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<qrcodegen::DataTooLong> for EncodeError {
    fn from(err: qrcodegen::DataTooLong) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors raised outside the preview pipeline proper: building matrices by
/// hand, exporting renders and loading configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("module grid holds {actual} cells, a {size}x{size} symbol needs {expected}")]
    MatrixShape {
        size: usize,
        expected: usize,
        actual: usize,
    },

    #[error("unknown form field `{0}`")]
    UnknownField(String),

    #[error("malformed edit `{0}`, expected `field=value`")]
    MalformedEdit(String),

    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
