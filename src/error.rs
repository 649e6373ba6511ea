use thiserror::Error;

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "wav")]
    #[error("WAV decode error: {0}")]
    Wav(#[from] hound::Error),

    #[error("sample contains no frames")]
    EmptySample,

    #[error("unsupported sample format: {bits}-bit {format}")]
    UnsupportedFormat { bits: u16, format: &'static str },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
