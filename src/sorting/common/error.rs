use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortError {
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid frame dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Snapshot persistence failed: {0}")]
    Persistence(String),

    #[error("Frame capture failed: {0}")]
    Capture(String),

    #[error("Actuator command failed: {0}")]
    Actuator(String),
}

impl SortError {
    /// True for errors that reject the input frame itself. These stop a scan
    /// before any actuator or statistics side effect.
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self, Self::InvalidFrame(_) | Self::InvalidDimensions(_, _))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

pub type Result<T> = std::result::Result<T, SortError>;
