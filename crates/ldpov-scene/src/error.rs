//! Error types for scene generation.

use thiserror::Error;

/// Errors that abort a render or a configuration load.
///
/// Data problems inside a model (odd primitive names, singular placements,
/// misplaced edge colors, missing parts) are not errors: they are logged,
/// counted in the render report and worked around.
#[derive(Error, Debug)]
pub enum SceneError {
    /// Writing the scene or a resource file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
