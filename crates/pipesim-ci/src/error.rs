//! Error types for pipeline setup and stage bookkeeping

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pipeline declares no stages")]
    EmptyPipeline,

    #[error("Invalid stage identifier: {0:?}")]
    InvalidStageId(String),

    #[error("Stage '{0}' is declared more than once")]
    DuplicateStage(String),

    #[error("Stage '{0}' has no presentation slot")]
    UnknownSlot(String),

    #[error("Invalid stage status transition for '{stage}': {current} -> {requested}")]
    InvalidStatusTransition {
        stage: String,
        current: String,
        requested: String,
    },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
