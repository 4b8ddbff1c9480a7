use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy of the design pipeline
#[derive(Debug, Error)]
pub enum DesignError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid requirements: {0}")]
    Requirements(String),

    #[error("invalid cell {identifier}: {reason}")]
    InvalidCell { identifier: String, reason: String },

    #[error("cell voltage outside tabulated range for {identifier}: {voltage} V")]
    VoltageOutsideCurve { identifier: String, voltage: f64 },

    #[error("numeric error for cell {identifier}: {reason}")]
    Numeric { identifier: String, reason: String },

    #[error("unknown overhead plugin '{0}'")]
    UnknownOverheadPlugin(String),

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),

    #[error("No fitting system found. Please check requirements and settings.")]
    NoSolutions,
}
