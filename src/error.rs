//! Error types for the physique-scan library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur while scoring, storing or comparing scans.
#[derive(Error, Debug)]
pub enum PhysiqueError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A landmark sequence is shorter than the pose-estimation convention requires
    #[error("Insufficient {view} landmarks: got {actual}, need {expected}")]
    InsufficientLandmarks {
        /// Which view the landmarks belong to (front, side, pose)
        view: &'static str,
        /// Required landmark count
        expected: usize,
        /// Supplied landmark count
        actual: usize,
    },

    /// A specific landmark index is outside the supplied sequence
    #[error("Missing landmark {name} (index {index})")]
    MissingLandmark {
        /// Joint name
        name: &'static str,
        /// Index into the landmark sequence
        index: usize,
    },

    /// Input failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Gender string did not match any supported variant
    #[error("Invalid gender: {0}")]
    UnknownGender(String),

    /// A baseline already exists for this user
    #[error("Baseline already established for user {user_id}")]
    BaselineConflict {
        /// User whose baseline was contested
        user_id: String,
    },

    /// A record that must exist was not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

impl PhysiqueError {
    /// Whether the error was caused by the caller's input rather than by storage
    /// or an internal fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InsufficientLandmarks { .. }
                | Self::MissingLandmark { .. }
                | Self::InvalidInput(_)
                | Self::UnknownGender(_)
                | Self::NotFound(_)
        )
    }

    /// Whether the error is a storage conflict (duplicate baseline).
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::BaselineConflict { .. })
    }
}

/// Convenience type alias for Result with `PhysiqueError`
pub type Result<T> = std::result::Result<T, PhysiqueError>;

impl From<anyhow::Error> for PhysiqueError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
