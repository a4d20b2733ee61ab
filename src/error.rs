// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for species-curator

use thiserror::Error;

/// Result type alias for curator operations
pub type Result<T> = std::result::Result<T, CuratorError>;

/// Curator error types
#[derive(Error, Debug)]
pub enum CuratorError {
    #[error("Species not found: {0}")]
    SpeciesNotFound(String),

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CuratorError {
    /// Whether this error means the requested species folder does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CuratorError::SpeciesNotFound(_))
    }
}
