use std::path::PathBuf;

use thiserror::Error;

/// Application-level error type.
///
/// Only two conditions are allowed to abort a run: an empty prompt catalog
/// and a run-store failure. Backend, parse and schema failures all degrade
/// inside the pipeline and never surface here.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No prompt definitions found in {}", .0.display())]
    NoPrompts(PathBuf),

    #[error("Template render error: {0}")]
    Render(#[from] minijinja::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
