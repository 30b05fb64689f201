use std::path::PathBuf;

/// Errors raised while loading manifests, placing samples or splitting grids.
///
/// `ManifestNotFound`, `SourceNotFound`, `UnknownCategory` and
/// `DestinationOccupied` are recoverable: the caller skips the directory or
/// sample and keeps going. The wrapped I/O errors are fatal for a run.
#[derive(Debug, thiserror::Error)]
pub enum ReorgError {
    #[error("benchmark manifest not found: {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("manifest {} has no `{column}` column", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("unknown category '{category}' for ID {id}")]
    UnknownCategory { id: String, category: String },

    #[error("destination is a non-empty directory: {}", .0.display())]
    DestinationOccupied(PathBuf),

    #[error("invalid grid shape '{0}', expected <columns>x<rows> with 1 to 4096 cells")]
    InvalidGridShape(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("rules file error: {0}")]
    Rules(#[from] serde_json::Error),

    #[error("invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("logger already initialised: {0}")]
    Logger(#[from] log::SetLoggerError),
}

impl ReorgError {
    /// Whether the batch should log this error and move on rather than abort.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReorgError::ManifestNotFound(_)
                | ReorgError::SourceNotFound(_)
                | ReorgError::UnknownCategory { .. }
                | ReorgError::DestinationOccupied(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ReorgError>;
