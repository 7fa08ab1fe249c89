use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("window must span at least one day, got {0}")]
    InvalidWindow(u32),

    #[error("invalid calendar date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    /// The calendar builder produced the wrong number of days. Every
    /// alignment downstream assumes this never happens.
    #[error("calendar for {expected} days produced {actual} dates")]
    CalendarLength { expected: u32, actual: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
