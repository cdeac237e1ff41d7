use thiserror::Error;

/// Top-level error type for the rasptab engine.
/// Aggregates terminal failures; recoverable conditions travel as
/// [`crate::schedule::ParseWarning`] values inside diagnostics instead
/// of being raised.
#[derive(Error, Debug)]
pub enum RasptabError {
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    LoadError(#[from] crate::workbook::LoadError),
}
