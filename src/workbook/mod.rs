//! # Workbook Loading Module
//!
//! Abstracts over multiple spreadsheet back ends and normalizes their output
//! into one [`CellGrid`] shape per sheet. Back ends are tried strictly in
//! order; a back end's failure is recorded and the next one is attempted, so
//! a slow success can never mask a hard failure. Only total exhaustion of
//! the chain is terminal for a file.

pub(crate) mod calamine;
pub mod grid;
pub(crate) mod raw_xlsx;
pub(crate) mod reference;

#[cfg(test)]
pub(crate) mod fixture;

use crate::helpers::reader::SourceBuffer;
use grid::CellGrid;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while loading a workbook into cell grids.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The bytes are not a readable spreadsheet package.
    #[error("unreadable workbook archive: {0}")]
    ArchiveError(String),

    /// A required package part (e.g. `xl/workbook.xml`) is missing.
    #[error("missing workbook part '{0}'")]
    MissingPartError(String),

    /// Every configured back end failed; the caller must keep the
    /// previously stored dataset rather than delete it.
    #[error("all backends failed for '{origin}': {summary}")]
    AllBackendsFailed { origin: String, summary: String },

    #[error("{0}")]
    CalamineError(String),

    #[error("unresolvable XML entity '{0}'")]
    XmlEntityError(String),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),
}

/// One sheet of the workbook after normalization.
#[derive(Clone, Debug, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    pub grid: CellGrid,
}

/// A recorded back-end failure; recoverable, surfaced as a diagnostic.
#[derive(Clone, Debug)]
pub struct LoadFailure {
    pub backend: &'static str,
    pub message: String,
}

/// One spreadsheet-reading capability.
/// Implementations must be pure functions of the source bytes: no shared
/// mutable state, so distinct files may be loaded concurrently by callers.
pub trait WorkbookBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(&self, source: &SourceBuffer) -> Result<Vec<SheetGrid>, LoadError>;
}

/// Tries an explicit, ordered list of back ends until one succeeds.
pub struct WorkbookLoader {
    backends: Vec<Box<dyn WorkbookBackend>>,
}

impl Default for WorkbookLoader {
    /// The standard chain: calamine first (fastest and most robust), then
    /// the raw archive reader as last resort.
    fn default() -> WorkbookLoader {
        WorkbookLoader::new(vec![
            Box::new(calamine::CalamineBackend),
            Box::new(raw_xlsx::RawXlsxBackend),
        ])
    }
}

impl WorkbookLoader {
    /// Builds a loader over an explicit capability list. The order given
    /// here is the fallback order.
    pub fn new(backends: Vec<Box<dyn WorkbookBackend>>) -> WorkbookLoader {
        WorkbookLoader { backends }
    }

    /// Loads all sheets, falling back through the chain sequentially.
    /// Returns the grids from the first successful back end together with
    /// the failures recorded on the way there.
    pub fn load(
        &self,
        source: &SourceBuffer,
    ) -> Result<(Vec<SheetGrid>, Vec<LoadFailure>), LoadError> {
        let mut failures = Vec::<LoadFailure>::new();
        for backend in &self.backends {
            match backend.load(source) {
                Ok(sheets) => {
                    debug!(
                        backend = backend.name(),
                        sheets = sheets.len(),
                        origin = source.origin(),
                        "workbook loaded"
                    );
                    return Ok((sheets, failures));
                }
                Err(error) => {
                    warn!(
                        backend = backend.name(),
                        origin = source.origin(),
                        %error,
                        "backend failed, trying next"
                    );
                    failures.push(LoadFailure {
                        backend: backend.name(),
                        message: error.to_string(),
                    });
                }
            }
        }

        let summary = failures
            .iter()
            .map(|failure| format!("{}: {}", failure.backend, failure.message))
            .collect::<Vec<_>>()
            .join("; ");
        Err(LoadError::AllBackendsFailed {
            origin: source.origin().to_owned(),
            summary,
        })
    }
}
