use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{error, info};

use crate::diagnostics::DiagnosticSink;
use crate::polar::{PolarError, PolarTable};

/// Holder of the active polar table.
///
/// Readers take a cheap `Arc` snapshot and query it without holding any
/// lock; a reload builds a complete new table first and then swaps the
/// reference, so a reader sees either the old table or the new one.
pub struct PolarStore {
    current: RwLock<Arc<PolarTable>>,
    source: Option<PathBuf>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl PolarStore {
    pub fn new(table: PolarTable, source: Option<PathBuf>, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
            source,
            diagnostics,
        }
    }

    /// Load the table from `path`; on failure the store starts with an
    /// empty table so every polar field reads as unavailable.
    pub fn open<P: AsRef<Path>>(path: P, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        let path = path.as_ref().to_path_buf();
        let table = match PolarTable::load(&path, diagnostics.clone()) {
            Ok(table) => {
                info!("Loaded polar {} ({} wind speeds)", path.display(), table.bins().len());
                table
            }
            Err(e) => {
                error!("[Polar] Failed to load {}: {}", path.display(), e);
                PolarTable::empty(diagnostics.clone())
            }
        };
        Self::new(table, Some(path), diagnostics)
    }

    pub fn current(&self) -> Arc<PolarTable> {
        self.current.read().clone()
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Re-read the configured source file. On error the active table is left untouched.
    pub fn reload(&self) -> Result<Arc<PolarTable>, PolarError> {
        let Some(path) = &self.source else {
            return Err(PolarError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no polar file configured",
            )));
        };
        let table = Arc::new(PolarTable::load(path, self.diagnostics.clone())?);
        *self.current.write() = table.clone();
        info!("Reloaded polar {} ({} wind speeds)", path.display(), table.bins().len());
        Ok(table)
    }
}
