//! Annotation scanning for solid-model source directories.
//!
//! Every source file directly inside the scanned directory is read line by
//! line and each line is matched against the directive grammar in
//! [`parser`]. The result is two flat record lists, one per
//! [`DirectiveKind`], in scan order.

mod parser;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scadmake_shared::{DirectiveKind, EntryPointRecord, Result, ScadMakeError, SourceFile};
use tracing::{debug, info, instrument};

pub use parser::{Directive, parse_directive};

// ---------------------------------------------------------------------------
// ScanResult
// ---------------------------------------------------------------------------

/// Records discovered in one directory scan.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every matching source file, sorted by path.
    pub sources: Vec<Arc<SourceFile>>,
    /// `` `make` me`` records in scan order.
    pub buildable: Vec<EntryPointRecord>,
    /// `` `document` me`` records in scan order.
    pub documentable: Vec<EntryPointRecord>,
}

impl ScanResult {
    /// Buildable records followed by documentable records.
    pub fn records(&self) -> impl Iterator<Item = &EntryPointRecord> {
        self.buildable.iter().chain(self.documentable.iter())
    }

    pub fn record_count(&self) -> usize {
        self.buildable.len() + self.documentable.len()
    }

    /// Append the records found in one file's content.
    pub fn scan_source(&mut self, source: Arc<SourceFile>, content: &str) {
        for (idx, line) in content.lines().enumerate() {
            let Some(directive) = parse_directive(line) else {
                continue;
            };
            for kind in directive.kinds {
                let record = EntryPointRecord {
                    source: Arc::clone(&source),
                    name: directive.name.clone(),
                    kind,
                    line: idx + 1,
                };
                debug!(
                    file = %source.path.display(),
                    line = record.line,
                    entry = %record.name,
                    %kind,
                    "found directive"
                );
                match kind {
                    DirectiveKind::Buildable => self.buildable.push(record),
                    DirectiveKind::Documentable => self.documentable.push(record),
                }
            }
        }
        self.sources.push(source);
    }
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Scan `dir` for `*.<extension>` files and collect their directives.
///
/// Any file that cannot be read, or whose name is not UTF-8, aborts the whole
/// scan; a partial record set would silently drop targets from the build graph.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn scan_dir(dir: &Path, extension: &str) -> Result<ScanResult> {
    let paths = list_sources(dir, extension)?;
    let mut result = ScanResult::default();

    for path in paths {
        let source = SourceFile::from_path(&path)
            .ok_or_else(|| ScadMakeError::Encoding { path: path.clone() })?;
        let content = std::fs::read_to_string(&path).map_err(|e| ScadMakeError::io(&path, e))?;
        result.scan_source(Arc::new(source), &content);
    }

    info!(
        sources = result.sources.len(),
        buildable = result.buildable.len(),
        documentable = result.documentable.len(),
        "scan complete"
    );

    Ok(result)
}

/// List regular files in `dir` with the given extension, sorted by path so
/// that scans do not depend on directory iteration order.
pub fn list_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ScadMakeError::io(dir, e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| ScadMakeError::io(dir, e))?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == extension) {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths)
}
