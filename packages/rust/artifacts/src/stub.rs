//! Stub scripts: one small generated file per entry point that includes the
//! source file and calls exactly one module.
//!
//! ```text
//! MAKE_MMU = 1;
//! FROM_MAKE = 1;
//! $fn = 96;            (export stubs only)
//! include <../../frog.scad>
//! body();
//! ```

use std::path::Path;

use scadmake_shared::{AppConfig, EntryPointRecord, Result, StubFamily};
use tracing::{info, instrument};

use crate::layout::ArtifactLayout;
use crate::write::{WriteOutcome, write_if_changed};

/// A rendered stub, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedStub {
    /// Project-relative path, `/`-separated.
    pub path: String,
    pub content: String,
}

/// Fixed parameters shared by every stub of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubTemplate {
    layout: ArtifactLayout,
    resolution: u32,
}

impl StubTemplate {
    pub fn new(layout: ArtifactLayout, resolution: u32) -> Self {
        Self { layout, resolution }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(ArtifactLayout::from_config(config), config.render.resolution)
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    /// Render the stub for `record`; its family follows the record's kind.
    pub fn render(&self, record: &EntryPointRecord) -> GeneratedStub {
        let family = record.kind.stub_family();
        GeneratedStub {
            path: self
                .layout
                .stub_path(record.basename(), &record.name, family),
            content: self.content(record.source.file_name(), &record.name, family),
        }
    }

    /// Stub text for `entry` in `source_file_name`.
    pub fn content(&self, source_file_name: &str, entry: &str, family: StubFamily) -> String {
        let mut out = String::new();
        out.push_str("MAKE_MMU = 1;\n");
        out.push_str("FROM_MAKE = 1;\n");
        if family == StubFamily::Export {
            out.push_str(&format!("$fn = {};\n", self.resolution));
        }
        out.push_str(&format!(
            "include <{}{source_file_name}>\n",
            self.layout.include_prefix()
        ));
        out.push_str(&format!("{entry}();\n"));
        out
    }
}

/// Counts from one [`sync_stubs`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StubReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Every stub path for the run, in record order, duplicates included.
    pub paths: Vec<String>,
}

impl StubReport {
    fn record(&mut self, path: String, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created => self.created += 1,
            WriteOutcome::Updated => self.updated += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
        self.paths.push(path);
    }
}

/// Render and write the stub for every record under `root`, skipping files
/// whose content is already correct. The first failed write aborts.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn sync_stubs<'a>(
    root: &Path,
    template: &StubTemplate,
    records: impl IntoIterator<Item = &'a EntryPointRecord>,
) -> Result<StubReport> {
    let mut report = StubReport::default();

    for record in records {
        let stub = template.render(record);
        let outcome = write_if_changed(&root.join(&stub.path), &stub.content)?;
        report.record(stub.path, outcome);
    }

    info!(
        created = report.created,
        updated = report.updated,
        unchanged = report.unchanged,
        "stubs synchronized"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scadmake_shared::{DirectiveKind, SourceFile};
    use std::sync::Arc;

    fn record(file: &str, name: &str, kind: DirectiveKind) -> EntryPointRecord {
        EntryPointRecord {
            source: Arc::new(SourceFile::from_path(file).unwrap()),
            name: name.into(),
            kind,
            line: 1,
        }
    }

    fn template() -> StubTemplate {
        StubTemplate::new(ArtifactLayout::default(), 96)
    }

    #[test]
    fn export_stub_content() {
        let stub = template().render(&record("frog.scad", "body", DirectiveKind::Buildable));
        assert_eq!(stub.path, "output/frog/body.scad");
        assert_eq!(
            stub.content,
            "MAKE_MMU = 1;\nFROM_MAKE = 1;\n$fn = 96;\ninclude <../../frog.scad>\nbody();\n"
        );
    }

    #[test]
    fn preview_stub_omits_resolution() {
        let stub = template().render(&record("frog.scad", "body", DirectiveKind::Documentable));
        assert_eq!(stub.path, "output/frog/body.doc.scad");
        assert_eq!(
            stub.content,
            "MAKE_MMU = 1;\nFROM_MAKE = 1;\ninclude <../../frog.scad>\nbody();\n"
        );
    }

    #[test]
    fn sync_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let records = vec![
            record("frog.scad", "body", DirectiveKind::Buildable),
            record("frog.scad", "body", DirectiveKind::Documentable),
        ];

        let first = sync_stubs(tmp.path(), &template(), &records).unwrap();
        assert_eq!(first.created, 2);
        let stub = tmp.path().join("output/frog/body.scad");
        let mtime = std::fs::metadata(&stub).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = sync_stubs(tmp.path(), &template(), &records).unwrap();
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.created + second.updated, 0);
        assert_eq!(std::fs::metadata(&stub).unwrap().modified().unwrap(), mtime);
        assert_eq!(second.paths, first.paths);
    }

    #[test]
    fn resolution_change_updates_only_export_stubs() {
        let tmp = tempfile::tempdir().unwrap();
        let records = vec![
            record("frog.scad", "body", DirectiveKind::Buildable),
            record("frog.scad", "body", DirectiveKind::Documentable),
        ];
        sync_stubs(tmp.path(), &template(), &records).unwrap();

        let finer = StubTemplate::new(ArtifactLayout::default(), 128);
        let report = sync_stubs(tmp.path(), &finer, &records).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 1);
    }
}
