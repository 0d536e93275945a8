//! Path derivation for stubs and release artifacts.
//!
//! Every path is a pure function of the layout and a
//! `(basename, entry, kind)` triple, written with `/` separators relative to
//! the scanned directory (the directory `make` runs in).

use std::path::{Component, Path};

use scadmake_shared::{AppConfig, ArtifactKind, StubFamily};

/// Where generated files live, relative to the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    output_dir: String,
    release_dir: String,
}

impl ArtifactLayout {
    pub fn new(output_dir: &Path, release_dir: &Path) -> Self {
        Self {
            output_dir: slash_path(output_dir),
            release_dir: slash_path(release_dir),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.paths.output_dir, &config.paths.release_dir)
    }

    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn release_dir(&self) -> &str {
        &self.release_dir
    }

    /// `output/<basename>/`, holding the stubs of one source file.
    pub fn stub_subdir(&self, basename: &str) -> String {
        format!("{}/{basename}", self.output_dir)
    }

    /// `output/<basename>/<entry>.scad` or `.doc.scad`.
    ///
    /// A basename never contains `/` and an entry never contains `.`, so
    /// distinct `(basename, entry, family)` triples never share a path.
    pub fn stub_path(&self, basename: &str, entry: &str, family: StubFamily) -> String {
        format!("{}/{entry}{}", self.stub_subdir(basename), family.suffix())
    }

    /// `release/<basename>/`, where a source file's artifacts go.
    pub fn release_subdir(&self, basename: &str) -> String {
        format!("{}/{basename}", self.release_dir)
    }

    /// `release/<basename>/<file>` for the given artifact kind.
    pub fn artifact_path(&self, basename: &str, entry: &str, kind: ArtifactKind) -> String {
        format!("{}/{}", self.release_subdir(basename), kind.file_name(entry))
    }

    /// `release/<basename>/packing.pdf`.
    pub fn packing_path(&self, basename: &str) -> String {
        format!(
            "{}/{}",
            self.release_subdir(basename),
            ArtifactKind::Packing.file_name("")
        )
    }

    /// Relative prefix leading from a stub back to the sources: one `../`
    /// per component of the stub directory, plus one for the basename level.
    pub fn include_prefix(&self) -> String {
        "../".repeat(self.output_dir.split('/').count() + 1)
    }
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Join normal path components with `/`, dropping `.` components.
fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
