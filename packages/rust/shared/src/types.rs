//! Core domain types for scadmake build graphs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// One input solid-model source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    /// Path as discovered (directory-relative when scanning `.`).
    pub path: PathBuf,
    /// File stem; the namespace key for every artifact derived from this file.
    pub basename: String,
}

impl SourceFile {
    /// Build a source file from its path. Returns `None` for paths without a
    /// UTF-8 file stem.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let basename = path.file_stem()?.to_str()?.to_string();
        Some(Self { path, basename })
    }

    /// File name including extension (e.g. `frog.scad`).
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.basename.as_str())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ---------------------------------------------------------------------------
// DirectiveKind
// ---------------------------------------------------------------------------

/// Which marker opted an entry point in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    /// `` `make` me``: solid exports.
    Buildable,
    /// `` `document` me``: preview render and packing document.
    Documentable,
}

impl DirectiveKind {
    /// The word between backticks in the marker.
    pub fn marker_word(self) -> &'static str {
        match self {
            Self::Buildable => "make",
            Self::Documentable => "document",
        }
    }

    pub fn from_marker_word(word: &str) -> Option<Self> {
        match word {
            "make" => Some(Self::Buildable),
            "document" => Some(Self::Documentable),
            _ => None,
        }
    }

    /// Stub family generated for records of this kind.
    pub fn stub_family(self) -> StubFamily {
        match self {
            Self::Buildable => StubFamily::Export,
            Self::Documentable => StubFamily::Preview,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buildable => "buildable",
            Self::Documentable => "documentable",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntryPointRecord
// ---------------------------------------------------------------------------

/// One annotated entry point found by the scanner.
///
/// `(basename, name)` is the addressing key downstream; the same `name` may
/// appear in several files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPointRecord {
    /// Owning source file, shared by every record from that file.
    pub source: Arc<SourceFile>,
    /// Module identifier (`[A-Za-z0-9_-]+`).
    pub name: String,
    pub kind: DirectiveKind,
    /// 1-based line of the directive, for diagnostics only.
    pub line: usize,
}

impl EntryPointRecord {
    pub fn basename(&self) -> &str {
        &self.source.basename
    }
}

// ---------------------------------------------------------------------------
// Artifact kinds
// ---------------------------------------------------------------------------

/// Final files named as outputs by the emitted build script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Colorized multi-material export (`.3mf`).
    MultiMaterial,
    /// Plain single-material export (`.stl`).
    SingleMaterial,
    /// Preview render (`.png`).
    Preview,
    /// One packing document per source file.
    Packing,
}

impl ArtifactKind {
    /// File name of this artifact inside `release/<basename>/`.
    ///
    /// Packing documents are per-file, so `entry` is ignored for them.
    pub fn file_name(self, entry: &str) -> String {
        match self {
            Self::MultiMaterial => format!("{entry}.3mf"),
            Self::SingleMaterial => format!("{entry}.stl"),
            Self::Preview => format!("{entry}.png"),
            Self::Packing => "packing.pdf".to_string(),
        }
    }
}

/// The two generated stub templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubFamily {
    /// Input for the solid exports; pins the resolution.
    Export,
    /// Input for preview renders; uses the renderer's default resolution.
    Preview,
}

impl StubFamily {
    /// Suffix appended to the entry name for the stub file name.
    ///
    /// `.` is outside the entry-name alphabet, so export and preview stubs
    /// never collide.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Export => ".scad",
            Self::Preview => ".doc.scad",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_basename_strips_dir_and_extension() {
        let src = SourceFile::from_path("./models/frog.scad").expect("stem");
        assert_eq!(src.basename, "frog");
        assert_eq!(src.file_name(), "frog.scad");
    }

    #[test]
    fn marker_words_roundtrip() {
        for kind in [DirectiveKind::Buildable, DirectiveKind::Documentable] {
            assert_eq!(DirectiveKind::from_marker_word(kind.marker_word()), Some(kind));
        }
        assert_eq!(DirectiveKind::from_marker_word("Make"), None);
    }

    #[test]
    fn artifact_file_names() {
        assert_eq!(ArtifactKind::MultiMaterial.file_name("body"), "body.3mf");
        assert_eq!(ArtifactKind::SingleMaterial.file_name("body"), "body.stl");
        assert_eq!(ArtifactKind::Preview.file_name("body"), "body.png");
        assert_eq!(ArtifactKind::Packing.file_name("body"), "packing.pdf");
    }

    #[test]
    fn kind_maps_to_stub_family() {
        assert_eq!(DirectiveKind::Buildable.stub_family(), StubFamily::Export);
        assert_eq!(DirectiveKind::Documentable.stub_family(), StubFamily::Preview);
        assert_ne!(StubFamily::Export.suffix(), StubFamily::Preview.suffix());
    }

    #[test]
    fn stub_suffixes_share_the_scad_extension() {
        for family in [StubFamily::Export, StubFamily::Preview] {
            assert!(family.suffix().ends_with(".scad"));
        }
    }
}
