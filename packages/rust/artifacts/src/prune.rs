//! Opt-in removal of stubs left behind by renamed or deleted entry points.
//!
//! Only files one level below the stub directory
//! (`<output_dir>/<basename>/<entry><suffix>`, with a stub-family suffix) are
//! candidates. Release artifacts are never touched.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use scadmake_shared::{Result, ScadMakeError, StubFamily};
use tracing::{debug, info, instrument};

use crate::layout::ArtifactLayout;

/// Delete stub files under `root/<output_dir>` that are not in `keep`.
///
/// `keep` holds project-relative stub paths as produced by
/// [`ArtifactLayout::stub_path`]. Per-file stub directories left empty are
/// removed as well. Returns the removed stub paths, sorted.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn prune_stale_stubs(
    root: &Path,
    layout: &ArtifactLayout,
    keep: &[String],
) -> Result<Vec<PathBuf>> {
    let dir = root.join(layout.output_dir());
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let keep: HashSet<&str> = keep.iter().map(String::as_str).collect();
    let mut removed = Vec::new();

    for basename in read_names(&dir)? {
        let subdir = dir.join(&basename);
        if !subdir.is_dir() {
            continue;
        }
        for name in read_names(&subdir)? {
            let path = subdir.join(&name);
            if !path.is_file() || !is_stub_name(&name) {
                continue;
            }
            let relative = format!("{}/{name}", layout.stub_subdir(&basename));
            if keep.contains(relative.as_str()) {
                continue;
            }
            std::fs::remove_file(&path).map_err(|e| ScadMakeError::io(&path, e))?;
            debug!(path = %path.display(), "removed stale stub");
            removed.push(path);
        }
        if read_names(&subdir)?.is_empty() {
            std::fs::remove_dir(&subdir).map_err(|e| ScadMakeError::io(&subdir, e))?;
        }
    }

    removed.sort();
    info!(removed = removed.len(), "pruned stale stubs");
    Ok(removed)
}

fn is_stub_name(name: &str) -> bool {
    [StubFamily::Export, StubFamily::Preview]
        .iter()
        .any(|family| name.ends_with(family.suffix()))
}

/// UTF-8 entry names of `dir`; other names cannot be stubs we wrote.
fn read_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| ScadMakeError::io(dir, e))? {
        let entry = entry.map_err(|e| ScadMakeError::io(dir, e))?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    Ok(names)
}
