//! Compare-before-write for generated files.
//!
//! `make` decides what to rebuild from modification times, so a generated
//! file is only touched when its bytes actually change. Writes go through a
//! sibling temp file and a rename, so readers never see a half-written file.

use std::io::ErrorKind;
use std::path::Path;

use scadmake_shared::{Result, ScadMakeError};
use tracing::debug;

/// What [`write_if_changed`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist.
    Created,
    /// The file existed with different content.
    Updated,
    /// The file already had this exact content and was left alone.
    Unchanged,
}

impl WriteOutcome {
    pub fn wrote(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Write `content` to `path` unless the file already holds exactly these
/// bytes. Parent directories are created as needed.
pub fn write_if_changed(path: &Path, content: &str) -> Result<WriteOutcome> {
    let outcome = match std::fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => {
            debug!(path = %path.display(), "unchanged, skipping write");
            return Ok(WriteOutcome::Unchanged);
        }
        Ok(_) => WriteOutcome::Updated,
        Err(e) if e.kind() == ErrorKind::NotFound => WriteOutcome::Created,
        Err(e) => return Err(ScadMakeError::io(path, e)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ScadMakeError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| ScadMakeError::validation(format!("not a file path: {}", path.display())))?;
    let temp = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

    // Write to temp file first
    std::fs::write(&temp, content).map_err(|e| ScadMakeError::io(&temp, e))?;

    // Atomic rename
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(ScadMakeError::io(path, e));
    }

    debug!(path = %path.display(), ?outcome, size = content.len(), "wrote file");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_then_skips_identical_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("output/frog/body.scad");

        assert_eq!(write_if_changed(&path, "body();\n").unwrap(), WriteOutcome::Created);
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(
            write_if_changed(&path, "body();\n").unwrap(),
            WriteOutcome::Unchanged
        );
        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn rewrites_on_mismatch() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("generate.makefile");
        std::fs::write(&path, "all:\n").unwrap();

        assert_eq!(
            write_if_changed(&path, "all: tools\n").unwrap(),
            WriteOutcome::Updated
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "all: tools\n");
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = tempfile::tempdir().unwrap();
        write_if_changed(&tmp.path().join("a.scad"), "a();\n").unwrap();
        write_if_changed(&tmp.path().join("a.scad"), "b();\n").unwrap();

        for entry in std::fs::read_dir(tmp.path()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }
    }

    #[test]
    fn unwritable_target_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        // A directory where the file should be.
        let path = tmp.path().join("taken");
        std::fs::create_dir(&path).unwrap();

        assert!(write_if_changed(&path, "x").is_err());
    }
}
