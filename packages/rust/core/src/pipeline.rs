//! End-to-end `generate` pipeline: scan → group → stubs → makefile.
//!
//! Every fallible step runs before the script is replaced, so a failed run
//! leaves the previous script in place.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument, warn};

use scadmake_artifacts::{
    ArtifactLayout, StubReport, StubTemplate, WriteOutcome, prune_stale_stubs, sync_stubs,
    write_if_changed,
};
use scadmake_discovery::{ScanResult, scan_dir};
use scadmake_shared::{AppConfig, Result, ScadMakeError};

use crate::index::DocumentIndex;
use crate::makefile::{BuildGraph, MakefileEmitter, duplicate_outputs};

/// Configuration for the `generate` pipeline.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory holding the sources; every generated path is relative to it.
    pub project_dir: PathBuf,
    /// Resolved application config.
    pub app: AppConfig,
    /// Delete stubs no current entry point owns.
    pub prune: bool,
}

/// Result of the `generate` pipeline.
#[derive(Debug)]
pub struct GenerateResult {
    /// Where the script was written.
    pub script_path: PathBuf,
    /// Whether the script changed.
    pub script_outcome: WriteOutcome,
    /// Number of source files scanned.
    pub source_count: usize,
    pub buildable_count: usize,
    pub documentable_count: usize,
    /// Number of packing documents.
    pub group_count: usize,
    pub stubs: StubReport,
    /// Artifact and stub paths claimed by more than one record.
    pub duplicates: Vec<String>,
    /// Stubs removed by `prune`.
    pub pruned: Vec<PathBuf>,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &GenerateResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &GenerateResult) {}
}

/// Scan the project directory and group its documentable records.
pub fn discover(config: &GenerateConfig) -> Result<(ScanResult, DocumentIndex)> {
    let scan = scan_dir(&config.project_dir, &config.app.paths.source_extension)?;
    let index = DocumentIndex::build(&scan.documentable);
    Ok((scan, index))
}

/// Run the full `generate` pipeline.
///
/// 1. Scan sources for directives
/// 2. Group documentable records per file
/// 3. Write stubs whose content changed
/// 4. Create release directories
/// 5. Optionally prune stale stubs
/// 6. Write the makefile if its content changed
#[instrument(skip_all, fields(dir = %config.project_dir.display()))]
pub fn generate(
    config: &GenerateConfig,
    progress: &dyn ProgressReporter,
) -> Result<GenerateResult> {
    let start = Instant::now();
    let root = &config.project_dir;
    config.app.validate()?;

    // --- Phase 1: Scan ---
    progress.phase("Scanning sources");
    let (scan, index) = discover(config)?;

    let emitter = MakefileEmitter::from_config(&config.app);
    let graph = BuildGraph {
        buildable: &scan.buildable,
        documentable: &scan.documentable,
        groups: &index,
    };

    let mut outputs = emitter.artifact_targets(&graph);
    outputs.extend(emitter.stub_paths(&graph));
    let duplicates = duplicate_outputs(&outputs);
    for path in &duplicates {
        warn!(%path, "output declared by more than one record");
    }

    // --- Phase 2: Stubs ---
    progress.phase("Writing stubs");
    let template = StubTemplate::from_config(&config.app);
    let stubs = sync_stubs(root, &template, scan.records())?;

    // --- Phase 3: Release directories ---
    let layout = ArtifactLayout::from_config(&config.app);
    let basenames: BTreeSet<&str> = scan.records().map(|r| r.basename()).collect();
    for basename in basenames {
        let dir = root.join(layout.release_subdir(basename));
        std::fs::create_dir_all(&dir).map_err(|e| ScadMakeError::io(&dir, e))?;
    }

    // --- Phase 4: Prune ---
    let pruned = if config.prune {
        progress.phase("Pruning stale stubs");
        prune_stale_stubs(root, &layout, &stubs.paths)?
    } else {
        Vec::new()
    };

    // --- Phase 5: Makefile ---
    progress.phase("Writing makefile");
    let script_path = root.join(&config.app.paths.script);
    let script = emitter.render(&graph);
    let script_outcome = write_if_changed(&script_path, &script)?;

    let result = GenerateResult {
        script_path,
        script_outcome,
        source_count: scan.sources.len(),
        buildable_count: scan.buildable.len(),
        documentable_count: scan.documentable.len(),
        group_count: index.len(),
        stubs,
        duplicates,
        pruned,
        elapsed: start.elapsed(),
    };

    info!(
        script = %result.script_path.display(),
        outcome = ?result.script_outcome,
        buildable = result.buildable_count,
        documentable = result.documentable_count,
        groups = result.group_count,
        "generate complete"
    );

    progress.done(&result);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(tmp.path().join(name), content).unwrap();
        }
        tmp
    }

    fn config(dir: &Path) -> GenerateConfig {
        GenerateConfig {
            project_dir: dir.to_path_buf(),
            app: AppConfig::default(),
            prune: false,
        }
    }

    const FROG: &str = "module body(h) { cube(h); } // `make` me\n\
                        module body(h) { cube(h); } // `document` me\n";

    #[test]
    fn frog_scenario_end_to_end() {
        let tmp = project(&[("frog.scad", FROG)]);
        let result = generate(&config(tmp.path()), &SilentProgress).unwrap();

        assert_eq!(result.buildable_count, 1);
        assert_eq!(result.documentable_count, 1);
        assert_eq!(result.group_count, 1);
        assert_eq!(result.script_outcome, WriteOutcome::Created);
        assert!(result.duplicates.is_empty());

        let script = std::fs::read_to_string(tmp.path().join("generate.makefile")).unwrap();
        assert!(script.contains(
            "all: release/frog/body.3mf release/frog/body.stl release/frog/body.png release/frog/packing.pdf tools\n"
        ));
        assert!(script.contains("release/frog/packing.pdf: release/frog/body.png\n"));

        let stub = std::fs::read_to_string(tmp.path().join("output/frog/body.scad")).unwrap();
        assert!(stub.contains("include <../../frog.scad>\nbody();\n"));
        assert!(tmp.path().join("output/frog/body.doc.scad").is_file());
        assert!(tmp.path().join("release/frog").is_dir());
    }

    #[test]
    fn second_run_touches_nothing() {
        let tmp = project(&[("frog.scad", FROG)]);
        let cfg = config(tmp.path());
        let first = generate(&cfg, &SilentProgress).unwrap();
        let script_before = std::fs::read(&first.script_path).unwrap();
        let mtime = |p: &Path| std::fs::metadata(p).unwrap().modified().unwrap();
        let stub = tmp.path().join("output/frog/body.scad");
        let (stub_mtime, script_mtime) = (mtime(&stub), mtime(&first.script_path));

        std::thread::sleep(std::time::Duration::from_millis(20));
        let second = generate(&cfg, &SilentProgress).unwrap();

        assert_eq!(second.script_outcome, WriteOutcome::Unchanged);
        assert_eq!(second.stubs.unchanged, 2);
        assert_eq!(std::fs::read(&second.script_path).unwrap(), script_before);
        assert_eq!(mtime(&stub), stub_mtime);
        assert_eq!(mtime(&second.script_path), script_mtime);
    }

    #[test]
    fn empty_directory_yields_valid_script() {
        let tmp = project(&[]);
        let result = generate(&config(tmp.path()), &SilentProgress).unwrap();

        let script = std::fs::read_to_string(&result.script_path).unwrap();
        assert!(script.contains("\nall: tools\n"));
        assert!(script.contains("\n.SECONDARY:\n"));
        assert_eq!(result.stubs.paths.len(), 0);
    }

    #[test]
    fn duplicate_directives_are_reported_not_fatal() {
        let tmp = project(&[(
            "frog.scad",
            "module body() {} // `make` me\nmodule body() {} // `make` me\n",
        )]);
        let result = generate(&config(tmp.path()), &SilentProgress).unwrap();

        assert_eq!(
            result.duplicates,
            vec![
                "release/frog/body.3mf".to_string(),
                "release/frog/body.stl".to_string(),
                "output/frog/body.scad".to_string(),
            ]
        );
    }

    #[test]
    fn stub_write_failure_leaves_no_script() {
        let tmp = project(&[("frog.scad", FROG)]);
        // A regular file where the stub directory should be.
        std::fs::write(tmp.path().join("output"), "").unwrap();

        assert!(generate(&config(tmp.path()), &SilentProgress).is_err());
        assert!(!tmp.path().join("generate.makefile").exists());
    }

    #[test]
    fn prune_removes_stubs_of_deleted_entry_points() {
        let tmp = project(&[("frog.scad", FROG)]);
        let mut cfg = config(tmp.path());
        generate(&cfg, &SilentProgress).unwrap();

        std::fs::write(tmp.path().join("frog.scad"), "module body() {} // `make` me\n").unwrap();
        cfg.prune = true;
        let result = generate(&cfg, &SilentProgress).unwrap();

        assert_eq!(result.pruned, vec![tmp.path().join("output/frog/body.doc.scad")]);
        assert!(tmp.path().join("output/frog/body.scad").is_file());
    }

    #[test]
    fn stale_stubs_survive_without_prune() {
        let tmp = project(&[("frog.scad", FROG)]);
        let cfg = config(tmp.path());
        generate(&cfg, &SilentProgress).unwrap();

        std::fs::write(tmp.path().join("frog.scad"), "").unwrap();
        let result = generate(&cfg, &SilentProgress).unwrap();

        assert!(result.pruned.is_empty());
        assert!(tmp.path().join("output/frog/body.scad").is_file());
    }

    #[test]
    fn double_underscore_names_get_separate_stubs() {
        let tmp = project(&[
            ("a__b.scad", "module c() {} // `make` me\n"),
            ("a.scad", "module b__c() {} // `make` me\n"),
        ]);
        let cfg = config(tmp.path());
        let first = generate(&cfg, &SilentProgress).unwrap();

        assert_eq!(
            first.stubs.paths,
            vec!["output/a/b__c.scad".to_string(), "output/a__b/c.scad".to_string()]
        );
        assert!(first.duplicates.is_empty());
        let stub = std::fs::read_to_string(tmp.path().join("output/a/b__c.scad")).unwrap();
        assert!(stub.ends_with("include <../../a.scad>\nb__c();\n"));

        let second = generate(&cfg, &SilentProgress).unwrap();
        assert_eq!(second.stubs.unchanged, 2);
        assert_eq!(second.stubs.created + second.stubs.updated, 0);
    }

    #[test]
    fn prune_works_with_custom_source_extension() {
        let tmp = project(&[(
            "frog.inc",
            "module body() {} // `make` me\nmodule tail() {} // `make` me\n",
        )]);
        let mut cfg = config(tmp.path());
        cfg.app.paths.source_extension = "inc".into();
        generate(&cfg, &SilentProgress).unwrap();
        let tail = tmp.path().join("output/frog/tail.scad");
        assert!(tail.is_file());

        std::fs::write(tmp.path().join("frog.inc"), "module body() {} // `make` me\n").unwrap();
        cfg.prune = true;
        let result = generate(&cfg, &SilentProgress).unwrap();

        assert_eq!(result.pruned, vec![tail.clone()]);
        assert!(!tail.exists());
    }

    /// Records phase names in call order.
    #[derive(Default)]
    struct PhaseLog(std::sync::Mutex<Vec<String>>);

    impl ProgressReporter for PhaseLog {
        fn phase(&self, name: &str) {
            self.0.lock().unwrap().push(name.to_string());
        }
        fn done(&self, _result: &GenerateResult) {}
    }

    #[test]
    fn prune_runs_before_the_script_is_written() {
        let tmp = project(&[("frog.scad", FROG)]);
        let mut cfg = config(tmp.path());
        cfg.prune = true;
        let log = PhaseLog::default();
        generate(&cfg, &log).unwrap();

        let phases = log.0.lock().unwrap().clone();
        let pos = |name: &str| phases.iter().position(|p| p == name).unwrap();
        assert!(pos("Pruning stale stubs") < pos("Writing makefile"));
    }

    #[cfg(unix)]
    #[test]
    fn prune_failure_leaves_previous_script() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = project(&[("frog.scad", FROG)]);
        let mut cfg = config(tmp.path());
        generate(&cfg, &SilentProgress).unwrap();
        let script_path = tmp.path().join("generate.makefile");
        let script_before = std::fs::read(&script_path).unwrap();

        std::fs::write(tmp.path().join("frog.scad"), "module body() {} // `make` me\n").unwrap();
        let stub_dir = tmp.path().join("output/frog");
        std::fs::set_permissions(&stub_dir, std::fs::Permissions::from_mode(0o555)).unwrap();
        // Permission bits do not bind a privileged user.
        let writable = std::fs::write(stub_dir.join(".check"), "").is_ok();

        cfg.prune = true;
        let result = generate(&cfg, &SilentProgress);
        std::fs::set_permissions(&stub_dir, std::fs::Permissions::from_mode(0o755)).unwrap();
        if writable {
            return;
        }

        assert!(result.is_err());
        assert_eq!(std::fs::read(&script_path).unwrap(), script_before);
    }
}
