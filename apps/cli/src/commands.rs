//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use scadmake_core::{GenerateConfig, GenerateResult, ProgressReporter, discover, generate};
use scadmake_shared::{AppConfig, init_config, resolve_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// scadmake: build rules for annotated OpenSCAD modules.
#[derive(Parser)]
#[command(
    name = "scadmake",
    version,
    about = "Generate incremental make rules for OpenSCAD modules marked `make` me / `document` me.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scan sources, write stubs, and write the makefile fragment.
    Generate {
        /// Directory containing the .scad sources.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Makefile fragment to write, relative to --dir.
        #[arg(short, long)]
        script: Option<PathBuf>,

        /// Stub directory, relative to --dir.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Release directory, relative to --dir.
        #[arg(long)]
        release_dir: Option<PathBuf>,

        /// Delete stubs whose entry point no longer exists.
        #[arg(long)]
        prune: bool,
    },

    /// List annotated entry points without writing anything.
    List {
        /// Directory containing the .scad sources.
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a default user config file.
    Init,
    /// Show the configuration resolved for a project directory.
    Show {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "scadmake=warn",
        1 => "scadmake=info",
        2 => "scadmake=debug",
        _ => "scadmake=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate {
            dir,
            script,
            output_dir,
            release_dir,
            prune,
        } => cmd_generate(&dir, script, output_dir, release_dir, prune),
        Command::List { dir, json } => cmd_list(&dir, json),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show { dir } => cmd_config_show(&dir),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

fn load_project_config(dir: &Path) -> Result<AppConfig> {
    if !dir.is_dir() {
        return Err(eyre!("'{}' is not a directory", dir.display()));
    }
    Ok(resolve_config(dir)?)
}

fn cmd_generate(
    dir: &Path,
    script: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    release_dir: Option<PathBuf>,
    prune: bool,
) -> Result<()> {
    let mut app = load_project_config(dir)?;
    if let Some(script) = script {
        app.paths.script = script;
    }
    if let Some(output_dir) = output_dir {
        app.paths.output_dir = output_dir;
    }
    if let Some(release_dir) = release_dir {
        app.paths.release_dir = release_dir;
    }

    let config = GenerateConfig {
        project_dir: dir.to_path_buf(),
        app,
        prune,
    };

    info!(dir = %dir.display(), prune, "generating build rules");

    let reporter = CliProgress::new();
    let result = generate(&config, &reporter)?;

    println!();
    println!("  Build rules generated.");
    println!("  Script:     {} ({:?})", result.script_path.display(), result.script_outcome);
    println!("  Sources:    {}", result.source_count);
    println!("  Buildable:  {}", result.buildable_count);
    println!("  Documented: {}", result.documentable_count);
    println!("  Packing:    {}", result.group_count);
    println!(
        "  Stubs:      {} created, {} updated, {} unchanged",
        result.stubs.created, result.stubs.updated, result.stubs.unchanged
    );
    if prune {
        println!("  Pruned:     {}", result.pruned.len());
    }
    for path in &result.duplicates {
        println!("  Warning:    {path} is claimed by more than one record");
    }
    println!("  Time:       {:.2}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn done(&self, _result: &GenerateResult) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

fn cmd_list(dir: &Path, json: bool) -> Result<()> {
    let app = load_project_config(dir)?;
    let config = GenerateConfig {
        project_dir: dir.to_path_buf(),
        app,
        prune: false,
    };
    let (scan, index) = discover(&config)?;

    if json {
        let records: Vec<_> = scan
            .records()
            .map(|r| {
                serde_json::json!({
                    "file": r.source.file_name(),
                    "basename": r.basename(),
                    "entry": r.name,
                    "kind": r.kind,
                    "line": r.line,
                })
            })
            .collect();
        let groups: Vec<_> = index
            .groups()
            .iter()
            .map(|g| {
                serde_json::json!({
                    "basename": g.basename,
                    "members": g.members.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
                })
            })
            .collect();
        let output = serde_json::json!({ "records": records, "groups": groups });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if scan.record_count() == 0 {
        println!("No annotated modules found in {}", dir.display());
        return Ok(());
    }
    for record in scan.records() {
        println!(
            "{:<13} {}:{:<5} {}",
            record.kind,
            record.source.file_name(),
            record.line,
            record.name
        );
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(dir: &Path) -> Result<()> {
    let config = load_project_config(dir)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
