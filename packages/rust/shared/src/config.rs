//! Application configuration for scadmake.
//!
//! A project config lives next to the sources as `scadmake.toml`; a user-wide
//! fallback lives at `~/.scadmake/scadmake.toml`. CLI flags override config
//! file values, which override defaults.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScadMakeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "scadmake.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".scadmake";

// ---------------------------------------------------------------------------
// Config structs (matching scadmake.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// External tool commands and make variable names.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Flags passed to the renderer.
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[paths]` section. All paths are relative to the scanned directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Extension of solid-model sources, without the dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// Directory for generated stubs.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for final artifacts, one subdirectory per source file.
    #[serde(default = "default_release_dir")]
    pub release_dir: PathBuf,

    /// File name of the emitted makefile fragment.
    #[serde(default = "default_script")]
    pub script: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_extension: default_source_extension(),
            output_dir: default_output_dir(),
            release_dir: default_release_dir(),
            script: default_script(),
        }
    }
}

fn default_source_extension() -> String {
    "scad".into()
}
fn default_output_dir() -> PathBuf {
    "output".into()
}
fn default_release_dir() -> PathBuf {
    "release".into()
}
fn default_script() -> PathBuf {
    "generate.makefile".into()
}

/// `[tools]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Make variable holding the renderer path.
    #[serde(default = "default_renderer_var")]
    pub renderer_var: String,
    /// Default renderer command (`?=` in the emitted script).
    #[serde(default = "default_renderer")]
    pub renderer: String,

    /// Make variable holding the colorizing post-processor path.
    #[serde(default = "default_colorizer_var")]
    pub colorizer_var: String,
    #[serde(default = "default_colorizer")]
    pub colorizer: String,

    /// Make variable holding the packing-document assembler path.
    #[serde(default = "default_assembler_var")]
    pub assembler_var: String,
    #[serde(default = "default_assembler")]
    pub assembler: String,

    /// Extra target appended to `all`, defined by the including Makefile.
    ///
    /// With the default `"tools"`, an empty project still yields `all: tools`.
    /// Set it to `""` for a bare `all:` with no dependencies.
    #[serde(default = "default_aggregate_target")]
    pub aggregate_target: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            renderer_var: default_renderer_var(),
            renderer: default_renderer(),
            colorizer_var: default_colorizer_var(),
            colorizer: default_colorizer(),
            assembler_var: default_assembler_var(),
            assembler: default_assembler(),
            aggregate_target: default_aggregate_target(),
        }
    }
}

fn default_renderer_var() -> String {
    "SCAD".into()
}
fn default_renderer() -> String {
    "openscad".into()
}
fn default_colorizer_var() -> String {
    "COLORSCAD".into()
}
fn default_colorizer() -> String {
    "colorscad".into()
}
fn default_assembler_var() -> String {
    "PACKER".into()
}
fn default_assembler() -> String {
    "img2pdf".into()
}
fn default_aggregate_target() -> String {
    "tools".into()
}

/// `[render]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Geometry backend (`--backend=`).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Experimental features (`--enable=`), in emission order.
    #[serde(default = "default_features")]
    pub features: Vec<String>,

    /// `$fn` pinned in export stubs.
    #[serde(default = "default_resolution")]
    pub resolution: u32,

    /// Preview image size in pixels, `[width, height]`.
    #[serde(default = "default_preview_size")]
    pub preview_size: [u32; 2],

    /// RGB vectors handed to the colorizer, in order.
    #[serde(default = "default_colors")]
    pub colors: [[f64; 3]; 2],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            features: default_features(),
            resolution: default_resolution(),
            preview_size: default_preview_size(),
            colors: default_colors(),
        }
    }
}

fn default_backend() -> String {
    "manifold".into()
}
fn default_features() -> Vec<String> {
    vec!["lazy-union".into(), "roof".into()]
}
fn default_resolution() -> u32 {
    96
}
fn default_preview_size() -> [u32; 2] {
    [1024, 768]
}
fn default_colors() -> [[f64; 3]; 2] {
    [[0.2, 0.6, 0.2], [0.9, 0.9, 0.85]]
}

impl AppConfig {
    /// Reject settings that would produce a broken build graph.
    pub fn validate(&self) -> Result<()> {
        if self.paths.source_extension.is_empty() || self.paths.source_extension.starts_with('.')
        {
            return Err(ScadMakeError::validation(
                "paths.source_extension must be a bare extension such as \"scad\"",
            ));
        }
        for (key, dir) in [
            ("paths.output_dir", &self.paths.output_dir),
            ("paths.release_dir", &self.paths.release_dir),
        ] {
            if !is_plain_relative(dir) {
                return Err(ScadMakeError::validation(format!(
                    "{key} must be a relative path without `..` (got {})",
                    dir.display()
                )));
            }
        }
        for (key, var) in [
            ("tools.renderer_var", &self.tools.renderer_var),
            ("tools.colorizer_var", &self.tools.colorizer_var),
            ("tools.assembler_var", &self.tools.assembler_var),
        ] {
            if var.is_empty() || !var.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(ScadMakeError::validation(format!(
                    "{key} must be a make variable name (got {var:?})"
                )));
            }
        }
        Ok(())
    }
}

/// True for relative paths with at least one normal component and no `..`.
fn is_plain_relative(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.scadmake/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ScadMakeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.scadmake/scadmake.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the user config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ScadMakeError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        ScadMakeError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.validate()?;
    Ok(config)
}

/// Resolve the config for a project directory: `<dir>/scadmake.toml` wins,
/// then the user config, then defaults.
pub fn resolve_config(project_dir: &Path) -> Result<AppConfig> {
    let local = project_dir.join(CONFIG_FILE_NAME);
    if local.is_file() {
        tracing::debug!(path = ?local, "using project config");
        return load_config_from(&local);
    }
    load_config()
}

/// Create the user config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ScadMakeError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ScadMakeError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ScadMakeError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
