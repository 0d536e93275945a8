//! Shared types, error model, and configuration for scadmake.
//!
//! This crate is the foundation depended on by all other scadmake crates.
//! It provides:
//! - [`ScadMakeError`]: the unified error type
//! - Domain types ([`SourceFile`], [`EntryPointRecord`], [`DirectiveKind`], [`ArtifactKind`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, PathsConfig, RenderConfig, ToolsConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, resolve_config,
};
pub use error::{Result, ScadMakeError};
pub use types::{ArtifactKind, DirectiveKind, EntryPointRecord, SourceFile, StubFamily};
