//! scadmake CLI: generate incremental make rules for annotated OpenSCAD
//! modules.
//!
//! Scans a directory for `` `make` me`` / `` `document` me`` directives and
//! writes stub scripts plus a makefile fragment that renders them.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
