//! Core pipeline orchestration and build-graph synthesis for scadmake.
//!
//! This crate ties together discovery, per-file grouping, stub synthesis and
//! makefile emission into the end-to-end `generate` workflow.

pub mod index;
pub mod makefile;
pub mod pipeline;

pub use index::{DocumentGroup, DocumentIndex};
pub use makefile::{BuildGraph, MakefileEmitter, duplicate_outputs};
pub use pipeline::{
    GenerateConfig, GenerateResult, ProgressReporter, SilentProgress, discover, generate,
};
