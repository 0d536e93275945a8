//! Generated files for scadmake: artifact paths, stub scripts, and the
//! compare-before-write helper every generated file goes through.

pub mod layout;
pub mod prune;
pub mod stub;
pub mod write;

pub use layout::ArtifactLayout;
pub use prune::prune_stale_stubs;
pub use stub::{GeneratedStub, StubReport, StubTemplate, sync_stubs};
pub use write::{WriteOutcome, write_if_changed};
