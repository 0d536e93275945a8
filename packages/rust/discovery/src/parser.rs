//! Directive grammar for annotated module declarations.
//!
//! A directive is a single trimmed line of the form
//! `module <name>(<params>)<rest>` where `<rest>` contains one or more
//! markers:
//! - `` `make` me``: the module is buildable
//! - `` `document` me``: the module is documentable
//!
//! `<name>` is `[A-Za-z0-9_-]+`. Matching is case-sensitive.

use regex::Regex;
use scadmake_shared::DirectiveKind;
use std::sync::LazyLock;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A declaration line carrying at least one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Module name.
    pub name: String,
    /// Distinct marker kinds on the line, in `DirectiveKind` order.
    pub kinds: Vec<DirectiveKind>,
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `module name(` at the start of a line.
static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^module\s+([A-Za-z0-9_-]+)\s*\(").expect("declaration regex")
});

/// Matches a `` `make` me`` or `` `document` me`` marker.
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`(make|document)` me").expect("marker regex")
});

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse one source line. Returns `None` for anything that is not a marked
/// declaration; such lines are never an error.
pub fn parse_directive(line: &str) -> Option<Directive> {
    let trimmed = line.trim();
    let caps = DECLARATION_RE.captures(trimmed)?;
    let open = caps.get(0)?.end();
    let name = caps[1].to_string();

    // Markers only count after the parameter list closes.
    let rest = &trimmed[open..];
    let close = rest.find(')')?;
    let tail = &rest[close + 1..];

    let mut kinds: Vec<DirectiveKind> = MARKER_RE
        .captures_iter(tail)
        .filter_map(|c| DirectiveKind::from_marker_word(&c[1]))
        .collect();
    kinds.sort();
    kinds.dedup();

    if kinds.is_empty() {
        return None;
    }

    Some(Directive { name, kinds })
}
