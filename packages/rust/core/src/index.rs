//! Per-file grouping of documentable entry points.
//!
//! Each group becomes one packing-document rule, so order matters twice:
//! groups keep first-discovery order, members keep scan order.

use std::collections::HashMap;

use scadmake_shared::{DirectiveKind, EntryPointRecord};

/// Documentable records belonging to one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    pub basename: String,
    /// In scan order; duplicates are kept.
    pub members: Vec<EntryPointRecord>,
}

/// Basename-keyed, insertion-ordered collection of [`DocumentGroup`]s.
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    groups: Vec<DocumentGroup>,
    by_basename: HashMap<String, usize>,
}

impl DocumentIndex {
    /// Group the documentable records among `records`. Other kinds are skipped.
    pub fn build<'a>(records: impl IntoIterator<Item = &'a EntryPointRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            if record.kind == DirectiveKind::Documentable {
                index.insert(record.clone());
            }
        }
        index
    }

    fn insert(&mut self, record: EntryPointRecord) {
        let slot = match self.by_basename.get(record.basename()) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.by_basename.insert(record.basename().to_string(), slot);
                self.groups.push(DocumentGroup {
                    basename: record.basename().to_string(),
                    members: Vec::new(),
                });
                slot
            }
        };
        self.groups[slot].members.push(record);
    }

    pub fn get(&self, basename: &str) -> Option<&DocumentGroup> {
        self.by_basename.get(basename).map(|&slot| &self.groups[slot])
    }

    /// Groups in first-discovery order.
    pub fn groups(&self) -> &[DocumentGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
