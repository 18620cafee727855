//! Outline structuring: flat bookmark list → ordered map of sections.
//!
//! A PDF outline arrives as a flat, depth-first list of `(level, title, page)`
//! entries. [`structure_outline`] walks it once, keeping the ancestor path and
//! a per-level sibling counter, and assigns every entry a dotted id such as
//! `1.2.3`.
//!
//! Malformed outlines are accepted as they are:
//!
//! - a jump of more than one level (1 → 3) leaves the intermediate path
//!   entries absent, and the id skips the zero counters in between, so
//!   `1` followed by a level-3 entry yields `1.1`;
//! - a later entry whose id collides with an earlier one replaces the earlier
//!   record in place and is reported as a [`DuplicateSection`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One raw outline entry as reported by the PDF decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    /// 1-based outline depth.
    pub level: usize,
    /// Bookmark title.
    pub title: String,
    /// 1-based page the bookmark points at.
    pub page: usize,
}

impl OutlineEntry {
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }
}

/// One node of the reconstructed outline tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    /// Dotted id, unique within one [`SectionMap`].
    pub id: String,
    /// Outline title, verbatim.
    pub title: String,
    /// 1-based depth.
    pub level: usize,
    /// 1-based start page as reported by the outline.
    pub page: usize,
    /// Ancestor titles followed by this section's own title.
    pub full_path: Vec<String>,
}

impl SectionRecord {
    /// Id of the top-level section this one belongs to (`"1"` for `"1.2.3"`).
    pub fn top_level_id(&self) -> &str {
        self.id.split('.').next().unwrap_or(&self.id)
    }

    /// Whether `other` is a direct child of this section, judged by level and
    /// ancestry path rather than by id.
    pub fn is_parent_of(&self, other: &SectionRecord) -> bool {
        other.level == self.level + 1
            && other
                .full_path
                .split_last()
                .is_some_and(|(_, ancestors)| ancestors == self.full_path.as_slice())
    }
}

/// Sections keyed by id, in order of first appearance in the outline.
pub type SectionMap = IndexMap<String, SectionRecord>;

/// Section id reported for documents that have no outline.
pub const UNTITLED_DOCUMENT_ID: &str = "document";

/// A later outline entry produced an id that was already taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSection {
    pub id: String,
    /// Title of the record that was replaced.
    pub previous_title: String,
    /// Title of the record that replaced it.
    pub title: String,
}

/// Result of structuring an outline.
#[derive(Debug, Clone, Default)]
pub struct OutlineStructure {
    pub sections: SectionMap,
    /// Id collisions, in the order they were encountered.
    pub duplicates: Vec<DuplicateSection>,
}

impl OutlineStructure {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Title of the top-level section `record` belongs to, if it is present.
    pub fn top_level_title(&self, record: &SectionRecord) -> Option<&str> {
        self.sections
            .get(record.top_level_id())
            .map(|top| top.title.as_str())
    }
}

/// Convert a flat outline into an ordered section map.
///
/// Entries deeper than `max_depth`, and entries with level `0`, are dropped
/// entirely: they never become sections and never appear in another
/// section's `full_path`.
pub fn structure_outline(entries: &[OutlineEntry], max_depth: usize) -> OutlineStructure {
    let mut structure = OutlineStructure::default();
    let mut current_path: Vec<String> = Vec::new();
    let mut counters = vec![0usize; max_depth];

    for entry in entries {
        let level = entry.level;
        if level == 0 {
            warn!("Skipping outline entry '{}' with level 0", entry.title);
            continue;
        }
        if level > max_depth {
            debug!(
                "Skipping outline entry '{}' at level {} (max depth {})",
                entry.title, level, max_depth
            );
            continue;
        }

        current_path.truncate(level - 1);
        current_path.push(entry.title.clone());

        counters[level - 1] += 1;
        for counter in counters.iter_mut().skip(level) {
            *counter = 0;
        }

        let id = counters[..level]
            .iter()
            .filter(|&&n| n > 0)
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");

        let record = SectionRecord {
            id: id.clone(),
            title: entry.title.clone(),
            level,
            page: entry.page,
            full_path: current_path.clone(),
        };

        if let Some(previous) = structure.sections.insert(id.clone(), record) {
            warn!(
                "Duplicate section id {}: '{}' replaces '{}'",
                id, entry.title, previous.title
            );
            structure.duplicates.push(DuplicateSection {
                id,
                previous_title: previous.title,
                title: entry.title.clone(),
            });
        }
    }

    info!("Found {} sections", structure.sections.len());
    structure
}
