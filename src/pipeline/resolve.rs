//! Section page-range inference.
//!
//! Outlines only record where a section starts. The end of each section is
//! inferred by looking ahead in page order:
//!
//! 1. the first later entry that is a direct child (one level deeper, whose
//!    parent path is this section's path), and
//! 2. the first later entry at the same or a shallower level (a sibling or an
//!    ancestor-level cousin).
//!
//! The child wins when it starts no later than the sibling/cousin. With
//! neither, the section is the trailing leaf of the document and gets a fixed
//! [`FALLBACK_SPAN`]. The end is finally clamped so it is never before the
//! start.

use crate::outline::{SectionMap, SectionRecord};

/// Pages assigned past the start page when nothing later bounds a section.
pub const FALLBACK_SPAN: usize = 10;

/// A section together with its inferred page range (both 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSection<'a> {
    pub section: &'a SectionRecord,
    pub start_page: usize,
    pub end_page: usize,
}

/// Sections in processing order: by start page, shallower level first on the
/// same page, document order otherwise.
pub fn page_order(sections: &SectionMap) -> Vec<&SectionRecord> {
    let mut ordered: Vec<&SectionRecord> = sections.values().collect();
    ordered.sort_by_key(|s| (s.page, s.level));
    ordered
}

/// Resolve the page range of every section, in [`page_order`].
pub fn resolve_ranges(sections: &SectionMap) -> Vec<ResolvedSection<'_>> {
    let ordered = page_order(sections);
    (0..ordered.len())
        .map(|i| resolve_at(&ordered, i))
        .collect()
}

/// Resolve the range of `ordered[index]` against the entries after it.
pub fn resolve_at<'a>(ordered: &[&'a SectionRecord], index: usize) -> ResolvedSection<'a> {
    let section = ordered[index];
    let later = &ordered[index + 1..];
    let start_page = section.page;

    let first_child_page = later
        .iter()
        .find(|other| section.is_parent_of(other))
        .map(|child| child.page);

    let next_boundary_page = later
        .iter()
        .find(|other| other.level <= section.level)
        .map(|other| other.page);

    let end_page = match (first_child_page, next_boundary_page) {
        (Some(child), None) => child,
        (Some(child), Some(boundary)) if child <= boundary => child,
        (_, Some(boundary)) => boundary,
        (None, None) => start_page + FALLBACK_SPAN,
    };

    ResolvedSection {
        section,
        start_page,
        end_page: end_page.max(start_page),
    }
}
