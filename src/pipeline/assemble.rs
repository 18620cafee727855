//! Section text assembly: page range → one formatted Markdown blob.
//!
//! For a section with resolved pages `start..end` (1-based):
//!
//! 1. text runs from pages `start..end` (end exclusive, capped at the page
//!    count) survive the margin filter and are trimmed; runs of one page are
//!    joined with `\n`, pages with `\n\n`, empty pages are dropped;
//! 2. a `![Figure](../<images>/<file>)` reference is put in front of the text
//!    for every image extracted from those pages. References are prepended one
//!    at a time, so the last image of the last page ends up first;
//! 3. the result is normalised with [`format_text`] and given its heading.
//!
//! Documents without an outline are assembled page by page instead, each
//! page's image references in front of that page's text.

use crate::config::{ConversionConfig, MarginConfig};
use crate::pipeline::decode::{LoadedDocument, PageContent};
use crate::pipeline::format::{add_section_header, format_text};
use crate::pipeline::images::ImageLocations;
use crate::pipeline::resolve::ResolvedSection;

/// Surviving text of one page: trimmed runs outside the margins, one per line.
pub fn page_text(page: &PageContent, margins: &MarginConfig) -> String {
    page.runs
        .iter()
        .filter(|run| !margins.should_skip(run, page.height))
        .map(|run| run.text.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Raw text of pages `start_page..end_page` (1-based, end exclusive).
pub fn extract_section_text(
    doc: &LoadedDocument,
    start_page: usize,
    end_page: usize,
    margins: &MarginConfig,
) -> String {
    let first = start_page.saturating_sub(1);
    let last = end_page.saturating_sub(1).min(doc.page_count());
    if first >= last {
        return String::new();
    }
    doc.pages[first..last]
        .iter()
        .map(|page| page_text(page, margins))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Markdown reference to an extracted image.
pub fn image_ref(images_prefix: &str, file: &str) -> String {
    format!("\n![Figure]({images_prefix}/{file})\n")
}

/// Put references to images on pages `start_page..end_page` in front of `text`.
pub fn prepend_image_refs(
    text: String,
    locations: &ImageLocations,
    start_page: usize,
    end_page: usize,
    images_dir: &str,
) -> String {
    let prefix = format!("../{images_dir}");
    let first = start_page.saturating_sub(1);
    let last = end_page.saturating_sub(1);

    let mut text = text;
    for files in locations.range(first..last.max(first)).map(|(_, files)| files) {
        for file in files {
            text = image_ref(&prefix, file) + &text;
        }
    }
    text
}

/// Full Markdown of one resolved section, heading included, ready to chunk.
pub fn assemble_section(
    doc: &LoadedDocument,
    resolved: &ResolvedSection<'_>,
    locations: &ImageLocations,
    config: &ConversionConfig,
) -> String {
    let section = resolved.section;
    let raw = extract_section_text(doc, resolved.start_page, resolved.end_page, &config.margins);
    let with_images = prepend_image_refs(
        raw,
        locations,
        resolved.start_page,
        resolved.end_page,
        &config.images.output_dir,
    );
    let formatted = format_text(&with_images, config.formatting.max_newlines);
    add_section_header(&formatted, &section.id, &section.title, section.level)
}

/// Full Markdown of a document without an outline, ready to chunk.
pub fn assemble_document(
    doc: &LoadedDocument,
    locations: &ImageLocations,
    config: &ConversionConfig,
) -> String {
    let images_dir = &config.images.output_dir;
    let pages: Vec<String> = doc
        .pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let mut parts: Vec<String> = locations
                .get(&idx)
                .into_iter()
                .flatten()
                .map(|file| image_ref(images_dir, file))
                .collect();
            let text = page_text(page, &config.margins);
            if !text.is_empty() {
                parts.push(text);
            }
            (!parts.is_empty()).then(|| parts.join("\n"))
        })
        .collect();

    format_text(&pages.join("\n\n"), config.formatting.max_newlines)
}
