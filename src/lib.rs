//! # pdf2md-outline
//!
//! Convert PDF documents into section-chunked Markdown, driven by the
//! document's own outline (bookmarks).
//!
//! ## Why outline-driven?
//!
//! Retrieval and LLM pipelines want text in pieces that follow the author's
//! structure. A PDF's bookmarks already describe that structure. This crate
//! turns every bookmark into a section, infers which pages belong to it, and
//! writes the section as size-bounded Markdown chunks under one directory per
//! top-level chapter. Running headers and footers are dropped by position and
//! embedded images are extracted and referenced inline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     check the path and the %PDF header
//!  ├─ 2. Decode    outline, positioned text runs, embedded images (pdfium)
//!  ├─ 3. Images    save images ≥ min_size under images/
//!  ├─ 4. Outline   flat bookmarks → dotted section ids (1, 1.1, 1.2.3 …)
//!  ├─ 5. Resolve   infer each section's page range
//!  ├─ 6. Assemble  margin filter, image refs, normalise, heading
//!  ├─ 7. Chunk     paragraph → sentence packing with overlap
//!  └─ 8. Output    structure.yaml, chunk files, optional full file
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_outline::{convert, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .max_chars(2000)
//!         .overlap_chars(100)
//!         .build()?;
//!     let stats = convert("book.pdf", "out/book.md", &config).await?;
//!     eprintln!("{} sections → {} chunks", stats.sections, stats.chunks_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-outline` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2md-outline = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod outline;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ChunkingConfig, ConversionConfig, ConversionConfigBuilder, FormattingConfig, ImageConfig,
    MarginConfig,
};
pub use convert::{convert, convert_document, convert_from_bytes, convert_sync, output_base_dir};
pub use error::{ErrorKind, ImageError, Pdf2MdError};
pub use outline::{structure_outline, DuplicateSection, OutlineEntry, SectionMap, SectionRecord};
pub use output::{format_section_id, ConversionStats, OutputLayout};
pub use pipeline::chunk::{split_into_chunks, ChunkSplitter};
pub use pipeline::decode::{LoadedDocument, PageContent};
pub use pipeline::resolve::{resolve_ranges, ResolvedSection};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
