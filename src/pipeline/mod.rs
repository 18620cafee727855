//! Pipeline stages for outline-driven PDF-to-Markdown conversion.
//!
//! Each submodule implements one transformation step. Only [`decode`] talks to
//! pdfium; every later stage works on the owned [`decode::LoadedDocument`].
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ images ──▶ resolve ──▶ assemble ──▶ chunk
//! (path)    (pdfium)   (files)    (ranges)    (markdown)   (split)
//!                                               │
//!                                     margin + format
//! ```
//!
//! 1. [`input`]    validate the path and the `%PDF` header
//! 2. [`decode`]   read outline, text runs and embedded images in one pass
//! 3. [`images`]   save images above the size threshold, record per-page names
//! 4. [`resolve`]  infer each section's page range from the outline
//! 5. [`assemble`] gather section text through the [`margin`] filter, add
//!    image references, normalise with [`format`] and add the heading
//! 6. [`chunk`]    split the section into size-bounded chunks with overlap

pub mod assemble;
pub mod chunk;
pub mod decode;
pub mod format;
pub mod images;
pub mod input;
pub mod margin;
pub mod resolve;
