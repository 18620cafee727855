//! PDF decoding: outline, positioned text runs and embedded images via pdfium.
//!
//! Everything the rest of the pipeline needs is pulled out of the document in
//! one pass and stored in a plain [`LoadedDocument`]. After that nothing
//! touches pdfium again, so the later stages are pure functions over owned
//! data and can be tested without a PDF on disk.
//!
//! ## Binding
//!
//! pdfium is a dynamically loaded C++ library. [`bind_pdfium`] looks for it
//! in this order:
//!
//! 1. `PDFIUM_LIB_PATH`: either the library file itself or a directory
//!    containing it;
//! 2. the current working directory;
//! 3. the system library search path.

use crate::error::Pdf2MdError;
use crate::outline::OutlineEntry;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the pdfium library (file or directory).
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Hard cap on outline entries read from one document. Malformed outlines
/// can link back into themselves.
const MAX_BOOKMARKS: usize = 10_000;
const MAX_BOOKMARK_DEPTH: usize = 64;

// ── Decoded data ─────────────────────────────────────────────────────────────

/// A piece of page text with its vertical extent in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// Bottom edge.
    pub y0: f32,
    /// Top edge.
    pub y1: f32,
}

impl TextRun {
    pub fn new(text: impl Into<String>, y0: f32, y1: f32) -> Self {
        Self {
            text: text.into(),
            y0,
            y1,
        }
    }
}

/// An embedded image decoded to pixels.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    /// Extension matching the stream's encoding (`jpg` for DCT, `png`
    /// otherwise).
    pub source_ext: String,
}

/// Decode outcome of one embedded image. Failures carry the decoder message.
pub type ImageSlot = Result<DecodedImage, String>;

/// One page of a decoded document.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Page height in points.
    pub height: f32,
    /// Text runs in content-stream order.
    pub runs: Vec<TextRun>,
    /// Embedded images in content-stream order.
    pub images: Vec<ImageSlot>,
}

impl PageContent {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            ..Self::default()
        }
    }

    pub fn with_run(mut self, text: impl Into<String>, y0: f32, y1: f32) -> Self {
        self.runs.push(TextRun::new(text, y0, y1));
        self
    }

    pub fn with_image(mut self, image: DynamicImage, source_ext: impl Into<String>) -> Self {
        self.images.push(Ok(DecodedImage {
            image,
            source_ext: source_ext.into(),
        }));
        self
    }

    pub fn with_broken_image(mut self, detail: impl Into<String>) -> Self {
        self.images.push(Err(detail.into()));
        self
    }
}

/// Everything the pipeline reads from a PDF.
#[derive(Debug, Clone, Default)]
pub struct LoadedDocument {
    /// Flat depth-first outline; empty when the document has none.
    pub outline: Vec<OutlineEntry>,
    pub pages: Vec<PageContent>,
}

impl LoadedDocument {
    pub fn new(outline: Vec<OutlineEntry>, pages: Vec<PageContent>) -> Self {
        Self { outline, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

// ── pdfium ───────────────────────────────────────────────────────────────────

/// Bind to the pdfium shared library.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2MdError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(configured) => {
            let configured = PathBuf::from(configured);
            let library = if configured.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&configured)
            } else {
                configured.clone()
            };
            Pdfium::bind_to_library(&library).map_err(|e| {
                Pdf2MdError::PdfiumBindingFailed(format!(
                    "{PDFIUM_LIB_PATH_ENV}={}: {e:?}",
                    configured.display()
                ))
            })?
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Pdf2MdError::PdfiumBindingFailed(format!("{e:?}")))?,
    };
    Ok(Pdfium::new(bindings))
}

/// Receives each embedded image as soon as it is decoded:
/// `(page_index, image_index, slot)`, both indices 0-based.
pub type ImageSink<'a> = &'a mut (dyn FnMut(usize, usize, ImageSlot) + 'a);

/// Open and fully decode a PDF file, keeping every image in its page.
pub fn load_pdf(path: &Path, password: Option<&str>) -> Result<LoadedDocument, Pdf2MdError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| map_load_error(e, path, password))?;
    read_document(&document, None)
}

/// Decode a PDF file, handing every image to `sink` instead of storing it.
///
/// At most one decoded image is alive at a time; the returned pages carry
/// no image slots.
pub fn load_pdf_streaming(
    path: &Path,
    password: Option<&str>,
    sink: ImageSink<'_>,
) -> Result<LoadedDocument, Pdf2MdError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| map_load_error(e, path, password))?;
    read_document(&document, Some(sink))
}

/// In-memory counterpart of [`load_pdf_streaming`].
pub fn load_pdf_from_bytes_streaming(
    bytes: Vec<u8>,
    password: Option<&str>,
    sink: ImageSink<'_>,
) -> Result<LoadedDocument, Pdf2MdError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_byte_vec(bytes, password)
        .map_err(|e| map_load_error(e, Path::new("<memory>"), password))?;
    read_document(&document, Some(sink))
}

fn map_load_error(e: PdfiumError, path: &Path, password: Option<&str>) -> Pdf2MdError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            Pdf2MdError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2MdError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        Pdf2MdError::CorruptPdf {
            path: path.to_path_buf(),
            detail: err_str,
        }
    }
}

fn read_document(
    document: &PdfDocument,
    mut sink: Option<ImageSink<'_>>,
) -> Result<LoadedDocument, Pdf2MdError> {
    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let outline = read_outline(document);
    debug!("Outline has {} entries", outline.len());

    let mut decoded = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        decoded.push(read_page(idx, &page, sink.as_deref_mut())?);
    }

    Ok(LoadedDocument::new(outline, decoded))
}

fn read_page(
    idx: usize,
    page: &PdfPage,
    mut sink: Option<&mut (dyn FnMut(usize, usize, ImageSlot) + '_)>,
) -> Result<PageContent, Pdf2MdError> {
    let mut content = PageContent::new(page.height().value);

    let text = page.text().map_err(|e| Pdf2MdError::PageReadFailed {
        page: idx + 1,
        detail: format!("{:?}", e),
    })?;
    for segment in text.segments().iter() {
        let bounds = segment.bounds();
        content
            .runs
            .push(TextRun::new(segment.text(), bounds.bottom().value, bounds.top().value));
    }

    let mut image_count = 0;
    for object in page.objects().iter() {
        if let Some(image) = object.as_image_object() {
            let source_ext = source_extension(image);
            let slot = image
                .get_raw_image()
                .map(|pixels| DecodedImage {
                    image: pixels,
                    source_ext,
                })
                .map_err(|e| format!("{:?}", e));
            match sink.as_deref_mut() {
                Some(sink) => sink(idx, image_count, slot),
                None => content.images.push(slot),
            }
            image_count += 1;
        }
    }

    debug!(
        "Page {}: {} text runs, {} images",
        idx + 1,
        content.runs.len(),
        image_count
    );
    Ok(content)
}

fn source_extension(image: &PdfPageImageObject) -> String {
    let dct = image
        .filters()
        .iter()
        .any(|filter| filter.name() == "DCTDecode");
    let ext = if dct { "jpg" } else { "png" };
    ext.to_string()
}

// ── Outline ──────────────────────────────────────────────────────────────────

fn read_outline(document: &PdfDocument) -> Vec<OutlineEntry> {
    let mut raw = Vec::new();
    walk_bookmarks(document.bookmarks().root(), 1, &mut raw);
    inherit_missing_pages(raw)
}

fn walk_bookmarks(
    first: Option<PdfBookmark>,
    level: usize,
    out: &mut Vec<(usize, String, Option<usize>)>,
) {
    if level > MAX_BOOKMARK_DEPTH {
        warn!("Outline deeper than {} levels; ignoring the rest", MAX_BOOKMARK_DEPTH);
        return;
    }
    let mut current = first;
    while let Some(bookmark) = current {
        if out.len() >= MAX_BOOKMARKS {
            warn!("Outline has more than {} entries; truncating", MAX_BOOKMARKS);
            return;
        }
        let title = bookmark.title().unwrap_or_default();
        out.push((level, title, bookmark_page(&bookmark)));
        walk_bookmarks(bookmark.first_child(), level + 1, out);
        current = bookmark.next_sibling();
    }
}

/// 1-based target page of a bookmark, from its destination or its GoTo action.
fn bookmark_page(bookmark: &PdfBookmark) -> Option<usize> {
    let index = match bookmark.destination() {
        Some(destination) => destination.page_index().ok(),
        None => match bookmark.action() {
            Some(PdfAction::LocalDestination(action)) => action
                .destination()
                .ok()
                .and_then(|destination| destination.page_index().ok()),
            _ => None,
        },
    }?;
    Some(index as usize + 1)
}

/// Entries without a target take the previous entry's page (page 1 first).
pub(crate) fn inherit_missing_pages(raw: Vec<(usize, String, Option<usize>)>) -> Vec<OutlineEntry> {
    let mut last_page = 1;
    raw.into_iter()
        .map(|(level, title, page)| {
            let page = match page {
                Some(p) => p,
                None => {
                    debug!("Bookmark '{}' has no destination; using page {}", title, last_page);
                    last_page
                }
            };
            last_page = page;
            OutlineEntry::new(level, title, page)
        })
        .collect()
}
