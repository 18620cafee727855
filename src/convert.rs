//! Conversion entry points.
//!
//! The pipeline itself is synchronous: pdfium is not async-safe and every
//! later stage is plain CPU and file work. [`convert`] and
//! [`convert_from_bytes`] move the whole run onto a blocking thread with
//! `tokio::task::spawn_blocking`; [`convert_sync`] runs it on the caller's
//! thread. [`convert_document`] skips decoding and works on an already loaded
//! document.

use crate::config::ConversionConfig;
use crate::error::Pdf2MdError;
use crate::outline::{structure_outline, OutlineStructure, UNTITLED_DOCUMENT_ID};
use crate::output::{write_chunk_files, ConversionStats, OutputLayout, UNKNOWN_SECTION};
use crate::pipeline::assemble::{assemble_document, assemble_section};
use crate::pipeline::chunk::ChunkSplitter;
use crate::pipeline::decode::{self, ImageSink, LoadedDocument};
use crate::pipeline::images::{extract_images, ImageExtraction, ImageExtractor, ImageLocations};
use crate::pipeline::input;
use crate::pipeline::resolve::resolve_ranges;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Convert a PDF file into sectioned Markdown under `output_path`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `pdf_path`    — local PDF file
/// * `output_path` — full-document Markdown path; chunk files go to the
///   sibling directory named after its stem
/// * `config`      — conversion configuration
///
/// # Errors
/// Returns `Err(Pdf2MdError)` for fatal errors only. Failed images are
/// reported in [`ConversionStats::image_errors`].
///
/// # Example
/// ```rust,no_run
/// use pdf2md_outline::{convert, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConversionConfig::default();
/// let stats = convert("paper.pdf", "out/paper.md", &config).await?;
/// println!("{} sections, {} chunks", stats.sections, stats.chunks_written);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2MdError> {
    let pdf_path = pdf_path.as_ref().to_path_buf();
    let output_path = output_path.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || convert_sync(&pdf_path, &output_path, &config))
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Blocking variant of [`convert`].
pub fn convert_sync(
    pdf_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2MdError> {
    config.validate()?;
    let pdf_path = input::resolve_local(pdf_path.as_ref())?;
    info!("Starting conversion: {}", pdf_path.display());

    decode_and_convert(output_path.as_ref(), config, |sink| {
        decode::load_pdf_streaming(&pdf_path, config.password.as_deref(), sink)
    })
}

/// Convert PDF bytes held in memory.
///
/// pdfium reads the buffer directly; nothing is written besides the output
/// tree.
pub async fn convert_from_bytes(
    bytes: Vec<u8>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2MdError> {
    config.validate()?;
    input::check_pdf_bytes(&bytes)?;
    let output_path = output_path.as_ref().to_path_buf();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        info!("Starting conversion of {} in-memory bytes", bytes.len());
        decode_and_convert(&output_path, &config, |sink| {
            decode::load_pdf_from_bytes_streaming(bytes, config.password.as_deref(), sink)
        })
    })
    .await
    .map_err(|e| Pdf2MdError::Internal(format!("Conversion task panicked: {}", e)))?
}

/// Run the pipeline on a decoded document.
///
/// Steps: prepare directories → extract images → structure the outline →
/// write `structure.yaml` → per section: resolve range, assemble, split,
/// write chunks → optionally write the full file.
///
/// The document is consumed; its image slots are released as they are
/// saved.
pub fn convert_document(
    mut document: LoadedDocument,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2MdError> {
    let total_start = Instant::now();
    config.validate()?;

    // ── Step 1: Output directories ───────────────────────────────────────
    let layout = prepare_layout(output_path.as_ref(), config)?;

    // ── Step 2: Images ───────────────────────────────────────────────────
    let extraction = extract_images(
        &mut document,
        layout.image_dir(),
        &config.images,
        config.progress_callback.as_ref(),
    );

    write_outputs(&document, &layout, extraction, config, total_start)
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn prepare_layout(output_path: &Path, config: &ConversionConfig) -> Result<OutputLayout, Pdf2MdError> {
    let layout = OutputLayout::new(output_path, &config.images.output_dir);
    layout.prepare()?;
    debug!("Output base directory: {}", layout.base().display());
    Ok(layout)
}

/// Decode with images saved as they are read, then run the rest of the
/// pipeline.
fn decode_and_convert<F>(
    output_path: &Path,
    config: &ConversionConfig,
    load: F,
) -> Result<ConversionStats, Pdf2MdError>
where
    F: FnOnce(ImageSink<'_>) -> Result<LoadedDocument, Pdf2MdError>,
{
    let total_start = Instant::now();
    let layout = prepare_layout(output_path, config)?;

    let mut extractor = ImageExtractor::new(
        layout.image_dir(),
        &config.images,
        config.progress_callback.as_ref(),
    );
    let document = load(&mut |page, index, slot| extractor.accept(page, index, slot))?;
    let extraction = extractor.finish();

    write_outputs(&document, &layout, extraction, config, total_start)
}

/// Steps after image extraction: outline, sections or whole document,
/// full file, stats.
fn write_outputs(
    document: &LoadedDocument,
    layout: &OutputLayout,
    extraction: ImageExtraction,
    config: &ConversionConfig,
    total_start: Instant,
) -> Result<ConversionStats, Pdf2MdError> {
    // ── Step 3: Outline ──────────────────────────────────────────────────
    let outline = structure_outline(&document.outline, config.chunking.toc_level);
    layout.write_structure(&outline.sections)?;

    let mut stats = ConversionStats {
        total_pages: document.page_count(),
        images_saved: extraction.saved,
        images_skipped: extraction.skipped_small,
        image_errors: extraction.errors,
        duplicate_sections: outline.duplicates.clone(),
        used_outline: !outline.is_empty(),
        ..ConversionStats::default()
    };

    // ── Step 4: Sections ─────────────────────────────────────────────────
    let full_text = if outline.is_empty() {
        write_whole_document(document, layout, &extraction.locations, config, &mut stats)?
    } else {
        write_sections(document, &outline, layout, &extraction.locations, config, &mut stats)?
    };

    // ── Step 5: Full file ────────────────────────────────────────────────
    if config.chunking.keep_full_file {
        layout.write_full_file(&full_text)?;
        stats.full_file = Some(layout.output_path().to_path_buf());
    }

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} sections, {} chunks, {} images in {}ms",
        stats.sections, stats.chunks_written, stats.images_saved, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(stats.sections.max(1), stats.chunks_written);
    }

    Ok(stats)
}

/// Assemble, split and write every section. Returns the full-file text.
fn write_sections(
    document: &LoadedDocument,
    outline: &OutlineStructure,
    layout: &OutputLayout,
    locations: &ImageLocations,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Result<String, Pdf2MdError> {
    let splitter = ChunkSplitter::from(&config.chunking);
    let resolved = resolve_ranges(&outline.sections);
    let total = resolved.len();
    info!("Processing {} sections", total);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    let mut texts = Vec::with_capacity(total);
    for (i, range) in resolved.iter().enumerate() {
        let section = range.section;
        if let Some(ref cb) = config.progress_callback {
            cb.on_section_start(i + 1, total, &section.id, &section.title);
        }
        debug!(
            "Section {} '{}': pages {}..{}",
            section.id, section.title, range.start_page, range.end_page
        );

        let top_title = outline.top_level_title(section).unwrap_or(UNKNOWN_SECTION);
        let dir = layout.create_section_dir(section.top_level_id(), top_title)?;

        let text = assemble_section(document, range, locations, config);
        let chunks = splitter.split(&text);
        write_chunk_files(&dir, &chunks, &section.id, &section.title)?;

        stats.chunks_written += chunks.len();
        if let Some(ref cb) = config.progress_callback {
            cb.on_section_complete(i + 1, total, chunks.len());
        }
        texts.push(text);
    }

    stats.sections = total;
    Ok(texts.join("\n\n"))
}

/// Chunk a document without an outline as one unit. Returns the full-file text.
fn write_whole_document(
    document: &LoadedDocument,
    layout: &OutputLayout,
    locations: &ImageLocations,
    config: &ConversionConfig,
    stats: &mut ConversionStats,
) -> Result<String, Pdf2MdError> {
    info!("No outline found; processing {} pages", document.page_count());
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(1);
        cb.on_section_start(1, 1, UNTITLED_DOCUMENT_ID, &document_title(layout));
    }

    let text = assemble_document(document, locations, config);
    let chunks = ChunkSplitter::from(&config.chunking).split(&text);
    layout.write_document_chunks(&chunks)?;

    stats.chunks_written = chunks.len();
    if let Some(ref cb) = config.progress_callback {
        cb.on_section_complete(1, 1, chunks.len());
    }
    Ok(text)
}

fn document_title(layout: &OutputLayout) -> String {
    layout
        .base()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Where [`convert`] will put chunk files for `output_path`.
pub fn output_base_dir(output_path: impl AsRef<Path>) -> PathBuf {
    OutputLayout::new(output_path.as_ref(), "images")
        .base()
        .to_path_buf()
}
