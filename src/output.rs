//! Output layout and result types.
//!
//! For an output path `out/report.md` the converter writes:
//!
//! ```text
//! out/report.md                          full document (optional)
//! out/report/structure.yaml              section map
//! out/report/images/image_p3_1.png       extracted images
//! out/report/1_introduction/1_0_introduction_01.md
//! out/report/1_introduction/1_01_background_01.md
//! out/report/2_methods/2_0_methods_01.md
//! ```
//!
//! Documents without an outline get `out/report/chunk_001.md`, … instead of
//! section directories. Every write is idempotent: directories are reused and
//! files overwritten.

use crate::error::{ImageError, Pdf2MdError};
use crate::outline::{DuplicateSection, SectionMap};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the section map dump inside the base directory.
pub const STRUCTURE_FILE: &str = "structure.yaml";

/// Directory title used when a section's top-level ancestor is missing.
pub const UNKNOWN_SECTION: &str = "unknown_section";

// ── Layout ───────────────────────────────────────────────────────────────────

/// Resolved paths for one conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    output_path: PathBuf,
    base: PathBuf,
    image_dir: PathBuf,
}

impl OutputLayout {
    /// Layout for `output_path`, with images under `<base>/<images_dir>`.
    pub fn new(output_path: impl Into<PathBuf>, images_dir: &str) -> Self {
        let output_path = output_path.into();
        let stem = output_path
            .file_stem()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| "output".into());
        let base = output_path
            .parent()
            .map(|p| p.join(&stem))
            .unwrap_or_else(|| PathBuf::from(&stem));
        let image_dir = base.join(images_dir);
        Self {
            output_path,
            base,
            image_dir,
        }
    }

    /// The full-file path given by the caller.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// `<output parent>/<output stem>`.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Create the base and image directories.
    pub fn prepare(&self) -> Result<(), Pdf2MdError> {
        create_dir(&self.base)?;
        create_dir(&self.image_dir)
    }

    /// Dump the section map, in outline order, to `structure.yaml`.
    pub fn write_structure(&self, sections: &SectionMap) -> Result<PathBuf, Pdf2MdError> {
        let yaml =
            serde_yaml::to_string(sections).map_err(|e| Pdf2MdError::Serialization(e.to_string()))?;
        let path = self.base.join(STRUCTURE_FILE);
        std::fs::write(&path, yaml).map_err(|e| Pdf2MdError::write_failed(&path, e))?;
        info!("Section structure saved to {}", path.display());
        Ok(path)
    }

    /// Create (or reuse) `<base>/<top_id>_<sanitised top title>/`.
    pub fn create_section_dir(&self, top_id: &str, top_title: &str) -> Result<PathBuf, Pdf2MdError> {
        let dir = self
            .base
            .join(format!("{}_{}", top_id, sanitize_title(top_title)));
        create_dir(&dir)?;
        Ok(dir)
    }

    /// Write whole-document chunks as `<base>/chunk_NNN.md`.
    pub fn write_document_chunks(&self, chunks: &[String]) -> Result<Vec<PathBuf>, Pdf2MdError> {
        let total = chunks.len();
        info!("Writing {} chunks", total);
        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let path = self.base.join(format!("chunk_{:03}.md", i + 1));
                std::fs::write(&path, chunk).map_err(|e| Pdf2MdError::write_failed(&path, e))?;
                info!("Written chunk {}/{}: {}", i + 1, total, path.display());
                Ok(path)
            })
            .collect()
    }

    /// Write the full document to the output path.
    ///
    /// Uses atomic write (temp file + rename) so a reader never sees a
    /// half-written file.
    pub fn write_full_file(&self, text: &str) -> Result<(), Pdf2MdError> {
        let path = &self.output_path;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir(parent)?;
        }

        let mut tmp_name = path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        std::fs::write(&tmp_path, text).map_err(|e| Pdf2MdError::write_failed(path, e))?;
        std::fs::rename(&tmp_path, path).map_err(|e| Pdf2MdError::write_failed(path, e))?;
        info!("Written full file: {}", path.display());
        Ok(())
    }
}

/// Write one section's chunks as `<fmt id>_<sanitised title>_NN.md` in `dir`.
pub fn write_chunk_files(
    dir: &Path,
    chunks: &[String],
    section_id: &str,
    section_title: &str,
) -> Result<Vec<PathBuf>, Pdf2MdError> {
    let stem = format!(
        "{}_{}",
        format_section_id(section_id),
        sanitize_title(section_title)
    );
    chunks
        .iter()
        .enumerate()
        .map(|(j, chunk)| {
            let path = dir.join(format!("{}_{:02}.md", stem, j + 1));
            std::fs::write(&path, chunk).map_err(|e| Pdf2MdError::write_failed(&path, e))?;
            info!("Written: {}", path.display());
            Ok(path)
        })
        .collect()
}

/// File-name form of a dotted id: later components padded to two digits,
/// top-level ids suffixed with `_0`.
///
/// ```rust
/// use pdf2md_outline::output::format_section_id;
///
/// assert_eq!(format_section_id("1.2.3"), "1_02_03");
/// assert_eq!(format_section_id("1"), "1_0");
/// ```
pub fn format_section_id(section_id: &str) -> String {
    let parts: Vec<String> = section_id
        .split('.')
        .enumerate()
        .map(|(i, part)| match part.parse::<usize>() {
            Ok(n) if i > 0 => format!("{n:02}"),
            _ => part.to_string(),
        })
        .collect();
    if parts.len() == 1 {
        format!("{}_0", parts[0])
    } else {
        parts.join("_")
    }
}

/// Lowercase, with path separators replaced by `_`.
pub fn sanitize_title(title: &str) -> String {
    title.to_lowercase().replace(['/', '\\'], "_")
}

fn create_dir(path: &Path) -> Result<(), Pdf2MdError> {
    std::fs::create_dir_all(path).map_err(|e| Pdf2MdError::write_failed(path, e))
}

// ── Results ──────────────────────────────────────────────────────────────────

/// Summary of a finished conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    /// Sections written; `0` for documents without an outline.
    pub sections: usize,
    /// Whether the document was split along its outline.
    pub used_outline: bool,
    pub chunks_written: usize,
    pub images_saved: usize,
    /// Images dropped for being below `images.min_size`.
    pub images_skipped: usize,
    /// Per-image failures. Never fatal.
    pub image_errors: Vec<ImageError>,
    /// Outline entries whose id replaced an earlier one.
    pub duplicate_sections: Vec<DuplicateSection>,
    /// Where the full document went, when `keep_full_file` is on.
    pub full_file: Option<PathBuf>,
    pub total_duration_ms: u64,
}
