//! Error types for the pdf2md-outline library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2MdError`] — **Fatal**: the conversion cannot proceed at all
//!   (bad configuration, missing input, unreadable PDF, output not writable).
//!   Returned as `Err(Pdf2MdError)` from the top-level `convert*` functions.
//!
//! * [`ImageError`] — **Non-fatal**: a single embedded image could not be
//!   decoded or saved. It is logged, counted in
//!   [`crate::output::ConversionStats`], and the rest of the document is
//!   converted as usual.
//!
//! Every fatal variant belongs to one [`ErrorKind`], so callers that only
//! care about the coarse category (config, input, conversion) can match on
//! [`Pdf2MdError::kind`] instead of the individual variants.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure category of a [`Pdf2MdError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorKind {
    /// Malformed or missing configuration; raised before conversion starts.
    ConfigLoad,
    /// Input file missing or unreadable; raised before any work begins.
    InputNotFound,
    /// Any other failure while decoding, structuring, formatting or writing.
    Conversion,
}

/// All fatal errors returned by the pdf2md-outline library.
///
/// Image-level failures use [`ImageError`] and never abort a conversion.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The configuration file could not be read or parsed.
    #[error("Failed to load config '{path}': {detail}")]
    ConfigLoad { path: PathBuf, detail: String },

    /// Builder or loaded-file validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// pdfium-render failed while reading a specific page.
    #[error("Failed to read page {page}: {detail}")]
    PageReadFailed { page: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create a directory or write an output file.
    #[error("Failed to write output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The section structure could not be serialised.
    #[error("Failed to serialise section structure: {0}")]
    Serialization(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the working directory.\n\
  • Install pdfium system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2MdError {
    /// The coarse category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Pdf2MdError::ConfigLoad { .. } | Pdf2MdError::InvalidConfig(_) => ErrorKind::ConfigLoad,
            Pdf2MdError::FileNotFound { .. }
            | Pdf2MdError::PermissionDenied { .. }
            | Pdf2MdError::NotAPdf { .. } => ErrorKind::InputNotFound,
            _ => ErrorKind::Conversion,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Pdf2MdError::OutputWriteFailed {
            path: path.into(),
            source,
        }
    }
}

/// A non-fatal error for a single embedded image.
///
/// Collected in the conversion result; the page and the document continue.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The decoder could not produce pixels for the image.
    #[error("Page {page}, image {index}: decode failed: {detail}")]
    Decode {
        page: usize,
        index: usize,
        detail: String,
    },

    /// The image could not be re-encoded in the target format.
    #[error("Page {page}, image {index}: encoding as {format} failed: {detail}")]
    Encode {
        page: usize,
        index: usize,
        format: String,
        detail: String,
    },

    /// The encoded bytes could not be written to disk.
    #[error("Failed to save image '{path}': {detail}")]
    Save { path: PathBuf, detail: String },
}
