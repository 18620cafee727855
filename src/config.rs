//! Configuration types for outline-driven PDF-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`]. It can
//! be built in code via [`ConversionConfigBuilder`] or loaded from a YAML file
//! with [`ConversionConfig::from_yaml_file`]. The YAML layout groups knobs by
//! concern:
//!
//! ```yaml
//! margins:
//!   header_margin: 50.0
//!   footer_margin: 50.0
//! chunking:
//!   max_chars: 4000
//!   overlap_chars: 200
//!   toc_level: 6
//!   keep_full_file: true
//! images:
//!   min_size: 100
//!   formats: [png, jpg, jpeg]
//!   output_dir: images
//! formatting:
//!   max_newlines: 2
//! ```
//!
//! Every section and every field is optional; anything omitted keeps its
//! default. Loaded files go through the same validation as the builder.

use crate::error::Pdf2MdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Configuration for a PDF-to-Markdown conversion.
///
/// # Example
/// ```rust
/// use pdf2md_outline::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .max_chars(2000)
///     .overlap_chars(100)
///     .toc_level(3)
///     .build()
///     .unwrap();
/// assert_eq!(config.chunking.max_chars, 2000);
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Header/footer bands excluded from extracted text.
    pub margins: MarginConfig,

    /// Chunk sizing and outline depth.
    pub chunking: ChunkingConfig,

    /// Embedded image extraction.
    pub images: ImageConfig,

    /// Text normalisation applied before chunking.
    pub formatting: FormattingConfig,

    /// PDF user password for encrypted documents.
    #[serde(skip)]
    pub password: Option<String>,

    /// Optional per-section progress callback.
    #[serde(skip)]
    pub progress_callback: Option<ProgressCallback>,
}

/// Vertical bands, in PDF points, treated as running header/footer noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarginConfig {
    /// Band measured down from the top edge of the page. Default: 50.
    pub header_margin: f32,

    /// Band measured up from the bottom edge of the page. Default: 50.
    pub footer_margin: f32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        Self {
            header_margin: 50.0,
            footer_margin: 50.0,
        }
    }
}

/// Chunk sizing and outline depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target upper bound on characters per chunk file. Default: 4000.
    ///
    /// Best-effort: a single sentence longer than this is still written
    /// whole, never truncated.
    pub max_chars: usize,

    /// Characters of the previous chunk repeated at the top of the next one.
    /// `0` disables overlap. Default: 200.
    pub overlap_chars: usize,

    /// Deepest outline level turned into a section. Default: 6.
    pub toc_level: usize,

    /// Also write every section concatenated into the output path. Default: true.
    pub keep_full_file: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            overlap_chars: 200,
            toc_level: 6,
            keep_full_file: true,
        }
    }
}

/// Embedded image extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Images whose smaller side is below this many pixels are dropped
    /// (bullets, rules, logos). Default: 100.
    pub min_size: u32,

    /// Source formats written as-is; anything else is re-encoded as PNG.
    pub formats: Vec<String>,

    /// Name of the image directory inside the output tree. Default: `images`.
    pub output_dir: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            min_size: 100,
            formats: vec!["png".into(), "jpg".into(), "jpeg".into()],
            output_dir: "images".into(),
        }
    }
}

/// Text normalisation applied before chunking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingConfig {
    /// Runs of three or more newlines collapse to this many. Default: 2.
    pub max_newlines: usize,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self { max_newlines: 2 }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("margins", &self.margins)
            .field("chunking", &self.chunking)
            .field("images", &self.images)
            .field("formatting", &self.formatting)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load and validate a configuration from a YAML file.
    ///
    /// Any read, parse or validation failure is reported as
    /// [`Pdf2MdError::ConfigLoad`] naming the file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Pdf2MdError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| Pdf2MdError::ConfigLoad {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_yaml_str(&contents).map_err(|e| Pdf2MdError::ConfigLoad {
            path: path.to_path_buf(),
            detail: match e {
                Pdf2MdError::InvalidConfig(msg) => msg,
                other => other.to_string(),
            },
        })
    }

    /// Parse and validate a configuration from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, Pdf2MdError> {
        let config: ConversionConfig = if yaml.trim().is_empty() {
            ConversionConfig::default()
        } else {
            serde_yaml::from_str(yaml).map_err(|e| Pdf2MdError::InvalidConfig(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the constraints every conversion relies on.
    pub fn validate(&self) -> Result<(), Pdf2MdError> {
        if self.chunking.max_chars == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "chunking.max_chars must be ≥ 1".into(),
            ));
        }
        if self.chunking.toc_level == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "chunking.toc_level must be ≥ 1".into(),
            ));
        }
        if self.formatting.max_newlines == 0 {
            return Err(Pdf2MdError::InvalidConfig(
                "formatting.max_newlines must be ≥ 1".into(),
            ));
        }
        let m = &self.margins;
        if !(m.header_margin >= 0.0 && m.footer_margin >= 0.0) {
            return Err(Pdf2MdError::InvalidConfig(format!(
                "margins must be non-negative, got header={} footer={}",
                m.header_margin, m.footer_margin
            )));
        }
        if self.images.output_dir.trim().is_empty() {
            return Err(Pdf2MdError::InvalidConfig(
                "images.output_dir must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl fmt::Debug for ConversionConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl ConversionConfigBuilder {
    pub fn header_margin(mut self, points: f32) -> Self {
        self.config.margins.header_margin = points;
        self
    }

    pub fn footer_margin(mut self, points: f32) -> Self {
        self.config.margins.footer_margin = points;
        self
    }

    pub fn max_chars(mut self, n: usize) -> Self {
        self.config.chunking.max_chars = n;
        self
    }

    pub fn overlap_chars(mut self, n: usize) -> Self {
        self.config.chunking.overlap_chars = n;
        self
    }

    pub fn toc_level(mut self, depth: usize) -> Self {
        self.config.chunking.toc_level = depth;
        self
    }

    pub fn keep_full_file(mut self, v: bool) -> Self {
        self.config.chunking.keep_full_file = v;
        self
    }

    pub fn min_image_size(mut self, px: u32) -> Self {
        self.config.images.min_size = px;
        self
    }

    pub fn image_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.images.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn image_dir(mut self, name: impl Into<String>) -> Self {
        self.config.images.output_dir = name.into();
        self
    }

    pub fn max_newlines(mut self, n: usize) -> Self {
        self.config.formatting.max_newlines = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2MdError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
