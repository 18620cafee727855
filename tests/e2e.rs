//! End-to-end integration tests for pdf2md-outline.
//!
//! Most tests drive the full pipeline on an in-memory [`LoadedDocument`], so
//! they need neither pdfium nor a PDF on disk. The fixture tests decode
//! `./test_cases/outlined.pdf` whenever a pdfium library can be bound and
//! skip otherwise; the async conversions at the bottom are also gated behind
//! the `E2E_ENABLED` environment variable.
//!
//! Run the gated ones with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=/path/to/libpdfium.so cargo test --test e2e -- --nocapture

use image::{DynamicImage, Rgb, RgbImage};
use pdf2md_outline::pipeline::chunk::OVERLAP_MARKER;
use pdf2md_outline::pipeline::decode::load_pdf;
use pdf2md_outline::{
    convert, convert_document, convert_sync, ConversionConfig, ConversionProgressCallback,
    ErrorKind, LoadedDocument, OutlineEntry, PageContent, Pdf2MdError, ProgressCallback,
    SectionMap,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const PAGE_HEIGHT: f32 = 792.0;

/// Route library logs to the test harness; `RUST_LOG` overrides the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP — test file not found: {}", p.display());
            return;
        }
        p
    }};
}

/// A page with a running header, a page number and the given body lines.
fn page(number: usize, lines: &[&str]) -> PageContent {
    let mut p = PageContent::new(PAGE_HEIGHT).with_run("ACME Annual Report", 760.0, 772.0);
    let mut y = 700.0;
    for line in lines {
        p = p.with_run(*line, y, y + 12.0);
        y -= 14.0;
    }
    p.with_run(number.to_string(), 20.0, 32.0)
}

fn figure(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([30, 90, 160])))
}

/// Six pages, two chapters, one nested subsection, three images.
fn report() -> LoadedDocument {
    let long_para = "The committee reviewed every line item. ".repeat(12);
    LoadedDocument::new(
        vec![
            OutlineEntry::new(1, "Overview", 1),
            OutlineEntry::new(2, "Scope", 2),
            OutlineEntry::new(2, "Method/Approach", 3),
            OutlineEntry::new(3, "Sampling", 4),
            OutlineEntry::new(1, "Results", 5),
        ],
        vec![
            page(1, &["Welcome to the report."]),
            page(2, &["Scope covers fiscal 2025."]).with_image(figure(300, 200), "png"),
            page(3, &["We used a mixed approach."])
                .with_image(figure(40, 40), "png")
                .with_image(figure(160, 160), "jpg"),
            page(4, &[long_para.trim_end()]),
            page(5, &["Revenue grew."]).with_broken_image("unsupported colour space"),
            page(6, &["Costs fell."]).with_image(figure(200, 120), "jpg"),
        ],
    )
}

fn read(path: impl AsRef<Path>) -> String {
    std::fs::read_to_string(path.as_ref())
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.as_ref().display()))
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── In-memory pipeline ───────────────────────────────────────────────────────

#[test]
fn report_produces_sectioned_tree() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("report.md");
    let config = ConversionConfig::builder()
        .max_chars(300)
        .overlap_chars(40)
        .build()
        .unwrap();

    let stats = convert_document(report(), &out, &config).unwrap();
    let base = tmp.path().join("report");

    assert_eq!(stats.total_pages, 6);
    assert_eq!(stats.sections, 5);
    assert_eq!(stats.images_saved, 3);
    assert_eq!(stats.images_skipped, 1);
    assert_eq!(stats.image_errors.len(), 1);
    assert!(stats.duplicate_sections.is_empty());

    assert_eq!(
        file_names(&base),
        vec!["1_overview", "2_results", "images", "structure.yaml"]
    );
    assert_eq!(
        file_names(&base.join("images")),
        vec!["image_p2_1.png", "image_p3_2.jpg", "image_p6_1.jpg"]
    );

    let chapter_one = file_names(&base.join("1_overview"));
    assert!(chapter_one.contains(&"1_0_overview_01.md".to_string()));
    assert!(chapter_one.contains(&"1_01_scope_01.md".to_string()));
    assert!(chapter_one.contains(&"1_02_method_approach_01.md".to_string()));
    assert!(chapter_one.contains(&"1_02_01_sampling_01.md".to_string()));
    assert!(
        chapter_one.contains(&"1_02_01_sampling_02.md".to_string()),
        "long subsection should be split: {chapter_one:?}"
    );
}

#[test]
fn chunks_carry_headers_images_and_overlap() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("report.md");
    let config = ConversionConfig::builder()
        .max_chars(300)
        .overlap_chars(40)
        .build()
        .unwrap();
    convert_document(report(), &out, &config).unwrap();
    let chapter_one = tmp.path().join("report/1_overview");

    let scope = read(chapter_one.join("1_01_scope_01.md"));
    assert_eq!(
        scope,
        "## 1.1 Scope\n\n\n![Figure](../images/image_p2_1.png)\nScope covers fiscal 2025."
    );

    let method = read(chapter_one.join("1_02_method_approach_01.md"));
    assert!(method.starts_with("## 1.2 Method/Approach\n\n"));
    assert!(method.contains("![Figure](../images/image_p3_2.jpg)"));
    assert!(!method.contains("ACME Annual Report"), "running header leaked");

    // The heading paragraph is flushed on its own before the oversized body
    // paragraph is broken at sentence ends.
    let first = read(chapter_one.join("1_02_01_sampling_01.md"));
    let second = read(chapter_one.join("1_02_01_sampling_02.md"));
    let third = read(chapter_one.join("1_02_01_sampling_03.md"));
    assert_eq!(first, "### 1.2.1 Sampling");
    assert!(second.starts_with(&format!("### 1.2.1 Sampling{OVERLAP_MARKER}The committee")));

    let (tail, body) = third.split_once(OVERLAP_MARKER).unwrap();
    assert_eq!(tail.chars().count(), 40);
    assert!(second.ends_with(tail));
    assert!(body.starts_with("The committee"));
    assert!(body.chars().count() <= 300);
}

#[test]
fn structure_yaml_matches_outline() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("report.md");
    convert_document(report(), &out, &ConversionConfig::default()).unwrap();

    let yaml = read(tmp.path().join("report/structure.yaml"));
    let sections: SectionMap = serde_yaml::from_str(&yaml).unwrap();
    let ids: Vec<&str> = sections.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "1.1", "1.2", "1.2.1", "2"]);
    assert_eq!(
        sections["1.2.1"].full_path,
        vec!["Overview", "Method/Approach", "Sampling"]
    );
}

#[test]
fn full_file_joins_sections_in_page_order() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("report.md");
    convert_document(report(), &out, &ConversionConfig::default()).unwrap();

    let full = read(&out);
    let headings: Vec<&str> = full.lines().filter(|l| l.starts_with('#')).collect();
    assert_eq!(
        headings,
        vec![
            "# 1 Overview",
            "## 1.1 Scope",
            "## 1.2 Method/Approach",
            "### 1.2.1 Sampling",
            "# 2 Results",
        ]
    );
    assert!(full.contains("Revenue grew.\n\nCosts fell."));
}

#[test]
fn shallow_toc_level_drops_deep_sections() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("report.md");
    let config = ConversionConfig::builder().toc_level(1).build().unwrap();
    let stats = convert_document(report(), &out, &config).unwrap();

    assert_eq!(stats.sections, 2);
    let full = read(&out);
    assert!(full.starts_with("# 1 Overview\n\n"));
    // Chapter 1 now spans pages 1-4, so its text includes the subsection pages.
    assert!(full.contains("We used a mixed approach."));
}

#[test]
fn flat_document_is_chunked_whole() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("memo.md");
    let doc = LoadedDocument::new(
        vec![],
        vec![
            page(1, &["First page."]).with_image(figure(200, 200), "png"),
            page(2, &["Second page."]),
        ],
    );
    let stats = convert_document(doc, &out, &ConversionConfig::default()).unwrap();

    assert_eq!(stats.sections, 0);
    assert_eq!(stats.chunks_written, 1);
    let chunk = read(tmp.path().join("memo/chunk_001.md"));
    assert_eq!(
        chunk,
        "\n![Figure](images/image_p1_1.png)\n\nFirst page.\n\nSecond page."
    );
    assert_eq!(read(&out), chunk);
}

#[test]
fn config_file_drives_conversion() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let cfg_path = tmp.path().join("config.yaml");
    std::fs::write(
        &cfg_path,
        "chunking:\n  keep_full_file: false\nimages:\n  output_dir: figures\n  min_size: 10\n",
    )
    .unwrap();
    let config = ConversionConfig::from_yaml_file(&cfg_path).unwrap();

    let out = tmp.path().join("report.md");
    let stats = convert_document(report(), &out, &config).unwrap();

    assert!(!out.exists());
    assert_eq!(stats.images_saved, 4);
    assert!(tmp.path().join("report/figures/image_p3_1.png").is_file());
    let scope = read(tmp.path().join("report/1_overview/1_01_scope_01.md"));
    assert!(scope.contains("![Figure](../figures/image_p2_1.png)"));
}

#[test]
fn duplicate_ids_are_reported() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("odd.md");
    let doc = LoadedDocument::new(
        vec![
            OutlineEntry::new(1, "Part", 1),
            OutlineEntry::new(3, "Orphan", 1),
            OutlineEntry::new(2, "Chapter", 2),
        ],
        vec![page(1, &["Part text."]), page(2, &["Chapter text."])],
    );
    let stats = convert_document(doc, &out, &ConversionConfig::default()).unwrap();

    assert_eq!(stats.sections, 2);
    assert_eq!(stats.duplicate_sections.len(), 1);
    assert_eq!(stats.duplicate_sections[0].id, "1.1");
    assert_eq!(stats.duplicate_sections[0].previous_title, "Orphan");
    assert!(tmp.path().join("odd/1_part/1_01_chapter_01.md").is_file());
}

// ── Progress callbacks ───────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    sections: AtomicUsize,
    chunks: AtomicUsize,
    image_errors: Mutex<Vec<(usize, String)>>,
    finished: AtomicUsize,
}

impl ConversionProgressCallback for Counting {
    fn on_section_complete(&self, _index: usize, _total: usize, chunk_count: usize) {
        self.sections.fetch_add(1, Ordering::SeqCst);
        self.chunks.fetch_add(chunk_count, Ordering::SeqCst);
    }

    fn on_image_error(&self, page: usize, error: &str) {
        self.image_errors
            .lock()
            .unwrap()
            .push((page, error.to_string()));
    }

    fn on_conversion_complete(&self, _total_sections: usize, total_chunks: usize) {
        self.finished.store(total_chunks, Ordering::SeqCst);
    }
}

#[test]
fn progress_callback_sees_every_section() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let counting = Arc::new(Counting::default());
    let config = ConversionConfig::builder()
        .max_chars(300)
        .progress_callback(counting.clone() as ProgressCallback)
        .build()
        .unwrap();

    let stats = convert_document(report(), tmp.path().join("r.md"), &config).unwrap();

    assert_eq!(counting.sections.load(Ordering::SeqCst), 5);
    assert_eq!(counting.chunks.load(Ordering::SeqCst), stats.chunks_written);
    assert_eq!(counting.finished.load(Ordering::SeqCst), stats.chunks_written);
    let errors = counting.image_errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].0, 5);
    assert!(errors[0].1.contains("unsupported colour space"));
}

#[test]
fn stats_serialise_to_json() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let stats =
        convert_document(report(), tmp.path().join("r.md"), &ConversionConfig::default())
            .unwrap();
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["sections"], 5);
    assert_eq!(json["image_errors"].as_array().map(Vec::len), Some(1));
}

// ── Error paths (no pdfium needed) ───────────────────────────────────────────

#[tokio::test]
async fn missing_pdf_is_input_error() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let err = convert(
        tmp.path().join("nope.pdf"),
        tmp.path().join("out.md"),
        &ConversionConfig::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
}

#[tokio::test]
async fn non_pdf_input_is_input_error() {
    init_tracing();
    let tmp = tempfile::tempdir().unwrap();
    let fake = tmp.path().join("fake.pdf");
    std::fs::write(&fake, "<html></html>").unwrap();
    let err = convert(&fake, tmp.path().join("out.md"), &ConversionConfig::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputNotFound);
    assert!(err.to_string().contains("not a valid PDF"));
}

// ── Fixture PDF (needs pdfium) ───────────────────────────────────────────────

fn fixture() -> PathBuf {
    test_cases_dir().join("outlined.pdf")
}

/// Decoding and converting share one test so pdfium is bound one at a time.
#[test]
fn fixture_pdf_decodes_and_converts() {
    init_tracing();
    let doc = match load_pdf(&fixture(), None) {
        Ok(doc) => doc,
        Err(Pdf2MdError::PdfiumBindingFailed(e)) => {
            println!("SKIP — pdfium library not available: {e}");
            return;
        }
        Err(e) => panic!("fixture failed to load: {e}"),
    };

    assert_eq!(doc.page_count(), 3);
    let outline: Vec<(usize, &str, usize)> = doc
        .outline
        .iter()
        .map(|e| (e.level, e.title.as_str(), e.page))
        .collect();
    // "Results" has no /Dest, only a GoTo action.
    assert_eq!(
        outline,
        vec![(1, "Introduction", 1), (2, "Background", 2), (1, "Results", 3)]
    );
    assert!(doc.pages[1]
        .runs
        .iter()
        .any(|r| r.text.contains("Background text.")));
    assert!(doc.pages[0].images.is_empty());
    assert_eq!(doc.pages[1].images.len(), 1);
    let image = doc.pages[1].images[0]
        .as_ref()
        .expect("fixture image should decode");
    assert_eq!((image.image.width(), image.image.height()), (120, 120));
    assert_eq!(image.source_ext, "png");
    drop(doc);

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("outlined.md");
    let stats = convert_sync(fixture(), &out, &ConversionConfig::default()).unwrap();

    assert_eq!(stats.total_pages, 3);
    assert_eq!(stats.sections, 3);
    assert_eq!(stats.images_saved, 1);
    assert!(stats.image_errors.is_empty());
    assert!(tmp.path().join("outlined/images/image_p2_1.png").is_file());

    let background = read(tmp.path().join("outlined/1_introduction/1_01_background_01.md"));
    assert!(background.starts_with("## 1.1 Background\n\n"));
    assert!(background.contains("![Figure](../images/image_p2_1.png)"));
    assert!(background.contains("Background text."));
    assert!(tmp
        .path()
        .join("outlined/2_results/2_0_results_01.md")
        .is_file());
    assert!(!read(&out).contains("Fixture Report"), "running header leaked");
}

// ── Real PDFs (E2E_ENABLED) ──────────────────────────────────────────────────

#[tokio::test]
async fn test_convert_outlined_pdf() {
    init_tracing();
    let path = e2e_skip_unless_ready!(test_cases_dir().join("outlined.pdf"));
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("outlined.md");

    let stats = convert(&path, &out, &ConversionConfig::default())
        .await
        .expect("convert() should succeed");

    assert!(stats.total_pages > 0);
    assert!(stats.sections > 0, "fixture should have bookmarks");
    assert!(stats.chunks_written >= stats.sections);
    assert!(tmp.path().join("outlined/structure.yaml").is_file());

    let full = read(&out);
    assert!(full.lines().any(|l| l.starts_with("# 1 ")));
    println!("{}", serde_json::to_string_pretty(&stats).unwrap());
}

#[tokio::test]
async fn test_convert_from_bytes_matches_file() {
    init_tracing();
    let path = e2e_skip_unless_ready!(test_cases_dir().join("outlined.pdf"));
    let tmp = tempfile::tempdir().unwrap();
    let config = ConversionConfig::default();

    let from_file = convert(&path, tmp.path().join("a.md"), &config).await.unwrap();
    let bytes = std::fs::read(&path).unwrap();
    let from_bytes = pdf2md_outline::convert_from_bytes(bytes, tmp.path().join("b.md"), &config)
        .await
        .unwrap();

    assert_eq!(from_file.sections, from_bytes.sections);
    assert_eq!(from_file.chunks_written, from_bytes.chunks_written);
    assert_eq!(read(tmp.path().join("a.md")), read(tmp.path().join("b.md")));
}
