//! Input validation: make sure the PDF path points at something pdfium can open.
//!
//! The checks run before pdfium is even bound, so a typo in the path or a
//! stray `.md` passed by mistake produces a clear input error rather than a
//! decoder message.

use crate::error::Pdf2MdError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// Validate a local PDF path: it exists, is readable and starts with `%PDF`.
pub fn resolve_local(path: &Path) -> Result<PathBuf, Pdf2MdError> {
    let path = path.to_path_buf();

    if !path.is_file() {
        return Err(Pdf2MdError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(f) => {
            let mut magic = [0u8; 4];
            let mut head = Vec::with_capacity(4);
            f.take(4)
                .read_to_end(&mut head)
                .map_err(|_| Pdf2MdError::PermissionDenied { path: path.clone() })?;
            magic[..head.len()].copy_from_slice(&head);
            if &magic != PDF_MAGIC {
                return Err(Pdf2MdError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2MdError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2MdError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// Check the magic bytes of an in-memory PDF.
pub fn check_pdf_bytes(bytes: &[u8]) -> Result<(), Pdf2MdError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let mut magic = [0u8; 4];
    let n = bytes.len().min(4);
    magic[..n].copy_from_slice(&bytes[..n]);
    Err(Pdf2MdError::NotAPdf {
        path: PathBuf::from("<memory>"),
        magic,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn missing_file() {
        let err = resolve_local(Path::new("/no/such/file.pdf")).unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_local(dir.path()).unwrap_err();
        assert!(matches!(err, Pdf2MdError::FileNotFound { .. }));
    }

    #[test]
    fn wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, "# just markdown").unwrap();
        let err = resolve_local(&path).unwrap_err();
        match err {
            Pdf2MdError::NotAPdf { magic, .. } => assert_eq!(&magic, b"# ju"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_file_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, "%P").unwrap();
        assert!(matches!(
            resolve_local(&path),
            Err(Pdf2MdError::NotAPdf { .. })
        ));
    }

    #[test]
    fn pdf_header_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, "%PDF-1.7\n%âãÏÓ\n").unwrap();
        assert_eq!(resolve_local(&path).unwrap(), path);
    }

    #[test]
    fn byte_check() {
        assert!(check_pdf_bytes(b"%PDF-1.4").is_ok());
        assert!(matches!(
            check_pdf_bytes(b"PK\x03\x04"),
            Err(Pdf2MdError::NotAPdf { .. })
        ));
        assert!(check_pdf_bytes(b"").is_err());
    }
}
