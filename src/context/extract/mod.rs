//! Per-format text extraction.
//!
//! Every format is a plain `fn(&[u8]) -> Result<String>`; [`MimeCategory::extractor`] is the
//! only place that maps a category to its reader. Adding a format means one new enum
//! variant and one new arm there.

mod office;
mod pdf;
mod sheet;
mod text;

use anyhow::{anyhow, Context, Result};
use log::debug;
use std::fs;
use std::panic;
use std::path::Path;
use std::sync::Mutex;

use crate::context::{ExtractedDocument, MimeCategory};

pub use office::{read_docx, read_pptx};
pub use pdf::read_pdf;
pub use sheet::read_spreadsheet;
pub use text::{decode_text, read_markdown};

pub type ExtractFn = fn(&[u8]) -> Result<String>;

impl MimeCategory {
    pub fn extractor(self) -> ExtractFn {
        match self {
            MimeCategory::Plaintext | MimeCategory::Code => decode_text,
            MimeCategory::Markdown => read_markdown,
            MimeCategory::Pdf => read_pdf,
            MimeCategory::Docx => read_docx,
            MimeCategory::Xlsx => read_spreadsheet,
            MimeCategory::Pptx => read_pptx,
            MimeCategory::Unknown => unsupported,
        }
    }
}

fn unsupported(_bytes: &[u8]) -> Result<String> {
    Err(anyhow!("binary format is not supported"))
}

/// Reads `path` and converts it to text according to its extension.
///
/// Never fails: read errors, parse errors and panics inside third-party parsers all end
/// up in [`ExtractedDocument::extraction_error`].
pub fn extract(path: &Path) -> ExtractedDocument {
    let mime_category = MimeCategory::from_path(path);
    debug!("Extracting {} as {}", path.display(), mime_category.as_str());

    match run_extractor(path, mime_category) {
        Ok(text_content) => ExtractedDocument {
            source_path: path.to_path_buf(),
            mime_category,
            text_content,
            extraction_error: None,
        },
        Err(e) => {
            let reason = format!("{e:#}");
            debug!("Could not extract {}: {reason}", path.display());
            ExtractedDocument {
                source_path: path.to_path_buf(),
                mime_category,
                text_content: String::new(),
                extraction_error: Some(reason),
            }
        }
    }
}

// Serializes hook swaps so concurrent extractions restore the right hook.
static PANIC_HOOK: Mutex<()> = Mutex::new(());

fn run_extractor(path: &Path, category: MimeCategory) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    guarded(category, category.extractor(), &bytes)
}

/// Runs `reader` and turns a panic into an error. The panic message goes to the debug
/// log instead of stderr; the caller reports the failure once.
fn guarded(category: MimeCategory, reader: ExtractFn, bytes: &[u8]) -> Result<String> {
    let _lock = PANIC_HOOK.lock().unwrap_or_else(|e| e.into_inner());
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|info| debug!("Parser panic: {info}")));
    let outcome = panic::catch_unwind(|| reader(bytes));
    panic::set_hook(previous);

    match outcome {
        Ok(result) => result.map(|text| text.trim().to_string()),
        Err(_) => Err(anyhow!("{} parser panicked", category.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn plaintext_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "note.txt", b"  hello world\n\n");
        let doc = extract(&path);
        assert!(doc.is_ok());
        assert_eq!(doc.mime_category, MimeCategory::Plaintext);
        assert_eq!(doc.text_content, "hello world");
    }

    #[test]
    fn corrupted_structured_files_degrade_instead_of_failing() {
        let dir = TempDir::new().unwrap();
        let garbage = b"this is definitely not a structured document";

        for name in ["broken.pdf", "broken.docx", "broken.xlsx", "broken.pptx", "broken.png"] {
            let doc = extract(&write(&dir, name, garbage));
            assert!(doc.text_content.is_empty(), "{name} produced text");
            assert!(doc.extraction_error.is_some(), "{name} has no error");
        }
    }

    fn exploding_reader(_bytes: &[u8]) -> Result<String> {
        panic!("malformed cross-reference table")
    }

    #[test]
    fn parser_panic_becomes_an_error() {
        let err = guarded(MimeCategory::Pdf, exploding_reader, b"%PDF").unwrap_err();
        assert_eq!(err.to_string(), "pdf parser panicked");
        assert_eq!(
            guarded(MimeCategory::Plaintext, decode_text, b" ok ").unwrap(),
            "ok"
        );
    }

    #[test]
    fn missing_file_is_recorded_not_raised() {
        let dir = TempDir::new().unwrap();
        let doc = extract(&dir.path().join("gone.txt"));
        assert!(!doc.is_ok());
        assert!(doc.extraction_error.unwrap().contains("Failed to read"));
    }

    #[test]
    fn sibling_files_still_extract_after_a_failure() {
        let dir = TempDir::new().unwrap();
        let bad = write(&dir, "bad.pdf", b"%PDF-garbage");
        let good = write(&dir, "good.rs", b"fn main() {}");

        let docs: Vec<_> = [bad, good].iter().map(|p| extract(p)).collect();
        assert!(!docs[0].is_ok());
        assert!(docs[1].is_ok());
        assert_eq!(docs[1].mime_category, MimeCategory::Code);
        assert_eq!(docs[1].text_content, "fn main() {}");
    }
}
