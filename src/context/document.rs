use serde::Serialize;
use std::path::{Path, PathBuf};

/// Format family of a context file, decided by its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MimeCategory {
    Plaintext,
    Pdf,
    Docx,
    Xlsx,
    Pptx,
    Markdown,
    Code,
    Unknown,
}

const CODE_EXTENSIONS: &[&str] = &[
    "py", "js", "jsx", "ts", "tsx", "java", "c", "cpp", "cc", "h", "hpp", "cs", "rb", "php", "go",
    "rs", "swift", "kt", "scala", "sh", "bash", "zsh", "fish", "sql", "r", "lua", "pl", "json",
    "xml", "html", "htm", "css", "ini", "cfg", "conf", "yaml", "yml", "toml", "env",
];

/// Binary formats no extractor understands.
const UNSUPPORTED_EXTENSIONS: &[&str] = &[
    "doc", "ppt", "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "zip", "gz", "tgz", "tar",
    "7z", "rar", "exe", "dll", "so", "dylib", "o", "a", "class", "jar", "pyc", "wasm", "mp3",
    "mp4", "mov", "wav", "sqlite", "db",
];

impl MimeCategory {
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => MimeCategory::Pdf,
            "docx" => MimeCategory::Docx,
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => MimeCategory::Xlsx,
            "pptx" => MimeCategory::Pptx,
            "md" | "markdown" => MimeCategory::Markdown,
            e if CODE_EXTENSIONS.contains(&e) => MimeCategory::Code,
            e if UNSUPPORTED_EXTENSIONS.contains(&e) => MimeCategory::Unknown,
            _ => MimeCategory::Plaintext,
        }
    }

    /// Extensionless files (`Makefile`, `LICENSE`) are treated as plain text.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(MimeCategory::Plaintext, Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeCategory::Plaintext => "plaintext",
            MimeCategory::Pdf => "pdf",
            MimeCategory::Docx => "docx",
            MimeCategory::Xlsx => "xlsx",
            MimeCategory::Pptx => "pptx",
            MimeCategory::Markdown => "markdown",
            MimeCategory::Code => "code",
            MimeCategory::Unknown => "unknown",
        }
    }
}

/// Text pulled out of one resolved context file.
///
/// A failed extraction keeps the document with empty text and the cause in
/// `extraction_error`, so one bad file never hides its siblings.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub source_path: PathBuf,
    pub mime_category: MimeCategory,
    pub text_content: String,
    pub extraction_error: Option<String>,
}

impl ExtractedDocument {
    pub fn is_ok(&self) -> bool {
        self.extraction_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_dispatch_is_case_insensitive() {
        assert_eq!(MimeCategory::from_path(Path::new("a/REPORT.PDF")), MimeCategory::Pdf);
        assert_eq!(MimeCategory::from_path(Path::new("notes.Md")), MimeCategory::Markdown);
        assert_eq!(MimeCategory::from_path(Path::new("book.xls")), MimeCategory::Xlsx);
        assert_eq!(MimeCategory::from_path(Path::new("main.rs")), MimeCategory::Code);
        assert_eq!(MimeCategory::from_path(Path::new("setup.cfg")), MimeCategory::Code);
    }

    #[test]
    fn unmapped_extensions_default_to_plaintext() {
        assert_eq!(MimeCategory::from_path(Path::new("Makefile")), MimeCategory::Plaintext);
        assert_eq!(MimeCategory::from_path(Path::new("data.weird")), MimeCategory::Plaintext);
        assert_eq!(MimeCategory::from_path(Path::new("logo.png")), MimeCategory::Unknown);
    }
}
