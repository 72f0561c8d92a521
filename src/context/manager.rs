use log::{debug, info};

use crate::config::settings::ContextConfig;
use crate::context::extract;
use crate::context::{ExtractedDocument, PathResolver};
use crate::error::AgentError;

/// Everything gathered for a prompt: documents in resolution order plus the non-fatal
/// problems met on the way.
#[derive(Debug, Default)]
pub struct ContextData {
    pub documents: Vec<ExtractedDocument>,
    pub warnings: Vec<AgentError>,
}

impl ContextData {
    pub fn extracted(&self) -> impl Iterator<Item = &ExtractedDocument> {
        self.documents.iter().filter(|d| d.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExtractedDocument> {
        self.documents.iter().filter(|d| !d.is_ok())
    }
}

pub struct ContextManager {
    resolver: PathResolver,
}

impl ContextManager {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            resolver: PathResolver::new(config),
        }
    }

    /// Resolves the specifiers and extracts every file, one at a time.
    pub fn gather<S: AsRef<str>>(&self, specifiers: &[S]) -> ContextData {
        let resolution = self.resolver.resolve(specifiers);
        debug!("Resolved {} context files", resolution.paths.len());

        let mut warnings = resolution.warnings;
        let documents: Vec<ExtractedDocument> = resolution
            .paths
            .iter()
            .map(|resolved| extract::extract(&resolved.path))
            .collect();

        for document in documents.iter().filter(|d| !d.is_ok()) {
            warnings.push(AgentError::ExtractionFailed {
                path: document.source_path.clone(),
                reason: document.extraction_error.clone().unwrap_or_default(),
            });
        }

        info!(
            "Loaded {} context documents ({} failed)",
            documents.len(),
            documents.iter().filter(|d| !d.is_ok()).count()
        );

        ContextData {
            documents,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn corrupted_pdf_beside_valid_text() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), "hello world").unwrap();
        fs::write(dir.path().join("report.pdf"), "not really a pdf").unwrap();

        let manager = ContextManager::new(&ContextConfig::default());
        let data = manager.gather(&[dir.path().to_str().unwrap()]);

        assert_eq!(data.documents.len(), 2);
        let ok: Vec<_> = data.extracted().collect();
        let failed: Vec<_> = data.failed().collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].text_content, "hello world");
        assert_eq!(failed.len(), 1);
        assert!(failed[0].source_path.ends_with("report.pdf"));
        assert!(matches!(
            data.warnings.as_slice(),
            [AgentError::ExtractionFailed { .. }]
        ));
    }

    #[test]
    fn not_found_and_extraction_warnings_are_both_collected() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("deck.pptx");
        fs::write(&broken, [0u8, 1, 2, 3]).unwrap();
        let missing = dir.path().join("nope");

        let manager = ContextManager::new(&ContextConfig::default());
        let data = manager.gather(&[broken.to_str().unwrap(), missing.to_str().unwrap()]);

        assert_eq!(data.documents.len(), 1);
        assert_eq!(data.warnings.len(), 2);
        assert!(matches!(data.warnings[0], AgentError::ContextNotFound(_)));
        assert!(matches!(data.warnings[1], AgentError::ExtractionFailed { .. }));
    }
}
