use log::{debug, warn};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::settings::ContextConfig;
use crate::context::MimeCategory;
use crate::error::AgentError;

/// A concrete file found for one or more context specifiers.
///
/// `path` is the path as the user will see it in the prompt; `canonical` is the
/// absolute, symlink-free form used to collapse duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: PathBuf,
    pub canonical: PathBuf,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub paths: Vec<ResolvedPath>,
    /// One `ContextNotFound` per specifier that matched nothing.
    pub warnings: Vec<AgentError>,
}

pub struct PathResolver {
    config: ContextConfig,
}

fn is_glob(specifier: &str) -> bool {
    specifier.contains(['*', '?', '['])
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

fn has_hidden_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl PathResolver {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Expands specifiers into files, first-seen order, each canonical path once.
    ///
    /// An existing file or directory is taken as is; anything else with pattern
    /// characters is expanded as a glob. Directories are walked up to `max_depth`.
    pub fn resolve<S: AsRef<str>>(&self, specifiers: &[S]) -> Resolution {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();

        for specifier in specifiers {
            let specifier = specifier.as_ref();
            let candidates = self.expand(specifier);

            if candidates.is_empty() {
                debug!("No files found for context '{specifier}'");
                resolution
                    .warnings
                    .push(AgentError::ContextNotFound(specifier.to_string()));
                continue;
            }

            for path in candidates {
                let canonical = match fs::canonicalize(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        debug!("Skipping {}: {e}", path.display());
                        continue;
                    }
                };
                if seen.insert(canonical.clone()) {
                    resolution.paths.push(ResolvedPath { path, canonical });
                } else {
                    debug!("Duplicate context file {}", path.display());
                }
            }
        }

        resolution
    }

    fn expand(&self, specifier: &str) -> Vec<PathBuf> {
        let path = Path::new(specifier);

        // Existing paths win over pattern syntax: `notes[1].txt` is a file, not a class.
        if path.is_dir() {
            self.walk_directory(path)
        } else if path.is_file() {
            vec![path.to_path_buf()]
        } else if is_glob(specifier) {
            self.expand_glob(specifier)
        } else {
            Vec::new()
        }
    }

    fn expand_glob(&self, pattern: &str) -> Vec<PathBuf> {
        let paths = match glob::glob(pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!("Invalid glob pattern '{pattern}': {e}");
                return Vec::new();
            }
        };

        let mut files = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) if path.is_file() => {
                    if self.config.include_hidden || !has_hidden_name(&path) {
                        files.push(path);
                    }
                }
                Ok(path) if path.is_dir() => files.extend(self.walk_directory(&path)),
                Ok(_) => {}
                Err(e) => debug!("Unreadable glob match: {e}"),
            }
        }
        files
    }

    fn walk_directory(&self, dir: &Path) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(dir).follow_links(true).sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        walker
            .into_iter()
            .filter_entry(|entry| include_hidden || !is_hidden(entry))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(DirEntry::into_path)
            .filter(|path| {
                let supported = MimeCategory::from_path(path) != MimeCategory::Unknown;
                if !supported && self.config.skip_unsupported {
                    debug!("Skipping unsupported file {}", path.display());
                    return false;
                }
                true
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, relative).unwrap();
        path
    }

    fn resolver() -> PathResolver {
        PathResolver::new(&ContextConfig::default())
    }

    fn as_arg(path: &Path) -> String {
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn overlapping_specifiers_yield_each_file_once() {
        let dir = TempDir::new().unwrap();
        let a = touch(dir.path(), "src/a.rs");
        touch(dir.path(), "src/b.rs");
        let pattern = format!("{}/src/*.rs", dir.path().display());

        let resolution = resolver().resolve(&[as_arg(&a), as_arg(dir.path()), pattern, as_arg(&a)]);

        assert!(resolution.warnings.is_empty());
        let names: Vec<_> = resolution
            .paths
            .iter()
            .map(|p| p.canonical.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn missing_specifier_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let present = touch(dir.path(), "present.txt");
        let missing = dir.path().join("missing.txt");
        let empty_glob = format!("{}/*.nothing", dir.path().display());

        let resolution = resolver().resolve(&[as_arg(&missing), as_arg(&present), empty_glob]);

        assert_eq!(resolution.paths.len(), 1);
        assert_eq!(resolution.paths[0].path, present);
        assert_eq!(resolution.warnings.len(), 2);
        assert!(matches!(
            resolution.warnings[0],
            AgentError::ContextNotFound(ref s) if s.ends_with("missing.txt")
        ));
    }

    #[test]
    fn hidden_and_binary_files_are_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "visible.md");
        touch(dir.path(), ".secret");
        touch(dir.path(), ".git/config");
        touch(dir.path(), "logo.png");

        let resolution = resolver().resolve(&[as_arg(dir.path())]);
        assert_eq!(resolution.paths.len(), 1);
        assert!(resolution.paths[0].path.ends_with("visible.md"));

        let config = ContextConfig {
            include_hidden: true,
            skip_unsupported: false,
            ..ContextConfig::default()
        };
        let resolution = PathResolver::new(&config).resolve(&[as_arg(dir.path())]);
        assert_eq!(resolution.paths.len(), 4);
    }

    #[test]
    fn max_depth_limits_recursion() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "top.txt");
        touch(dir.path(), "nested/deeper/inner.txt");

        let config = ContextConfig {
            max_depth: Some(1),
            ..ContextConfig::default()
        };
        let resolution = PathResolver::new(&config).resolve(&[as_arg(dir.path())]);
        assert_eq!(resolution.paths.len(), 1);
        assert!(resolution.paths[0].path.ends_with("top.txt"));
    }

    #[test]
    fn existing_file_with_pattern_characters_is_taken_literally() {
        let dir = TempDir::new().unwrap();
        let bracketed = touch(dir.path(), "notes[1].txt");
        touch(dir.path(), "notes1.txt");

        let resolution = resolver().resolve(&[as_arg(&bracketed)]);

        assert!(resolution.warnings.is_empty());
        assert_eq!(resolution.paths.len(), 1);
        assert_eq!(resolution.paths[0].path, bracketed);
    }

    #[test]
    fn empty_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let resolution = resolver().resolve(&[as_arg(dir.path())]);
        assert!(resolution.paths.is_empty());
        assert_eq!(resolution.warnings.len(), 1);
    }
}
