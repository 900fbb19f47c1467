//! File-context resolution
//!
//! Materializes `@`-mentions into `(path, content | error)` records. The
//! output sequence is a pure function of the filesystem snapshot and the
//! resolver configuration.

use crate::types::FileContext;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::fs;
use std::path::Path;

/// Default per-file size ceiling (256 KiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024;

/// Resolves mention paths into file-context records.
#[derive(Debug, Clone)]
pub struct FileContextResolver {
    max_file_size: u64,
}

impl FileContextResolver {
    pub fn new() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    /// Resolve each mention to one or more records.
    ///
    /// Files yield exactly one record (content or error). Directories yield
    /// one record per eligible text file in lexicographic path order, with
    /// `.gitignore` patterns from within the directory applied; a directory
    /// with no eligible files yields an informational error record.
    pub fn resolve(&self, mentions: &[String]) -> Vec<FileContext> {
        let mut results = Vec::new();
        for mention in mentions {
            let path = Path::new(mention);
            match fs::metadata(path) {
                Err(_) => results.push(FileContext::error(mention.clone(), "not found")),
                Ok(meta) if meta.is_dir() => {
                    self.resolve_directory(mention, path, &mut results);
                }
                Ok(meta) => {
                    results.push(self.resolve_file(mention.clone(), path, meta.len()));
                }
            }
        }
        results
    }

    fn resolve_file(&self, mention: String, path: &Path, size: u64) -> FileContext {
        if size > self.max_file_size {
            return FileContext::error(
                mention,
                format!(
                    "exceeds limit ({} bytes, limit {})",
                    size, self.max_file_size
                ),
            );
        }
        match fs::read(path) {
            Err(_) => FileContext::error(mention, "not found"),
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(content) => FileContext::content(mention, content),
                Err(_) => FileContext::error(mention, "binary or non-UTF-8 content"),
            },
        }
    }

    fn resolve_directory(&self, mention: &str, dir: &Path, results: &mut Vec<FileContext>) {
        let Ok(entries) = fs::read_dir(dir) else {
            results.push(FileContext::error(mention.to_string(), "not found"));
            return;
        };

        let gitignore = load_gitignore(dir);

        let mut candidates: Vec<std::path::PathBuf> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        // Byte-wise lexicographic order keeps the listing stable across
        // platforms and filesystem case conventions.
        candidates.sort();

        let mut emitted = 0usize;
        for candidate in candidates {
            if let Some(gi) = &gitignore {
                if gi.matched(&candidate, false).is_ignore() {
                    continue;
                }
            }
            let Ok(meta) = fs::metadata(&candidate) else {
                continue;
            };
            if meta.len() > self.max_file_size {
                continue;
            }
            let Ok(bytes) = fs::read(&candidate) else {
                continue;
            };
            let Ok(content) = String::from_utf8(bytes) else {
                continue;
            };
            results.push(FileContext::content(
                candidate.to_string_lossy().into_owned(),
                content,
            ));
            emitted += 1;
        }

        if emitted == 0 {
            results.push(FileContext::error(mention.to_string(), "empty directory"));
        }
    }
}

impl Default for FileContextResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn load_gitignore(dir: &Path) -> Option<Gitignore> {
    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        return None;
    }
    let mut builder = GitignoreBuilder::new(dir);
    if let Some(err) = builder.add(&gitignore_path) {
        tracing::warn!("ignoring unreadable {}: {}", gitignore_path.display(), err);
        return None;
    }
    match builder.build() {
        Ok(gi) => Some(gi),
        Err(err) => {
            tracing::warn!("invalid gitignore in {}: {}", dir.display(), err);
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn mentions(paths: &[String]) -> Vec<String> {
        paths.to_vec()
    }

    #[test]
    fn test_resolve_file_content() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("note.txt");
        fs::write(&file, "hello").unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[file.to_string_lossy().into_owned()]));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_content(), Some("hello"));
    }

    #[test]
    fn test_missing_path() {
        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&["/definitely/not/here.txt".to_string()]));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_error(), Some("not found"));
    }

    #[test]
    fn test_binary_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("blob.bin");
        fs::write(&file, [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[file.to_string_lossy().into_owned()]));

        assert_eq!(results[0].as_error(), Some("binary or non-UTF-8 content"));
    }

    #[test]
    fn test_oversize_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("big.txt");
        fs::write(&file, "0123456789").unwrap();

        let resolver = FileContextResolver::new().with_max_file_size(4);
        let results = resolver.resolve(&mentions(&[file.to_string_lossy().into_owned()]));

        let error = results[0].as_error().unwrap();
        assert!(error.contains("exceeds limit"));
        assert!(error.contains("10 bytes"));
        assert!(error.contains("limit 4"));
    }

    #[test]
    fn test_directory_lexicographic_non_recursive() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), "b").unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();
        fs::write(tmp.path().join("nested/c.txt"), "c").unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[tmp.path().to_string_lossy().into_owned()]));

        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(results.len(), 2);
        assert!(paths[0].ends_with("a.txt"));
        assert!(paths[1].ends_with("b.txt"));
    }

    #[test]
    fn test_directory_applies_gitignore() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".gitignore"), "*.log\n").unwrap();
        fs::write(tmp.path().join("keep.txt"), "keep").unwrap();
        fs::write(tmp.path().join("skip.log"), "skip").unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[tmp.path().to_string_lossy().into_owned()]));

        let paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        assert!(paths.iter().any(|p| p.ends_with("keep.txt")));
        assert!(!paths.iter().any(|p| p.ends_with("skip.log")));
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[tmp.path().to_string_lossy().into_owned()]));

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].as_error(), Some("empty directory"));
    }

    #[test]
    fn test_multiple_mentions_keep_order() {
        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join("first.txt");
        let second = tmp.path().join("second.txt");
        fs::write(&first, "1").unwrap();
        fs::write(&second, "2").unwrap();

        let resolver = FileContextResolver::new();
        let results = resolver.resolve(&mentions(&[
            second.to_string_lossy().into_owned(),
            first.to_string_lossy().into_owned(),
        ]));

        assert!(results[0].path.ends_with("second.txt"));
        assert!(results[1].path.ends_with("first.txt"));
    }
}
