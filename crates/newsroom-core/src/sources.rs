//! Document sources for the "uploaded documents" mode.
//!
//! Both sources ignore the topic: the documents are fixed up front.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::traits::DocumentSource;
use crate::types::SourceDocument;

#[cfg(feature = "pdf")]
const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "pdf"];
#[cfg(not(feature = "pdf"))]
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

/// Reads plain-text and PDF files, given directly or found under directories.
///
/// Directories are walked recursively and only `.txt`/`.md`/`.pdf` files are
/// taken; files named explicitly are always read. Output order is the order of
/// `paths`, with each directory's files sorted by path. A file reached twice
/// (e.g. a directory plus a file inside it) is read once.
#[derive(Debug, Clone, Default)]
pub struct FileSystemSource {
    paths: Vec<PathBuf>,
}

impl FileSystemSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self { paths: paths.into_iter().map(Into::into).collect() }
    }

    pub fn load(&self) -> Result<Vec<SourceDocument>> {
        let mut files = Vec::new();
        for path in &self.paths {
            if path.is_dir() {
                let found = list_text_files(path);
                if found.is_empty() { warn!("No {} files found under {}", TEXT_EXTENSIONS.join("/"), path.display()); }
                files.extend(found);
            } else if path.is_file() {
                files.push(path.clone());
            } else {
                return Err(Error::NotFound(path.display().to_string()));
            }
        }

        let mut seen = HashSet::new();
        let mut docs = Vec::with_capacity(files.len());
        for file in files {
            let key = fs::canonicalize(&file).unwrap_or_else(|_| file.clone());
            if !seen.insert(key) {
                warn!(path = %file.display(), "file listed more than once, skipping duplicate");
                continue;
            }
            docs.push(read_document(&file)?);
        }
        info!(documents = docs.len(), "loaded documents from disk");
        Ok(docs)
    }
}

impl DocumentSource for FileSystemSource {
    fn documents(&self, _topic: &str) -> Result<Vec<SourceDocument>> { self.load() }
}

/// Documents already held in memory, e.g. text extracted by a caller.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    docs: Vec<SourceDocument>,
}

impl StaticSource {
    pub fn new(docs: Vec<SourceDocument>) -> Self { Self { docs } }
}

impl DocumentSource for StaticSource {
    fn documents(&self, _topic: &str) -> Result<Vec<SourceDocument>> { Ok(self.docs.clone()) }
}

fn read_document(path: &Path) -> Result<SourceDocument> {
    if is_pdf(path) {
        return Ok(SourceDocument::new(path.display().to_string(), read_pdf(path)?));
    }
    let text = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
    };
    Ok(SourceDocument::new(path.display().to_string(), text))
}

fn list_text_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|s| s.to_str()).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext)))
        .collect();
    files.sort();
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension().and_then(|s| s.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> Result<String> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| Error::Extraction(format!("{}: {}", path.display(), e)))?;
    if text.trim().is_empty() {
        warn!(path = %path.display(), "PDF has no extractable text");
    }
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn read_pdf(path: &Path) -> Result<String> {
    Err(Error::Extraction(format!("{}: PDF input needs the `pdf` feature", path.display())))
}
