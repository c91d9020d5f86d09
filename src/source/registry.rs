use crate::source::{FileSource, SymphoniaFileSource};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Factory producing a fresh, unopened backend instance.
pub type FileSourceCreator = dyn Fn() -> Box<dyn FileSource> + Send + Sync;

/// A registered backend: display name, `;`-delimited extension list and factory.
#[derive(Clone)]
pub struct FileSourceInfo {
    pub name: String,
    /// Extensions handled by the backend, e.g. `"wav;flac"`
    pub extensions: String,
    creator: Arc<FileSourceCreator>,
}

impl FileSourceInfo {
    pub fn new<F>(name: impl Into<String>, extensions: impl Into<String>, creator: F) -> Self
    where
        F: Fn() -> Box<dyn FileSource> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            extensions: extensions.into(),
            creator: Arc::new(creator),
        }
    }

    /// Instantiates a new backend.
    pub fn create(&self) -> Box<dyn FileSource> {
        (self.creator)()
    }
}

impl fmt::Debug for FileSourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSourceInfo")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Maps lower-cased file extensions to the backend able to open them.
///
/// Built once from a list of backends and immutable afterwards. When two backends claim the
/// same extension, the one registered last wins.
#[derive(Debug, Clone, Default)]
pub struct ExtensionRegistry {
    backends: Vec<FileSourceInfo>,
    /// Extension to 1-based backend index; 0 is never stored and means unsupported
    extensions: HashMap<String, usize>,
}

impl ExtensionRegistry {
    pub fn new(backends: Vec<FileSourceInfo>) -> Self {
        let mut extensions = HashMap::new();

        for (index, info) in backends.iter().enumerate() {
            for token in info.extensions.split(';') {
                let Some(ext) = normalize_extension(token) else {
                    continue;
                };

                if let Some(previous) = extensions.insert(ext.clone(), index + 1) {
                    log::debug!(
                        "Extension '{}' moved from backend '{}' to '{}'",
                        ext,
                        backends[previous - 1].name,
                        info.name
                    );
                }
            }
        }

        log::debug!(
            "Extension registry built: {} backends, {} extensions",
            backends.len(),
            extensions.len()
        );

        Self {
            backends,
            extensions,
        }
    }

    /// Registry containing the built-in symphonia backend.
    pub fn with_default_backends() -> Self {
        Self::new(vec![SymphoniaFileSource::info()])
    }

    pub fn supports(&self, extension: &str) -> bool {
        self.backend_index(extension) > 0
    }

    pub fn supports_path(&self, path: &Path) -> bool {
        path_extension(path).is_some_and(|ext| self.supports(&ext))
    }

    pub fn resolve_backend(&self, extension: &str) -> Option<&FileSourceInfo> {
        match self.backend_index(extension) {
            0 => None,
            index => self.backends.get(index - 1),
        }
    }

    pub fn backends(&self) -> &[FileSourceInfo] {
        &self.backends
    }

    /// Wildcard filter over every supported extension, sorted, e.g. `"*.flac;*.wav"`.
    pub fn extension_filter(&self) -> String {
        let mut extensions: Vec<&str> = self.extensions.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        extensions
            .iter()
            .map(|ext| format!("*.{}", ext))
            .collect::<Vec<_>>()
            .join(";")
    }

    fn backend_index(&self, extension: &str) -> usize {
        normalize_extension(extension)
            .and_then(|ext| self.extensions.get(&ext).copied())
            .unwrap_or(0)
    }
}

/// Lower-cased extension of `path` without the dot.
pub(crate) fn path_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

fn normalize_extension(token: &str) -> Option<String> {
    let ext = token.trim().trim_matches('"').trim();
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}
