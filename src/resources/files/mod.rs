//! File-backed resources
//!
//! Every adapter here resolves a root-relative path to bytes and decodes
//! per format; values are plain data, so none of them has a release
//! action. The root directory defaults to the process working directory.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::Resource;

#[cfg(feature = "hocon")]
mod hocon;
#[cfg(feature = "ini")]
mod ini;
#[cfg(feature = "yaml")]
mod yaml;

#[cfg(feature = "hocon")]
pub use self::hocon::HoconResource;
#[cfg(feature = "ini")]
pub use self::ini::IniResource;
#[cfg(feature = "yaml")]
pub use self::yaml::YamlResource;

/// A root-relative file reference shared by the file adapters.
#[derive(Debug, Clone)]
pub struct FileRef {
    root: Option<PathBuf>,
    path: PathBuf,
}

impl FileRef {
    /// Reference `path`, resolved against the process working directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            root: None,
            path: path.into(),
        }
    }

    /// Resolve against `root` instead of the working directory.
    pub fn in_dir(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// The resolved filesystem path.
    #[must_use]
    pub fn resolved(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.join(&self.path),
            None => self.path.clone(),
        }
    }

    /// Read the referenced file's bytes.
    pub async fn read(&self) -> Result<Vec<u8>> {
        let path = self.resolved();
        tokio::fs::read(&path)
            .await
            .map_err(|source| Error::Io { path, source })
    }

    /// Read and decode the referenced file as UTF-8.
    pub async fn read_utf8(&self) -> Result<String> {
        let bytes = self.read().await?;
        String::from_utf8(bytes).map_err(|source| Error::Decode {
            path: self.resolved(),
            format: "utf-8",
            source: Box::new(source),
        })
    }
}

impl From<&str> for FileRef {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for FileRef {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl From<&std::path::Path> for FileRef {
    fn from(path: &std::path::Path) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

/// Resource yielding a file's raw bytes.
#[derive(Debug)]
pub struct BytesResource {
    file: FileRef,
}

impl BytesResource {
    /// Read bytes from `file` on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for BytesResource {
    type Value = Vec<u8>;

    async fn acquire(&self, _manager: &Manager) -> Result<Vec<u8>> {
        self.file.read().await
    }
}

/// Resource yielding a file parsed as a JSON document.
#[derive(Debug)]
pub struct JsonResource {
    file: FileRef,
}

impl JsonResource {
    /// Parse `file` as JSON on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for JsonResource {
    type Value = serde_json::Value;

    async fn acquire(&self, _manager: &Manager) -> Result<serde_json::Value> {
        let bytes = self.file.read().await?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
            path: self.file.resolved(),
            format: "json",
            source: Box::new(source),
        })
    }
}

/// Resource yielding the resolved path itself, verified to exist.
#[derive(Debug)]
pub struct PathResource {
    file: FileRef,
}

impl PathResource {
    /// Yield the resolved path of `file` on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for PathResource {
    type Value = PathBuf;

    async fn acquire(&self, _manager: &Manager) -> Result<PathBuf> {
        let path = self.file.resolved();
        tokio::fs::metadata(&path)
            .await
            .map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

/// Convenience: pull a named section out of a manager slot holding a JSON
/// document, for adapter config callbacks.
pub fn json_section(manager: &Manager, slot: &str, section: &str) -> Result<serde_json::Value> {
    let doc = manager.get::<serde_json::Value>(slot)?;
    doc.get(section)
        .cloned()
        .ok_or_else(|| Error::configuration(format!("missing config section '{section}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_ref_resolves_against_root() {
        let file = FileRef::new("conf/app.json").in_dir("/srv/data");
        assert_eq!(file.resolved(), PathBuf::from("/srv/data/conf/app.json"));
    }

    #[test]
    fn file_ref_without_root_keeps_path() {
        let file = FileRef::from("conf/app.json");
        assert_eq!(file.resolved(), PathBuf::from("conf/app.json"));
    }

    #[tokio::test]
    async fn read_missing_file_reports_path() {
        let file = FileRef::new("definitely-absent.bin").in_dir("/nonexistent-root");
        let err = file.read().await.unwrap_err();
        match err {
            Error::Io { path, .. } => {
                assert_eq!(path, PathBuf::from("/nonexistent-root/definitely-absent.bin"));
            }
            other => panic!("expected Io error, got: {other:?}"),
        }
    }
}
