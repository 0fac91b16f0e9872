//! YAML file resource (multi-document)

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::Resource;

use super::FileRef;

/// Resource yielding every document of a YAML file, in order.
///
/// Single-document files produce a one-element vector.
#[derive(Debug)]
pub struct YamlResource {
    file: FileRef,
}

impl YamlResource {
    /// Parse `file` as a YAML document stream on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for YamlResource {
    type Value = Vec<serde_yaml::Value>;

    async fn acquire(&self, _manager: &Manager) -> Result<Vec<serde_yaml::Value>> {
        let text = self.file.read_utf8().await?;
        let mut documents = Vec::new();
        for deserializer in serde_yaml::Deserializer::from_str(&text) {
            let document =
                serde_yaml::Value::deserialize(deserializer).map_err(|source| Error::Decode {
                    path: self.file.resolved(),
                    format: "yaml",
                    source: Box::new(source),
                })?;
            documents.push(document);
        }
        Ok(documents)
    }
}
