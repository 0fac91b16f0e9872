//! INI file resource

use async_trait::async_trait;
use ini::Ini;

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::Resource;

use super::FileRef;

/// Resource yielding a file parsed as line-oriented INI sections.
#[derive(Debug)]
pub struct IniResource {
    file: FileRef,
}

impl IniResource {
    /// Parse `file` as INI on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for IniResource {
    type Value = Ini;

    async fn acquire(&self, _manager: &Manager) -> Result<Ini> {
        let text = self.file.read_utf8().await?;
        Ini::load_from_str(&text).map_err(|source| Error::Decode {
            path: self.file.resolved(),
            format: "ini",
            source: Box::new(source),
        })
    }
}
