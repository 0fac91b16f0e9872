//! HOCON file resource

use async_trait::async_trait;
use hocon::{Hocon, HoconLoader};

use crate::error::{Error, Result};
use crate::manager::Manager;
use crate::resource::Resource;

use super::FileRef;

/// Resource yielding a file parsed as a HOCON configuration tree.
#[derive(Debug)]
pub struct HoconResource {
    file: FileRef,
}

impl HoconResource {
    /// Parse `file` as HOCON on acquisition.
    pub fn new(file: impl Into<FileRef>) -> Self {
        Self { file: file.into() }
    }
}

#[async_trait]
impl Resource for HoconResource {
    type Value = Hocon;

    async fn acquire(&self, _manager: &Manager) -> Result<Hocon> {
        let text = self.file.read_utf8().await?;
        HoconLoader::new()
            .load_str(&text)
            .and_then(|loader| loader.hocon())
            .map_err(|source| Error::Decode {
                path: self.file.resolved(),
                format: "hocon",
                source: source.to_string().into(),
            })
    }
}
