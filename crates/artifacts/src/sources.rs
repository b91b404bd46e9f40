use auditless_solc_core::error::{SolcError, SolcIoError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::BTreeMap, fs, path::Path};

/// An ordered list of source unit names and their source
pub type Sources = BTreeMap<String, Source>;

/// A single entry of the `sources` object of the standard JSON input.
///
/// Either `content` is set, or `urls` points at the file(s) solc should read.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Source {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keccak256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Keys this crate doesn't model, e.g. `ast` or `license`.
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Source {
    /// Creates a new instance of [Source] with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: Some(content.into()), ..Default::default() }
    }

    /// Creates a source that is resolved through the given urls.
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { urls: Some(urls.into_iter().map(Into::into).collect()), ..Default::default() }
    }

    /// Reads the file's content as is, line endings included, so it hashes the same as the
    /// file on disk.
    #[instrument(level = "debug", skip_all, err)]
    pub fn read(file: impl AsRef<Path>) -> Result<Self, SolcIoError> {
        let file = file.as_ref();
        trace!(file=%file.display());
        let content = fs::read_to_string(file).map_err(|err| SolcIoError::new(err, file))?;
        Ok(Self::new(content))
    }

    /// Returns the url solc would read this source from, the last one listed.
    pub fn url(&self) -> Option<&str> {
        self.urls.as_ref()?.last().map(String::as_str)
    }

    /// Returns `true` if this source must be fetched by the compiler rather than being inlined.
    pub fn is_url(&self) -> bool {
        self.content.is_none() && self.url().is_some()
    }

    /// Returns the source with its url replaced by the content of the file it points at.
    ///
    /// Swarm and IPFS urls can't be read from disk and are rejected.
    pub fn resolved(&self) -> Result<Self, SolcError> {
        let Some(url) = self.url().filter(|_| self.content.is_none()) else {
            return Ok(self.clone());
        };
        if url.contains("ipfs://") || url.contains("bzzr:") {
            return Err(SolcError::RemoteSource(url.to_string()));
        }
        Ok(Self::read(url)?)
    }
}

impl AsRef<str> for Source {
    fn as_ref(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }
}
