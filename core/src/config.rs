//! Client configuration.
//!
//! `ClientConfig` derives serde so hosts can load it from whatever format
//! they already use; only `base_url` is required.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PREFIX: &str = "api";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    /// Static collection list. When absent, collections are discovered
    /// through the content-type metadata endpoint at connect time.
    #[serde(default)]
    pub collections: Option<Vec<String>>,
    /// Bearer token attached to every request while set.
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            collections: None,
            token: None,
            prefix: default_prefix(),
        }
    }

    pub fn with_collections<I, S>(mut self, collections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.collections = Some(collections.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    /// Base URL without trailing slashes.
    pub(crate) fn normalized_base_url(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }

    /// Prefix without surrounding slashes; empty means no prefix segment.
    pub(crate) fn normalized_prefix(&self) -> String {
        self.prefix.trim_matches('/').to_string()
    }
}
