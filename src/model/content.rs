//! Content items and the content-type capability model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque content item identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentId(pub u64);

impl std::fmt::Display for ContentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A content item owned by the external content store. Only its byline
/// relation is ever written by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: ContentId,
    pub content_type: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
}

/// A registered content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentType {
    pub name: String,
    pub graphql_single_name: Option<String>,
    pub graphql_plural_name: Option<String>,
    /// Capability flag: content of this type carries bylines.
    pub supports_bylines: bool,
}

impl ContentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graphql_single_name: None,
            graphql_plural_name: None,
            supports_bylines: false,
        }
    }

    pub fn with_graphql_names(mut self, single: impl Into<String>, plural: impl Into<String>) -> Self {
        self.graphql_single_name = Some(single.into());
        self.graphql_plural_name = Some(plural.into());
        self
    }

    pub fn with_bylines(mut self) -> Self {
        self.supports_bylines = true;
        self
    }
}

/// The set of registered content types and their byline capability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentModel {
    types: Vec<ContentType>,
}

impl ContentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a content type.
    pub fn register(&mut self, content_type: ContentType) {
        match self.types.iter_mut().find(|t| t.name == content_type.name) {
            Some(existing) => *existing = content_type,
            None => self.types.push(content_type),
        }
    }

    pub fn with_type(mut self, content_type: ContentType) -> Self {
        self.register(content_type);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ContentType> {
        self.types.iter().find(|t| t.name == name)
    }

    /// Content types flagged for byline support, in registration order.
    pub fn byline_supported(&self) -> impl Iterator<Item = &ContentType> {
        self.types.iter().filter(|t| t.supports_bylines)
    }

    /// Flagged types that the host also exposes.
    pub fn eligible<'a>(&'a self, exposed: &'a [String]) -> impl Iterator<Item = &'a ContentType> + 'a {
        self.byline_supported().filter(move |t| exposed.iter().any(|e| *e == t.name))
    }
}
