//! # bylines: authorship identities for content items
//!
//! A byline is an authorship identity distinct from a user account. Content
//! items carry an ordered list of bylines, and a host graph-query engine
//! exposes them through a `byline` node type plus a `bylines` field on every
//! byline-capable content type.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `StorageBackend` is the contract with whatever persists
//!    bylines, users, content and relations
//! 2. **Clean DTOs**: `Byline`, `ContentItem`, `UserAccount` cross all boundaries
//! 3. **Replace, never merge**: saving authorship rewrites the whole relation
//! 4. **Typed hooks**: host extension points are registered trait objects,
//!    not string-keyed callbacks
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bylines::{Bylines, NewByline, UserAccount};
//!
//! # async fn example() -> bylines::Result<()> {
//! let bylines = Bylines::open_memory().await?;
//! let post = bylines.backend().create_content("post", "Hello");
//! let user = bylines.backend().create_user(UserAccount::new("foo", "Foo Bar"));
//!
//! let b1 = bylines.registry().create(NewByline::new("b1")).await?;
//! let payload = [format!("u{user}"), b1.id.to_string()];
//! let saved = bylines.save_bylines(post, &payload).await?;
//! assert_eq!(saved.len(), 2);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod config;
pub mod storage;
pub mod tx;
pub mod registry;
pub mod relation;
pub mod query;
pub mod hooks;
pub mod node;
pub mod relay;
pub mod schema;

use std::sync::Arc;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Byline, BylineId, BylineAttribute, NewByline, BylineUpdate, UserLink,
    ContentId, ContentItem, ContentType, ContentModel,
    UserAccount, UserId, AuthorshipToken, Value, PropertyMap,
};

// ============================================================================
// Re-exports: Components
// ============================================================================

pub use config::{BylinesConfig, UnresolvedTokens};
pub use storage::{StorageBackend, BackendConfig, MemoryBackend};
pub use tx::{Transaction, TxMode, TxId};
pub use registry::BylineRegistry;
pub use relation::RelationManager;
pub use query::{QueryArgs, TaxClause, TermField, BylineQueryFilter};
pub use hooks::{Hooks, QueryArgsFilter, NodeResolver, NodeTypeResolver};
pub use node::{BylineNodeResolver, BylineNodeTypeResolver};
pub use schema::{
    SchemaExtension, SchemaRegistry, HostSchema, GraphObject, FieldValue,
    ResolveContext, ResolveInfo, BYLINE_TYPE_NAME,
};

// ============================================================================
// Top-level handle
// ============================================================================

/// The primary entry point. Wires registry, relation manager and the
/// byline hooks over one storage backend.
pub struct Bylines<B: StorageBackend> {
    backend: Arc<B>,
    registry: Arc<BylineRegistry<B>>,
    relations: RelationManager<B>,
    hooks: Hooks,
    config: BylinesConfig,
}

impl<B: StorageBackend> Bylines<B> {
    /// Build over `backend`. The byline query filter and node resolvers are
    /// registered on the hook chains.
    pub fn with_backend(backend: B, config: BylinesConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(backend);
        let registry = Arc::new(BylineRegistry::new(backend.clone()));
        let relations = RelationManager::new(registry.clone(), config.clone());

        let mut hooks = Hooks::new();
        hooks
            .register_query_filter(BylineQueryFilter::new(config.taxonomy.as_str()))
            .register_node_resolver(BylineNodeResolver::new(registry.clone()))
            .register_node_type_resolver(BylineNodeTypeResolver);

        Ok(Self { backend, registry, relations, hooks, config })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &BylineRegistry<B> {
        &self.registry
    }

    pub fn relations(&self) -> &RelationManager<B> {
        &self.relations
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// For hosts that add their own callbacks to the chains.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    pub fn config(&self) -> &BylinesConfig {
        &self.config
    }

    /// Save a raw authorship payload (`"12"`, `"u7"`, ...) for a content item.
    pub async fn save_bylines<S: AsRef<str>>(&self, content: ContentId, payload: &[S]) -> Result<Vec<Byline>> {
        self.relations.save_raw(content, payload).await
    }

    pub async fn bylines_for(&self, content: ContentId) -> Result<Vec<Byline>> {
        self.relations.bylines_for(content).await
    }

    /// Schema extension for `host`, with exposure taken from the host.
    pub fn schema_extension(&self, content_model: ContentModel, host: &dyn HostSchema) -> SchemaExtension {
        SchemaExtension::for_host(content_model, host)
    }

    pub fn resolve_context(&self) -> ResolveContext<'_, B> {
        ResolveContext::new(&self.backend, &self.hooks, &self.config)
    }

    /// Resolve an opaque global id through the node-resolver chain.
    pub async fn resolve_node(&self, global_id: &str) -> Result<Option<GraphObject>> {
        self.hooks.resolve_global_id(global_id).await
    }

    pub fn resolve_node_type(&self, node: &GraphObject) -> Option<String> {
        self.hooks.resolve_node_type(node)
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.backend.shutdown().await
    }
}

/// In-memory bylines for testing and embedding.
impl Bylines<MemoryBackend> {
    pub async fn open_memory() -> Result<Self> {
        Self::open_memory_with(BylinesConfig::default()).await
    }

    pub async fn open_memory_with(config: BylinesConfig) -> Result<Self> {
        let backend = MemoryBackend::from_config(&BackendConfig::Memory {
            taxonomy: config.taxonomy.clone(),
        });
        Self::with_backend(backend, config)
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Duplicate slug: {0}")]
    DuplicateSlug(String),

    #[error("Invalid slug: {0}")]
    InvalidSlug(String),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Content not found: {0}")]
    ContentNotFound(ContentId),

    #[error("Byline not found: {0}")]
    BylineNotFound(BylineId),

    #[error("User {user} is already linked to byline {byline}")]
    UserAlreadyLinked { user: UserId, byline: BylineId },

    #[error("Unresolved authorship token: {0}")]
    UnresolvedToken(String),

    #[error("Invalid authorship token: {0:?}")]
    InvalidToken(String),

    #[error("Invalid global id: {0}")]
    InvalidGlobalId(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
