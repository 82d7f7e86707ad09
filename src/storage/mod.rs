//! # Storage Backend Trait
//!
//! This is THE contract between the byline core and the persistence
//! collaborator that owns byline records, user accounts, content items
//! and the ordered byline relation of each item.
//!
//! ## Implementations
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `MemoryBackend` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use crate::model::*;
use crate::query::QueryArgs;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryBackend;

// ============================================================================
// Backend Configuration
// ============================================================================

/// Configuration for connecting to a storage backend.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    /// In-memory (no persistence); `taxonomy` names the byline relation.
    Memory { taxonomy: String },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory { taxonomy: "byline".into() }
    }
}

// ============================================================================
// StorageBackend Trait
// ============================================================================

/// The universal storage contract.
///
/// Lookups return `Ok(None)` / empty collections on a miss. Errors are
/// reserved for constraint violations and genuine storage failures.
#[async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// The transaction type for this backend.
    type Tx: Transaction;

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Shut down the backend, flushing any pending writes.
    async fn shutdown(&self) -> Result<()>;

    // ========================================================================
    // Transactions
    // ========================================================================

    async fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    async fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    async fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Byline records
    // ========================================================================

    /// Store a new byline and assign its id.
    /// Fails with `Error::DuplicateSlug` if the slug is taken; the check and
    /// the insert happen atomically.
    async fn insert_byline(&self, tx: &mut Self::Tx, new: NewByline) -> Result<BylineId>;

    /// Overwrite an existing byline record. Slug uniqueness is re-checked.
    async fn update_byline(&self, tx: &mut Self::Tx, byline: Byline) -> Result<()>;

    async fn get_byline(&self, tx: &Self::Tx, id: BylineId) -> Result<Option<Byline>>;

    async fn byline_by_slug(&self, tx: &Self::Tx, slug: &str) -> Result<Option<Byline>>;

    /// Every byline whose `linked_user_id` is `user`. The registry keeps
    /// this to at most one; storage does not.
    async fn bylines_by_user(&self, tx: &Self::Tx, user: UserId) -> Result<Vec<Byline>>;

    /// All bylines, ordered by id.
    async fn all_bylines(&self, tx: &Self::Tx) -> Result<Vec<Byline>>;

    // ========================================================================
    // Users (read-only)
    // ========================================================================

    async fn get_user(&self, tx: &Self::Tx, id: UserId) -> Result<Option<UserAccount>>;

    // ========================================================================
    // Content
    // ========================================================================

    async fn get_content(&self, tx: &Self::Tx, id: ContentId) -> Result<Option<ContentItem>>;

    /// Run a content query. Results are newest first.
    async fn query_content(&self, tx: &Self::Tx, args: &QueryArgs) -> Result<Vec<ContentItem>>;

    // ========================================================================
    // Relations
    // ========================================================================

    /// Ordered byline ids attached to a content item (empty if none).
    async fn get_relation(&self, tx: &Self::Tx, content: ContentId) -> Result<Vec<BylineId>>;

    /// Replace the whole relation of a content item in a single write.
    async fn replace_relation(
        &self,
        tx: &mut Self::Tx,
        content: ContentId,
        bylines: &[BylineId],
    ) -> Result<()>;
}
