//! In-memory storage backend.
//!
//! This is the reference implementation of `StorageBackend`.
//! It uses hash maps protected by `parking_lot::RwLock`.
//!
//! ## Limitations
//!
//! - **No real transactions**: `commit_tx()` and `rollback_tx()` are no-ops.
//!   Writes are applied immediately. Rollback does NOT undo mutations.
//! - **Per-table atomicity only**: byline records and their slug/user
//!   indexes share one lock, so slug uniqueness is checked and applied
//!   atomically. A relation replacement is a single swap under the relation
//!   lock. Nothing spans tables.
//!
//! Users and content items are owned by outside systems in production;
//! here they are seeded with `create_user` / `create_content`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::model::*;
use crate::query::{QueryArgs, TaxClause, TermField};
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::{BackendConfig, StorageBackend};

/// Most items carry a handful of bylines.
type RelationList = SmallVec<[BylineId; 4]>;

// ============================================================================
// MemoryBackend
// ============================================================================

/// In-memory byline storage.
#[derive(Clone)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    taxonomy: String,
    bylines: RwLock<BylineTable>,
    users: RwLock<HashMap<UserId, UserAccount>>,
    content: RwLock<HashMap<ContentId, ContentItem>>,
    /// content id → ordered byline ids
    relations: RwLock<HashMap<ContentId, RelationList>>,
    next_byline_id: AtomicU64,
    next_user_id: AtomicU64,
    next_content_id: AtomicU64,
    next_tx_id: AtomicU64,
}

#[derive(Default)]
struct BylineTable {
    records: HashMap<BylineId, Byline>,
    by_slug: HashMap<String, BylineId>,
    /// linked user → byline ids (poor man's user index)
    by_user: HashMap<UserId, Vec<BylineId>>,
}

impl BylineTable {
    fn index(&mut self, byline: &Byline) {
        self.by_slug.insert(byline.slug.clone(), byline.id);
        if let Some(user) = byline.linked_user_id {
            self.by_user.entry(user).or_default().push(byline.id);
        }
    }

    fn unindex(&mut self, byline: &Byline) {
        self.by_slug.remove(&byline.slug);
        if let Some(user) = byline.linked_user_id {
            if let Some(ids) = self.by_user.get_mut(&user) {
                ids.retain(|id| *id != byline.id);
                if ids.is_empty() {
                    self.by_user.remove(&user);
                }
            }
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_taxonomy("byline")
    }

    /// Backend whose relation answers taxonomy queries under `taxonomy`.
    pub fn with_taxonomy(taxonomy: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                taxonomy: taxonomy.into(),
                bylines: RwLock::new(BylineTable::default()),
                users: RwLock::new(HashMap::new()),
                content: RwLock::new(HashMap::new()),
                relations: RwLock::new(HashMap::new()),
                next_byline_id: AtomicU64::new(1),
                next_user_id: AtomicU64::new(1),
                next_content_id: AtomicU64::new(1),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        match config {
            BackendConfig::Memory { taxonomy } => Self::with_taxonomy(taxonomy.as_str()),
        }
    }

    // ========================================================================
    // Seeding (stand-ins for the external user and content stores)
    // ========================================================================

    /// Store a user account under a freshly assigned id.
    pub fn create_user(&self, mut account: UserAccount) -> UserId {
        let id = UserId(self.inner.next_user_id.fetch_add(1, Ordering::Relaxed));
        account.id = id;
        self.inner.users.write().insert(id, account);
        id
    }

    /// Remove a user account. Linked bylines are left alone.
    pub fn delete_user(&self, id: UserId) -> bool {
        self.inner.users.write().remove(&id).is_some()
    }

    pub fn create_content(&self, content_type: &str, title: &str) -> ContentId {
        self.create_content_at(content_type, title, Utc::now())
    }

    pub fn create_content_at(
        &self,
        content_type: &str,
        title: &str,
        published_at: DateTime<Utc>,
    ) -> ContentId {
        let id = ContentId(self.inner.next_content_id.fetch_add(1, Ordering::Relaxed));
        let item = ContentItem {
            id,
            content_type: content_type.to_string(),
            title: title.to_string(),
            published_at,
        };
        self.inner.content.write().insert(id, item);
        id
    }

    fn check_writable(tx: &MemoryTx) -> Result<()> {
        if tx.is_writable() {
            Ok(())
        } else {
            Err(Error::TxError(format!("transaction {} is read-only", tx.id.0)))
        }
    }

    fn clause_matches(&self, clause: &TaxClause, related: &[BylineId], table: &BylineTable) -> bool {
        if clause.taxonomy != self.inner.taxonomy {
            // Unknown taxonomies hold no terms in this backend.
            return false;
        }
        clause.terms.iter().any(|term| match clause.field {
            TermField::TermId => term
                .as_int()
                .is_some_and(|id| related.iter().any(|b| i64::try_from(b.0) == Ok(id))),
            TermField::Slug => term
                .as_str()
                .and_then(|slug| table.by_slug.get(slug))
                .is_some_and(|id| related.contains(id)),
        })
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction (a marker only, no MVCC).
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

// ============================================================================
// StorageBackend impl
// ============================================================================

#[async_trait]
impl StorageBackend for MemoryBackend {
    type Tx = MemoryTx;

    async fn shutdown(&self) -> Result<()> { Ok(()) }

    async fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode })
    }

    /// No-op: memory backend applies writes immediately, not on commit.
    async fn commit_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    /// WARNING: No-op. Mutations applied during this transaction are NOT reverted.
    async fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> { Ok(()) }

    // ========================================================================
    // Byline records
    // ========================================================================

    async fn insert_byline(&self, tx: &mut MemoryTx, new: NewByline) -> Result<BylineId> {
        Self::check_writable(tx)?;
        let mut table = self.inner.bylines.write();
        if table.by_slug.contains_key(&new.slug) {
            return Err(Error::DuplicateSlug(new.slug));
        }
        let id = BylineId(self.inner.next_byline_id.fetch_add(1, Ordering::Relaxed));
        let byline = Byline::from_new(id, new);
        table.index(&byline);
        table.records.insert(id, byline);
        Ok(id)
    }

    async fn update_byline(&self, tx: &mut MemoryTx, byline: Byline) -> Result<()> {
        Self::check_writable(tx)?;
        let mut table = self.inner.bylines.write();
        let previous = table
            .records
            .get(&byline.id)
            .cloned()
            .ok_or(Error::BylineNotFound(byline.id))?;
        if let Some(owner) = table.by_slug.get(&byline.slug) {
            if *owner != byline.id {
                return Err(Error::DuplicateSlug(byline.slug));
            }
        }
        table.unindex(&previous);
        table.index(&byline);
        table.records.insert(byline.id, byline);
        Ok(())
    }

    async fn get_byline(&self, _tx: &MemoryTx, id: BylineId) -> Result<Option<Byline>> {
        Ok(self.inner.bylines.read().records.get(&id).cloned())
    }

    async fn byline_by_slug(&self, _tx: &MemoryTx, slug: &str) -> Result<Option<Byline>> {
        let table = self.inner.bylines.read();
        Ok(table.by_slug.get(slug).and_then(|id| table.records.get(id)).cloned())
    }

    async fn bylines_by_user(&self, _tx: &MemoryTx, user: UserId) -> Result<Vec<Byline>> {
        let table = self.inner.bylines.read();
        let ids = table.by_user.get(&user).cloned().unwrap_or_default();
        Ok(ids.iter().filter_map(|id| table.records.get(id).cloned()).collect())
    }

    async fn all_bylines(&self, _tx: &MemoryTx) -> Result<Vec<Byline>> {
        let mut all: Vec<Byline> = self.inner.bylines.read().records.values().cloned().collect();
        all.sort_by_key(|b| b.id);
        Ok(all)
    }

    // ========================================================================
    // Users
    // ========================================================================

    async fn get_user(&self, _tx: &MemoryTx, id: UserId) -> Result<Option<UserAccount>> {
        Ok(self.inner.users.read().get(&id).cloned())
    }

    // ========================================================================
    // Content
    // ========================================================================

    async fn get_content(&self, _tx: &MemoryTx, id: ContentId) -> Result<Option<ContentItem>> {
        Ok(self.inner.content.read().get(&id).cloned())
    }

    async fn query_content(&self, _tx: &MemoryTx, args: &QueryArgs) -> Result<Vec<ContentItem>> {
        // Lock order: content → relations → bylines
        let content = self.inner.content.read();
        let relations = self.inner.relations.read();
        let table = self.inner.bylines.read();

        let mut items: Vec<ContentItem> = content
            .values()
            .filter(|item| {
                args.content_type.as_deref().is_none_or(|t| item.content_type == t)
            })
            .filter(|item| {
                let related = relations.get(&item.id).map(|r| r.as_slice()).unwrap_or(&[]);
                args.tax_query.iter().all(|clause| self.clause_matches(clause, related, &table))
            })
            .cloned()
            .collect();

        // Newest first; id breaks ties so equal timestamps stay deterministic.
        items.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));
        Ok(items)
    }

    // ========================================================================
    // Relations
    // ========================================================================

    async fn get_relation(&self, _tx: &MemoryTx, content: ContentId) -> Result<Vec<BylineId>> {
        Ok(self
            .inner
            .relations
            .read()
            .get(&content)
            .map(|r| r.to_vec())
            .unwrap_or_default())
    }

    async fn replace_relation(
        &self,
        tx: &mut MemoryTx,
        content: ContentId,
        bylines: &[BylineId],
    ) -> Result<()> {
        Self::check_writable(tx)?;
        if !self.inner.content.read().contains_key(&content) {
            return Err(Error::ContentNotFound(content));
        }
        let list: RelationList = bylines.iter().copied().collect();
        let mut relations = self.inner.relations.write();
        if list.is_empty() {
            relations.remove(&content);
        } else {
            relations.insert(content, list);
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    async fn write_tx(db: &MemoryBackend) -> MemoryTx {
        db.begin_tx(TxMode::ReadWrite).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get_byline() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;

        let id = db
            .insert_byline(&mut tx, NewByline::new("ada").with_display_name("Ada"))
            .await
            .unwrap();
        let byline = db.get_byline(&tx, id).await.unwrap().unwrap();

        assert_eq!(byline.slug, "ada");
        assert_eq!(byline.display_name.as_deref(), Some("Ada"));
        assert_eq!(db.byline_by_slug(&tx, "ada").await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;

        db.insert_byline(&mut tx, NewByline::new("ada")).await.unwrap();
        let result = db.insert_byline(&mut tx, NewByline::new("ada")).await;
        assert!(matches!(result, Err(Error::DuplicateSlug(s)) if s == "ada"));
        assert_eq!(db.all_bylines(&tx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_only_tx_cannot_write() {
        let db = MemoryBackend::new();
        let mut tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
        let result = db.insert_byline(&mut tx, NewByline::new("ada")).await;
        assert!(matches!(result, Err(Error::TxError(_))));
    }

    #[tokio::test]
    async fn test_update_reindexes_slug_and_user() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;

        let id = db.insert_byline(&mut tx, NewByline::new("old").linked_to(UserId(9))).await.unwrap();
        let mut byline = db.get_byline(&tx, id).await.unwrap().unwrap();
        byline.slug = "new".into();
        byline.linked_user_id = Some(UserId(10));
        db.update_byline(&mut tx, byline).await.unwrap();

        assert!(db.byline_by_slug(&tx, "old").await.unwrap().is_none());
        assert!(db.byline_by_slug(&tx, "new").await.unwrap().is_some());
        assert!(db.bylines_by_user(&tx, UserId(9)).await.unwrap().is_empty());
        assert_eq!(db.bylines_by_user(&tx, UserId(10)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_cannot_steal_slug() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;

        db.insert_byline(&mut tx, NewByline::new("a")).await.unwrap();
        let b = db.insert_byline(&mut tx, NewByline::new("b")).await.unwrap();
        let mut byline = db.get_byline(&tx, b).await.unwrap().unwrap();
        byline.slug = "a".into();

        assert!(matches!(db.update_byline(&mut tx, byline).await, Err(Error::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_replace_relation_overwrites() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;
        let post = db.create_content("post", "Hello");

        db.replace_relation(&mut tx, post, &[BylineId(1), BylineId(2)]).await.unwrap();
        db.replace_relation(&mut tx, post, &[BylineId(3)]).await.unwrap();
        assert_eq!(db.get_relation(&tx, post).await.unwrap(), vec![BylineId(3)]);

        db.replace_relation(&mut tx, post, &[]).await.unwrap();
        assert!(db.get_relation(&tx, post).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_relation_requires_content() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;
        let result = db.replace_relation(&mut tx, ContentId(404), &[BylineId(1)]).await;
        assert!(matches!(result, Err(Error::ContentNotFound(ContentId(404)))));
    }

    #[tokio::test]
    async fn test_query_content_by_type_and_relation() {
        let db = MemoryBackend::new();
        let mut tx = write_tx(&db).await;
        let t = |s| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, s).unwrap();

        let ada = db.insert_byline(&mut tx, NewByline::new("ada")).await.unwrap();
        let p1 = db.create_content_at("post", "first", t(1));
        let p2 = db.create_content_at("post", "second", t(2));
        let page = db.create_content_at("page", "about", t(3));
        db.replace_relation(&mut tx, p1, &[ada]).await.unwrap();
        db.replace_relation(&mut tx, p2, &[ada]).await.unwrap();
        db.replace_relation(&mut tx, page, &[ada]).await.unwrap();

        let posts = db
            .query_content(&tx, &QueryArgs::for_content_type("post").with_relation("byline", ada))
            .await
            .unwrap();
        let ids: Vec<_> = posts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![p2, p1]);

        let by_slug = QueryArgs {
            tax_query: vec![TaxClause::slugs("byline", ["ada"])],
            ..QueryArgs::default()
        };
        assert_eq!(db.query_content(&tx, &by_slug).await.unwrap().len(), 3);

        let other_taxonomy = QueryArgs::default().with_relation("category", ada);
        assert!(db.query_content(&tx, &other_taxonomy).await.unwrap().is_empty());

        let everywhere: Vec<_> = db
            .query_content(&tx, &QueryArgs::default().with_relation("byline", ada))
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(everywhere, vec![page, p2, p1]);
    }

    #[tokio::test]
    async fn test_delete_user_keeps_byline() {
        let db = MemoryBackend::new();
        let user = db.create_user(UserAccount::new("ada", "Ada"));
        let mut tx = write_tx(&db).await;
        let id = db.insert_byline(&mut tx, NewByline::new("ada").linked_to(user)).await.unwrap();

        assert!(db.delete_user(user));
        assert!(db.get_user(&tx, user).await.unwrap().is_none());
        let byline = db.get_byline(&tx, id).await.unwrap().unwrap();
        assert_eq!(byline.linked_user_id, Some(user));
    }
}
