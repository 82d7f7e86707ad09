//! Byline registry: creation, lookup and the user ⇄ byline link.
//!
//! Storage keeps a plain `linked_user_id` attribute plus a lookup index.
//! The registry is what guarantees that at most one byline is linked to a
//! given user: every path that sets a link holds that user's lock while it
//! checks and writes.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::model::*;
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::{Error, Result};

/// How many suffixed slugs `create_from_user` tries before giving up.
const MAX_SLUG_ATTEMPTS: usize = 64;

type UserLock = Arc<tokio::sync::Mutex<()>>;

pub struct BylineRegistry<B: StorageBackend> {
    backend: Arc<B>,
    user_locks: Mutex<HashMap<UserId, UserLock>>,
}

impl<B: StorageBackend> BylineRegistry<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend, user_locks: Mutex::new(HashMap::new()) }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    // ========================================================================
    // Creation
    // ========================================================================

    /// Create a byline. The slug must be non-empty and unused.
    pub async fn create(&self, new: NewByline) -> Result<Byline> {
        validate_slug(&new.slug)?;
        match new.linked_user_id {
            Some(user) => {
                let lock = self.user_lock(user);
                let result = {
                    let _guard = lock.lock().await;
                    match self.get_by_user_id(user).await {
                        Ok(Some(existing)) => Err(Error::UserAlreadyLinked { user, byline: existing.id }),
                        Ok(None) => self.insert(new).await,
                        Err(e) => Err(e),
                    }
                };
                self.release_user_lock(user, lock);
                result
            }
            None => self.insert(new).await,
        }
    }

    /// Return the byline linked to `user`, creating it from the account if
    /// there is none. Concurrent calls for one user yield one byline.
    pub async fn create_from_user(&self, user: UserId) -> Result<Byline> {
        let lock = self.user_lock(user);
        let result = {
            let _guard = lock.lock().await;
            self.create_from_user_locked(user).await
        };
        self.release_user_lock(user, lock);
        result
    }

    async fn create_from_user_locked(&self, user: UserId) -> Result<Byline> {
        if let Some(existing) = self.get_by_user_id(user).await? {
            debug!(%user, byline = %existing.id, "reusing linked byline");
            return Ok(existing);
        }

        let account = {
            let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
            let account = self.backend.get_user(&tx, user).await?;
            self.backend.commit_tx(tx).await?;
            account.ok_or(Error::UserNotFound(user))?
        };

        let base = account.slug_source().trim().to_string();
        validate_slug(&base)?;

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = if attempt == 1 { base.clone() } else { format!("{base}-{attempt}") };
            if self.get_by_slug(&slug).await?.is_some() {
                continue;
            }
            match self.insert(new_byline_from_user(&account, slug)).await {
                Ok(byline) => {
                    info!(%user, byline = %byline.id, slug = %byline.slug, "created byline from user");
                    return Ok(byline);
                }
                // Lost a race for this slug; try the next suffix.
                Err(Error::DuplicateSlug(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(Error::DuplicateSlug(base))
    }

    async fn insert(&self, new: NewByline) -> Result<Byline> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let id = match self.backend.insert_byline(&mut tx, new).await {
            Ok(id) => id,
            Err(e) => {
                self.backend.rollback_tx(tx).await?;
                return Err(e);
            }
        };
        let byline = self
            .backend
            .get_byline(&tx, id)
            .await?
            .ok_or_else(|| Error::StorageError(format!("byline {id} vanished after insert")))?;
        self.backend.commit_tx(tx).await?;
        info!(byline = %byline.id, slug = %byline.slug, "created byline");
        Ok(byline)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub async fn get_by_id(&self, id: BylineId) -> Result<Option<Byline>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let byline = self.backend.get_byline(&tx, id).await?;
        self.backend.commit_tx(tx).await?;
        Ok(byline)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Byline>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let byline = self.backend.byline_by_slug(&tx, slug).await?;
        self.backend.commit_tx(tx).await?;
        Ok(byline)
    }

    /// The byline currently linked to `user`, if any.
    pub async fn get_by_user_id(&self, user: UserId) -> Result<Option<Byline>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let linked = self.backend.bylines_by_user(&tx, user).await?;
        self.backend.commit_tx(tx).await?;
        Ok(linked.into_iter().min_by_key(|b| b.id))
    }

    pub async fn all(&self) -> Result<Vec<Byline>> {
        let tx = self.backend.begin_tx(TxMode::ReadOnly).await?;
        let all = self.backend.all_bylines(&tx).await?;
        self.backend.commit_tx(tx).await?;
        Ok(all)
    }

    // ========================================================================
    // Update
    // ========================================================================

    pub async fn update(&self, id: BylineId, update: BylineUpdate) -> Result<Byline> {
        if let Some(slug) = &update.slug {
            validate_slug(slug)?;
        }
        match update.user {
            Some(UserLink::Link(user)) => {
                let lock = self.user_lock(user);
                let result = {
                    let _guard = lock.lock().await;
                    match self.get_by_user_id(user).await {
                        Ok(Some(other)) if other.id != id => {
                            Err(Error::UserAlreadyLinked { user, byline: other.id })
                        }
                        Ok(_) => self.write_update(id, &update).await,
                        Err(e) => Err(e),
                    }
                };
                self.release_user_lock(user, lock);
                result
            }
            _ => self.write_update(id, &update).await,
        }
    }

    async fn write_update(&self, id: BylineId, update: &BylineUpdate) -> Result<Byline> {
        let mut tx = self.backend.begin_tx(TxMode::ReadWrite).await?;
        let mut byline = self
            .backend
            .get_byline(&tx, id)
            .await?
            .ok_or(Error::BylineNotFound(id))?;

        update.apply_attributes(&mut byline);
        if let Some(slug) = &update.slug {
            byline.slug = slug.clone();
        }
        match update.user {
            Some(UserLink::Link(user)) => byline.linked_user_id = Some(user),
            Some(UserLink::Unlink) => byline.linked_user_id = None,
            None => {}
        }

        if let Err(e) = self.backend.update_byline(&mut tx, byline.clone()).await {
            self.backend.rollback_tx(tx).await?;
            return Err(e);
        }
        self.backend.commit_tx(tx).await?;
        debug!(byline = %id, "updated byline");
        Ok(byline)
    }

    // ========================================================================
    // Per-user locks
    // ========================================================================

    fn user_lock(&self, user: UserId) -> UserLock {
        self.user_locks.lock().entry(user).or_default().clone()
    }

    /// Drop the map entry once nobody else holds or waits on it.
    fn release_user_lock(&self, user: UserId, lock: UserLock) {
        let mut locks = self.user_locks.lock();
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user);
        }
    }
}

fn validate_slug(slug: &str) -> Result<()> {
    if slug.trim().is_empty() {
        return Err(Error::InvalidSlug("slug must not be empty".into()));
    }
    Ok(())
}

fn new_byline_from_user(account: &UserAccount, slug: String) -> NewByline {
    let non_empty = |s: &Option<String>| s.as_ref().filter(|v| !v.is_empty()).cloned();
    NewByline {
        slug,
        display_name: Some(account.display_name.clone()).filter(|n| !n.is_empty()),
        first_name: non_empty(&account.first_name),
        last_name: non_empty(&account.last_name),
        bio: non_empty(&account.description),
        email: non_empty(&account.email),
        url: non_empty(&account.url),
        linked_user_id: Some(account.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    fn registry() -> (Arc<MemoryBackend>, BylineRegistry<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        (backend.clone(), BylineRegistry::new(backend))
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let (_, reg) = registry();
        let b = reg.create(NewByline::new("b1").with_display_name("Byline 1")).await.unwrap();

        assert_eq!(reg.get_by_id(b.id).await.unwrap(), Some(b.clone()));
        assert_eq!(reg.get_by_slug("b1").await.unwrap(), Some(b));
        assert_eq!(reg.get_by_id(BylineId(999)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_duplicate_slug() {
        let (_, reg) = registry();
        assert!(matches!(reg.create(NewByline::new("  ")).await, Err(Error::InvalidSlug(_))));

        reg.create(NewByline::new("b1")).await.unwrap();
        assert!(matches!(reg.create(NewByline::new("b1")).await, Err(Error::DuplicateSlug(_))));
    }

    #[tokio::test]
    async fn test_create_from_user_is_idempotent() {
        let (backend, reg) = registry();
        let user = backend.create_user(
            UserAccount::new("foo", "Foo Bar").with_nicename("foobar").with_email("foo@example.com"),
        );
        assert_eq!(reg.get_by_user_id(user).await.unwrap(), None);

        let first = reg.create_from_user(user).await.unwrap();
        let second = reg.create_from_user(user).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, "foobar");
        assert_eq!(first.display_name.as_deref(), Some("Foo Bar"));
        assert_eq!(first.email.as_deref(), Some("foo@example.com"));
        assert_eq!(first.linked_user_id, Some(user));
        assert_eq!(reg.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_from_user_suffixes_taken_slug() {
        let (backend, reg) = registry();
        reg.create(NewByline::new("foobar")).await.unwrap();
        let user = backend.create_user(UserAccount::new("foo", "Foo Bar").with_nicename("foobar"));

        let byline = reg.create_from_user(user).await.unwrap();
        assert_eq!(byline.slug, "foobar-2");
    }

    #[tokio::test]
    async fn test_create_from_missing_user() {
        let (_, reg) = registry();
        let result = reg.create_from_user(UserId(77)).await;
        assert!(matches!(result, Err(Error::UserNotFound(UserId(77)))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_from_user_yields_one_byline() {
        let (backend, reg) = registry();
        let reg = Arc::new(reg);
        let user = backend.create_user(UserAccount::new("race", "Race"));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let reg = reg.clone();
                tokio::spawn(async move { reg.create_from_user(user).await.unwrap().id })
            })
            .collect();

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(reg.all().await.unwrap().len(), 1);
        assert!(reg.user_locks.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_with_one_slug_has_one_winner() {
        let (_, reg) = registry();
        let reg = Arc::new(reg);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let reg = reg.clone();
                tokio::spawn(async move { reg.create(NewByline::new("x")).await })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(b) => {
                    assert_eq!(b.slug, "x");
                    created += 1;
                }
                Err(e) => assert!(matches!(e, Error::DuplicateSlug(ref s) if s == "x"), "{e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(reg.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_is_exclusive() {
        let (backend, reg) = registry();
        let user = backend.create_user(UserAccount::new("ada", "Ada"));
        let linked = reg.create_from_user(user).await.unwrap();
        let other = reg.create(NewByline::new("other")).await.unwrap();

        let steal = BylineUpdate { user: Some(UserLink::Link(user)), ..Default::default() };
        assert!(matches!(
            reg.update(other.id, steal).await,
            Err(Error::UserAlreadyLinked { byline, .. }) if byline == linked.id
        ));
        assert!(matches!(
            reg.create(NewByline::new("third").linked_to(user)).await,
            Err(Error::UserAlreadyLinked { .. })
        ));

        let unlink = BylineUpdate { user: Some(UserLink::Unlink), ..Default::default() };
        reg.update(linked.id, unlink).await.unwrap();
        let relink = BylineUpdate { user: Some(UserLink::Link(user)), ..Default::default() };
        let other = reg.update(other.id, relink).await.unwrap();
        assert_eq!(reg.get_by_user_id(user).await.unwrap().map(|b| b.id), Some(other.id));
    }

    #[tokio::test]
    async fn test_update_attributes_and_missing() {
        let (_, reg) = registry();
        let b = reg.create(NewByline::new("b1").with_bio("old")).await.unwrap();
        let updated = reg
            .update(b.id, BylineUpdate {
                slug: Some("renamed".into()),
                bio: Some(String::new()),
                url: Some("https://example.com".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.slug, "renamed");
        assert_eq!(updated.bio, None);
        assert_eq!(updated.url.as_deref(), Some("https://example.com"));

        let missing = reg.update(BylineId(999), BylineUpdate::default()).await;
        assert!(matches!(missing, Err(Error::BylineNotFound(_))));
    }
}
