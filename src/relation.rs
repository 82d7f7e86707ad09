//! Relation manager: turns a save payload into the ordered byline relation
//! of a content item.
//!
//! A save always replaces the whole relation. Tokens resolve in payload
//! order and duplicates are kept as given. What happens to a token that
//! does not resolve is decided by `BylinesConfig::unresolved_tokens`.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{BylinesConfig, UnresolvedTokens};
use crate::model::*;
use crate::registry::BylineRegistry;
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::{Error, Result};

pub struct RelationManager<B: StorageBackend> {
    registry: Arc<BylineRegistry<B>>,
    config: BylinesConfig,
}

impl<B: StorageBackend> RelationManager<B> {
    pub fn new(registry: Arc<BylineRegistry<B>>, config: BylinesConfig) -> Self {
        Self { registry, config }
    }

    /// Parse a raw payload (`"12"`, `"u7"`, ...) and save it.
    pub async fn save_raw<S: AsRef<str>>(&self, content: ContentId, payload: &[S]) -> Result<Vec<Byline>> {
        let mut tokens = Vec::with_capacity(payload.len());
        for raw in payload {
            let raw = raw.as_ref();
            match AuthorshipToken::parse(raw, &self.config.user_token_prefix) {
                Some(token) => tokens.push(token),
                None => match self.config.unresolved_tokens {
                    UnresolvedTokens::Skip => {
                        warn!(%content, token = raw, "dropping malformed authorship token");
                    }
                    UnresolvedTokens::Reject => return Err(Error::InvalidToken(raw.to_string())),
                },
            }
        }
        self.save(content, &tokens).await
    }

    /// Resolve `tokens` in order and make them the item's entire relation.
    pub async fn save(&self, content: ContentId, tokens: &[AuthorshipToken]) -> Result<Vec<Byline>> {
        let backend = self.registry.backend();
        {
            let tx = backend.begin_tx(TxMode::ReadOnly).await?;
            let exists = backend.get_content(&tx, content).await?.is_some();
            backend.commit_tx(tx).await?;
            if !exists {
                return Err(Error::ContentNotFound(content));
            }
        }

        if self.config.unresolved_tokens == UnresolvedTokens::Reject {
            // Nothing may be created for a save that is going to fail.
            for token in tokens {
                if !self.resolvable(*token).await? {
                    return Err(Error::UnresolvedToken(token.to_string()));
                }
            }
        }

        let mut resolved = Vec::with_capacity(tokens.len());
        for token in tokens {
            match self.resolve(*token).await? {
                Some(byline) => resolved.push(byline),
                None => match self.config.unresolved_tokens {
                    UnresolvedTokens::Skip => {
                        warn!(%content, %token, "dropping unresolved authorship token");
                    }
                    UnresolvedTokens::Reject => return Err(Error::UnresolvedToken(token.to_string())),
                },
            }
        }

        let ids: Vec<BylineId> = resolved.iter().map(|b| b.id).collect();
        let mut tx = backend.begin_tx(TxMode::ReadWrite).await?;
        if let Err(e) = backend.replace_relation(&mut tx, content, &ids).await {
            backend.rollback_tx(tx).await?;
            return Err(e);
        }
        backend.commit_tx(tx).await?;

        debug!(%content, count = ids.len(), "replaced byline relation");
        Ok(resolved)
    }

    /// `Ok(None)` means the token names nothing that exists.
    async fn resolve(&self, token: AuthorshipToken) -> Result<Option<Byline>> {
        match token {
            AuthorshipToken::Byline(id) => self.registry.get_by_id(id).await,
            AuthorshipToken::User(user) => match self.registry.create_from_user(user).await {
                Ok(byline) => Ok(Some(byline)),
                Err(Error::UserNotFound(_) | Error::InvalidSlug(_) | Error::DuplicateSlug(_)) => Ok(None),
                Err(e) => Err(e),
            },
        }
    }

    /// Would `resolve` find or create a byline for `token`, without writing.
    async fn resolvable(&self, token: AuthorshipToken) -> Result<bool> {
        match token {
            AuthorshipToken::Byline(id) => Ok(self.registry.get_by_id(id).await?.is_some()),
            AuthorshipToken::User(user) => {
                if self.registry.get_by_user_id(user).await?.is_some() {
                    return Ok(true);
                }
                let backend = self.registry.backend();
                let tx = backend.begin_tx(TxMode::ReadOnly).await?;
                let account = backend.get_user(&tx, user).await?;
                backend.commit_tx(tx).await?;
                Ok(account.is_some_and(|a| !a.slug_source().trim().is_empty()))
            }
        }
    }

    /// The item's bylines in relation order. Ids whose record is gone are skipped.
    pub async fn bylines_for(&self, content: ContentId) -> Result<Vec<Byline>> {
        let backend = self.registry.backend();
        let tx = backend.begin_tx(TxMode::ReadOnly).await?;
        let ids = backend.get_relation(&tx, content).await?;
        let mut bylines = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(byline) = backend.get_byline(&tx, id).await? {
                bylines.push(byline);
            }
        }
        backend.commit_tx(tx).await?;
        Ok(bylines)
    }
}
