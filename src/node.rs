//! Node resolution for bylines, in both directions.
//!
//! `BylineNodeResolver` answers `(id, "byline")` lookups and
//! `BylineNodeTypeResolver` reports the `byline` type for byline objects.
//! The two agree: whatever the first returns, the second names as a byline.

use std::sync::Arc;

use async_trait::async_trait;

use crate::hooks::{NodeResolver, NodeTypeResolver};
use crate::model::BylineId;
use crate::registry::BylineRegistry;
use crate::relay;
use crate::schema::{GraphObject, BYLINE_TYPE_NAME};
use crate::storage::StorageBackend;
use crate::Result;

pub struct BylineNodeResolver<B: StorageBackend> {
    registry: Arc<BylineRegistry<B>>,
}

impl<B: StorageBackend> BylineNodeResolver<B> {
    pub fn new(registry: Arc<BylineRegistry<B>>) -> Self {
        Self { registry }
    }
}

/// Accepts a raw numeric id or a byline global id.
fn parse_byline_id(id: &str) -> Option<BylineId> {
    let id = id.trim();
    if let Ok(n) = id.parse::<u64>() {
        return Some(BylineId(n));
    }
    relay::decode_typed(BYLINE_TYPE_NAME, id).ok().map(BylineId)
}

#[async_trait]
impl<B: StorageBackend> NodeResolver for BylineNodeResolver<B> {
    async fn resolve_node(
        &self,
        current: Option<GraphObject>,
        id: &str,
        type_name: &str,
    ) -> Result<Option<GraphObject>> {
        if type_name != BYLINE_TYPE_NAME {
            return Ok(current);
        }
        let Some(id) = parse_byline_id(id) else {
            return Ok(None);
        };
        Ok(self.registry.get_by_id(id).await?.map(GraphObject::Byline))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BylineNodeTypeResolver;

impl NodeTypeResolver for BylineNodeTypeResolver {
    fn resolve_node_type(&self, current: Option<String>, node: &GraphObject) -> Option<String> {
        match node {
            GraphObject::Byline(_) => Some(BYLINE_TYPE_NAME.to_string()),
            _ => current,
        }
    }
}
