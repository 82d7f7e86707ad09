//! Typed extension points a host query engine calls into.
//!
//! Each hook kind is a chain. Callbacks run in registration order; each one
//! receives the previous callback's result and either replaces it or hands
//! it through unchanged.

use std::sync::Arc;

use async_trait::async_trait;

use crate::model::PropertyMap;
use crate::query::QueryArgs;
use crate::relay;
use crate::schema::{GraphObject, ResolveInfo};
use crate::Result;

/// Rewrites the default arguments of a content query issued on behalf of
/// `source`. Must be pure: return a new value, leave inputs alone.
pub trait QueryArgsFilter: Send + Sync {
    fn filter(
        &self,
        args: &QueryArgs,
        source: &GraphObject,
        request_args: &PropertyMap,
        info: &ResolveInfo,
    ) -> QueryArgs;
}

/// Resolves `(id, type_name)` to an object, or passes `current` through.
#[async_trait]
pub trait NodeResolver: Send + Sync {
    async fn resolve_node(
        &self,
        current: Option<GraphObject>,
        id: &str,
        type_name: &str,
    ) -> Result<Option<GraphObject>>;
}

/// Names the node type of a resolved object, or passes `current` through.
pub trait NodeTypeResolver: Send + Sync {
    fn resolve_node_type(&self, current: Option<String>, node: &GraphObject) -> Option<String>;
}

/// Registered callbacks, one chain per extension point.
#[derive(Clone, Default)]
pub struct Hooks {
    query_filters: Vec<Arc<dyn QueryArgsFilter>>,
    node_resolvers: Vec<Arc<dyn NodeResolver>>,
    node_type_resolvers: Vec<Arc<dyn NodeTypeResolver>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_query_filter(&mut self, filter: impl QueryArgsFilter + 'static) -> &mut Self {
        self.query_filters.push(Arc::new(filter));
        self
    }

    pub fn register_node_resolver(&mut self, resolver: impl NodeResolver + 'static) -> &mut Self {
        self.node_resolvers.push(Arc::new(resolver));
        self
    }

    pub fn register_node_type_resolver(&mut self, resolver: impl NodeTypeResolver + 'static) -> &mut Self {
        self.node_type_resolvers.push(Arc::new(resolver));
        self
    }

    pub fn apply_query_filters(
        &self,
        args: &QueryArgs,
        source: &GraphObject,
        request_args: &PropertyMap,
        info: &ResolveInfo,
    ) -> QueryArgs {
        self.query_filters
            .iter()
            .fold(args.clone(), |acc, f| f.filter(&acc, source, request_args, info))
    }

    pub async fn resolve_node(&self, id: &str, type_name: &str) -> Result<Option<GraphObject>> {
        let mut node = None;
        for resolver in &self.node_resolvers {
            node = resolver.resolve_node(node, id, type_name).await?;
        }
        Ok(node)
    }

    /// Decode a global id and run the node-resolver chain on its parts.
    /// A malformed id resolves to nothing.
    pub async fn resolve_global_id(&self, global_id: &str) -> Result<Option<GraphObject>> {
        match relay::from_global_id(global_id) {
            Ok((type_name, id)) => self.resolve_node(&id.to_string(), &type_name).await,
            Err(_) => Ok(None),
        }
    }

    pub fn resolve_node_type(&self, node: &GraphObject) -> Option<String> {
        self.node_type_resolvers
            .iter()
            .fold(None, |acc, r| r.resolve_node_type(acc, node))
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("query_filters", &self.query_filters.len())
            .field("node_resolvers", &self.node_resolvers.len())
            .field("node_type_resolvers", &self.node_type_resolvers.len())
            .finish()
    }
}
