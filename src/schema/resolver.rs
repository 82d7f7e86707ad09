//! Field resolver strategies.
//!
//! A small closed set instead of per-field closures: each variant is
//! parameterized by what it reads, and none captures mutable state.

use tracing::debug;

use crate::config::BylinesConfig;
use crate::hooks::Hooks;
use crate::model::{BylineAttribute, PropertyMap, Value};
use crate::query::QueryArgs;
use crate::relay;
use crate::storage::StorageBackend;
use crate::tx::TxMode;
use crate::{Error, Result};
use super::{Connection, Edge, FieldValue, GraphObject, PageInfo, ResolveInfo, BYLINE_TYPE_NAME};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResolver {
    /// The byline's opaque global id.
    GlobalId,
    /// One text attribute of a byline; null when unset or empty.
    Attribute(BylineAttribute),
    /// Ordered bylines of a content item; null when there are none.
    ContentBylines,
    /// Paginated content of one type related to the source byline.
    BylineConnection { content_type: String },
}

/// Everything a resolver may touch while running.
pub struct ResolveContext<'a, B: StorageBackend> {
    pub backend: &'a B,
    pub hooks: &'a Hooks,
    pub config: &'a BylinesConfig,
}

impl<'a, B: StorageBackend> ResolveContext<'a, B> {
    pub fn new(backend: &'a B, hooks: &'a Hooks, config: &'a BylinesConfig) -> Self {
        Self { backend, hooks, config }
    }
}

impl FieldResolver {
    /// Evaluate the field on `source`. A source of the wrong kind yields null.
    pub async fn resolve<B: StorageBackend>(
        &self,
        source: &GraphObject,
        args: &PropertyMap,
        info: &ResolveInfo,
        ctx: &ResolveContext<'_, B>,
    ) -> Result<FieldValue> {
        match self {
            FieldResolver::GlobalId => Ok(match source {
                GraphObject::Byline(b) => FieldValue::Id(relay::to_global_id(BYLINE_TYPE_NAME, b.id.0)),
                _ => FieldValue::Null,
            }),
            FieldResolver::Attribute(attr) => Ok(source
                .as_byline()
                .and_then(|b| b.get(*attr))
                .filter(|v| !v.is_empty())
                .map(|v| FieldValue::String(v.to_string()))
                .unwrap_or(FieldValue::Null)),
            FieldResolver::ContentBylines => resolve_content_bylines(source, ctx).await,
            FieldResolver::BylineConnection { content_type } => {
                resolve_connection(content_type, source, args, info, ctx).await
            }
        }
    }
}

async fn resolve_content_bylines<B: StorageBackend>(
    source: &GraphObject,
    ctx: &ResolveContext<'_, B>,
) -> Result<FieldValue> {
    let GraphObject::Content(item) = source else {
        return Ok(FieldValue::Null);
    };
    let tx = ctx.backend.begin_tx(TxMode::ReadOnly).await?;
    let ids = ctx.backend.get_relation(&tx, item.id).await?;
    let mut bylines = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(byline) = ctx.backend.get_byline(&tx, id).await? {
            bylines.push(GraphObject::Byline(byline));
        }
    }
    ctx.backend.commit_tx(tx).await?;

    Ok(if bylines.is_empty() { FieldValue::Null } else { FieldValue::List(bylines) })
}

async fn resolve_connection<B: StorageBackend>(
    content_type: &str,
    source: &GraphObject,
    args: &PropertyMap,
    info: &ResolveInfo,
    ctx: &ResolveContext<'_, B>,
) -> Result<FieldValue> {
    let defaults = QueryArgs::for_content_type(content_type);
    let query = ctx.hooks.apply_query_filters(&defaults, source, args, info);
    debug!(field = %info.field_name, ?query, "resolving byline connection");

    let tx = ctx.backend.begin_tx(TxMode::ReadOnly).await?;
    let items = ctx.backend.query_content(&tx, &query).await?;
    ctx.backend.commit_tx(tx).await?;

    let first = ctx.config.page_size(int_arg(args, "first")?);
    let start = match str_arg(args, "after")? {
        Some(cursor) => {
            let after = relay::decode_cursor(cursor)?;
            // A cursor pointing at an item no longer in the result starts from the top.
            items.iter().position(|c| c.id.0 == after).map(|i| i + 1).unwrap_or(0)
        }
        None => 0,
    };

    let remaining = items.len().saturating_sub(start);
    let edges: Vec<Edge> = items
        .into_iter()
        .skip(start)
        .take(first)
        .map(|item| Edge { cursor: relay::encode_cursor(item.id.0), node: GraphObject::Content(item) })
        .collect();

    let page_info = PageInfo {
        has_next_page: remaining > edges.len(),
        has_previous_page: start > 0,
        start_cursor: edges.first().map(|e| e.cursor.clone()),
        end_cursor: edges.last().map(|e| e.cursor.clone()),
    };
    Ok(FieldValue::Connection(Connection { edges, page_info }))
}

/// An optional `Int` argument. Null counts as absent.
fn int_arg(args: &PropertyMap, name: &str) -> Result<Option<i64>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ (Value::Int(_) | Value::Float(_))) => v.as_int().map(Some).ok_or_else(|| mistyped(name, "Int", v)),
        Some(v) => Err(mistyped(name, "Int", v)),
    }
}

/// An optional `String` argument. Null counts as absent.
fn str_arg<'a>(args: &'a PropertyMap, name: &str) -> Result<Option<&'a str>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(v) => Err(mistyped(name, "String", v)),
    }
}

fn mistyped(name: &str, expected: &str, got: &Value) -> Error {
    Error::SchemaError(format!("argument '{name}' expects {expected}, got {} {got}", got.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Byline, BylineId, NewByline};
    use crate::storage::MemoryBackend;

    fn ada() -> GraphObject {
        GraphObject::Byline(Byline::from_new(
            BylineId(3),
            NewByline::new("ada").with_display_name("Ada").with_bio(""),
        ))
    }

    #[tokio::test]
    async fn test_scalar_strategies() {
        let backend = MemoryBackend::new();
        let hooks = Hooks::new();
        let config = BylinesConfig::default();
        let ctx = ResolveContext::new(&backend, &hooks, &config);
        let info = ResolveInfo::new("byline", "x");
        let args = PropertyMap::new();

        let name = FieldResolver::Attribute(BylineAttribute::DisplayName)
            .resolve(&ada(), &args, &info, &ctx).await.unwrap();
        assert_eq!(name, FieldValue::String("Ada".into()));

        let bio = FieldResolver::Attribute(BylineAttribute::Bio)
            .resolve(&ada(), &args, &info, &ctx).await.unwrap();
        assert!(bio.is_null());

        let id = FieldResolver::GlobalId.resolve(&ada(), &args, &info, &ctx).await.unwrap();
        assert_eq!(id, FieldValue::Id(relay::to_global_id("byline", 3)));

        let foreign = GraphObject::Foreign { type_name: "menu".into(), id: 1 };
        let wrong = FieldResolver::GlobalId.resolve(&foreign, &args, &info, &ctx).await.unwrap();
        assert!(wrong.is_null());
    }

    #[tokio::test]
    async fn test_connection_arguments_are_type_checked() {
        let backend = MemoryBackend::new();
        let hooks = Hooks::new();
        let config = BylinesConfig::default();
        let ctx = ResolveContext::new(&backend, &hooks, &config);
        let info = ResolveInfo::new("byline", "posts");
        let posts = FieldResolver::BylineConnection { content_type: "post".into() };

        let nulls = crate::model::props([("first", Value::Null), ("after", Value::Null)]);
        assert!(posts.resolve(&ada(), &nulls, &info, &ctx).await.is_ok());

        let whole_float = crate::model::props([("first", 2.0)]);
        assert!(posts.resolve(&ada(), &whole_float, &info, &ctx).await.is_ok());

        let text_first = crate::model::props([("first", "ten")]);
        let err = posts.resolve(&ada(), &text_first, &info, &ctx).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error: argument 'first' expects Int, got STRING \"ten\""
        );

        let list_after = crate::model::props([("after", Value::from(vec![1, 2]))]);
        let err = posts.resolve(&ada(), &list_after, &info, &ctx).await.unwrap_err();
        assert!(err.to_string().ends_with("expects String, got LIST [1, 2]"));

        let flag_first = crate::model::props([("first", true)]);
        assert!(posts.resolve(&ada(), &flag_first, &info, &ctx).await.is_err());
    }
}
