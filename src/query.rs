//! Content query arguments and the byline default-query filter.
//!
//! A host resolves a content connection by building `QueryArgs`, letting
//! every registered `QueryArgsFilter` rewrite them, then running the query.
//! `BylineQueryFilter` is how a connection whose source is a byline gets
//! restricted to that byline's content.

use serde::{Deserialize, Serialize};

use crate::hooks::QueryArgsFilter;
use crate::model::{BylineId, PropertyMap, Value};
use crate::schema::{GraphObject, ResolveInfo};

/// Which term attribute the clause's `terms` refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermField {
    TermId,
    Slug,
}

/// One taxonomy predicate: content must carry at least one of `terms`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxClause {
    pub taxonomy: String,
    pub field: TermField,
    pub terms: Vec<Value>,
}

impl TaxClause {
    /// Ids outside the `Int` range cannot be expressed as terms and are left out.
    pub fn term_ids(taxonomy: impl Into<String>, ids: impl IntoIterator<Item = BylineId>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            field: TermField::TermId,
            terms: ids
                .into_iter()
                .filter_map(|id| i64::try_from(id.0).ok())
                .map(Value::Int)
                .collect(),
        }
    }

    pub fn slugs<S: Into<String>>(taxonomy: impl Into<String>, slugs: impl IntoIterator<Item = S>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            field: TermField::Slug,
            terms: slugs.into_iter().map(|s| Value::String(s.into())).collect(),
        }
    }
}

/// Arguments of a content query. All clauses are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryArgs {
    pub content_type: Option<String>,
    pub tax_query: Vec<TaxClause>,
    /// Host-specific arguments this crate carries through untouched.
    pub extra: PropertyMap,
}

impl QueryArgs {
    pub fn for_content_type(content_type: impl Into<String>) -> Self {
        Self { content_type: Some(content_type.into()), ..Self::default() }
    }

    pub fn with_relation(mut self, taxonomy: &str, byline: BylineId) -> Self {
        self.tax_query.push(TaxClause::term_ids(taxonomy, [byline]));
        self
    }
}

// ============================================================================
// Byline filter
// ============================================================================

/// Restricts queries issued from a byline to content related to it.
#[derive(Debug, Clone)]
pub struct BylineQueryFilter {
    taxonomy: String,
}

impl BylineQueryFilter {
    pub fn new(taxonomy: impl Into<String>) -> Self {
        Self { taxonomy: taxonomy.into() }
    }
}

impl QueryArgsFilter for BylineQueryFilter {
    fn filter(
        &self,
        args: &QueryArgs,
        source: &GraphObject,
        _request_args: &PropertyMap,
        _info: &ResolveInfo,
    ) -> QueryArgs {
        let mut out = args.clone();
        if let GraphObject::Byline(byline) = source {
            out.tax_query = vec![TaxClause::term_ids(self.taxonomy.as_str(), [byline.id])];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Byline, ContentId, ContentItem, NewByline};
    use pretty_assertions::assert_eq;

    fn info() -> ResolveInfo {
        ResolveInfo::new("byline", "posts")
    }

    #[test]
    fn test_byline_source_gets_relation_predicate() {
        let filter = BylineQueryFilter::new("byline");
        let byline = Byline::from_new(BylineId(4), NewByline::new("ada"));
        let mut args = QueryArgs::for_content_type("post");
        args.tax_query.push(TaxClause::slugs("category", ["news"]));

        let out = filter.filter(&args, &GraphObject::Byline(byline), &PropertyMap::new(), &info());

        assert_eq!(out.content_type.as_deref(), Some("post"));
        assert_eq!(out.tax_query, vec![TaxClause::term_ids("byline", [BylineId(4)])]);
        // input untouched
        assert_eq!(args.tax_query.len(), 1);
        assert_eq!(args.tax_query[0].taxonomy, "category");
    }

    #[test]
    fn test_term_ids_skip_ids_beyond_int_range() {
        let clause = TaxClause::term_ids("byline", [BylineId(7), BylineId(u64::MAX)]);
        assert_eq!(clause.terms, vec![Value::Int(7)]);
    }

    #[test]
    fn test_other_sources_pass_through() {
        let filter = BylineQueryFilter::new("byline");
        let mut args = QueryArgs::for_content_type("page");
        args.extra.insert("search".into(), Value::from("rust"));

        let content = GraphObject::Content(ContentItem {
            id: ContentId(1),
            content_type: "post".into(),
            title: "Hello".into(),
            published_at: chrono::Utc::now(),
        });
        assert_eq!(filter.filter(&args, &content, &PropertyMap::new(), &info()), args);

        let foreign = GraphObject::Foreign { type_name: "menu".into(), id: 3 };
        assert_eq!(filter.filter(&args, &foreign, &PropertyMap::new(), &info()), args);
    }
}
