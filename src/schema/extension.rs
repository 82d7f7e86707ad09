//! Builds the byline type's field set and installs it into a host schema.
//!
//! The field set depends on which content types are byline-capable and
//! exposed by the host. Both inputs are fixed when the extension is
//! constructed, and the field set is built on first access and cached for
//! the life of the extension.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::model::{BylineAttribute, ContentModel, ContentType};
use crate::{Error, Result};
use super::{
    FieldDef, FieldMap, FieldResolver, HostSchema, ObjectType, TypeRef,
    BYLINE_TYPE_NAME, NODE_INTERFACE,
};

pub struct SchemaExtension {
    content_model: ContentModel,
    exposed: Vec<String>,
    byline_fields: Mutex<Option<Arc<FieldMap>>>,
    builds: AtomicUsize,
}

impl SchemaExtension {
    pub fn new(content_model: ContentModel, exposed: Vec<String>) -> Self {
        Self {
            content_model,
            exposed,
            byline_fields: Mutex::new(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Take the exposed content types from `host`.
    pub fn for_host(content_model: ContentModel, host: &dyn HostSchema) -> Self {
        Self::new(content_model, host.allowed_content_types())
    }

    /// Content types that are byline-capable and exposed, in model order.
    pub fn eligible_types(&self) -> Vec<&ContentType> {
        self.content_model.eligible(&self.exposed).collect()
    }

    /// How many times the field set has actually been built.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// The byline field set, built on first call and cached afterwards.
    /// A failed build is not cached.
    pub fn byline_fields(&self) -> Result<Arc<FieldMap>> {
        let mut slot = self.byline_fields.lock();
        if let Some(fields) = slot.as_ref() {
            return Ok(fields.clone());
        }
        let fields = Arc::new(self.build_byline_fields()?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        debug!(fields = fields.len(), "built byline field set");
        *slot = Some(fields.clone());
        Ok(fields)
    }

    fn build_byline_fields(&self) -> Result<FieldMap> {
        let mut fields = FieldMap::new();
        fields.insert(FieldDef::new(
            "id",
            TypeRef::non_null(TypeRef::Id),
            "The globally unique identifier of the byline",
            FieldResolver::GlobalId,
        ));
        for attr in BylineAttribute::ALL {
            fields.insert(FieldDef::new(
                attr.field_name(),
                TypeRef::String,
                attr.description(),
                FieldResolver::Attribute(attr),
            ));
        }

        for content_type in self.eligible_types() {
            let plural = content_type
                .graphql_plural_name
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| {
                    Error::SchemaError(format!(
                        "content type '{}' supports bylines but has no graphql plural name",
                        content_type.name
                    ))
                })?;
            let target = content_type
                .graphql_single_name
                .clone()
                .unwrap_or_else(|| content_type.name.clone());

            let field = FieldDef::new(
                plural,
                TypeRef::Connection { from: BYLINE_TYPE_NAME.into(), to: target },
                format!("Connection between the byline and {plural}"),
                FieldResolver::BylineConnection { content_type: content_type.name.clone() },
            )
            .with_arg("first", TypeRef::Int)
            .with_arg("after", TypeRef::String);

            if fields.insert(field).is_some() {
                return Err(Error::SchemaError(format!(
                    "plural name '{plural}' of content type '{}' collides with a byline field",
                    content_type.name
                )));
            }
        }
        Ok(fields)
    }

    /// The `byline` object type, implementing `Node`.
    pub fn byline_type(&self) -> Result<ObjectType> {
        let mut object = ObjectType::new(BYLINE_TYPE_NAME, "The Byline object type");
        object.interfaces.push(NODE_INTERFACE.into());
        object.fields = (*self.byline_fields()?).clone();
        Ok(object)
    }

    /// The `bylines` field added to each eligible content type.
    pub fn content_bylines_field() -> FieldDef {
        FieldDef::new(
            "bylines",
            TypeRef::list_of(TypeRef::Object(BYLINE_TYPE_NAME.into())),
            "The bylines for the object",
            FieldResolver::ContentBylines,
        )
    }

    /// Register the byline type and the per-content-type `bylines` fields.
    /// Build errors surface here, at startup. Installing again is harmless.
    pub fn install(&self, host: &mut dyn HostSchema) -> Result<()> {
        let byline_type = self.byline_type()?;
        host.register_object_type(byline_type)?;

        let eligible: Vec<String> = self.eligible_types().iter().map(|t| t.name.clone()).collect();
        for type_name in &eligible {
            let fields: FieldMap = [Self::content_bylines_field()].into_iter().collect();
            host.extend_fields(type_name, fields)?;
        }
        info!(content_types = ?eligible, "installed byline schema extension");
        Ok(())
    }
}
