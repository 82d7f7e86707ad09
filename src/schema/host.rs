//! The host side of schema extension.
//!
//! `HostSchema` is what a graph-query engine must offer for bylines to be
//! installed into it. `SchemaRegistry` is a minimal host: it stores object
//! types and their fields and can resolve a single field. It does not
//! parse or execute queries.

use hashbrown::HashMap;
use tracing::debug;

use crate::model::PropertyMap;
use crate::storage::StorageBackend;
use crate::{Error, Result};
use super::{FieldDef, FieldMap, FieldValue, GraphObject, ObjectType, ResolveContext, ResolveInfo};

pub trait HostSchema {
    /// Content types the host exposes in its graph.
    fn allowed_content_types(&self) -> Vec<String>;

    /// Add a new object type, replacing one of the same name.
    fn register_object_type(&mut self, object: ObjectType) -> Result<()>;

    /// Field-set augmentation: merge `fields` into an existing type.
    fn extend_fields(&mut self, type_name: &str, fields: FieldMap) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    allowed: Vec<String>,
    types: HashMap<String, ObjectType>,
}

impl SchemaRegistry {
    /// A host exposing `content_types`, each starting as an empty object type.
    pub fn new<S: Into<String>>(content_types: impl IntoIterator<Item = S>) -> Self {
        let mut registry = Self::default();
        for name in content_types {
            let name = name.into();
            registry.types.insert(name.clone(), ObjectType::new(name.clone(), ""));
            registry.allowed.push(name);
        }
        registry
    }

    pub fn object_type(&self, name: &str) -> Option<&ObjectType> {
        self.types.get(name)
    }

    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.types.get(type_name)?.fields.get(field_name)
    }

    /// Resolve one field of `type_name` on `source`. Arguments the field
    /// does not declare are rejected.
    pub async fn resolve_field<B: StorageBackend>(
        &self,
        type_name: &str,
        field_name: &str,
        source: &GraphObject,
        args: &PropertyMap,
        ctx: &ResolveContext<'_, B>,
    ) -> Result<FieldValue> {
        let field = self.field(type_name, field_name).ok_or_else(|| {
            Error::SchemaError(format!("type '{type_name}' has no field '{field_name}'"))
        })?;
        if let Some(unknown) = args.keys().find(|k| !field.args.iter().any(|a| &a.name == *k)) {
            return Err(Error::SchemaError(format!(
                "field '{type_name}.{field_name}' has no argument '{unknown}'"
            )));
        }
        let info = ResolveInfo::new(type_name, field_name);
        field.resolver.resolve(source, args, &info, ctx).await
    }
}

impl HostSchema for SchemaRegistry {
    fn allowed_content_types(&self) -> Vec<String> {
        self.allowed.clone()
    }

    fn register_object_type(&mut self, object: ObjectType) -> Result<()> {
        debug!(type_name = %object.name, fields = object.fields.len(), "registering object type");
        self.types.insert(object.name.clone(), object);
        Ok(())
    }

    fn extend_fields(&mut self, type_name: &str, fields: FieldMap) -> Result<()> {
        let object = self
            .types
            .get_mut(type_name)
            .ok_or_else(|| Error::SchemaError(format!("unknown type '{type_name}'")))?;
        object.fields.extend(fields);
        Ok(())
    }
}
