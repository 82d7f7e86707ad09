//! # Schema Extension
//!
//! Types describing how bylines appear in a host's graph schema, and the
//! machinery that installs them.
//!
//! ```text
//! SchemaExtension::install(host)
//!   → register object type `byline` (Node) with scalar + connection fields
//!   → extend every eligible content type with a `bylines` field
//! SchemaRegistry::resolve_field(type, field, source, ...)
//!   → FieldResolver strategy → FieldValue
//! ```

pub mod extension;
pub mod host;
pub mod resolver;

use std::fmt;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::model::{Byline, ContentItem};

pub use extension::SchemaExtension;
pub use host::{HostSchema, SchemaRegistry};
pub use resolver::{FieldResolver, ResolveContext};

/// Node type name of bylines; also the global-id prefix.
pub const BYLINE_TYPE_NAME: &str = "byline";

/// Interface implemented by every globally addressable type.
pub const NODE_INTERFACE: &str = "Node";

// ============================================================================
// Objects flowing through resolvers
// ============================================================================

/// An already-resolved object a field is evaluated on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphObject {
    Byline(Byline),
    Content(ContentItem),
    /// Anything the host owns that this crate does not model.
    Foreign { type_name: String, id: u64 },
}

impl GraphObject {
    pub fn as_byline(&self) -> Option<&Byline> {
        match self {
            GraphObject::Byline(b) => Some(b),
            _ => None,
        }
    }
}

/// Where in the schema a resolver is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    pub parent_type: String,
    pub field_name: String,
}

impl ResolveInfo {
    pub fn new(parent_type: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self { parent_type: parent_type.into(), field_name: field_name.into() }
    }
}

// ============================================================================
// Type references
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Id,
    String,
    Int,
    Object(String),
    /// Paginated edge set from one object type to another.
    Connection { from: String, to: String },
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    pub fn list_of(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }
}

fn pascal(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Id => write!(f, "ID"),
            TypeRef::String => write!(f, "String"),
            TypeRef::Int => write!(f, "Int"),
            TypeRef::Object(name) => write!(f, "{name}"),
            TypeRef::Connection { from, to } => write!(f, "{}To{}Connection", pascal(from), pascal(to)),
            TypeRef::List(inner) => write!(f, "[{inner}]"),
            TypeRef::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

// ============================================================================
// Field definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDef {
    pub name: String,
    pub type_ref: TypeRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_ref: TypeRef,
    pub description: String,
    pub args: Vec<ArgDef>,
    pub resolver: FieldResolver,
}

impl FieldDef {
    pub fn new(
        name: impl Into<String>,
        type_ref: TypeRef,
        description: impl Into<String>,
        resolver: FieldResolver,
    ) -> Self {
        Self {
            name: name.into(),
            type_ref,
            description: description.into(),
            args: Vec::new(),
            resolver,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, type_ref: TypeRef) -> Self {
        self.args.push(ArgDef { name: name.into(), type_ref });
        self
    }
}

/// Field name → definition. Inserting an existing name replaces it, so
/// applying the same extension twice leaves one copy of each field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    fields: HashMap<String, FieldDef>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `field`, returning the definition it replaced.
    pub fn insert(&mut self, field: FieldDef) -> Option<FieldDef> {
        self.fields.insert(field.name.clone(), field)
    }

    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Merge `other` in; its definitions win on name clashes.
    pub fn extend(&mut self, other: FieldMap) {
        self.fields.extend(other.fields);
    }
}

impl FromIterator<FieldDef> for FieldMap {
    fn from_iter<I: IntoIterator<Item = FieldDef>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for field in iter {
            map.insert(field);
        }
        map
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub description: String,
    pub interfaces: Vec<String>,
    pub fields: FieldMap,
}

impl ObjectType {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            interfaces: Vec::new(),
            fields: FieldMap::new(),
        }
    }

    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.iter().any(|i| i == interface)
    }
}

// ============================================================================
// Resolved values
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Id(String),
    String(String),
    List(Vec<GraphObject>),
    Connection(Connection),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Id(s) | FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub cursor: String,
    pub node: GraphObject,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub edges: Vec<Edge>,
    pub page_info: PageInfo,
}

impl Connection {
    pub fn nodes(&self) -> impl Iterator<Item = &GraphObject> {
        self.edges.iter().map(|e| &e.node)
    }
}
