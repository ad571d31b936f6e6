//! Field catalog extraction from index mappings.
//!
//! The input is the document returned by the mapping endpoint:
//!
//! ```json
//! {
//!   "articles": {
//!     "mappings": {
//!       "properties": {
//!         "title":    { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
//!         "comments": { "type": "nested", "properties": { "author": { "type": "keyword" } } }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! It is flattened into a name-sorted list of [`FieldDescriptor`]s. Object fields are
//! traversed but not emitted, nested fields are emitted and scope their descendants,
//! and text fields with a `keyword` sub-field get an extra `<path>.keyword` entry.

use crate::error::{BuilderError, Result};
use crate::field_type::FieldType;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::trace;

/// Mapping document keyed by index name.
pub type SchemaDocument = BTreeMap<String, IndexSchema>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    #[serde(default)]
    pub mappings: Mappings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mappings {
    #[serde(default)]
    pub properties: BTreeMap<String, FieldDef>,
}

/// A single entry of a `properties` map. Unrecognised mapping keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, FieldDef>>,
    /// Multi-fields such as `fields.keyword`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldDef>>,
}

impl FieldDef {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    /// Text field with a `keyword` multi-field.
    pub fn text_with_keyword() -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("keyword".to_string(), FieldDef::new(FieldType::Keyword));
        Self {
            field_type: Some(FieldType::Text),
            fields: Some(fields),
            ..Default::default()
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, FieldDef>) -> Self {
        self.properties = Some(properties);
        self
    }

    fn is_nested(&self) -> bool {
        matches!(self.field_type, Some(FieldType::Nested))
    }

    /// Objects (explicit or implied by a `properties` map) are containers only.
    fn is_object(&self) -> bool {
        match &self.field_type {
            Some(FieldType::Object) => true,
            Some(FieldType::Nested) => false,
            _ => self.properties.is_some(),
        }
    }

    fn keyword_subfield(&self) -> Option<&FieldDef> {
        if !matches!(self.field_type, Some(FieldType::Text)) {
            return None;
        }
        self.fields.as_ref().and_then(|fields| fields.get("keyword"))
    }
}

/// Searchable field derived from the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Dot-separated path
    pub name: String,
    pub field_type: FieldType,
    /// True for a nested field and for everything inside its scope
    pub is_nested: bool,
    /// Path of the nearest enclosing nested field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_subfield: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            is_nested: false,
            nested_path: None,
            keyword_subfield: None,
        }
    }

    pub fn in_nested(mut self, path: impl Into<String>) -> Self {
        self.is_nested = true;
        self.nested_path = Some(path.into());
        self
    }

    pub fn with_keyword(mut self, subfield: impl Into<String>) -> Self {
        self.keyword_subfield = Some(subfield.into());
        self
    }
}

/// Flat, name-sorted list of field descriptors for one schema.
///
/// Immutable once built; share it behind an `Arc` between sessions on the same schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalog {
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    /// Build a catalog from descriptors, sorting by name and dropping duplicate names.
    pub fn new(mut fields: Vec<FieldDescriptor>) -> Self {
        let mut seen = HashSet::new();
        fields.retain(|field| seen.insert(field.name.clone()));
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        Self { fields }
    }

    /// 解析映射JSON字符串
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(BuilderError::InvalidSchema(
                "expected an object keyed by index name".to_string(),
            ));
        }
        let schema: SchemaDocument = serde_json::from_value(value)?;
        Ok(Self::from_schema(&schema))
    }

    /// Fields of every index in the document; on duplicate paths the first index (by name) wins.
    pub fn from_schema(schema: &SchemaDocument) -> Self {
        let mut fields = Vec::new();
        for index in schema.values() {
            collect_fields(&index.mappings.properties, None, None, &mut fields);
        }
        Self::new(fields)
    }

    /// Fields of a single index, or `None` if the document does not contain it.
    pub fn for_index(schema: &SchemaDocument, index_name: &str) -> Option<Self> {
        schema.get(index_name).map(|index| {
            let mut fields = Vec::new();
            collect_fields(&index.mappings.properties, None, None, &mut fields);
            Self::new(fields)
        })
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by(|field| field.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.fields[idx])
    }

    /// Look up a field by its exact name, falling back to a text field whose keyword
    /// sub-field has that name.
    pub fn resolve(&self, name: &str) -> Option<&FieldDescriptor> {
        self.get(name).or_else(|| {
            self.fields
                .iter()
                .find(|field| field.keyword_subfield.as_deref() == Some(name))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Depth-first walk over a `properties` map.
fn collect_fields(
    properties: &BTreeMap<String, FieldDef>,
    parent_path: Option<&str>,
    nested_path: Option<&str>,
    out: &mut Vec<FieldDescriptor>,
) {
    for (key, def) in properties {
        let path = match parent_path {
            Some(parent) => format!("{parent}.{key}"),
            None => key.clone(),
        };

        if def.is_nested() {
            out.push(FieldDescriptor::new(path.clone(), FieldType::Nested).in_nested(path.clone()));
            if let Some(children) = &def.properties {
                collect_fields(children, Some(&path), Some(&path), out);
            }
            continue;
        }

        if def.is_object() {
            if let Some(children) = &def.properties {
                collect_fields(children, Some(&path), nested_path, out);
            }
            continue;
        }

        let Some(field_type) = def.field_type.clone() else {
            trace!(field = %path, "skipping mapping entry without a type");
            continue;
        };

        let mut descriptor = FieldDescriptor::new(path.clone(), field_type);
        if let Some(scope) = nested_path {
            descriptor = descriptor.in_nested(scope);
        }

        if let Some(keyword) = def.keyword_subfield() {
            let keyword_path = format!("{path}.keyword");
            let keyword_type = keyword.field_type.clone().unwrap_or(FieldType::Keyword);
            let mut sub = FieldDescriptor::new(keyword_path.clone(), keyword_type);
            if let Some(scope) = nested_path {
                sub = sub.in_nested(scope);
            }
            descriptor = descriptor.with_keyword(keyword_path);
            out.push(sub);
        }

        out.push(descriptor);
    }
}
