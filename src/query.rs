//! Compiled query document.
//!
//! A typed subset of the search engine query DSL, covering exactly the shapes the
//! compiler emits. Serializes to the wire JSON, e.g.
//!
//! ```json
//! { "bool": { "should": [ { "term": { "status": "open" } },
//!                         { "range": { "views": { "gte": 10 } } } ],
//!             "minimum_should_match": 1 } }
//! ```

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Leaf value after type coercion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Long(i64),
    Double(f64),
    String(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Long(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// `{ "<field>": <value> }`, the body of most leaf queries.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue<T> {
    pub field: String,
    pub value: T,
}

impl<T> FieldValue<T> {
    pub fn new(field: impl Into<String>, value: T) -> Self {
        Self {
            field: field.into(),
            value,
        }
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.value)?;
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for FieldValue<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, T>::deserialize(deserializer)?;
        let mut entries = map.into_iter();
        match (entries.next(), entries.next()) {
            (Some((field, value)), None) => Ok(FieldValue { field, value }),
            _ => Err(D::Error::custom("expected an object with exactly one field")),
        }
    }
}

/// Range bounds, only the set ones are serialized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gt: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gte: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lt: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lte: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistsQuery {
    pub field: String,
}

/// Boolean combinator.
///
/// - `must`: every clause matches (AND)
/// - `should`: at least `minimum_should_match` clauses match (OR)
/// - `must_not`: no clause matches
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<Query>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<Query>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_should_match: Option<u32>,
}

/// Query evaluated inside a nested-object scope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedQuery {
    pub path: String,
    pub query: Box<Query>,
}

/// 编译后的查询节点
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    Term(FieldValue<Scalar>),
    Terms(FieldValue<Vec<Scalar>>),
    MatchPhrase(FieldValue<String>),
    Prefix(FieldValue<String>),
    Wildcard(FieldValue<String>),
    Regexp(FieldValue<String>),
    Range(FieldValue<RangeBounds>),
    Exists(ExistsQuery),
    Bool(BoolQuery),
    Nested(NestedQuery),
}

impl Query {
    pub fn term(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        Query::Term(FieldValue::new(field, value.into()))
    }

    pub fn terms(field: impl Into<String>, values: Vec<Scalar>) -> Self {
        Query::Terms(FieldValue::new(field, values))
    }

    pub fn match_phrase(field: impl Into<String>, text: impl Into<String>) -> Self {
        Query::MatchPhrase(FieldValue::new(field, text.into()))
    }

    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Query::Prefix(FieldValue::new(field, prefix.into()))
    }

    pub fn wildcard(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Query::Wildcard(FieldValue::new(field, pattern.into()))
    }

    pub fn regexp(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Query::Regexp(FieldValue::new(field, pattern.into()))
    }

    pub fn range(field: impl Into<String>, bounds: RangeBounds) -> Self {
        Query::Range(FieldValue::new(field, bounds))
    }

    pub fn exists(field: impl Into<String>) -> Self {
        Query::Exists(ExistsQuery {
            field: field.into(),
        })
    }

    /// `{"bool": {"must_not": [query]}}`
    pub fn must_not(query: Query) -> Self {
        Query::Bool(BoolQuery {
            must_not: vec![query],
            ..Default::default()
        })
    }

    /// Every clause must match.
    pub fn all_of(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            must: clauses,
            ..Default::default()
        })
    }

    /// At least one clause must match.
    pub fn any_of(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            should: clauses,
            minimum_should_match: Some(1),
            ..Default::default()
        })
    }

    pub fn nested(path: impl Into<String>, query: Query) -> Self {
        Query::Nested(NestedQuery {
            path: path.into(),
            query: Box::new(query),
        })
    }
}
