//! Visual boolean query builder.
//!
//! Users compose a nested AND/OR tree of field conditions against an index schema;
//! the tree compiles into a search-engine query document.
//!
//! ```
//! use std::sync::Arc;
//! use query_builder::{ConditionUpdate, FieldCatalog, Operator, QueryBuilder, ROOT_GROUP_ID};
//!
//! let catalog = FieldCatalog::from_json(
//!     r#"{ "articles": { "mappings": { "properties": { "views": { "type": "integer" } } } } }"#,
//! )
//! .unwrap();
//!
//! let mut builder = QueryBuilder::new(Arc::new(catalog));
//! let id = builder.add_condition(ROOT_GROUP_ID).unwrap();
//! builder.update_condition(
//!     ROOT_GROUP_ID,
//!     &id,
//!     ConditionUpdate::new().field("views").operator(Operator::Gte).value("10"),
//! );
//! assert_eq!(
//!     serde_json::to_string(builder.compiled().unwrap()).unwrap(),
//!     r#"{"range":{"views":{"gte":10}}}"#
//! );
//! ```

pub mod builder;
pub mod compiler;
pub mod config;
pub mod error;
pub mod field_type;
pub mod operator;
pub mod preview;
pub mod query;
pub mod schema;
pub mod tree;

pub use builder::QueryBuilder;
pub use compiler::{compile, QueryCompiler};
pub use config::{BuilderConfig, CompilerConfig, ConfigError, PreviewConfig};
pub use error::{BuilderError, Result};
pub use field_type::FieldType;
pub use operator::{operators_for, Operator, OperatorId, ValueArity};
pub use query::{Query, Scalar};
pub use schema::{FieldCatalog, FieldDescriptor};
pub use tree::{Condition, ConditionUpdate, Group, Logic, NodeId, ROOT_GROUP_ID};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
