//! Query compiler that lowers a condition tree into the query DSL.
//!
//! Compilation is a pure function of the tree and the field catalog. Conditions that
//! cannot be translated (no field, unrecognized operator, operator not applicable to
//! the field's type) are skipped, so every tree
//! compiles to *something*: a query, or `None` when nothing is left.

use crate::config::CompilerConfig;
use crate::field_type::FieldType;
use crate::operator::Operator;
use crate::query::{Query, RangeBounds, Scalar};
use crate::schema::{FieldCatalog, FieldDescriptor};
use crate::tree::{Condition, Group, Logic};
use tracing::{debug, trace};

/// Compile `root` against `catalog` with the default configuration.
pub fn compile(root: &Group, catalog: &FieldCatalog) -> Option<Query> {
    QueryCompiler::new(catalog).compile(root)
}

/// Compiler bound to one field catalog
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    catalog: &'a FieldCatalog,
    config: CompilerConfig,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(catalog: &'a FieldCatalog) -> Self {
        Self::with_config(catalog, CompilerConfig::default())
    }

    pub fn with_config(catalog: &'a FieldCatalog, config: CompilerConfig) -> Self {
        Self { catalog, config }
    }

    /// Compile a tree. Returns `None` when no condition in it is translatable.
    pub fn compile(&self, root: &Group) -> Option<Query> {
        let query = self.compile_group(root);
        trace!(group = %root.id, compiled = query.is_some(), "compiled condition tree");
        query
    }

    fn compile_group(&self, group: &Group) -> Option<Query> {
        let mut clauses: Vec<Query> = group
            .conditions
            .iter()
            .filter_map(|condition| self.compile_condition(condition))
            .collect();
        clauses.extend(group.groups.iter().filter_map(|child| self.compile_group(child)));

        match clauses.len() {
            0 => None,
            // a group of one never gets a bool wrapper, whatever its logic
            1 => clauses.pop(),
            _ => Some(match group.logic {
                Logic::And => Query::all_of(clauses),
                Logic::Or => Query::any_of(clauses),
            }),
        }
    }

    fn compile_condition(&self, condition: &Condition) -> Option<Query> {
        if condition.field.is_empty() {
            debug!(condition = %condition.id, "skipping condition without a field");
            return None;
        }
        let Some(operator) = condition.operator.known() else {
            debug!(
                condition = %condition.id,
                operator = %condition.operator,
                "skipping condition with unrecognized operator"
            );
            return None;
        };

        let descriptor = self.catalog.resolve(&condition.field);
        match descriptor {
            Some(d) if !operator.applies_to(&d.field_type) => {
                debug!(
                    condition = %condition.id,
                    field = %condition.field,
                    operator = %operator,
                    field_type = %d.field_type,
                    "skipping operator not applicable to field type"
                );
                return None;
            }
            Some(_) => {}
            None => debug!(field = %condition.field, "field not in catalog, compiling as untyped string"),
        }

        let clause = self.build_clause(operator, condition, descriptor);

        Some(match descriptor.and_then(|d| d.nested_path.as_deref()) {
            Some(path) => Query::nested(path, clause),
            None => clause,
        })
    }

    /// Build the leaf clause for one operator.
    fn build_clause(
        &self,
        operator: Operator,
        condition: &Condition,
        descriptor: Option<&FieldDescriptor>,
    ) -> Query {
        let field = condition.field.as_str();
        let raw = condition.value.as_str();
        let field_type = descriptor.map(|d| &d.field_type);

        match operator {
            Operator::Equals => Query::term(field, coerce(raw, field_type)),
            Operator::NotEquals => Query::must_not(Query::term(field, coerce(raw, field_type))),
            Operator::Contains => Query::match_phrase(field, raw),
            Operator::NotContains => Query::must_not(Query::match_phrase(field, raw)),
            Operator::StartsWith => Query::prefix(field, raw),
            Operator::EndsWith => Query::wildcard(field, format!("*{raw}")),
            Operator::In => Query::terms(field, self.split_list(raw, field_type)),
            Operator::NotIn => Query::must_not(Query::terms(field, self.split_list(raw, field_type))),
            Operator::Exists => Query::exists(field),
            Operator::NotExists => Query::must_not(Query::exists(field)),
            Operator::Gt => Query::range(
                field,
                RangeBounds {
                    gt: Some(coerce(raw, field_type)),
                    ..Default::default()
                },
            ),
            Operator::Gte => Query::range(
                field,
                RangeBounds {
                    gte: Some(coerce(raw, field_type)),
                    ..Default::default()
                },
            ),
            Operator::Lt => Query::range(
                field,
                RangeBounds {
                    lt: Some(coerce(raw, field_type)),
                    ..Default::default()
                },
            ),
            Operator::Lte => Query::range(
                field,
                RangeBounds {
                    lte: Some(coerce(raw, field_type)),
                    ..Default::default()
                },
            ),
            Operator::Between => {
                let upper = condition.value2.as_deref().unwrap_or_default();
                Query::range(
                    field,
                    RangeBounds {
                        gte: Some(coerce(raw, field_type)),
                        lte: Some(coerce(upper, field_type)),
                        ..Default::default()
                    },
                )
            }
            Operator::Regex => Query::regexp(field, raw),
        }
    }

    /// Split an `in` list, trimming each item and dropping empty ones.
    fn split_list(&self, raw: &str, field_type: Option<&FieldType>) -> Vec<Scalar> {
        raw.split(self.config.list_separator)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| coerce(item, field_type))
            .collect()
    }
}

/// Convert a raw input string to the field's value type.
///
/// Values that do not parse are passed through as strings; the search engine is the
/// one to reject them.
pub fn coerce(raw: &str, field_type: Option<&FieldType>) -> Scalar {
    let Some(field_type) = field_type else {
        return Scalar::String(raw.to_string());
    };
    let trimmed = raw.trim();

    if field_type.is_boolean() {
        if trimmed.eq_ignore_ascii_case("true") {
            return Scalar::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Scalar::Bool(false);
        }
    } else if field_type.is_integer() {
        if let Ok(value) = trimmed.parse::<i64>() {
            return Scalar::Long(value);
        }
    } else if field_type.is_float() {
        // "NaN" and "inf" parse as f64 but have no JSON form
        if let Some(value) = trimmed.parse::<f64>().ok().filter(|v| v.is_finite()) {
            return Scalar::Double(value);
        }
    }

    Scalar::String(raw.to_string())
}
