//! 运算符注册表
//!
//! A fixed table describing every operator the builder offers: how many values it
//! takes and which field types it applies to. The editing layer uses it to filter
//! operator menus; the compiler skips conditions whose operator does not apply.

use crate::field_type::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    Exists,
    NotExists,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
    Regex,
}

/// Number of values an operator reads from a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueArity {
    None,
    Single,
    Pair,
}

impl ValueArity {
    pub fn count(self) -> usize {
        match self {
            ValueArity::None => 0,
            ValueArity::Single => 1,
            ValueArity::Pair => 2,
        }
    }
}

/// One row of the registry.
#[derive(Debug)]
pub struct OperatorSpec {
    pub operator: Operator,
    pub id: &'static str,
    pub label: &'static str,
    pub arity: ValueArity,
    pub applicable_types: &'static [FieldType],
}

const SCALAR_TYPES: &[FieldType] = &[
    FieldType::Text,
    FieldType::Keyword,
    FieldType::Long,
    FieldType::Integer,
    FieldType::Short,
    FieldType::Byte,
    FieldType::Double,
    FieldType::Float,
    FieldType::HalfFloat,
    FieldType::ScaledFloat,
    FieldType::Boolean,
    FieldType::Date,
    FieldType::Ip,
];

const STRING_TYPES: &[FieldType] = &[FieldType::Text, FieldType::Keyword];

const ORDERED_TYPES: &[FieldType] = &[
    FieldType::Long,
    FieldType::Integer,
    FieldType::Short,
    FieldType::Byte,
    FieldType::Double,
    FieldType::Float,
    FieldType::HalfFloat,
    FieldType::ScaledFloat,
    FieldType::Date,
];

const fn row(
    operator: Operator,
    id: &'static str,
    label: &'static str,
    arity: ValueArity,
    applicable_types: &'static [FieldType],
) -> OperatorSpec {
    OperatorSpec {
        operator,
        id,
        label,
        arity,
        applicable_types,
    }
}

/// Registry rows in menu order.
pub static REGISTRY: [OperatorSpec; 16] = [
    row(Operator::Equals, "equals", "equals", ValueArity::Single, SCALAR_TYPES),
    row(Operator::NotEquals, "not_equals", "does not equal", ValueArity::Single, SCALAR_TYPES),
    row(Operator::Contains, "contains", "contains", ValueArity::Single, STRING_TYPES),
    row(Operator::NotContains, "not_contains", "does not contain", ValueArity::Single, STRING_TYPES),
    row(Operator::StartsWith, "starts_with", "starts with", ValueArity::Single, STRING_TYPES),
    row(Operator::EndsWith, "ends_with", "ends with", ValueArity::Single, STRING_TYPES),
    row(Operator::In, "in", "is one of", ValueArity::Single, SCALAR_TYPES),
    row(Operator::NotIn, "not_in", "is not one of", ValueArity::Single, SCALAR_TYPES),
    row(Operator::Exists, "exists", "exists", ValueArity::None, SCALAR_TYPES),
    row(Operator::NotExists, "not_exists", "does not exist", ValueArity::None, SCALAR_TYPES),
    row(Operator::Gt, "gt", "greater than", ValueArity::Single, ORDERED_TYPES),
    row(Operator::Gte, "gte", "greater than or equal", ValueArity::Single, ORDERED_TYPES),
    row(Operator::Lt, "lt", "less than", ValueArity::Single, ORDERED_TYPES),
    row(Operator::Lte, "lte", "less than or equal", ValueArity::Single, ORDERED_TYPES),
    row(Operator::Between, "between", "between", ValueArity::Pair, ORDERED_TYPES),
    row(Operator::Regex, "regex", "matches regex", ValueArity::Single, STRING_TYPES),
];

impl Operator {
    pub fn spec(self) -> &'static OperatorSpec {
        // REGISTRY is declared in variant order
        &REGISTRY[self as usize]
    }

    pub fn id(self) -> &'static str {
        self.spec().id
    }

    pub fn label(self) -> &'static str {
        self.spec().label
    }

    pub fn arity(self) -> ValueArity {
        self.spec().arity
    }

    pub fn applies_to(self, field_type: &FieldType) -> bool {
        let class = field_type.operator_class();
        self.spec().applicable_types.contains(&class)
    }
}

/// Operators offered for a field of the given type, in registry order.
pub fn operators_for(field_type: &FieldType) -> Vec<Operator> {
    REGISTRY
        .iter()
        .filter(|spec| spec.operator.applies_to(field_type))
        .map(|spec| spec.operator)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown operator: {0}")]
pub struct UnknownOperator(pub String);

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        REGISTRY
            .iter()
            .find(|spec| spec.id == s)
            .map(|spec| spec.operator)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Operator slot of a condition.
///
/// Trees loaded from elsewhere may carry operator ids this build does not know;
/// they are kept as-is and the compiler skips such conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperatorId {
    Known(Operator),
    Unrecognized(String),
}

impl OperatorId {
    pub fn known(&self) -> Option<Operator> {
        match self {
            OperatorId::Known(op) => Some(*op),
            OperatorId::Unrecognized(_) => None,
        }
    }
}

impl From<Operator> for OperatorId {
    fn from(op: Operator) -> Self {
        OperatorId::Known(op)
    }
}

impl From<&str> for OperatorId {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(op) => OperatorId::Known(op),
            Err(UnknownOperator(raw)) => OperatorId::Unrecognized(raw),
        }
    }
}

impl PartialEq<Operator> for OperatorId {
    fn eq(&self, other: &Operator) -> bool {
        self.known() == Some(*other)
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatorId::Known(op) => write!(f, "{op}"),
            OperatorId::Unrecognized(raw) => f.write_str(raw),
        }
    }
}
