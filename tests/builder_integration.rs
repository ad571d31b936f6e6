//! End-to-end tests: mapping JSON -> field catalog -> tree edits -> compiled query -> preview.

use query_builder::{
    compile, preview, BuilderConfig, ConditionUpdate, FieldCatalog, Group, Operator,
    PreviewConfig, Query, QueryBuilder, ROOT_GROUP_ID,
};
use serde_json::json;
use std::sync::Arc;

const MAPPING: &str = r#"{
  "articles": {
    "mappings": {
      "properties": {
        "title": { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
        "tags": { "type": "keyword" },
        "views": { "type": "integer" },
        "score": { "type": "double" },
        "draft": { "type": "boolean" },
        "comments": {
          "type": "nested",
          "properties": {
            "author": { "type": "keyword" },
            "likes": { "type": "long" }
          }
        }
      }
    }
  }
}"#;

fn catalog() -> FieldCatalog {
    FieldCatalog::from_json(MAPPING).unwrap()
}

fn builder() -> QueryBuilder {
    QueryBuilder::new(Arc::new(catalog()))
}

fn set(builder: &mut QueryBuilder, group: &str, field: &str, op: Operator, value: &str) -> String {
    let id = builder.add_condition(group).unwrap();
    builder.update_condition(
        group,
        &id,
        ConditionUpdate::new().field(field).operator(op).value(value),
    );
    id
}

fn compiled(builder: &QueryBuilder) -> serde_json::Value {
    serde_json::to_value(builder.compiled()).unwrap()
}

#[test]
fn test_empty_root_compiles_to_null() {
    assert_eq!(compile(&Group::root(), &catalog()), None);
    assert!(!builder().is_executable());
}

#[test]
fn test_single_condition_unwrapped_regardless_of_logic() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "tags", Operator::Equals, "rust");
    let and = compiled(&b);
    b.toggle_logic(ROOT_GROUP_ID);
    let or = compiled(&b);
    assert_eq!(and, json!({ "term": { "tags": "rust" } }));
    assert_eq!(or, and);
}

#[test]
fn test_or_vs_and_with_two_conditions() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "tags", Operator::Equals, "rust");
    set(&mut b, ROOT_GROUP_ID, "draft", Operator::Equals, "False");

    assert_eq!(
        compiled(&b),
        json!({ "bool": { "must": [
            { "term": { "tags": "rust" } },
            { "term": { "draft": false } }
        ] } })
    );

    b.toggle_logic(ROOT_GROUP_ID);
    assert_eq!(
        compiled(&b),
        json!({ "bool": {
            "should": [
                { "term": { "tags": "rust" } },
                { "term": { "draft": false } }
            ],
            "minimum_should_match": 1
        } })
    );
}

#[test]
fn test_between_on_integer_field() {
    let mut b = builder();
    let id = set(&mut b, ROOT_GROUP_ID, "views", Operator::Between, "10");
    b.update_condition(ROOT_GROUP_ID, &id, ConditionUpdate::new().value2("20"));
    assert_eq!(
        compiled(&b),
        json!({ "range": { "views": { "gte": 10, "lte": 20 } } })
    );
}

#[test]
fn test_in_on_keyword_field() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "tags", Operator::In, "a, b, c");
    assert_eq!(compiled(&b), json!({ "terms": { "tags": ["a", "b", "c"] } }));
}

#[test]
fn test_nested_condition_wrapped_sibling_not() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "comments.likes", Operator::Gt, "5");
    set(&mut b, ROOT_GROUP_ID, "score", Operator::Lte, "0.5");
    assert_eq!(
        compiled(&b),
        json!({ "bool": { "must": [
            { "nested": {
                "path": "comments",
                "query": { "range": { "comments.likes": { "gt": 5 } } }
            } },
            { "range": { "score": { "lte": 0.5 } } }
        ] } })
    );
}

#[test]
fn test_two_nested_conditions_get_separate_envelopes() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "comments.author", Operator::Equals, "ann");
    set(&mut b, ROOT_GROUP_ID, "comments.likes", Operator::Gte, "3");
    let Some(Query::Bool(bool_query)) = b.compiled() else {
        panic!("expected a bool query");
    };
    assert_eq!(bool_query.must.len(), 2);
    assert!(bool_query
        .must
        .iter()
        .all(|clause| matches!(clause, Query::Nested(nested) if nested.path == "comments")));
}

#[test]
fn test_single_nested_condition_in_or_group_wraps_once() {
    let mut b = builder();
    let group = b.add_group(ROOT_GROUP_ID).unwrap();
    b.toggle_logic(&group);
    set(&mut b, &group, "comments.author", Operator::Exists, "");
    assert_eq!(
        compiled(&b),
        json!({ "nested": {
            "path": "comments",
            "query": { "exists": { "field": "comments.author" } }
        } })
    );
}

#[test]
fn test_empty_field_contributes_nothing() {
    let mut b = builder();
    b.add_condition(ROOT_GROUP_ID).unwrap();
    assert_eq!(b.compiled(), None);
    assert_eq!(b.preview().unwrap(), "null");
}

#[test]
fn test_compile_is_deterministic() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "title", Operator::Contains, "query builder");
    let g = b.add_group(ROOT_GROUP_ID).unwrap();
    set(&mut b, &g, "views", Operator::NotIn, "1, 2");
    set(&mut b, &g, "title.keyword", Operator::EndsWith, "guide");
    b.toggle_logic(&g);

    let first = compile(b.root(), b.catalog());
    let second = compile(b.root(), b.catalog());
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_preview_round_trip() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "score", Operator::Gte, "2.0");
    set(&mut b, ROOT_GROUP_ID, "comments.author", Operator::NotEquals, "bot");
    set(&mut b, ROOT_GROUP_ID, "title", Operator::Regex, "ru.t");

    let config = PreviewConfig::default();
    let text = b.preview().unwrap();
    let parsed = preview::parse(&text, &config).unwrap();
    assert_eq!(parsed.as_ref(), b.compiled());
}

#[test]
fn test_preview_round_trip_keeps_full_float_precision() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "score", Operator::Gte, "1.0715660391465826e-75");
    let id = set(&mut b, ROOT_GROUP_ID, "score", Operator::Between, "0.1");
    b.update_condition(
        ROOT_GROUP_ID,
        &id,
        ConditionUpdate::new().value2("2.2250738585072014e-308"),
    );

    for config in [
        PreviewConfig::default(),
        PreviewConfig {
            indent: 0,
            wrap_in_query: true,
        },
    ] {
        let session = QueryBuilder::with_config(
            Arc::new(catalog()),
            BuilderConfig {
                preview: config.clone(),
                ..Default::default()
            },
        )
        .with_tree(b.root().clone());
        let text = session.preview().unwrap();
        let parsed = preview::parse(&text, &config).unwrap();
        assert_eq!(parsed.as_ref(), session.compiled());
    }
}

#[test]
fn test_structural_inverses() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "tags", Operator::Equals, "x");
    set(&mut b, ROOT_GROUP_ID, "views", Operator::Equals, "1");
    let before = b.root().clone();

    b.toggle_logic(ROOT_GROUP_ID);
    b.toggle_logic(ROOT_GROUP_ID);
    assert_eq!(b.root(), &before);

    let extra = b.add_condition(ROOT_GROUP_ID).unwrap();
    b.remove_condition(ROOT_GROUP_ID, &extra);
    assert_eq!(b.root().conditions, before.conditions);
}

#[test]
fn test_saved_tree_reloads() {
    let mut b = builder();
    set(&mut b, ROOT_GROUP_ID, "tags", Operator::In, "a,b");
    let saved = serde_json::to_string(b.root()).unwrap();

    let restored: Group = serde_json::from_str(&saved).unwrap();
    let reloaded = QueryBuilder::new(Arc::new(catalog())).with_tree(restored);
    assert_eq!(reloaded.compiled(), b.compiled());
}

#[test]
fn test_unknown_operator_in_saved_tree_is_skipped() {
    let saved = json!({
        "id": "root",
        "logic": "AND",
        "conditions": [
            { "id": "c1", "field": "tags", "operator": "fuzzy", "value": "rst" },
            { "id": "c2", "field": "tags", "operator": "equals", "value": "rust" }
        ],
        "groups": []
    });
    let root: Group = serde_json::from_value(saved).unwrap();
    assert_eq!(
        serde_json::to_value(compile(&root, &catalog())).unwrap(),
        json!({ "term": { "tags": "rust" } })
    );
}
