use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use query_builder::{
    compile, preview, ConditionUpdate, FieldCatalog, Group, Operator, PreviewConfig,
    ROOT_GROUP_ID,
};
use std::hint::black_box;

const SCHEMA: &str = r#"{
  "articles": {
    "mappings": {
      "properties": {
        "title": { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
        "status": { "type": "keyword" },
        "views": { "type": "integer" },
        "rating": { "type": "float" },
        "published": { "type": "boolean" },
        "author": { "properties": { "name": { "type": "keyword" }, "age": { "type": "short" } } },
        "comments": {
          "type": "nested",
          "properties": {
            "author": { "type": "keyword" },
            "body": { "type": "text", "fields": { "keyword": { "type": "keyword" } } }
          }
        }
      }
    }
  }
}"#;

const CONDITIONS: &[(&str, Operator, &str)] = &[
    ("status", Operator::In, "open, pending, review"),
    ("views", Operator::Gte, "100"),
    ("title", Operator::Contains, "rust"),
    ("published", Operator::Equals, "true"),
    ("comments.author", Operator::Equals, "ann"),
    ("rating", Operator::Lt, "4.5"),
];

// 构建 width 个条件、depth 层嵌套的树
fn build_tree(width: usize, depth: usize) -> Group {
    let mut root = Group::root();
    let mut group_id = ROOT_GROUP_ID.to_string();
    let mut next = 0;

    for level in 0..depth {
        for i in 0..width {
            next += 1;
            let id = format!("c{next}");
            let (field, op, value) = CONDITIONS[(level + i) % CONDITIONS.len()];
            root = root.add_condition(&group_id, id.clone()).update_condition(
                &group_id,
                &id,
                &ConditionUpdate::new().field(field).operator(op).value(value),
            );
        }
        if level % 2 == 1 {
            root = root.toggle_logic(&group_id);
        }
        let child = format!("g{level}");
        root = root.add_group(&group_id, child.clone());
        group_id = child;
    }
    root
}

// 基准测试：映射解析
fn benchmark_catalog(c: &mut Criterion) {
    c.bench_function("catalog_from_json", |b| {
        b.iter(|| FieldCatalog::from_json(black_box(SCHEMA)).expect("映射应该可以解析"))
    });
}

// 基准测试：查询编译
fn benchmark_compile(c: &mut Criterion) {
    let catalog = FieldCatalog::from_json(SCHEMA).expect("映射应该可以解析");
    let cases = vec![
        ("simple", build_tree(1, 1)),
        ("medium", build_tree(4, 2)),
        ("deep", build_tree(3, 8)),
        ("wide", build_tree(50, 1)),
    ];

    let mut group = c.benchmark_group("compile");
    for (name, tree) in &cases {
        group.bench_with_input(BenchmarkId::new("tree", name), tree, |b, tree| {
            b.iter(|| black_box(compile(black_box(tree), &catalog)))
        });
    }
    group.finish();
}

// 基准测试：编辑 + 重新编译
fn benchmark_edit_cycle(c: &mut Criterion) {
    let catalog = FieldCatalog::from_json(SCHEMA).expect("映射应该可以解析");
    let tree = build_tree(4, 3);

    c.bench_function("toggle_and_recompile", |b| {
        b.iter(|| {
            let edited = black_box(&tree).toggle_logic("g0");
            black_box(compile(&edited, &catalog))
        })
    });
}

// 基准测试：预览渲染
fn benchmark_preview(c: &mut Criterion) {
    let catalog = FieldCatalog::from_json(SCHEMA).expect("映射应该可以解析");
    let query = compile(&build_tree(4, 3), &catalog);
    let config = PreviewConfig::default();

    c.bench_function("preview_render", |b| {
        b.iter(|| preview::render(black_box(query.as_ref()), &config).expect("渲染应该成功"))
    });
}

criterion_group!(
    benches,
    benchmark_catalog,
    benchmark_compile,
    benchmark_edit_cycle,
    benchmark_preview
);
criterion_main!(benches);
