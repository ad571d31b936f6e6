use anyhow::{bail, Context, Result};
use query_builder::{
    BuilderConfig, ConditionUpdate, FieldCatalog, Group, OperatorId, QueryBuilder, ROOT_GROUP_ID,
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tracing::{info, warn};

const CONFIG_FILE: &str = "query_builder.json";

/// 没有指定映射文件时使用的示例映射
const DEMO_SCHEMA: &str = r#"{
  "articles": {
    "mappings": {
      "properties": {
        "title": { "type": "text", "fields": { "keyword": { "type": "keyword" } } },
        "status": { "type": "keyword" },
        "views": { "type": "integer" },
        "rating": { "type": "float" },
        "published": { "type": "boolean" },
        "created": { "type": "date" },
        "comments": {
          "type": "nested",
          "properties": {
            "author": { "type": "keyword" },
            "body": { "type": "text" }
          }
        }
      }
    }
  }
}"#;

const HELP: &str = "\
commands:
  fields                              list searchable fields
  ops <field>                         operators offered for a field
  add <group>                         add a blank condition
  group <parent>                      add a child group
  rm <group> <cond>                   remove a condition
  rmgroup <parent> <group>            remove a child group and its subtree
  toggle <group>                      flip AND/OR
  set <group> <cond> <key> <text...>  key is field | op | value | value2
  tree                                print the condition tree
  show                                print the compiled query
  reset                               start over
  help | quit";

/// 优先使用JSON配置文件，失败时使用默认配置
fn load_config() -> BuilderConfig {
    match BuilderConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            info!(path = CONFIG_FILE, "loaded builder config");
            config
        }
        Err(e) => {
            warn!("{e}, using default config");
            BuilderConfig::default()
        }
    }
}

fn load_catalog() -> Result<FieldCatalog> {
    match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("reading mapping file {path}"))?;
            FieldCatalog::from_json(&json).with_context(|| format!("parsing mapping file {path}"))
        }
        None => Ok(FieldCatalog::from_json(DEMO_SCHEMA)?),
    }
}

fn print_tree(group: &Group, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}[{}] {:?}", group.id, group.logic);
    for condition in &group.conditions {
        let field = if condition.field.is_empty() { "<none>" } else { condition.field.as_str() };
        match &condition.value2 {
            Some(value2) => println!(
                "{pad}  {}: {field} {} {:?} {:?}",
                condition.id, condition.operator, condition.value, value2
            ),
            None => println!(
                "{pad}  {}: {field} {} {:?}",
                condition.id, condition.operator, condition.value
            ),
        }
    }
    for child in &group.groups {
        print_tree(child, depth + 1);
    }
}

fn rest_after_words(line: &str, count: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}

/// Runs one command line; returns `false` when the shell should exit.
fn run_command(builder: &mut QueryBuilder, line: &str) -> Result<bool> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(true);
    };
    let args: Vec<&str> = words.collect();

    match (command, args.as_slice()) {
        ("quit" | "exit", _) => return Ok(false),
        ("help", _) => println!("{HELP}"),
        ("fields", _) => {
            for field in builder.catalog().iter() {
                match &field.nested_path {
                    Some(path) => println!("{:<28} {:<10} nested in {path}", field.name, field.field_type),
                    None => println!("{:<28} {}", field.name, field.field_type),
                }
            }
        }
        ("ops", [field]) => {
            let ops: Vec<String> = builder
                .operators_for_field(field)
                .into_iter()
                .map(|op| format!("{op} ({})", op.label()))
                .collect();
            println!("{}", ops.join(", "));
        }
        ("add", [group]) => match builder.add_condition(group) {
            Some(id) => println!("added condition {id}"),
            None => println!("no group {group}"),
        },
        ("group", [parent]) => match builder.add_group(parent) {
            Some(id) => println!("added group {id}"),
            None => println!("no group {parent}"),
        },
        ("rm", [group, condition]) => builder.remove_condition(group, condition),
        ("rmgroup", [parent, group]) => builder.remove_group(parent, group),
        ("toggle", [group]) => builder.toggle_logic(group),
        ("set", [group, condition, key, ..]) => {
            // keep the value's own spacing, e.g. `a, b, c`
            let text = rest_after_words(line, 4).to_string();
            let update = match *key {
                "field" => ConditionUpdate::new().field(text),
                "op" => ConditionUpdate::new().operator(OperatorId::from(text.as_str())),
                "value" => ConditionUpdate::new().value(text),
                "value2" => ConditionUpdate::new().value2(text),
                other => bail!("unknown key {other}, expected field | op | value | value2"),
            };
            builder.update_condition(group, condition, update);
        }
        ("tree", _) => print_tree(builder.root(), 0),
        ("show", _) => println!("{}", builder.preview()?),
        ("reset", _) => builder.reset(),
        _ => println!("unrecognized command, try `help`"),
    }
    Ok(true)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let catalog = load_catalog()?;
    println!("--- query builder {} ---", query_builder::VERSION);
    println!("{} fields loaded, root group is `{ROOT_GROUP_ID}`; type `help`", catalog.len());

    let mut builder = QueryBuilder::with_config(Arc::new(catalog), load_config());
    let mut editor = DefaultEditor::new()?;

    loop {
        match editor.readline("qb> ") {
            Ok(line) => {
                editor.add_history_entry(line.as_str())?;
                match run_command(&mut builder, &line) {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) => println!("error: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
