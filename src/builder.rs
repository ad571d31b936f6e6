//! 查询构建会话
//!
//! [`QueryBuilder`] owns one condition tree and keeps its compiled query current: every
//! edit replaces the tree and recompiles it against the shared field catalog.

use crate::compiler::QueryCompiler;
use crate::config::BuilderConfig;
use crate::error::Result;
use crate::field_type::FieldType;
use crate::operator::{operators_for, Operator};
use crate::preview;
use crate::query::Query;
use crate::schema::FieldCatalog;
use crate::tree::{ConditionUpdate, Group, IdGenerator, NodeId};
use std::sync::Arc;
use tracing::{debug, info};

/// Interactive builder session. Each session owns its tree; catalogs may be shared.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    root: Group,
    catalog: Arc<FieldCatalog>,
    config: BuilderConfig,
    ids: IdGenerator,
    compiled: Option<Query>,
}

impl QueryBuilder {
    pub fn new(catalog: Arc<FieldCatalog>) -> Self {
        Self::with_config(catalog, BuilderConfig::default())
    }

    pub fn with_config(catalog: Arc<FieldCatalog>, config: BuilderConfig) -> Self {
        Self {
            root: Group::root(),
            catalog,
            config,
            ids: IdGenerator::new(),
            compiled: None,
        }
    }

    /// Continue editing a previously saved tree.
    pub fn with_tree(mut self, root: Group) -> Self {
        self.replace(root);
        self
    }

    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Compiled query for the current tree, `None` while nothing is translatable.
    pub fn compiled(&self) -> Option<&Query> {
        self.compiled.as_ref()
    }

    /// Whether there is anything to hand to the search backend.
    pub fn is_executable(&self) -> bool {
        self.compiled.is_some()
    }

    pub fn preview(&self) -> Result<String> {
        preview::render(self.compiled.as_ref(), &self.config.preview)
    }

    /// Operators to offer for a field; unknown fields get the untyped-string set.
    pub fn operators_for_field(&self, field: &str) -> Vec<Operator> {
        match self.catalog.resolve(field) {
            Some(descriptor) => operators_for(&descriptor.field_type),
            None => operators_for(&FieldType::Keyword),
        }
    }

    /// Append a blank condition; returns its id, or `None` if the group does not exist.
    pub fn add_condition(&mut self, group_id: &str) -> Option<NodeId> {
        self.root.find_group(group_id)?;
        let id = self.ids.next_id("c", &self.root);
        let root = self.root.add_condition(group_id, id.clone());
        self.replace(root);
        Some(id)
    }

    pub fn remove_condition(&mut self, group_id: &str, condition_id: &str) {
        let root = self.root.remove_condition(group_id, condition_id);
        self.replace(root);
    }

    /// Merge `update` into a condition. When the field or operator changes, an operator
    /// that no longer fits the field's type is reset to `equals` with empty values, and
    /// `value2` is kept in line with the operator's arity.
    pub fn update_condition(&mut self, group_id: &str, condition_id: &str, update: ConditionUpdate) {
        let mut root = self.root.update_condition(group_id, condition_id, &update);

        if update.field.is_some() || update.operator.is_some() {
            let condition = root.find_group_mut(group_id).and_then(|group| {
                group
                    .conditions
                    .iter_mut()
                    .find(|condition| condition.id == condition_id)
            });
            if let Some(condition) = condition {
                let field_type = self
                    .catalog
                    .resolve(&condition.field)
                    .map(|descriptor| descriptor.field_type.clone());
                condition.reconcile_with_field(field_type.as_ref());
            }
        }

        self.replace(root);
    }

    /// Append an empty child group; returns its id, or `None` if the parent does not exist.
    pub fn add_group(&mut self, parent_group_id: &str) -> Option<NodeId> {
        self.root.find_group(parent_group_id)?;
        let id = self.ids.next_id("g", &self.root);
        let root = self.root.add_group(parent_group_id, id.clone());
        self.replace(root);
        Some(id)
    }

    pub fn remove_group(&mut self, parent_group_id: &str, group_id: &str) {
        let root = self.root.remove_group(parent_group_id, group_id);
        self.replace(root);
    }

    pub fn toggle_logic(&mut self, group_id: &str) {
        let root = self.root.toggle_logic(group_id);
        self.replace(root);
    }

    /// Swap in a catalog for a changed schema. The tree is not repaired: conditions on
    /// fields that disappeared compile as untyped strings.
    pub fn set_catalog(&mut self, catalog: Arc<FieldCatalog>) {
        info!(fields = catalog.len(), "field catalog replaced");
        self.catalog = catalog;
        self.recompile();
    }

    /// Back to an empty AND root. Ids handed out before the reset are not reused.
    pub fn reset(&mut self) {
        debug!("condition tree reset");
        self.replace(Group::root());
    }

    fn replace(&mut self, root: Group) {
        self.root = root;
        self.recompile();
    }

    fn recompile(&mut self) {
        self.compiled = QueryCompiler::with_config(&self.catalog, self.config.compiler.clone())
            .compile(&self.root);
    }
}
