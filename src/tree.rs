//! 条件树：组 (Group) 包含条件 (Condition) 和子组，所有编辑操作都返回一棵新树
use crate::field_type::FieldType;
use crate::operator::{Operator, OperatorId, ValueArity};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type NodeId = String;

/// Id of the root group of every fresh tree.
pub const ROOT_GROUP_ID: &str = "root";

/// 组内条件的组合方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    pub fn toggled(self) -> Self {
        match self {
            Logic::And => Logic::Or,
            Logic::Or => Logic::And,
        }
    }
}

/// 单个字段条件，例如 `status equals "open"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: NodeId,
    pub field: String,
    pub operator: OperatorId,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<String>,
}

impl Condition {
    /// A blank condition: no field, `equals`, empty value.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            field: String::new(),
            operator: OperatorId::Known(Operator::Equals),
            value: String::new(),
            value2: None,
        }
    }

    /// Reset operator and values when the current operator does not apply to `field_type`,
    /// then make `value2` agree with the operator's arity.
    ///
    /// `None` means the field is not in the catalog and is treated as an untyped string.
    pub fn reconcile_with_field(&mut self, field_type: Option<&FieldType>) {
        let class = field_type
            .cloned()
            .unwrap_or_else(|| FieldType::Other(String::new()));

        match self.operator.known() {
            Some(op) if op.applies_to(&class) => {}
            _ => {
                self.operator = OperatorId::Known(Operator::Equals);
                self.value.clear();
                self.value2 = None;
            }
        }
        self.align_value2();
    }

    /// `value2` is present exactly when the operator takes two values.
    pub fn align_value2(&mut self) {
        match self.operator.known().map(Operator::arity) {
            Some(ValueArity::Pair) => {
                if self.value2.is_none() {
                    self.value2 = Some(String::new());
                }
            }
            _ => self.value2 = None,
        }
    }
}

/// Partial update merged into a condition; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionUpdate {
    pub field: Option<String>,
    pub operator: Option<OperatorId>,
    pub value: Option<String>,
    /// `Some(None)` clears the second value
    pub value2: Option<Option<String>>,
}

impl ConditionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn operator(mut self, operator: impl Into<OperatorId>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn value2(mut self, value2: impl Into<String>) -> Self {
        self.value2 = Some(Some(value2.into()));
        self
    }

    pub fn clear_value2(mut self) -> Self {
        self.value2 = Some(None);
        self
    }

    pub fn apply(&self, condition: &mut Condition) {
        if let Some(field) = &self.field {
            condition.field = field.clone();
        }
        if let Some(operator) = &self.operator {
            condition.operator = operator.clone();
        }
        if let Some(value) = &self.value {
            condition.value = value.clone();
        }
        if let Some(value2) = &self.value2 {
            condition.value2 = value2.clone();
        }
    }
}

/// AND/OR 组，可以嵌套任意层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: NodeId,
    pub logic: Logic,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Default for Group {
    fn default() -> Self {
        Self::root()
    }
}

impl Group {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            logic: Logic::And,
            conditions: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// Empty AND root, the state of a freshly opened or reset builder.
    pub fn root() -> Self {
        Self::new(ROOT_GROUP_ID)
    }

    /// No conditions and no child groups.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.groups.is_empty()
    }

    /// Total number of conditions in this subtree.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
            + self
                .groups
                .iter()
                .map(Group::condition_count)
                .sum::<usize>()
    }

    pub fn find_group(&self, id: &str) -> Option<&Group> {
        if self.id == id {
            return Some(self);
        }
        self.groups.iter().find_map(|group| group.find_group(id))
    }

    pub fn find_group_mut(&mut self, id: &str) -> Option<&mut Group> {
        if self.id == id {
            return Some(self);
        }
        self.groups.iter_mut().find_map(|group| group.find_group_mut(id))
    }

    pub fn find_condition(&self, id: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|condition| condition.id == id)
            .or_else(|| self.groups.iter().find_map(|group| group.find_condition(id)))
    }

    /// Whether any group or condition in this subtree uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.find_group(id).is_some() || self.find_condition(id).is_some()
    }

    /// Copy the tree and run `edit` on the group `group_id`; a missing group leaves the copy unchanged.
    fn edit_group(&self, group_id: &str, edit: impl FnOnce(&mut Group)) -> Group {
        let mut root = self.clone();
        match root.find_group_mut(group_id) {
            Some(group) => edit(group),
            None => debug!(group_id, "group not found, edit ignored"),
        }
        root
    }

    pub fn add_condition(&self, group_id: &str, condition_id: impl Into<NodeId>) -> Group {
        let condition = Condition::new(condition_id);
        self.edit_group(group_id, move |group| group.conditions.push(condition))
    }

    pub fn remove_condition(&self, group_id: &str, condition_id: &str) -> Group {
        self.edit_group(group_id, |group| {
            group.conditions.retain(|condition| condition.id != condition_id)
        })
    }

    /// Shallow-merge `update` into the condition. Operator/value consistency with the
    /// field is not enforced here; see [`Condition::reconcile_with_field`].
    pub fn update_condition(
        &self,
        group_id: &str,
        condition_id: &str,
        update: &ConditionUpdate,
    ) -> Group {
        self.edit_group(group_id, |group| {
            match group
                .conditions
                .iter_mut()
                .find(|condition| condition.id == condition_id)
            {
                Some(condition) => update.apply(condition),
                None => debug!(group_id, condition_id, "condition not found, update ignored"),
            }
        })
    }

    pub fn add_group(&self, parent_group_id: &str, group_id: impl Into<NodeId>) -> Group {
        let child = Group::new(group_id);
        self.edit_group(parent_group_id, move |group| group.groups.push(child))
    }

    /// Remove a child group and its whole subtree.
    pub fn remove_group(&self, parent_group_id: &str, group_id: &str) -> Group {
        self.edit_group(parent_group_id, |group| {
            group.groups.retain(|child| child.id != group_id)
        })
    }

    /// Flip AND/OR on exactly this group.
    pub fn toggle_logic(&self, group_id: &str) -> Group {
        self.edit_group(group_id, |group| group.logic = group.logic.toggled())
    }
}

/// 为新节点生成在整棵树中唯一的id
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id of the form `<prefix><n>` not already used in `root`.
    pub fn next_id(&mut self, prefix: &str, root: &Group) -> NodeId {
        loop {
            self.next += 1;
            let id = format!("{prefix}{}", self.next);
            if !root.contains_id(&id) {
                return id;
            }
        }
    }
}
