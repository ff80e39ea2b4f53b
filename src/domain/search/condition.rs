use std::fmt;

use super::{Attribute, SearchField};

/// Represents a leaf of the search tree: one field compared to one
/// value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchCondition {
    pub field: SearchField,
    pub attribute: Attribute,
    pub value: String,
}

impl SearchCondition {
    pub fn new<V: ToString>(field: SearchField, attribute: Attribute, value: V) -> Self {
        Self {
            field,
            attribute,
            value: value.to_string(),
        }
    }
}

/// Represents the operators joining two subtrees.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operator {
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

/// Represents a boolean search tree.
///
/// A search without any condition is expressed with `None` where a
/// tree is expected, and matches everything.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConditionsTreeNode {
    Condition(SearchCondition),
    Not(Box<ConditionsTreeNode>),
    Binary {
        operator: Operator,
        left: Box<ConditionsTreeNode>,
        right: Box<ConditionsTreeNode>,
    },
}

impl ConditionsTreeNode {
    pub fn condition<V: ToString>(field: SearchField, attribute: Attribute, value: V) -> Self {
        Self::Condition(SearchCondition::new(field, attribute, value))
    }

    pub fn and(self, other: impl Into<Self>) -> Self {
        self.join(Operator::And, other.into())
    }

    pub fn or(self, other: impl Into<Self>) -> Self {
        self.join(Operator::Or, other.into())
    }

    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    fn join(self, operator: Operator, other: Self) -> Self {
        Self::Binary {
            operator,
            left: Box::new(self),
            right: Box::new(other),
        }
    }

    /// Returns the leaves of the tree, left to right.
    pub fn leaves(&self) -> Vec<&SearchCondition> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];

        while let Some(node) = stack.pop() {
            match node {
                Self::Condition(condition) => leaves.push(condition),
                Self::Not(child) => stack.push(child),
                Self::Binary { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }

        leaves
    }
}

impl From<SearchCondition> for ConditionsTreeNode {
    fn from(condition: SearchCondition) -> Self {
        Self::Condition(condition)
    }
}
