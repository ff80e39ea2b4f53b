pub mod flag;
pub use flag::{Flag, Flags};

pub mod search;
pub use search::{
    build_where_clause, qualify_columns, Attribute, ConditionsTreeNode, Operator,
    SearchCondition, SearchField, WhereClause,
};
