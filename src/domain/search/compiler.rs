//! Search compiler module.
//!
//! This module turns a [`ConditionsTreeNode`] into a SQL predicate
//! with `?` placeholders. Values are always bound, never written into
//! the predicate.

use log::trace;
use regex::{Captures, Regex};

use super::{Attribute, ConditionsTreeNode, Error, Result, SearchCondition, SearchField};

const FULLTEXT_SELECTION: &str = "id IN (SELECT docid FROM messages_fulltext WHERE fulltext MATCH ?)";

/// Represents a compiled predicate and the values bound to its
/// placeholders, in order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WhereClause {
    pub selection: String,
    pub args: Vec<String>,
}

/// Compiles the given tree. A missing tree matches everything.
pub fn build_where_clause(tree: Option<&ConditionsTreeNode>) -> Result<WhereClause> {
    let mut clause = WhereClause::default();

    match tree {
        None => clause.selection.push('1'),
        Some(tree) => build_where_clause_internal(tree, &mut clause)?,
    }

    trace!("compiled search selection: {}", clause.selection);
    Ok(clause)
}

fn build_where_clause_internal(node: &ConditionsTreeNode, clause: &mut WhereClause) -> Result<()> {
    match node {
        ConditionsTreeNode::Condition(condition) => append_condition(condition, clause),
        ConditionsTreeNode::Not(child) => {
            clause.selection.push_str("NOT (");
            build_where_clause_internal(child, clause)?;
            clause.selection.push(')');
            Ok(())
        }
        ConditionsTreeNode::Binary {
            operator,
            left,
            right,
        } => {
            clause.selection.push('(');
            build_where_clause_internal(left, clause)?;
            clause.selection.push_str(") ");
            clause.selection.push_str(&operator.to_string());
            clause.selection.push_str(" (");
            build_where_clause_internal(right, clause)?;
            clause.selection.push(')');
            Ok(())
        }
    }
}

fn append_condition(condition: &SearchCondition, clause: &mut WhereClause) -> Result<()> {
    if condition.field == SearchField::MessageContents {
        if condition.attribute != Attribute::Contains {
            return Err(Error::InvalidFulltextAttribute(condition.attribute));
        }
        clause.selection.push_str(FULLTEXT_SELECTION);
        clause.args.push(condition.value.clone());
        return Ok(());
    }

    let column = condition
        .field
        .column()
        .ok_or(Error::UnmappedField(condition.field))?;
    let numeric = condition.field.is_numeric();

    let (comparison, value) = match condition.attribute {
        Attribute::Contains => ("LIKE", format!("%{}%", condition.value)),
        Attribute::Equals if numeric => ("=", condition.value.clone()),
        Attribute::Equals => ("LIKE", condition.value.clone()),
        Attribute::NotEquals if numeric => ("!=", condition.value.clone()),
        Attribute::NotEquals => ("NOT LIKE", condition.value.clone()),
    };

    clause.selection.push_str(column);
    clause.selection.push(' ');
    clause.selection.push_str(comparison);
    clause.selection.push_str(" ?");
    clause.args.push(value);
    Ok(())
}

/// Prefixes the bare references to the given columns found in the
/// selection. References that are part of a longer identifier or
/// that are already qualified are left as they are.
pub fn qualify_columns(columns: &[&str], prefix: &str, selection: &str) -> Result<String> {
    if columns.is_empty() {
        return Ok(selection.to_owned());
    }

    let alternatives: Vec<String> = columns.iter().map(|column| regex::escape(column)).collect();
    let pattern = format!(r"\b(?:{})\b", alternatives.join("|"));
    let regex = Regex::new(&pattern).map_err(Error::BuildQualifierError)?;

    let qualified = regex.replace_all(selection, |captures: &Captures| {
        let column = &captures[0];
        let start = captures.get(0).map_or(0, |m| m.start());
        let is_qualified = selection[..start].ends_with('.');
        let is_qualifier = selection[start + column.len()..].starts_with('.');

        if is_qualified || is_qualifier {
            column.to_owned()
        } else {
            format!("{}{}", prefix, column)
        }
    });

    Ok(qualified.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(field: SearchField, attribute: Attribute, value: &str) -> ConditionsTreeNode {
        ConditionsTreeNode::condition(field, attribute, value)
    }

    fn compile(tree: &ConditionsTreeNode) -> WhereClause {
        build_where_clause(Some(tree)).unwrap()
    }

    #[test]
    fn missing_tree_matches_everything() {
        let clause = build_where_clause(None).unwrap();
        assert_eq!(clause.selection, "1");
        assert!(clause.args.is_empty());
    }

    #[test]
    fn contains_on_text_column() {
        let clause = compile(&leaf(SearchField::Subject, Attribute::Contains, "foo"));
        assert_eq!(clause.selection, "subject LIKE ?");
        assert_eq!(clause.args, vec!["%foo%"]);
    }

    #[test]
    fn equals_on_numeric_and_text_columns() {
        let clause = compile(&leaf(SearchField::Read, Attribute::Equals, "1"));
        assert_eq!(clause.selection, "read = ?");
        assert_eq!(clause.args, vec!["1"]);

        let clause = compile(&leaf(SearchField::Sender, Attribute::Equals, "a@b.c"));
        assert_eq!(clause.selection, "sender_list LIKE ?");
        assert_eq!(clause.args, vec!["a@b.c"]);

        let clause = compile(&leaf(SearchField::ThreadRoot, Attribute::Equals, "12"));
        assert_eq!(clause.selection, "threads.root = ?");
    }

    #[test]
    fn not_equals() {
        let clause = compile(&leaf(SearchField::Folder, Attribute::NotEquals, "3"));
        assert_eq!(clause.selection, "folder_id != ?");

        let clause = compile(&leaf(SearchField::DisplayClass, Attribute::NotEquals, "NO_CLASS"));
        assert_eq!(clause.selection, "display_class NOT LIKE ?");
        assert_eq!(clause.args, vec!["NO_CLASS"]);
    }

    #[test]
    fn not_wraps_child() {
        let clause = compile(&leaf(SearchField::Flagged, Attribute::Equals, "1").not());
        assert_eq!(clause.selection, "NOT (flagged = ?)");
    }

    #[test]
    fn binary_operators_keep_args_in_order() {
        let tree = leaf(SearchField::Subject, Attribute::Contains, "a")
            .and(leaf(SearchField::Read, Attribute::Equals, "0"));
        let clause = compile(&tree);
        assert_eq!(clause.selection, "(subject LIKE ?) AND (read = ?)");
        assert_eq!(clause.args, vec!["%a%", "0"]);

        let tree = tree.or(leaf(SearchField::To, Attribute::Contains, "b").not());
        let clause = compile(&tree);
        assert_eq!(
            clause.selection,
            "((subject LIKE ?) AND (read = ?)) OR (NOT (to_list LIKE ?))"
        );
        assert_eq!(clause.args, vec!["%a%", "0", "%b%"]);
    }

    #[test]
    fn fulltext_condition() {
        let clause = compile(&leaf(SearchField::MessageContents, Attribute::Contains, "hello"));
        assert_eq!(
            clause.selection,
            "id IN (SELECT docid FROM messages_fulltext WHERE fulltext MATCH ?)"
        );
        assert_eq!(clause.args, vec!["hello"]);

        for attribute in [Attribute::Equals, Attribute::NotEquals] {
            assert!(matches!(
                build_where_clause(Some(&leaf(SearchField::MessageContents, attribute, "x"))),
                Err(Error::InvalidFulltextAttribute(a)) if a == attribute
            ));
        }
    }

    #[test]
    fn values_are_never_inlined() {
        for value in ["'; DROP TABLE messages; --", "100%", "a' OR '1'='1", "\"quoted\""] {
            for field in SearchField::ALL {
                for attribute in [Attribute::Contains, Attribute::Equals, Attribute::NotEquals] {
                    let tree = leaf(field, attribute, value).and(leaf(field, attribute, value).not());
                    if let Ok(clause) = build_where_clause(Some(&tree)) {
                        assert!(!clause.selection.contains(value), "{}", clause.selection);
                        assert_eq!(clause.selection.matches('?').count(), clause.args.len());
                        assert!(clause.args.iter().all(|arg| arg.contains(value)));
                    }
                }
            }
        }
    }

    #[test]
    fn qualify_bare_columns() {
        let columns = ["id", "read", "folder_id", "subject"];

        let qualified = qualify_columns(
            &columns,
            "messages.",
            "(read = ?) AND (folder_id != ?) AND (threads.root = ?) AND (subject LIKE ?)",
        )
        .unwrap();
        assert_eq!(
            qualified,
            "(messages.read = ?) AND (messages.folder_id != ?) AND (threads.root = ?) AND (messages.subject LIKE ?)"
        );
    }

    #[test]
    fn qualify_skips_longer_identifiers_and_qualified_columns() {
        let columns = ["id", "read"];

        let qualified = qualify_columns(
            &columns,
            "messages.",
            "folder_id = ? AND messages.id = ? AND thread_id = ? AND id IN (SELECT docid FROM x) AND unread = ? AND read = ?",
        )
        .unwrap();
        assert_eq!(
            qualified,
            "folder_id = ? AND messages.id = ? AND thread_id = ? AND messages.id IN (SELECT docid FROM x) AND unread = ? AND messages.read = ?"
        );
    }

    #[test]
    fn qualify_compiled_fulltext_selection() {
        let clause = compile(&leaf(SearchField::MessageContents, Attribute::Contains, "id"));
        let qualified = qualify_columns(&["id", "fulltext_id"], "messages.", &clause.selection).unwrap();
        assert_eq!(
            qualified,
            "messages.id IN (SELECT docid FROM messages_fulltext WHERE fulltext MATCH ?)"
        );
    }
}
