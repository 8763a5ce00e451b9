//! Parameterized statements
//!
//! A statement is a resolved plan plus its rendered SQL text. The plan is
//! what executors run; the text exists for logs and diagnostics, and doubles
//! as the key executors may compile-and-cache under.

use std::fmt;

use crate::catalog::Value;

/// Comparison operator of a nibble predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    /// column < bound
    Lt,
    /// column <= bound
    Le,
    /// column > bound
    Gt,
    /// column >= bound
    Ge,
    /// column = bound
    Eq,
}

impl ComparisonOperator {
    /// Parses "LT", "LE", "GT", "GE" or "EQ" (case-insensitive, trimmed)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LT" => Some(ComparisonOperator::Lt),
            "LE" => Some(ComparisonOperator::Le),
            "GT" => Some(ComparisonOperator::Gt),
            "GE" => Some(ComparisonOperator::Ge),
            "EQ" => Some(ComparisonOperator::Eq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Lt => "LT",
            ComparisonOperator::Le => "LE",
            ComparisonOperator::Gt => "GT",
            ComparisonOperator::Ge => "GE",
            ComparisonOperator::Eq => "EQ",
        }
    }

    /// SQL symbol used when rendering statements
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Eq => "=",
        }
    }

    pub fn is_equality(&self) -> bool {
        matches!(self, ComparisonOperator::Eq)
    }

    /// The operator that also admits the bound itself (LT to LE, GT to GE)
    pub fn inclusive(&self) -> Self {
        match self {
            ComparisonOperator::Lt => ComparisonOperator::Le,
            ComparisonOperator::Gt => ComparisonOperator::Ge,
            other => *other,
        }
    }

    pub fn is_strict(&self) -> bool {
        matches!(self, ComparisonOperator::Lt | ComparisonOperator::Gt)
    }

    /// Evaluates `value <op> bound`
    pub fn matches(&self, value: &Value, bound: &Value) -> bool {
        match self {
            ComparisonOperator::Lt => value < bound,
            ComparisonOperator::Le => value <= bound,
            ComparisonOperator::Gt => value > bound,
            ComparisonOperator::Ge => value >= bound,
            ComparisonOperator::Eq => value == bound,
        }
    }

    /// Scan direction that visits matching rows closest to the open end first.
    ///
    /// Less-than predicates match a prefix of the index, greater-than
    /// predicates a suffix, so the rank-th value in this direction is always
    /// inside the matching range while rank < match count.
    pub fn scan_order(&self) -> SortOrder {
        match self {
            ComparisonOperator::Gt | ComparisonOperator::Ge => SortOrder::Descending,
            ComparisonOperator::Lt | ComparisonOperator::Le | ComparisonOperator::Eq => {
                SortOrder::Ascending
            }
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Statement kind, for logging and execution tracing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Count,
    Select,
    Insert,
    Delete,
    ValueAt,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Count => "COUNT",
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Delete => "DELETE",
            StatementKind::ValueAt => "VALUE_AT",
        }
    }
}

/// Executable statement plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementPlan {
    /// `SELECT COUNT(*) FROM table WHERE column <op> ?`
    Count {
        table: String,
        column: String,
        operator: ComparisonOperator,
        index: Option<String>,
    },
    /// `SELECT * FROM table WHERE column <op> ? ORDER BY column <order>`
    Select {
        table: String,
        column: String,
        operator: ComparisonOperator,
        order: SortOrder,
        index: Option<String>,
    },
    /// `INSERT INTO table VALUES (?, ...)`
    Insert { table: String, arity: usize },
    /// `DELETE FROM table WHERE k1 = ? AND ...`
    Delete {
        table: String,
        key_columns: Vec<String>,
    },
    /// `SELECT column FROM table ORDER BY column <order> LIMIT 1 OFFSET ?`
    ValueAt {
        table: String,
        column: String,
        order: SortOrder,
        index: Option<String>,
    },
}

impl StatementPlan {
    pub fn kind(&self) -> StatementKind {
        match self {
            StatementPlan::Count { .. } => StatementKind::Count,
            StatementPlan::Select { .. } => StatementKind::Select,
            StatementPlan::Insert { .. } => StatementKind::Insert,
            StatementPlan::Delete { .. } => StatementKind::Delete,
            StatementPlan::ValueAt { .. } => StatementKind::ValueAt,
        }
    }

    /// Number of positional parameters the plan binds
    pub fn parameter_count(&self) -> usize {
        match self {
            StatementPlan::Count { .. }
            | StatementPlan::Select { .. }
            | StatementPlan::ValueAt { .. } => 1,
            StatementPlan::Insert { arity, .. } => *arity,
            StatementPlan::Delete { key_columns, .. } => key_columns.len(),
        }
    }

    /// Target table of the plan
    pub fn table(&self) -> &str {
        match self {
            StatementPlan::Count { table, .. }
            | StatementPlan::Select { table, .. }
            | StatementPlan::Insert { table, .. }
            | StatementPlan::Delete { table, .. }
            | StatementPlan::ValueAt { table, .. } => table,
        }
    }

    /// Renders the plan as SQL text
    pub fn render(&self) -> String {
        match self {
            StatementPlan::Count {
                table,
                column,
                operator,
                ..
            } => format!(
                "SELECT COUNT(*) FROM {} WHERE {} {} ?;",
                table,
                column,
                operator.sql_symbol()
            ),
            StatementPlan::Select {
                table,
                column,
                operator,
                order,
                ..
            } => format!(
                "SELECT * FROM {} WHERE {} {} ? ORDER BY {} {};",
                table,
                column,
                operator.sql_symbol(),
                column,
                order.as_sql()
            ),
            StatementPlan::Insert { table, arity } => {
                let placeholders = vec!["?"; *arity].join(", ");
                format!("INSERT INTO {} VALUES ({});", table, placeholders)
            }
            StatementPlan::Delete { table, key_columns } => {
                let predicate = key_columns
                    .iter()
                    .map(|k| format!("{} = ?", k))
                    .collect::<Vec<_>>()
                    .join(" AND ");
                format!("DELETE FROM {} WHERE {};", table, predicate)
            }
            StatementPlan::ValueAt {
                table,
                column,
                order,
                ..
            } => format!(
                "SELECT {} FROM {} ORDER BY {} {} LIMIT 1 OFFSET ?;",
                column,
                table,
                column,
                order.as_sql()
            ),
        }
    }
}

/// A named, resolved statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    name: String,
    sql: String,
    plan: StatementPlan,
}

impl Statement {
    pub fn new(name: impl Into<String>, plan: StatementPlan) -> Self {
        Self {
            name: name.into(),
            sql: plan.render(),
            plan,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn plan(&self) -> &StatementPlan {
        &self.plan
    }

    pub fn kind(&self) -> StatementKind {
        self.plan.kind()
    }

    pub fn parameter_count(&self) -> usize {
        self.plan.parameter_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse() {
        assert_eq!(ComparisonOperator::parse("LT"), Some(ComparisonOperator::Lt));
        assert_eq!(ComparisonOperator::parse(" ge "), Some(ComparisonOperator::Ge));
        assert_eq!(ComparisonOperator::parse("eq"), Some(ComparisonOperator::Eq));
        assert_eq!(ComparisonOperator::parse("NE"), None);
        assert_eq!(ComparisonOperator::parse(""), None);
    }

    #[test]
    fn test_operator_matches() {
        let five = Value::Integer(5);
        assert!(ComparisonOperator::Lt.matches(&Value::Integer(4), &five));
        assert!(!ComparisonOperator::Lt.matches(&five, &five));
        assert!(ComparisonOperator::Le.matches(&five, &five));
        assert!(ComparisonOperator::Gt.matches(&Value::Integer(6), &five));
        assert!(ComparisonOperator::Ge.matches(&five, &five));
        assert!(ComparisonOperator::Eq.matches(&five, &five));
        assert!(!ComparisonOperator::Eq.matches(&Value::Integer(6), &five));
    }

    #[test]
    fn test_scan_order() {
        assert_eq!(ComparisonOperator::Lt.scan_order(), SortOrder::Ascending);
        assert_eq!(ComparisonOperator::Ge.scan_order(), SortOrder::Descending);
        assert_eq!(ComparisonOperator::Eq.scan_order(), SortOrder::Ascending);
    }

    #[test]
    fn test_inclusive_counterpart() {
        assert_eq!(ComparisonOperator::Lt.inclusive(), ComparisonOperator::Le);
        assert_eq!(ComparisonOperator::Gt.inclusive(), ComparisonOperator::Ge);
        assert_eq!(ComparisonOperator::Ge.inclusive(), ComparisonOperator::Ge);
        assert_eq!(ComparisonOperator::Eq.inclusive(), ComparisonOperator::Eq);
        assert!(ComparisonOperator::Gt.is_strict());
        assert!(!ComparisonOperator::Le.is_strict());
    }

    #[test]
    fn test_render_sql() {
        let count = StatementPlan::Count {
            table: "events".into(),
            column: "ts".into(),
            operator: ComparisonOperator::Le,
            index: None,
        };
        assert_eq!(count.render(), "SELECT COUNT(*) FROM events WHERE ts <= ?;");

        let delete = StatementPlan::Delete {
            table: "events".into(),
            key_columns: vec!["region".into(), "id".into()],
        };
        assert_eq!(
            delete.render(),
            "DELETE FROM events WHERE region = ? AND id = ?;"
        );
        assert_eq!(delete.parameter_count(), 2);

        let insert = StatementPlan::Insert {
            table: "sink".into(),
            arity: 3,
        };
        assert_eq!(insert.render(), "INSERT INTO sink VALUES (?, ?, ?);");

        let value_at = StatementPlan::ValueAt {
            table: "events".into(),
            column: "ts".into(),
            order: SortOrder::Descending,
            index: Some("events_ts".into()),
        };
        assert_eq!(
            value_at.render(),
            "SELECT ts FROM events ORDER BY ts DESC LIMIT 1 OFFSET ?;"
        );
    }

    #[test]
    fn test_statement_carries_rendered_sql() {
        let stmt = Statement::new(
            "events.nibbleSelectLT",
            StatementPlan::Select {
                table: "events".into(),
                column: "ts".into(),
                operator: ComparisonOperator::Lt,
                order: SortOrder::Ascending,
                index: None,
            },
        );
        assert_eq!(stmt.kind(), StatementKind::Select);
        assert_eq!(stmt.sql(), "SELECT * FROM events WHERE ts < ? ORDER BY ts ASC;");
        assert_eq!(stmt.name(), "events.nibbleSelectLT");
    }
}
