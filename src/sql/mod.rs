//! SQL statement surface shared by the nibble procedures and executors
//!
//! The nibble procedures never parse SQL. They build `Statement`s (a plan
//! plus rendered text) and hand them, with positional parameters, to a
//! `SqlExecutor` bound to the caller's current transaction.

mod errors;
mod result;
mod statement;

pub use errors::{ExecutionError, ExecutionResult};
pub use result::{ResultColumn, ResultTable};
pub use statement::{ComparisonOperator, SortOrder, Statement, StatementKind, StatementPlan};

use crate::catalog::Value;

/// Executes resolved statements inside the current transaction
pub trait SqlExecutor {
    /// Executes `statement` with positional `params`.
    ///
    /// Writes are only visible if the surrounding transaction commits.
    fn execute(&mut self, statement: &Statement, params: &[Value]) -> ExecutionResult<ResultTable>;
}
