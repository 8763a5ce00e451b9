//! Cutoff resolution
//!
//! COUNT always runs; its result is the "matching at invocation start"
//! figure that `left_rows` is derived from. When more than a chunk matches,
//! a value looked up by rank in scan order replaces the caller's bound, so
//! the following SELECT touches roughly one chunk:
//!
//! - LE and GE use the value at rank `chunk_size`
//! - LT and GT use the value at rank `chunk_size - 1` and select inclusively,
//!   so a run of ties at the cutoff is still moved rather than skipped
//!
//! Duplicates of the cutoff value on the included side can overrun the chunk.

use crate::catalog::Value;
use crate::sql::{ComparisonOperator, SqlExecutor};

use super::errors::{NibbleError, NibbleResult};
use super::statements::StatementSet;

/// Bound the SELECT runs with, plus the pre-invocation match count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cutoff {
    pub matching_rows: i64,
    pub bound: Value,
    /// True if a VALUE-AT lookup replaced the caller's bound
    pub tightened: bool,
    /// The SELECT must also admit rows equal to `bound`
    pub inclusive: bool,
}

impl Cutoff {
    /// Keeps the caller's bound and operator
    pub fn untightened(matching_rows: i64, bound: Value) -> Self {
        Self {
            matching_rows,
            bound,
            tightened: false,
            inclusive: false,
        }
    }
}

pub fn resolve_cutoff(
    executor: &mut impl SqlExecutor,
    statements: &StatementSet,
    operator: ComparisonOperator,
    bound: Value,
    chunk_size: i64,
) -> NibbleResult<Cutoff> {
    let count_stmt = &statements.count;
    let matching_rows = executor
        .execute(count_stmt, std::slice::from_ref(&bound))
        .map_err(|e| NibbleError::execution_failed(count_stmt.name(), e))?
        .as_scalar_long()
        .ok_or_else(|| NibbleError::unexpected_result(count_stmt.name(), "no scalar count"))?;

    if operator.is_equality() || matching_rows <= chunk_size {
        return Ok(Cutoff::untightened(matching_rows, bound));
    }

    let strict = operator.is_strict();
    let offset = if strict { chunk_size - 1 } else { chunk_size };
    let value_at = &statements.value_at;
    let result = executor
        .execute(value_at, &[Value::BigInt(offset)])
        .map_err(|e| NibbleError::execution_failed(value_at.name(), e))?;
    let cutoff = result
        .fetch_row(0)
        .and_then(|row| row.first())
        .cloned()
        .ok_or_else(|| {
            NibbleError::unexpected_result(
                value_at.name(),
                format!("no row at offset {} of {} matching rows", offset, matching_rows),
            )
        })?;

    Ok(Cutoff {
        matching_rows,
        bound: cutoff,
        tightened: true,
        inclusive: strict,
    })
}
