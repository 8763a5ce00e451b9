//! Chunked delete and export-then-delete
//!
//! A chunked invocation runs, inside the caller's transaction:
//!
//! 1. validation (before any statement executes)
//! 2. index selection for the nibble column
//! 3. statement resolution, cached per (table, column, operator, sink)
//! 4. COUNT, and when more than a chunk matches, a VALUE-AT cutoff lookup
//! 5. SELECT with the effective bound, then per row INSERT into the sink
//!    (if any) and DELETE by primary key
//!
//! and reports `(exported_rows, left_rows)` where `left_rows` is the COUNT
//! minus the rows moved. Callers re-invoke until `left_rows` is zero.
//!
//! The delete-only form deletes one key at a time with no chunking.

mod cutoff;
mod engine;
mod errors;
mod index_selector;
mod mover;
mod progress;
mod request;
mod statements;
mod validation;

pub use cutoff::{resolve_cutoff, Cutoff};
pub use engine::NibbleEngine;
pub use errors::{NibbleError, NibbleErrorCode, NibbleResult};
pub use index_selector::{select_index, IndexSelection};
pub use mover::move_rows;
pub use progress::{NibbleProgress, EXPORTED_ROWS, LEFT_ROWS};
pub use request::NibbleRequest;
pub use statements::{
    resolve_delete_by_column, resolve_statements, CacheLookup, StatementCache, StatementKey,
    StatementSet,
};
pub use validation::{
    bound_from_table, check_bound_type, check_chunk_size, parse_operator, validate_target,
    ValidatedTarget,
};
