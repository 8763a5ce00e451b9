//! nibbledb - chunked delete and export-then-delete for live tables
//!
//! A nibble removes (or copies to a sink, then removes) at most roughly one
//! chunk of rows per invocation so that maintenance never blows the latency
//! budget of regular transactions. The caller re-invokes until `left_rows`
//! reaches zero.

pub mod catalog;
pub mod config;
pub mod memdb;
pub mod nibble;
pub mod observability;
pub mod sql;
