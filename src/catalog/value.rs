//! Typed SQL values and column types
//!
//! Values carry their own runtime type so that bound parameters can be
//! checked against a column's declared type before any statement runs.
//!
//! Ordering is total and deterministic. Values of the same type compare
//! naturally (floats via `total_cmp`); values of different types order by
//! type rank: TinyInt < SmallInt < Integer < BigInt < Float < Timestamp <
//! Varchar < Varbinary.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// 8-bit signed integer
    TinyInt,
    /// 16-bit signed integer
    SmallInt,
    /// 32-bit signed integer
    Integer,
    /// 64-bit signed integer
    BigInt,
    /// 64-bit floating point
    Float,
    /// UTC timestamp
    Timestamp,
    /// UTF-8 string
    Varchar,
    /// Raw bytes
    Varbinary,
}

impl ColumnType {
    /// Returns the SQL type name
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::TinyInt => "TINYINT",
            ColumnType::SmallInt => "SMALLINT",
            ColumnType::Integer => "INTEGER",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Varbinary => "VARBINARY",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ColumnType::TinyInt => 0,
            ColumnType::SmallInt => 1,
            ColumnType::Integer => 2,
            ColumnType::BigInt => 3,
            ColumnType::Float => 4,
            ColumnType::Timestamp => 5,
            ColumnType::Varchar => 6,
            ColumnType::Varbinary => 7,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single typed SQL value
#[derive(Debug, Clone)]
pub enum Value {
    TinyInt(i8),
    SmallInt(i16),
    Integer(i32),
    BigInt(i64),
    Float(f64),
    Timestamp(DateTime<Utc>),
    Varchar(String),
    Varbinary(Vec<u8>),
}

impl Value {
    /// Returns the runtime type of this value
    pub fn value_type(&self) -> ColumnType {
        match self {
            Value::TinyInt(_) => ColumnType::TinyInt,
            Value::SmallInt(_) => ColumnType::SmallInt,
            Value::Integer(_) => ColumnType::Integer,
            Value::BigInt(_) => ColumnType::BigInt,
            Value::Float(_) => ColumnType::Float,
            Value::Timestamp(_) => ColumnType::Timestamp,
            Value::Varchar(_) => ColumnType::Varchar,
            Value::Varbinary(_) => ColumnType::Varbinary,
        }
    }

    /// Widens any integer value to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::TinyInt(v) => Some(i64::from(*v)),
            Value::SmallInt(v) => Some(i64::from(*v)),
            Value::Integer(v) => Some(i64::from(*v)),
            Value::BigInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Create a varchar value
    pub fn varchar(v: impl Into<String>) -> Self {
        Value::Varchar(v.into())
    }

    /// Create a timestamp from microseconds since the Unix epoch
    pub fn timestamp_micros(micros: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp_micros(micros).map(Value::Timestamp)
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::TinyInt(a), Value::TinyInt(b)) => a.cmp(b),
            (Value::SmallInt(a), Value::SmallInt(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::BigInt(a), Value::BigInt(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Varchar(a), Value::Varchar(b)) => a.cmp(b),
            (Value::Varbinary(a), Value::Varbinary(b)) => a.cmp(b),
            _ => self.value_type().rank().cmp(&other.value_type().rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::TinyInt(v) => write!(f, "{}", v),
            Value::SmallInt(v) => write!(f, "{}", v),
            Value::Integer(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Varchar(v) => write!(f, "'{}'", v),
            Value::Varbinary(v) => write!(f, "x'{}'", v.iter().map(|b| format!("{:02x}", b)).collect::<String>()),
        }
    }
}
