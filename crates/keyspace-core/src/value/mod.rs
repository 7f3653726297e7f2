mod compare;


use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, net::IpAddr};
use uuid::Uuid;

pub use compare::strict_cmp;

///
/// Value
///
/// Storage-side value of one column, collection element, tuple slot or UDT
/// field. `Null` stands for an absent cell.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[remain::sorted]
pub enum Value {
    BigInt(i64),
    Blob(Vec<u8>),
    Boolean(bool),
    Counter(i64),
    Date(NaiveDate),
    Double(f64),
    Float(f32),
    Inet(IpAddr),
    Int(i32),
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Null,
    Set(Vec<Value>),
    SmallInt(i16),
    Text(String),
    Time(NaiveTime),
    Timestamp(DateTime<Utc>),
    TinyInt(i8),
    Tuple(Vec<Value>),
    Udt(Vec<(String, Value)>),
    Uuid(Uuid),
}

impl Value {
    /// Short CQL-flavoured name of the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::BigInt(_) => "bigint",
            Self::Blob(_) => "blob",
            Self::Boolean(_) => "boolean",
            Self::Counter(_) => "counter",
            Self::Date(_) => "date",
            Self::Double(_) => "double",
            Self::Float(_) => "float",
            Self::Inet(_) => "inet",
            Self::Int(_) => "int",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Null => "null",
            Self::Set(_) => "set",
            Self::SmallInt(_) => "smallint",
            Self::Text(_) => "text",
            Self::Time(_) => "time",
            Self::Timestamp(_) => "timestamp",
            Self::TinyInt(_) => "tinyint",
            Self::Tuple(_) => "tuple",
            Self::Udt(_) => "udt",
            Self::Uuid(_) => "uuid",
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Ordering between two values of the same orderable variant.
    #[must_use]
    pub fn strict_cmp(&self, other: &Self) -> Option<Ordering> {
        strict_cmp(self, other)
    }

    /// Look up a named UDT field; absent fields read as `Null`.
    #[must_use]
    pub fn udt_field(&self, name: &str) -> Option<&Self> {
        match self {
            Self::Udt(fields) => Some(
                fields
                    .iter()
                    .find(|(field, _)| field == name)
                    .map_or(&Self::Null, |(_, value)| value),
            ),
            _ => None,
        }
    }
}
