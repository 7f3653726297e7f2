use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::{
    collections::{BTreeMap, BTreeSet},
    net::IpAddr,
};
use uuid::Uuid;

///
/// ColumnValue
///
/// Lossless conversion between a Rust value and its storage `Value`.
/// Collections read `Null` as empty; `Option` reads `Null` as `None`.
///

pub trait ColumnValue: Sized {
    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> Option<Self>;
}

///
/// Enumerated
///
/// Closed enumeration stored either by variant name or by ordinal
/// (position in `VARIANTS`).
///

pub trait Enumerated: Clone + PartialEq + Sized + 'static {
    const VARIANTS: &'static [Self];

    fn name(&self) -> &'static str;

    fn ordinal(&self) -> usize {
        Self::VARIANTS
            .iter()
            .position(|variant| variant == self)
            .unwrap_or_default()
    }

    #[must_use]
    fn from_name(name: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|variant| variant.name() == name)
            .cloned()
    }

    #[must_use]
    fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::VARIANTS.get(ordinal).cloned()
    }
}

/// Read one named field out of a UDT value; absent fields read as `Null`.
#[must_use]
pub fn udt_field<T: ColumnValue>(value: &Value, name: &str) -> Option<T> {
    T::from_value(value.udt_field(name)?)
}

//
// scalars
//

macro_rules! impl_scalar {
    ($ty:ty, $variant:ident) => {
        impl ColumnValue for $ty {
            fn to_value(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

impl_scalar!(String, Text);
impl_scalar!(bool, Boolean);
impl_scalar!(i8, TinyInt);
impl_scalar!(i16, SmallInt);
impl_scalar!(i32, Int);
impl_scalar!(f32, Float);
impl_scalar!(f64, Double);
impl_scalar!(Vec<u8>, Blob);
impl_scalar!(Uuid, Uuid);
impl_scalar!(DateTime<Utc>, Timestamp);
impl_scalar!(NaiveDate, Date);
impl_scalar!(NaiveTime, Time);
impl_scalar!(IpAddr, Inet);

// bigint and counter columns share i64
impl ColumnValue for i64 {
    fn to_value(&self) -> Value {
        Value::BigInt(*self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::BigInt(v) | Value::Counter(v) => Some(*v),
            _ => None,
        }
    }
}

//
// optional
//

impl<T: ColumnValue> ColumnValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, ColumnValue::to_value)
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

//
// collections
//

impl<T: ColumnValue> ColumnValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ColumnValue::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::List(items) | Value::Set(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<T: ColumnValue + Ord> ColumnValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(ColumnValue::to_value).collect())
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Set(items) | Value::List(items) => items.iter().map(T::from_value).collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

impl<K: ColumnValue + Ord, V: ColumnValue> ColumnValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_value(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| Some((K::from_value(k)?, V::from_value(v)?)))
                .collect(),
            Value::Null => Some(Self::new()),
            _ => None,
        }
    }
}

//
// tuples
//

macro_rules! impl_tuple {
    ($len:literal => $($name:ident : $idx:tt),+) => {
        impl<$($name: ColumnValue),+> ColumnValue for ($($name,)+) {
            fn to_value(&self) -> Value {
                Value::Tuple(vec![$(self.$idx.to_value()),+])
            }

            fn from_value(value: &Value) -> Option<Self> {
                let Value::Tuple(items) = value else {
                    return None;
                };
                if items.len() != $len {
                    return None;
                }

                Some(($($name::from_value(&items[$idx])?,)+))
            }
        }
    };
}

impl_tuple!(1 => A: 0);
impl_tuple!(2 => A: 0, B: 1);
impl_tuple!(3 => A: 0, B: 1, C: 2);
impl_tuple!(4 => A: 0, B: 1, C: 2, D: 3);
impl_tuple!(5 => A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple!(6 => A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
