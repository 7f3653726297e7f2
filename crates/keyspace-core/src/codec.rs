//! Column codecs.
//!
//! A codec maps one source type onto a storage `Value`. Generated entity
//! code names a codec per field; the schema resolver decides which one.

use crate::{
    Error,
    traits::{ColumnValue, Enumerated},
    value::Value,
};
use serde::{Serialize, de::DeserializeOwned};
use std::{any::type_name, marker::PhantomData};
use thiserror::Error as ThisError;

///
/// CodecError
///

#[derive(Debug, ThisError)]
pub enum CodecError {
    #[error("expected a value decodable as {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown variant '{value}' for {enumeration}")]
    UnknownVariant {
        enumeration: &'static str,
        value: String,
    },

    #[error("json codec: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl CodecError {
    #[must_use]
    pub fn type_mismatch<T>(found: &Value) -> Self {
        Self::TypeMismatch {
            expected: type_name::<T>(),
            found: found.type_name(),
        }
    }

    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

///
/// Codec
///
/// Encode/decode pair between `Source` and its storage `Value`.
///

pub trait Codec {
    type Source;

    fn encode(source: &Self::Source) -> Result<Value, CodecError>;

    fn decode(value: &Value) -> Result<Self::Source, CodecError>;
}

///
/// NativeCodec
/// Built-in mapping through `ColumnValue`.
///

pub struct NativeCodec<T>(PhantomData<fn() -> T>);

impl<T: ColumnValue> Codec for NativeCodec<T> {
    type Source = T;

    fn encode(source: &T) -> Result<Value, CodecError> {
        Ok(source.to_value())
    }

    fn decode(value: &Value) -> Result<T, CodecError> {
        T::from_value(value).ok_or_else(|| CodecError::type_mismatch::<T>(value))
    }
}

///
/// EnumNameCodec
/// Enumeration stored as its variant name (text).
///

pub struct EnumNameCodec<T>(PhantomData<fn() -> T>);

impl<T: Enumerated> Codec for EnumNameCodec<T> {
    type Source = T;

    fn encode(source: &T) -> Result<Value, CodecError> {
        Ok(Value::Text(source.name().to_string()))
    }

    fn decode(value: &Value) -> Result<T, CodecError> {
        let Value::Text(name) = value else {
            return Err(CodecError::type_mismatch::<T>(value));
        };

        T::from_name(name).ok_or_else(|| CodecError::UnknownVariant {
            enumeration: type_name::<T>(),
            value: name.clone(),
        })
    }
}

///
/// EnumOrdinalCodec
/// Enumeration stored as its ordinal (int).
///

pub struct EnumOrdinalCodec<T>(PhantomData<fn() -> T>);

impl<T: Enumerated> Codec for EnumOrdinalCodec<T> {
    type Source = T;

    fn encode(source: &T) -> Result<Value, CodecError> {
        let ordinal = i32::try_from(source.ordinal())
            .map_err(|_| CodecError::custom("enumeration ordinal exceeds int range"))?;

        Ok(Value::Int(ordinal))
    }

    fn decode(value: &Value) -> Result<T, CodecError> {
        let Value::Int(ordinal) = value else {
            return Err(CodecError::type_mismatch::<T>(value));
        };

        usize::try_from(*ordinal)
            .ok()
            .and_then(T::from_ordinal)
            .ok_or_else(|| CodecError::UnknownVariant {
                enumeration: type_name::<T>(),
                value: ordinal.to_string(),
            })
    }
}

///
/// JsonCodec
/// Catch-all: the source is stored as one JSON text blob.
///

pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T: Serialize + DeserializeOwned> Codec for JsonCodec<T> {
    type Source = T;

    fn encode(source: &T) -> Result<Value, CodecError> {
        Ok(Value::Text(serde_json::to_string(source)?))
    }

    fn decode(value: &Value) -> Result<T, CodecError> {
        let Value::Text(text) = value else {
            return Err(CodecError::type_mismatch::<T>(value));
        };

        Ok(serde_json::from_str(text)?)
    }
}

//
// column helpers used by generated entity code
//

/// Encode a required column.
pub fn encode_column<C: Codec>(column: &'static str, source: &C::Source) -> Result<Value, Error> {
    C::encode(source).map_err(|source| Error::ColumnCodec { column, source })
}

/// Encode a list of values for an `IN` relation on `column`.
pub fn encode_column_list<C: Codec>(
    column: &'static str,
    sources: &[C::Source],
) -> Result<Value, Error> {
    sources
        .iter()
        .map(|source| encode_column::<C>(column, source))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::List)
}

/// Encode an optional column; `None` is written as `Null`.
pub fn encode_optional_column<C: Codec>(
    column: &'static str,
    source: Option<&C::Source>,
) -> Result<Value, Error> {
    source.map_or(Ok(Value::Null), |source| encode_column::<C>(column, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::{
        collections::{BTreeMap, BTreeSet},
        fmt::Debug,
        net::{IpAddr, Ipv4Addr, Ipv6Addr},
    };
    use uuid::Uuid;

    fn round_trip<T: ColumnValue + Debug + PartialEq>(value: &T) {
        let encoded = NativeCodec::<T>::encode(value).expect("encode");
        let decoded = NativeCodec::<T>::decode(&encoded).expect("decode");

        assert_eq!(&decoded, value);
    }

    #[test]
    fn scalar_boundary_values_round_trip() {
        round_trip(&String::new());
        round_trip(&"x".repeat(65_535));
        round_trip(&false);
        round_trip(&i8::MIN);
        round_trip(&i8::MAX);
        round_trip(&i16::MIN);
        round_trip(&0i32);
        round_trip(&i32::MAX);
        round_trip(&i64::MIN);
        round_trip(&f32::MIN_POSITIVE);
        round_trip(&f64::MAX);
        round_trip(&Vec::<u8>::new());
        round_trip(&Uuid::nil());
        round_trip(&DateTime::<Utc>::UNIX_EPOCH);
        round_trip(&NaiveDate::MIN);
        round_trip(&NaiveTime::MIN);
        round_trip(&IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        round_trip(&IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn collection_boundary_values_round_trip() {
        round_trip(&Vec::<i32>::new());
        round_trip(&(0..u16::MAX).map(i32::from).collect::<Vec<_>>());
        round_trip(&BTreeSet::from(["a".to_string(), String::new()]));
        round_trip(&BTreeMap::from([(0i64, vec![1u8, 2]), (i64::MAX, vec![])]));
        round_trip(&(1i32, "a".to_string(), Some(2.5f64)));
    }

    proptest! {
        #[test]
        fn text_round_trips(s in ".*") {
            round_trip(&s);
        }

        #[test]
        fn bigint_round_trips(v in any::<i64>()) {
            round_trip(&v);
        }

        #[test]
        fn int_round_trips(v in any::<i32>()) {
            round_trip(&v);
        }

        #[test]
        fn double_round_trips(v in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
            round_trip(&v);
        }

        #[test]
        fn blob_round_trips(v in proptest::collection::vec(any::<u8>(), 0..256)) {
            round_trip(&v);
        }

        #[test]
        fn timestamp_round_trips(millis in -62_000_000_000_000i64..200_000_000_000_000i64) {
            let ts = DateTime::<Utc>::from_timestamp_millis(millis).expect("in range");
            round_trip(&ts);
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Level {
        Low,
        High,
    }

    impl Enumerated for Level {
        const VARIANTS: &'static [Self] = &[Self::Low, Self::High];

        fn name(&self) -> &'static str {
            match self {
                Self::Low => "LOW",
                Self::High => "HIGH",
            }
        }
    }

    #[test]
    fn enum_codecs_store_name_or_ordinal() {
        assert_eq!(
            EnumNameCodec::<Level>::encode(&Level::High).unwrap(),
            Value::Text("HIGH".into())
        );
        assert_eq!(
            EnumOrdinalCodec::<Level>::encode(&Level::High).unwrap(),
            Value::Int(1)
        );
        assert_eq!(
            EnumOrdinalCodec::<Level>::decode(&Value::Int(0)).unwrap(),
            Level::Low
        );
        assert!(matches!(
            EnumNameCodec::<Level>::decode(&Value::Text("MEDIUM".into())),
            Err(CodecError::UnknownVariant { .. })
        ));
    }

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Prefs {
        theme: String,
        volume: u8,
    }

    #[test]
    fn json_codec_wraps_one_text_blob() {
        let prefs = Prefs {
            theme: "dark".into(),
            volume: 7,
        };
        let encoded = JsonCodec::<Prefs>::encode(&prefs).unwrap();

        assert_eq!(
            encoded,
            Value::Text(r#"{"theme":"dark","volume":7}"#.into())
        );
        assert_eq!(JsonCodec::<Prefs>::decode(&encoded).unwrap(), prefs);
        assert!(JsonCodec::<Prefs>::decode(&Value::Int(1)).is_err());
    }

    #[test]
    fn optional_columns_encode_none_as_null() {
        let value = encode_optional_column::<NativeCodec<i32>>("score", None).unwrap();

        assert_eq!(value, Value::Null);
    }
}
