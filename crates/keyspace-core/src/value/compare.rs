use crate::value::Value;
use std::cmp::Ordering;

/// Strict comparator for identical orderable variants.
///
/// Returns `None` for mismatched variants, `Null`, maps and UDTs. Lists,
/// sets and tuples compare element-wise, shorter prefix first.
#[must_use]
pub fn strict_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::BigInt(a), Value::BigInt(b)) | (Value::Counter(a), Value::Counter(b)) => {
            Some(a.cmp(b))
        }
        (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
        (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Inet(a), Value::Inet(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::SmallInt(a), Value::SmallInt(b)) => Some(a.cmp(b)),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Time(a), Value::Time(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::TinyInt(a), Value::TinyInt(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
        (Value::List(a), Value::List(b))
        | (Value::Set(a), Value::Set(b))
        | (Value::Tuple(a), Value::Tuple(b)) => strict_cmp_seq(a, b),
        _ => None,
    }
}

fn strict_cmp_seq(left: &[Value], right: &[Value]) -> Option<Ordering> {
    for (a, b) in left.iter().zip(right) {
        match strict_cmp(a, b)? {
            Ordering::Equal => {}
            other => return Some(other),
        }
    }

    Some(left.len().cmp(&right.len()))
}
