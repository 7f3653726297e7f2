//! Type and codec resolution.
//!
//! Every field resolves to exactly one strategy, tried in order: an explicit
//! codec, an enumeration, the built-in mapping, then JSON. Field markers are
//! explicit choices and win over the built-in mapping; identifier types
//! registered as JSON-capable are the fallback when nothing else applies.

use crate::{
    decl::EnumEncoding,
    model::{CodecMarker, FieldModel, ShapeKind, UdtModel, ValueShape},
    types::ScalarType,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Path prefix generated code uses to reach re-exported crates.
pub const REEXPORTS: &str = "::keyspace::__reexports";

/// Largest tuple arity with a built-in mapping.
pub const MAX_TUPLE_ARITY: usize = 6;

///
/// ResolveError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolveError {
    #[error("unsupported type '{ty}', provide an explicit codec")]
    Unsupported { ty: String },

    #[error("'{ty}' has no total order and cannot be a set element or map key")]
    UnorderedElement { ty: String },

    #[error("unknown user type '{name}'")]
    UnknownUdt { name: String },
}

///
/// ResolvedCodec
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResolvedCodec {
    Explicit { path: String, rust_type: String },
    Enumerated { rust_type: String, encoding: EnumEncoding },
    Native { rust_type: String },
    Json { rust_type: String },
}

impl ResolvedCodec {
    /// Rust type of the field value (before any `Option` wrapping).
    #[must_use]
    pub fn rust_type(&self) -> &str {
        match self {
            Self::Explicit { rust_type, .. }
            | Self::Enumerated { rust_type, .. }
            | Self::Native { rust_type }
            | Self::Json { rust_type } => rust_type,
        }
    }

    /// Type implementing `keyspace::core::codec::Codec` for this field.
    #[must_use]
    pub fn codec_type(&self) -> String {
        match self {
            Self::Explicit { path, .. } => path.clone(),
            Self::Enumerated {
                rust_type,
                encoding: EnumEncoding::Name,
            } => format!("::keyspace::core::codec::EnumNameCodec<{rust_type}>"),
            Self::Enumerated {
                rust_type,
                encoding: EnumEncoding::Ordinal,
            } => format!("::keyspace::core::codec::EnumOrdinalCodec<{rust_type}>"),
            Self::Native { rust_type } => {
                format!("::keyspace::core::codec::NativeCodec<{rust_type}>")
            }
            Self::Json { rust_type } => format!("::keyspace::core::codec::JsonCodec<{rust_type}>"),
        }
    }

    /// CQL storage type override; `None` keeps the declared shape.
    #[must_use]
    pub const fn storage_override(&self) -> Option<&'static str> {
        match self {
            Self::Enumerated {
                encoding: EnumEncoding::Name,
                ..
            }
            | Self::Json { .. } => Some("text"),
            Self::Enumerated {
                encoding: EnumEncoding::Ordinal,
                ..
            } => Some("int"),
            Self::Explicit { .. } | Self::Native { .. } => None,
        }
    }
}

///
/// CodecRegistry
///
/// Built once per build and passed explicitly. Holds the identifier types
/// that may be stored as JSON text when no user type of that name exists.
///

#[derive(Clone, Debug, Default)]
pub struct CodecRegistry {
    json_types: BTreeMap<String, String>,
}

impl CodecRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `ident` (as written in field types) as a JSON-capable type.
    #[must_use]
    pub fn with_json_type(mut self, ident: impl Into<String>, rust_type: impl Into<String>) -> Self {
        self.json_types
            .insert(ident.into().to_ascii_lowercase(), rust_type.into());
        self
    }

    #[must_use]
    pub fn is_json_type(&self, ident: &str) -> bool {
        self.json_types.contains_key(&ident.to_ascii_lowercase())
    }

    pub fn resolve(
        &self,
        field: &FieldModel,
        udts: &[UdtModel],
    ) -> Result<ResolvedCodec, ResolveError> {
        match &field.codec {
            CodecMarker::Explicit { path, rust_type } => {
                return Ok(ResolvedCodec::Explicit {
                    path: path.clone(),
                    rust_type: rust_type.clone(),
                });
            }
            CodecMarker::Enumerated {
                rust_type,
                encoding,
            } => {
                return Ok(ResolvedCodec::Enumerated {
                    rust_type: rust_type.clone(),
                    encoding: *encoding,
                });
            }
            CodecMarker::Json { rust_type } => {
                return Ok(ResolvedCodec::Json {
                    rust_type: rust_type.clone(),
                });
            }
            CodecMarker::None => {}
        }

        match native_type(&field.shape, udts) {
            Ok(rust_type) => Ok(ResolvedCodec::Native { rust_type }),
            Err(err) => match &field.shape.kind {
                ShapeKind::Udt(ident) if udts.iter().all(|udt| &udt.type_name != ident) => self
                    .json_types
                    .get(&ident.to_ascii_lowercase())
                    .map(|rust_type| ResolvedCodec::Json {
                        rust_type: rust_type.clone(),
                    })
                    .ok_or(err),
                _ => Err(err),
            },
        }
    }
}

/// Built-in Rust type for a storage shape.
pub fn native_type(shape: &ValueShape, udts: &[UdtModel]) -> Result<String, ResolveError> {
    let ty = match &shape.kind {
        ShapeKind::Scalar(scalar) => scalar_type(*scalar)?,
        ShapeKind::Counter => "i64".to_string(),
        ShapeKind::List(inner) => format!("::std::vec::Vec<{}>", native_type(inner, udts)?),
        ShapeKind::Set(inner) => {
            require_ordered(inner, udts)?;
            format!(
                "::std::collections::BTreeSet<{}>",
                native_type(inner, udts)?
            )
        }
        ShapeKind::Map(key, value) => {
            require_ordered(key, udts)?;
            format!(
                "::std::collections::BTreeMap<{}, {}>",
                native_type(key, udts)?,
                native_type(value, udts)?
            )
        }
        ShapeKind::Tuple(items) => {
            if items.is_empty() || items.len() > MAX_TUPLE_ARITY {
                return Err(ResolveError::Unsupported {
                    ty: shape.to_string(),
                });
            }
            let items = items
                .iter()
                .map(|item| native_type(item, udts))
                .collect::<Result<Vec<_>, _>>()?;
            if items.len() == 1 {
                format!("({},)", items[0])
            } else {
                format!("({})", items.join(", "))
            }
        }
        ShapeKind::Udt(type_name) => find_udt(type_name, udts)?.name.clone(),
    };

    Ok(ty)
}

/// Whether values of `shape` have a total order (set elements, map keys,
/// derived `Ord` on generated user types).
#[must_use]
pub fn is_orderable(shape: &ValueShape, udts: &[UdtModel]) -> bool {
    is_orderable_guarded(shape, udts, 0)
}

fn is_orderable_guarded(shape: &ValueShape, udts: &[UdtModel], depth: usize) -> bool {
    // user types may reference each other; cycles are rejected elsewhere
    if depth > udts.len() + 1 {
        return false;
    }

    match &shape.kind {
        ShapeKind::Scalar(scalar) => !scalar.is_float(),
        ShapeKind::Counter => true,
        ShapeKind::List(inner) | ShapeKind::Set(inner) => {
            is_orderable_guarded(inner, udts, depth)
        }
        ShapeKind::Map(key, value) => {
            is_orderable_guarded(key, udts, depth) && is_orderable_guarded(value, udts, depth)
        }
        ShapeKind::Tuple(items) => items
            .iter()
            .all(|item| is_orderable_guarded(item, udts, depth)),
        ShapeKind::Udt(type_name) => find_udt(type_name, udts).is_ok_and(|udt| {
            udt.fields
                .iter()
                .all(|field| is_orderable_guarded(&field.shape, udts, depth + 1))
        }),
    }
}

fn require_ordered(shape: &ValueShape, udts: &[UdtModel]) -> Result<(), ResolveError> {
    if is_orderable(shape, udts) {
        Ok(())
    } else {
        Err(ResolveError::UnorderedElement {
            ty: shape.to_string(),
        })
    }
}

fn find_udt<'a>(type_name: &str, udts: &'a [UdtModel]) -> Result<&'a UdtModel, ResolveError> {
    udts.iter()
        .find(|udt| udt.type_name == type_name)
        .ok_or_else(|| ResolveError::UnknownUdt {
            name: type_name.to_string(),
        })
}

fn scalar_type(scalar: ScalarType) -> Result<String, ResolveError> {
    let ty = match scalar {
        ScalarType::Ascii | ScalarType::Text | ScalarType::Varchar => "String".to_string(),
        ScalarType::Boolean => "bool".to_string(),
        ScalarType::TinyInt => "i8".to_string(),
        ScalarType::SmallInt => "i16".to_string(),
        ScalarType::Int => "i32".to_string(),
        ScalarType::BigInt => "i64".to_string(),
        ScalarType::Float => "f32".to_string(),
        ScalarType::Double => "f64".to_string(),
        ScalarType::Blob => "::std::vec::Vec<u8>".to_string(),
        ScalarType::Uuid | ScalarType::TimeUuid => format!("{REEXPORTS}::uuid::Uuid"),
        ScalarType::Timestamp => {
            format!("{REEXPORTS}::chrono::DateTime<{REEXPORTS}::chrono::Utc>")
        }
        ScalarType::Date => format!("{REEXPORTS}::chrono::NaiveDate"),
        ScalarType::Time => format!("{REEXPORTS}::chrono::NaiveTime"),
        ScalarType::Inet => "::std::net::IpAddr".to_string(),
        ScalarType::VarInt | ScalarType::Decimal | ScalarType::Duration => {
            return Err(ResolveError::Unsupported {
                ty: scalar.to_string(),
            });
        }
    };

    Ok(ty)
}
