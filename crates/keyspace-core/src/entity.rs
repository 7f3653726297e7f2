use crate::{
    Error,
    codec::Codec,
    executor::Row,
    range::ClusteringColumn,
    value::Value,
};

///
/// ColumnKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    Partition,
    Clustering { ascending: bool },
    Static,
    StaticCounter,
    Counter,
    Regular,
    Computed,
}

impl ColumnKind {
    #[must_use]
    pub const fn is_key(self) -> bool {
        matches!(self, Self::Partition | Self::Clustering { .. })
    }

    #[must_use]
    pub const fn is_counter(self) -> bool {
        matches!(self, Self::Counter | Self::StaticCounter)
    }

    /// Whether the column is written by INSERT. Counters only move through
    /// UPDATE increments.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Computed | Self::Counter | Self::StaticCounter)
    }
}

///
/// ColumnMeta
///
/// `expression` is what SELECT projects: the column name itself, or a
/// function call aliased back to `name` for computed columns.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ColumnMeta {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub cql_type: &'static str,
    pub expression: &'static str,
}

///
/// Entity
///
/// Generated mapping between a struct and one table or view. `COLUMNS` is
/// ordered partition keys first, then clustering columns, each in declared
/// order, then the rest.
///

pub trait Entity: Sized + Send + Sync {
    const KEYSPACE: Option<&'static str>;
    const TABLE: &'static str;
    const COLUMNS: &'static [ColumnMeta];

    fn from_row(row: &Row) -> Result<Self, Error>;

    /// Writable columns with their encoded values, in `COLUMNS` order.
    fn encode_columns(&self) -> Result<Vec<(&'static str, Value)>, Error>;

    #[must_use]
    fn qualified_table() -> String {
        match Self::KEYSPACE {
            Some(keyspace) => format!("{keyspace}.{}", Self::TABLE),
            None => Self::TABLE.to_string(),
        }
    }

    #[must_use]
    fn partition_columns() -> Vec<&'static str> {
        Self::COLUMNS
            .iter()
            .filter(|column| column.kind == ColumnKind::Partition)
            .map(|column| column.name)
            .collect()
    }

    #[must_use]
    fn clustering_columns() -> Vec<ClusteringColumn> {
        Self::COLUMNS
            .iter()
            .filter_map(|column| match column.kind {
                ColumnKind::Clustering { ascending } => {
                    Some(ClusteringColumn::new(column.name, ascending))
                }
                _ => None,
            })
            .collect()
    }

    /// Projection list for a plain SELECT.
    #[must_use]
    fn projection() -> String {
        Self::COLUMNS
            .iter()
            .map(|column| column.expression)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Decode a required column; an absent cell decodes as `Null`.
pub fn decode_column<C: Codec>(row: &Row, column: &'static str) -> Result<C::Source, Error> {
    let value = row.get(column).unwrap_or(&Value::Null);

    C::decode(value).map_err(|source| Error::ColumnCodec { column, source })
}

/// Decode an optional column; `Null` and absent cells read as `None`.
pub fn decode_optional_column<C: Codec>(
    row: &Row,
    column: &'static str,
) -> Result<Option<C::Source>, Error> {
    match row.get(column) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => C::decode(value)
            .map(Some)
            .map_err(|source| Error::ColumnCodec { column, source }),
    }
}

/// Like [`decode_column`], but the column must be present in the row.
pub fn require_column<'r>(row: &'r Row, column: &str) -> Result<&'r Value, Error> {
    row.get(column).ok_or_else(|| Error::MissingColumn {
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::NativeCodec;

    #[test]
    fn absent_collections_decode_as_empty() {
        let row = Row::default().with("id", Value::BigInt(1));

        let tags = decode_column::<NativeCodec<Vec<String>>>(&row, "tags").unwrap();
        assert!(tags.is_empty());

        let err = decode_column::<NativeCodec<i64>>(&row, "score").unwrap_err();
        assert!(matches!(err, Error::ColumnCodec { column: "score", .. }));
    }

    #[test]
    fn optional_columns_read_null_as_none() {
        let row = Row::default()
            .with("nickname", Value::Null)
            .with("age", Value::Int(33));

        assert_eq!(
            decode_optional_column::<NativeCodec<String>>(&row, "nickname").unwrap(),
            None
        );
        assert_eq!(
            decode_optional_column::<NativeCodec<i32>>(&row, "age").unwrap(),
            Some(33)
        );
    }

    #[test]
    fn row_lookup_ignores_case_and_quotes() {
        let row = Row::default().with("userid", Value::Int(1));

        assert_eq!(row.get("\"UserId\""), Some(&Value::Int(1)));
        assert!(require_column(&row, "missing").is_err());
    }
}
