//! Immutable schema model produced by extraction and consumed by the
//! validator, the DDL renderer and the DSL synthesizer.

mod index;
mod shape;

pub use index::*;
pub use shape::*;

use crate::decl::{EnumEncoding, Naming};

///
/// ColumnRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnRole {
    Partition { order: u32 },
    Clustering { order: u32, ascending: bool },
    Static,
    StaticCounter,
    Counter,
    Regular,
    Computed,
}

impl ColumnRole {
    #[must_use]
    pub const fn is_partition(self) -> bool {
        matches!(self, Self::Partition { .. })
    }

    #[must_use]
    pub const fn is_clustering(self) -> bool {
        matches!(self, Self::Clustering { .. })
    }

    #[must_use]
    pub const fn is_key(self) -> bool {
        self.is_partition() || self.is_clustering()
    }

    #[must_use]
    pub const fn is_static(self) -> bool {
        matches!(self, Self::Static | Self::StaticCounter)
    }

    #[must_use]
    pub const fn is_counter(self) -> bool {
        matches!(self, Self::Counter | Self::StaticCounter)
    }

    /// Columns an insert or update may write.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Computed)
    }
}

///
/// CodecMarker
/// Field-level codec choice as declared, before resolution.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CodecMarker {
    None,
    Explicit { path: String, rust_type: String },
    Enumerated { rust_type: String, encoding: EnumEncoding },
    Json { rust_type: String },
}

///
/// ComputedModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComputedModel {
    pub function: String,
    pub targets: Vec<String>,
    pub alias: String,
}

impl ComputedModel {
    /// Projection expression, `fn(a, b) AS alias`.
    #[must_use]
    pub fn expression(&self, columns: &[String]) -> String {
        format!("{}({}) AS {}", self.function, columns.join(", "), self.alias)
    }
}

///
/// FieldModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    pub name: String,
    pub column: String,
    pub shape: ValueShape,
    pub role: ColumnRole,
    pub indexes: Vec<IndexModel>,
    pub codec: CodecMarker,
    pub computed: Option<ComputedModel>,
    pub optional: bool,
}

impl FieldModel {
    #[must_use]
    pub fn index(&self) -> Option<&IndexModel> {
        self.indexes.first()
    }

    #[must_use]
    pub const fn is_key(&self) -> bool {
        self.role.is_key()
    }
}

///
/// EntityModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    pub name: String,
    pub table: String,
    pub keyspace: Option<String>,
    pub fields: Vec<FieldModel>,
    pub view_of: Option<String>,
    pub naming: Naming,
    pub clustered_counter: bool,
}

impl EntityModel {
    #[must_use]
    pub fn qualified_table(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{keyspace}.{}", self.table),
            None => self.table.clone(),
        }
    }

    #[must_use]
    pub const fn is_view(&self) -> bool {
        self.view_of.is_some()
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Partition fields in declared key order.
    #[must_use]
    pub fn partition_fields(&self) -> Vec<&FieldModel> {
        let mut fields = self
            .fields
            .iter()
            .filter_map(|field| match field.role {
                ColumnRole::Partition { order } => Some((order, field)),
                _ => None,
            })
            .collect::<Vec<_>>();
        fields.sort_by_key(|(order, _)| *order);

        fields.into_iter().map(|(_, field)| field).collect()
    }

    /// Clustering fields in declared key order.
    #[must_use]
    pub fn clustering_fields(&self) -> Vec<&FieldModel> {
        let mut fields = self
            .fields
            .iter()
            .filter_map(|field| match field.role {
                ColumnRole::Clustering { order, .. } => Some((order, field)),
                _ => None,
            })
            .collect::<Vec<_>>();
        fields.sort_by_key(|(order, _)| *order);

        fields.into_iter().map(|(_, field)| field).collect()
    }

    /// Key fields first (partition, clustering), then the rest in
    /// declaration order.
    #[must_use]
    pub fn ordered_fields(&self) -> Vec<&FieldModel> {
        let mut fields = self.partition_fields();
        fields.extend(self.clustering_fields());
        fields.extend(self.fields.iter().filter(|field| !field.is_key()));

        fields
    }

    #[must_use]
    pub fn static_fields(&self) -> Vec<&FieldModel> {
        self.fields
            .iter()
            .filter(|field| field.role.is_static())
            .collect()
    }

    #[must_use]
    pub fn indexed_fields(&self) -> Vec<&FieldModel> {
        self.fields
            .iter()
            .filter(|field| !field.indexes.is_empty())
            .collect()
    }

    #[must_use]
    pub fn has_counters(&self) -> bool {
        self.fields.iter().any(|field| field.role.is_counter())
    }
}

///
/// UdtModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UdtModel {
    pub name: String,
    pub type_name: String,
    pub keyspace: Option<String>,
    pub fields: Vec<UdtFieldModel>,
}

impl UdtModel {
    #[must_use]
    pub fn qualified_type(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{keyspace}.{}", self.type_name),
            None => self.type_name.clone(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UdtFieldModel {
    pub name: String,
    pub column: String,
    pub shape: ValueShape,
}

///
/// FunctionModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunctionModel {
    pub keyspace: Option<String>,
    pub name: String,
    pub params: Vec<(String, ValueShape)>,
    pub returns: ValueShape,
    pub deterministic: bool,
}

impl FunctionModel {
    /// `name(type, type)`, the identity used for duplicate detection.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|(_, shape)| shape.to_string())
            .collect::<Vec<_>>();

        format!("{}({})", self.qualified_name(), params.join(", "))
    }

    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{keyspace}.{}", self.name),
            None => self.name.clone(),
        }
    }
}
