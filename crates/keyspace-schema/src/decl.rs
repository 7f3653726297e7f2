//! Declaration surface: what users write (TOML in practice) to describe
//! entities, user types and functions.

use serde::{Deserialize, Serialize};

///
/// SchemaDecl
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SchemaDecl {
    #[serde(default, rename = "udt")]
    pub udts: Vec<UdtDecl>,

    #[serde(default, rename = "entity")]
    pub entities: Vec<EntityDecl>,

    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionDecl>,
}

impl SchemaDecl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entity(mut self, entity: EntityDecl) -> Self {
        self.entities.push(entity);
        self
    }

    #[must_use]
    pub fn udt(mut self, udt: UdtDecl) -> Self {
        self.udts.push(udt);
        self
    }

    #[must_use]
    pub fn function(mut self, function: FunctionDecl) -> Self {
        self.functions.push(function);
        self
    }
}

///
/// Naming
///
/// How Rust field names turn into CQL column names.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Naming {
    #[default]
    SnakeCase,
    LowerCase,
    CaseSensitive,
}

///
/// EntityDecl
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_of: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub naming: Option<Naming>,

    #[serde(default, rename = "field")]
    pub fields: Vec<FieldDecl>,
}

impl EntityDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            keyspace: None,
            view_of: None,
            naming: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub fn view_of(mut self, base: impl Into<String>) -> Self {
        self.view_of = Some(base.into());
        self
    }

    #[must_use]
    pub const fn naming(mut self, naming: Naming) -> Self {
        self.naming = Some(naming);
        self
    }

    #[must_use]
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

///
/// FieldDecl
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clustering: Option<ClusteringDecl>,

    #[serde(default, rename = "static")]
    pub is_static: bool,

    #[serde(default)]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codec: Option<CodecDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enumerated: Option<EnumeratedDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<JsonDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed: Option<ComputedDecl>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            ..Self::default()
        }
    }

    /// Field without a declared type (enumerated or JSON fields).
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    #[must_use]
    pub const fn partition(mut self, order: u32) -> Self {
        self.partition = Some(order);
        self
    }

    #[must_use]
    pub const fn clustering(mut self, order: u32, asc: bool) -> Self {
        self.clustering = Some(ClusteringDecl { order, asc });
        self
    }

    #[must_use]
    pub const fn static_column(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn index(mut self, index: IndexDecl) -> Self {
        self.index = Some(index);
        self
    }

    #[must_use]
    pub fn codec(mut self, path: impl Into<String>, rust_type: impl Into<String>) -> Self {
        self.codec = Some(CodecDecl {
            path: path.into(),
            rust_type: rust_type.into(),
        });
        self
    }

    #[must_use]
    pub fn enumerated(mut self, rust_type: impl Into<String>, encoding: EnumEncoding) -> Self {
        self.enumerated = Some(EnumeratedDecl {
            rust_type: rust_type.into(),
            encoding,
        });
        self
    }

    #[must_use]
    pub fn json(mut self, rust_type: impl Into<String>) -> Self {
        self.json = Some(JsonDecl {
            rust_type: rust_type.into(),
        });
        self
    }

    #[must_use]
    pub fn computed(
        mut self,
        function: impl Into<String>,
        targets: &[&str],
        alias: impl Into<String>,
    ) -> Self {
        self.computed = Some(ComputedDecl {
            function: function.into(),
            targets: targets.iter().map(ToString::to_string).collect(),
            alias: alias.into(),
        });
        self
    }
}

///
/// ClusteringDecl
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClusteringDecl {
    pub order: u32,

    #[serde(default = "default_true")]
    pub asc: bool,
}

const fn default_true() -> bool {
    true
}

///
/// IndexDecl
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IndexKindDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub using: IndexUsing,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sasi: Option<SasiDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dse: Option<DseDecl>,
}

impl IndexDecl {
    #[must_use]
    pub fn native() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sasi(sasi: SasiDecl) -> Self {
        Self {
            using: IndexUsing::Sasi,
            sasi: Some(sasi),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn dse_search(dse: DseDecl) -> Self {
        Self {
            using: IndexUsing::DseSearch,
            dse: Some(dse),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn kind(mut self, kind: IndexKindDecl) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

///
/// IndexKindDecl
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKindDecl {
    Normal,
    Full,
    Collection,
    MapKey,
    MapValue,
    MapEntry,
}

///
/// IndexUsing
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexUsing {
    #[default]
    Native,
    Sasi,
    DseSearch,
}

///
/// SasiDecl
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SasiDecl {
    #[serde(default)]
    pub mode: SasiMode,

    #[serde(default)]
    pub analyzed: bool,

    #[serde(default)]
    pub analyzer: SasiAnalyzer,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub normalization: Normalization,
}

impl SasiDecl {
    #[must_use]
    pub fn mode(mode: SasiMode) -> Self {
        Self {
            mode,
            case_sensitive: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SasiMode {
    #[default]
    Prefix,
    Contains,
    Sparse,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SasiAnalyzer {
    #[default]
    NonTokenizing,
    Standard,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    #[default]
    None,
    Lowercase,
    Uppercase,
}

///
/// DseDecl
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DseDecl {
    #[serde(default)]
    pub full_text: bool,

    #[serde(default)]
    pub case_sensitive: bool,
}

///
/// CodecDecl
/// User codec: `path` names a type implementing `Codec`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CodecDecl {
    pub path: String,
    pub rust_type: String,
}

///
/// EnumeratedDecl
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnumeratedDecl {
    pub rust_type: String,

    #[serde(default)]
    pub encoding: EnumEncoding,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumEncoding {
    #[default]
    Name,
    Ordinal,
}

///
/// JsonDecl
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JsonDecl {
    pub rust_type: String,
}

///
/// ComputedDecl
/// Read-only column projected as `function(targets...) AS alias`.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ComputedDecl {
    pub function: String,
    pub targets: Vec<String>,
    pub alias: String,
}

///
/// UdtDecl
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UdtDecl {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    #[serde(default, rename = "field")]
    pub fields: Vec<UdtFieldDecl>,
}

impl UdtDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            keyspace: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.fields.push(UdtFieldDecl {
            name: name.into(),
            ty: ty.into(),
            column: None,
        });
        self
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UdtFieldDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

///
/// FunctionDecl
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,

    pub name: String,

    #[serde(default, rename = "param")]
    pub params: Vec<ParamDecl>,

    pub returns: String,

    #[serde(default)]
    pub deterministic: bool,
}

impl FunctionDecl {
    pub fn new(name: impl Into<String>, returns: impl Into<String>) -> Self {
        Self {
            keyspace: None,
            name: name.into(),
            params: Vec::new(),
            returns: returns.into(),
            deterministic: false,
        }
    }

    #[must_use]
    pub fn param(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.params.push(ParamDecl {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParamDecl {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_declarations_deserialize() {
        let schema: SchemaDecl = toml::from_str(
            r#"
            [[udt]]
            name = "Address"
            field = [{ name = "city", type = "text" }]

            [[entity]]
            name = "User"
            keyspace = "app"

            [[entity.field]]
            name = "id"
            type = "bigint"
            partition = 0

            [[entity.field]]
            name = "created"
            type = "timestamp"
            clustering = { order = 0, asc = false }

            [[entity.field]]
            name = "tags"
            type = "set<text>"
            index = { using = "sasi", sasi = { mode = "contains" } }

            [[entity.field]]
            name = "status"
            enumerated = { rust_type = "crate::Status", encoding = "ordinal" }
            "#,
        )
        .expect("schema parses");

        assert_eq!(schema.udts[0].fields[0].ty, "text");
        let user = &schema.entities[0];
        assert_eq!(user.keyspace.as_deref(), Some("app"));
        assert_eq!(user.fields[1].clustering, Some(ClusteringDecl { order: 0, asc: false }));

        let index = user.fields[2].index.as_ref().expect("index");
        assert_eq!(index.using, IndexUsing::Sasi);
        let sasi = index.sasi.as_ref().expect("sasi options");
        assert_eq!(sasi.mode, SasiMode::Contains);
        assert!(sasi.case_sensitive);

        assert_eq!(user.fields[3].ty, None);
        assert_eq!(
            user.fields[3].enumerated.as_ref().map(|e| e.encoding),
            Some(EnumEncoding::Ordinal)
        );
    }

    #[test]
    fn unknown_field_keys_are_rejected() {
        let result = toml::from_str::<SchemaDecl>(
            r#"
            [[entity]]
            name = "User"
            [[entity.field]]
            name = "id"
            type = "bigint"
            primary = true
            "#,
        );

        assert!(result.is_err());
    }
}
