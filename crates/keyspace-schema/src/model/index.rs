use crate::decl::{Normalization, SasiAnalyzer, SasiMode};
use derive_more::Display;

///
/// IndexKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum IndexKind {
    #[display("NORMAL")]
    Normal,
    #[display("FULL")]
    Full,
    #[display("COLLECTION")]
    Collection,
    #[display("MAP_KEY")]
    MapKey,
    #[display("MAP_VALUE")]
    MapValue,
    #[display("MAP_ENTRY")]
    MapEntry,
}

///
/// IndexSlot
/// Where in the field's value the index applies.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexSlot {
    Field,
    Element,
    MapKey,
    MapValue,
}

///
/// SasiOptions
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SasiOptions {
    pub mode: SasiMode,
    pub analyzed: bool,
    pub analyzer: SasiAnalyzer,
    pub case_sensitive: bool,
    pub normalization: Normalization,
}

///
/// IndexImplementation
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexImplementation {
    Native,
    Sasi(SasiOptions),
    DseSearch { full_text: bool, case_sensitive: bool },
}

impl IndexImplementation {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Native => "native",
            Self::Sasi(_) => "SASI",
            Self::DseSearch { .. } => "DSE search",
        }
    }

    #[must_use]
    pub const fn is_native(self) -> bool {
        matches!(self, Self::Native)
    }
}

///
/// IndexModel
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexModel {
    pub kind: IndexKind,
    pub implementation: IndexImplementation,
    pub name: Option<String>,
    pub slot: IndexSlot,
}

impl IndexModel {
    /// Index name, defaulting to `<table>_<column>_idx`.
    #[must_use]
    pub fn resolved_name(&self, table: &str, column: &str) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!("{table}_{}_idx", column.trim_matches('"').to_ascii_lowercase())
        })
    }
}
