use crate::profile::Profile;
use keyspace_schema::{
    LoadOptions,
    codec::CodecRegistry,
    decl::{Naming, SchemaDecl},
};
use serde::Deserialize;
use std::collections::BTreeMap;

///
/// GeneratorConfig
///
/// The `[generator]` table of a schema file.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub profile: Profile,
    pub keyspace: Option<String>,
    pub naming: Naming,
    pub emit_ddl: bool,

    /// Identifier types stored as JSON text, mapped to their Rust type.
    pub json_types: BTreeMap<String, String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            keyspace: None,
            naming: Naming::default(),
            emit_ddl: true,
            json_types: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            keyspace: self.keyspace.clone(),
            naming: self.naming,
        }
    }

    #[must_use]
    pub fn registry(&self) -> CodecRegistry {
        self.json_types
            .iter()
            .fold(CodecRegistry::new(), |registry, (ident, rust_type)| {
                registry.with_json_type(ident, rust_type)
            })
    }
}

///
/// SchemaFile
///
/// A whole schema TOML document: generator settings plus declarations.
///

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SchemaFile {
    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(flatten)]
    pub schema: SchemaDecl,
}

impl SchemaFile {
    pub fn parse(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_table_is_optional() {
        let file = SchemaFile::parse(
            r#"
            [[entity]]
            name = "User"
            field = [{ name = "id", type = "bigint", partition = 0 }]
            "#,
        )
        .unwrap();

        assert_eq!(file.generator, GeneratorConfig::default());
        assert!(file.generator.emit_ddl);
        assert_eq!(file.schema.entities.len(), 1);
    }

    #[test]
    fn generator_settings_parse() {
        let file = SchemaFile::parse(
            r#"
            [generator]
            profile = "cassandra_3_7"
            keyspace = "app"
            naming = "lower_case"
            emit_ddl = false
            json_types = { Settings = "crate::Settings" }
            "#,
        )
        .unwrap();

        let config = file.generator;
        assert_eq!(config.profile, Profile::Cassandra37);
        assert_eq!(config.keyspace.as_deref(), Some("app"));
        assert_eq!(config.naming, Naming::LowerCase);
        assert!(!config.emit_ddl);
        assert!(config.registry().is_json_type("settings"));
        assert_eq!(config.load_options().keyspace.as_deref(), Some("app"));
    }

    #[test]
    fn unknown_generator_keys_are_rejected() {
        assert!(SchemaFile::parse("[generator]\nprofil = \"dse_5_1\"\n").is_err());
        assert!(SchemaFile::parse("[generator]\nprofile = \"cassandra_9\"\n").is_err());
    }
}
