//! Schema side of keyspace: declarations, type expressions, the extracted
//! model, codec resolution, structural validation and DDL rendering.

pub mod codec;
pub mod ddl;
pub mod decl;
pub mod error;
pub mod extract;
pub mod model;
pub mod types;
pub mod validate;

use crate::{
    codec::{CodecRegistry, ResolvedCodec},
    decl::{Naming, SchemaDecl},
    error::ErrorTree,
    extract::ExtractOptions,
    model::{EntityModel, FieldModel, FunctionModel, UdtModel},
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;
use tracing::debug;

/// Maximum length of an entity or user type name.
pub const MAX_ENTITY_NAME_LEN: usize = 48;

/// Maximum length of a field name.
pub const MAX_FIELD_NAME_LEN: usize = 48;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Schema, SchemaError,
        codec::{CodecRegistry, ResolvedCodec},
        decl::*,
        error::{ErrorTree, Violation},
        load,
        model::*,
    };
}

///
/// SchemaError
///

#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("schema validation failed:\n{0}")]
    Validation(ErrorTree),
}

impl From<ErrorTree> for SchemaError {
    fn from(tree: ErrorTree) -> Self {
        Self::Validation(tree)
    }
}

///
/// LoadOptions
///

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub keyspace: Option<String>,
    pub naming: Naming,
}

///
/// Schema
///
/// A validated batch. Every field of every entity has a resolved codec.
///

#[derive(Clone, Debug)]
pub struct Schema {
    pub entities: Vec<EntityModel>,
    pub udts: Vec<UdtModel>,
    pub functions: Vec<FunctionModel>,
    codecs: BTreeMap<(String, String), ResolvedCodec>,
}

impl Schema {
    #[must_use]
    pub fn entity(&self, name: &str) -> Option<&EntityModel> {
        self.entities.iter().find(|e| e.name == name)
    }

    #[must_use]
    pub fn udt(&self, type_name: &str) -> Option<&UdtModel> {
        self.udts.iter().find(|u| u.type_name == type_name)
    }

    /// Resolved codec of one field; present for every field after `load`.
    #[must_use]
    pub fn codec(&self, entity: &EntityModel, field: &FieldModel) -> Option<&ResolvedCodec> {
        self.codecs.get(&(entity.name.clone(), field.name.clone()))
    }

    /// CQL type of the stored column, honouring codec storage overrides.
    #[must_use]
    pub fn column_type(&self, entity: &EntityModel, field: &FieldModel) -> String {
        self.codec(entity, field)
            .and_then(ResolvedCodec::storage_override)
            .map_or_else(|| field.shape.to_string(), ToString::to_string)
    }
}

/// Extract, validate and resolve a declaration batch.
pub fn load(
    decl: &SchemaDecl,
    registry: &CodecRegistry,
    options: &LoadOptions,
) -> Result<Schema, SchemaError> {
    let mut errs = ErrorTree::new();
    let extract = ExtractOptions {
        keyspace: options.keyspace.as_deref(),
        naming: options.naming,
    };

    let mut udts = Vec::new();
    for udt in &decl.udts {
        match extract::extract_udt(udt, &decl.udts, extract) {
            Ok(model) => udts.push(model),
            Err(tree) => errs.route(udt.name.clone()).merge(tree),
        }
    }

    let mut entities = Vec::new();
    let mut unextracted = BTreeSet::new();
    for entity in &decl.entities {
        match extract::extract_entity(entity, &udts, extract) {
            Ok(model) => entities.push(model),
            Err(tree) => {
                unextracted.insert(entity.name.as_str());
                errs.route(entity.name.clone()).merge(tree);
            }
        }
    }

    let mut functions = Vec::new();
    for function in &decl.functions {
        match extract::extract_function(function, &udts, extract) {
            Ok(model) => functions.push(model),
            Err(tree) => errs.route("function").route(function.name.clone()).merge(tree),
        }
    }

    // Validate whatever extracted so one pass reports every violation. A view
    // whose base failed extraction has nothing to be checked against.
    let checked = entities
        .iter()
        .filter(|e| {
            e.view_of
                .as_deref()
                .is_none_or(|base| !unextracted.contains(base))
        })
        .cloned()
        .collect::<Vec<_>>();
    if let Err(tree) = validate::validate_schema(&checked, &udts, &functions, registry) {
        errs.merge(tree);
    }
    errs.result()?;

    let mut codecs = BTreeMap::new();
    for entity in &entities {
        for field in &entity.fields {
            let resolved = registry
                .resolve(field, &udts)
                .map_err(|e| ErrorTree::from(error::Violation::from(e)))?;
            codecs.insert((entity.name.clone(), field.name.clone()), resolved);
        }
        debug!(entity = %entity.name, table = %entity.qualified_table(), "schema entity loaded");
    }

    Ok(Schema {
        entities,
        udts,
        functions,
        codecs,
    })
}
