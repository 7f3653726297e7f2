//! Build-time code generation: schema file in, Rust DSL source out.

pub mod config;
pub mod dsl;
pub mod profile;

mod macros;

pub use dsl::Generator;

use crate::{
    config::{GeneratorConfig, SchemaFile},
    profile::{Capabilities, CapabilityError, Profile},
};
use keyspace_schema::{SchemaError, codec::ResolveError, decl::SchemaDecl};
use proc_macro2::TokenStream;
use thiserror::Error as ThisError;
use tracing::info;

///
/// BuildError
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum BuildError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("invalid schema file: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("entity '{entity}' field '{field}' has no resolved codec")]
    MissingCodec { entity: String, field: String },

    #[error("cannot map '{ty}' to a Rust type")]
    Resolve {
        ty: String,
        #[source]
        source: ResolveError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid {kind} '{input}': {message}")]
    Syntax {
        kind: &'static str,
        input: String,
        message: String,
    },
}

/// Generate DSL source for a schema document, using its own profile.
pub fn generate(source: &str) -> Result<String, BuildError> {
    generate_with_profile(source, None)
}

/// Generate DSL source, with `profile` (when non-blank) overriding the
/// document's `[generator] profile`.
pub fn generate_with_profile(source: &str, profile: Option<&str>) -> Result<String, BuildError> {
    let file = SchemaFile::parse(source)?;
    let mut config = file.generator;

    if let Some(name) = profile.map(str::trim).filter(|name| !name.is_empty()) {
        config.profile = name.parse::<Profile>()?;
    }

    let tokens = generate_tokens(&file.schema, &config)?;

    Ok(tokens.to_string())
}

/// Load, validate and synthesize. Nothing is produced unless the whole
/// batch passes.
pub fn generate_tokens(
    decl: &SchemaDecl,
    config: &GeneratorConfig,
) -> Result<TokenStream, BuildError> {
    let schema = keyspace_schema::load(decl, &config.registry(), &config.load_options())?;
    let capabilities = Capabilities::for_profile(config.profile);

    info!(
        profile = %capabilities.profile(),
        entities = schema.entities.len(),
        udts = schema.udts.len(),
        functions = schema.functions.len(),
        "generating keyspace DSL"
    );

    Generator::new(&schema, &capabilities, config.emit_ddl).generate()
}
