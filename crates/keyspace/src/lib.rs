//! ## Crate layout
//! - `build`: schema file to DSL source, for `build.rs` scripts.
//! - `core`: values, codecs, the range algorithm, statement assembly and
//!   the executor contract generated builders run against.
//! - `schema`: declarations, the validated model and DDL rendering.
//!
//! Generated code addresses everything through `::keyspace::...`, so a
//! crate using the DSL only depends on this one.

pub use keyspace_build as build;
pub use keyspace_core as core;
pub use keyspace_schema as schema;

/// re-exports
///
/// generated code names these types by path so dependents don't have to
/// list them in their own Cargo.toml
pub mod __reexports {
    pub use chrono;
    pub use serde;
    pub use uuid;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::Error;
pub use keyspace_build::build;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::core::{query::function::FunctionArg, slice::SliceQuery};
}
