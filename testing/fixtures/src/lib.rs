//! Generated DSL for `schema.toml`, plus the Rust types the schema names.

use keyspace::core::traits::Enumerated;

///
/// Status
/// Stored by variant name.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Status {
    #[default]
    Active,
    Suspended,
    Closed,
}

impl Enumerated for Status {
    const VARIANTS: &'static [Self] = &[Self::Active, Self::Suspended, Self::Closed];

    fn name(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Suspended => "SUSPENDED",
            Self::Closed => "CLOSED",
        }
    }
}

#[allow(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/keyspace.rs"));
}

pub use generated::*;
