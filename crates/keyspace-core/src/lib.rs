//! Runtime for keyspace: CQL values, codecs, the compound-key range
//! algorithm, statement assembly, and the executor contract used by
//! generated query builders.

pub mod codec;
pub mod entity;
pub mod error;
pub mod executor;
pub mod query;
pub mod range;
pub mod slice;
pub mod statement;
pub mod traits;
pub mod value;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use error::Error;

///
/// Prelude
///
/// Domain vocabulary only; generated code addresses everything else by path.
///

pub mod prelude {
    pub use crate::{
        entity::{ColumnKind, ColumnMeta, Entity},
        executor::{Executor, ResultSet, Row},
        range::{BoundingMode, OrderingMode},
        statement::{Consistency, Statement},
        traits::{ColumnValue, Enumerated},
        value::Value,
    };
}
