use crate::{codec::CodecError, executor::ExecutorError, executor::Row, range::RangeError};
use thiserror::Error as ThisError;

///
/// Error
///
/// Runtime failure surfaced by generated builders and the slice executor.
/// Nothing here is retried: every variant is a deterministic function of the
/// statement and the returned rows, except `Executor`.
///

#[remain::sorted]
#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("column '{column}': {source}")]
    ColumnCodec {
        column: &'static str,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("conditional statement was not applied")]
    LwtNotApplied { current: Row },

    #[error("missing column '{column}' in result row")]
    MissingColumn { column: String },

    #[error("result row has no '[json]' column")]
    MissingJson,

    #[error(
        "slice page went backwards on '{column}': {current} after {previous} in a {direction} scan"
    )]
    PageOutOfOrder {
        column: &'static str,
        previous: String,
        current: String,
        direction: &'static str,
    },

    #[error(transparent)]
    Range(#[from] RangeError),
}

impl Error {
    /// Whether the failure comes from a conditional write that lost its race.
    #[must_use]
    pub const fn is_lwt_not_applied(&self) -> bool {
        matches!(self, Self::LwtNotApplied { .. })
    }
}
