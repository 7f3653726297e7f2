//! Contract with the wire-protocol client.
//!
//! The client itself lives outside this crate; generated builders only see
//! the `Executor` trait.

use crate::{statement::Statement, value::Value};
use async_trait::async_trait;
use thiserror::Error as ThisError;

///
/// ExecutorError
///

#[derive(Debug, ThisError)]
pub enum ExecutorError {
    #[error("prepare failed: {0}")]
    Prepare(String),

    #[error("execution failed: {0}")]
    Execution(String),

    #[error("no replica available: {0}")]
    Unavailable(String),
}

///
/// PreparedStatement
///
/// Opaque handle returned by `prepare`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PreparedStatement {
    pub id: Vec<u8>,
    pub cql: String,
}

///
/// Row
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Column lookup; CQL folds unquoted identifiers, so the match ignores
    /// ASCII case.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        let column = column.trim_matches('"');

        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: Value) -> Self {
        self.columns.push((column.into(), value));
        self
    }

    /// `[applied]` flag of a conditional write, if the row carries one.
    #[must_use]
    pub fn applied(&self) -> Option<bool> {
        match self.get("[applied]") {
            Some(Value::Boolean(applied)) => Some(*applied),
            _ => None,
        }
    }
}

///
/// ResultSet
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    pub rows: Vec<Row>,
    pub paging_state: Option<Vec<u8>>,
}

impl ResultSet {
    #[must_use]
    pub const fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            paging_state: None,
        }
    }

    #[must_use]
    pub fn with_paging_state(mut self, paging_state: Vec<u8>) -> Self {
        self.paging_state = Some(paging_state);
        self
    }
}

///
/// Executor
///
/// Blocking `prepare`/`execute` plus an async execution path. Clients
/// without a native async path inherit the blocking one.
///

#[async_trait]
pub trait Executor: Send + Sync {
    fn prepare(&self, cql: &str) -> Result<PreparedStatement, ExecutorError>;

    fn execute(
        &self,
        prepared: &PreparedStatement,
        statement: &Statement,
    ) -> Result<ResultSet, ExecutorError>;

    async fn execute_async(
        &self,
        prepared: &PreparedStatement,
        statement: &Statement,
    ) -> Result<ResultSet, ExecutorError> {
        self.execute(prepared, statement)
    }
}
