//! In-memory executor for tests of generated builders.

use crate::{
    executor::{Executor, ExecutorError, PreparedStatement, ResultSet},
    statement::Statement,
};
use std::{collections::VecDeque, sync::Mutex};

///
/// RecordingExecutor
///
/// Records every executed statement and answers with queued result sets
/// (an empty one once the queue runs dry).
///

#[derive(Debug, Default)]
pub struct RecordingExecutor {
    prepared: Mutex<Vec<String>>,
    executed: Mutex<Vec<Statement>>,
    responses: Mutex<VecDeque<Result<ResultSet, ExecutorError>>>,
}

impl RecordingExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_response(self, response: ResultSet) -> Self {
        self.push_response(response);
        self
    }

    pub fn push_response(&self, response: ResultSet) {
        self.lock_responses().push_back(Ok(response));
    }

    pub fn push_error(&self, error: ExecutorError) {
        self.lock_responses().push_back(Err(error));
    }

    #[must_use]
    pub fn prepared(&self) -> Vec<String> {
        self.prepared
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn executed(&self) -> Vec<Statement> {
        self.executed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// CQL of the last executed statement.
    #[must_use]
    pub fn last_cql(&self) -> Option<String> {
        self.executed().last().map(|statement| statement.cql.clone())
    }

    fn lock_responses(
        &self,
    ) -> std::sync::MutexGuard<'_, VecDeque<Result<ResultSet, ExecutorError>>> {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Executor for RecordingExecutor {
    fn prepare(&self, cql: &str) -> Result<PreparedStatement, ExecutorError> {
        let mut prepared = self
            .prepared
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        prepared.push(cql.to_string());

        Ok(PreparedStatement {
            id: prepared.len().to_be_bytes().to_vec(),
            cql: cql.to_string(),
        })
    }

    fn execute(
        &self,
        _prepared: &PreparedStatement,
        statement: &Statement,
    ) -> Result<ResultSet, ExecutorError> {
        self.executed
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(statement.clone());

        self.lock_responses()
            .pop_front()
            .unwrap_or_else(|| Ok(ResultSet::default()))
    }
}
