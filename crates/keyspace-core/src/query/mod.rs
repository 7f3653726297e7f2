//! Statement assembly shared by every generated builder chain.
//!
//! Generated builder states are thin typed wrappers around one
//! [`QueryState`]; each relation or assignment method appends its clause
//! text and bound value here, and the terminal methods render and execute.

pub mod function;


use crate::{
    Error,
    entity::Entity,
    executor::{Executor, ResultSet, Row},
    range::{OrderingMode, RangeError, RangePredicate},
    statement::{Consistency, Statement, StatementOptions},
    value::Value,
};
use function::FunctionCall;
use std::{cmp::Ordering, fmt::Debug};
use tracing::{debug, warn};

///
/// StatementKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementKind {
    Select,
    SelectJson,
    Insert,
    InsertJson,
    Update,
    Delete,
}

///
/// Bound
/// One bound value with its source-side rendering.
///

#[derive(Clone, Debug)]
struct Bound {
    rendered: String,
    value: Value,
}

///
/// Clause
///

#[derive(Clone, Debug, Default)]
struct Clause {
    items: Vec<String>,
    values: Vec<Bound>,
}

impl Clause {
    fn push(&mut self, item: String, bound: Option<Bound>) {
        self.items.push(item);
        self.values.extend(bound);
    }

    fn join(&self, separator: &str) -> String {
        self.items.join(separator)
    }
}

///
/// QueryState
///
/// Everything a statement accumulates while a builder chain is walked.
/// Encoding failures are remembered and reported by the terminal, so the
/// chain itself never returns `Result`.
///

pub struct QueryState<'a> {
    session: &'a dyn Executor,
    kind: StatementKind,
    table: String,
    projection: Clause,
    assignments: Clause,
    relations: Clause,
    conditions: Clause,
    order_by: Vec<String>,
    limit: Option<u32>,
    per_partition_limit: Option<u32>,
    allow_filtering: bool,
    native_index_relations: usize,
    if_not_exists: bool,
    if_exists: bool,
    ttl: Option<u32>,
    timestamp: Option<i64>,
    options: StatementOptions,
    error: Option<Error>,
}

impl<'a> QueryState<'a> {
    #[must_use]
    pub fn new(session: &'a dyn Executor, kind: StatementKind, table: impl Into<String>) -> Self {
        Self {
            session,
            kind,
            table: table.into(),
            projection: Clause::default(),
            assignments: Clause::default(),
            relations: Clause::default(),
            conditions: Clause::default(),
            order_by: Vec::new(),
            limit: None,
            per_partition_limit: None,
            allow_filtering: false,
            native_index_relations: 0,
            if_not_exists: false,
            if_exists: false,
            ttl: None,
            timestamp: None,
            options: StatementOptions::default(),
            error: None,
        }
    }

    /// SELECT over every mapped column of `E`.
    #[must_use]
    pub fn select<E: Entity>(session: &'a dyn Executor, json: bool) -> Self {
        let kind = if json {
            StatementKind::SelectJson
        } else {
            StatementKind::Select
        };
        let mut state = Self::new(session, kind, E::qualified_table());
        state.projection.push(E::projection(), None);

        state
    }

    /// INSERT of every writable column of `entity`.
    #[must_use]
    pub fn insert<E: Entity>(session: &'a dyn Executor, entity: &E) -> Self {
        let mut state = Self::new(session, StatementKind::Insert, E::qualified_table());

        match entity.encode_columns() {
            Ok(columns) => {
                for (column, value) in columns {
                    let rendered = format!("{value:?}");
                    state
                        .assignments
                        .push(column.to_string(), Some(Bound { rendered, value }));
                }
            }
            Err(err) => state.fail(err),
        }

        state
    }

    /// INSERT ... JSON with the whole row as one JSON document.
    #[must_use]
    pub fn insert_json<E: Entity>(session: &'a dyn Executor, json: &str) -> Self {
        let mut state = Self::new(session, StatementKind::InsertJson, E::qualified_table());
        state.assignments.push(
            "JSON ?".to_string(),
            Some(Bound {
                rendered: json.to_string(),
                value: Value::Text(json.to_string()),
            }),
        );

        state
    }

    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    //
    // clause accumulation
    //

    fn fail(&mut self, err: Error) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn bound(&mut self, source: &dyn Debug, value: Result<Value, Error>) -> Option<Bound> {
        match value {
            Ok(value) => Some(Bound {
                rendered: format!("{source:?}"),
                value,
            }),
            Err(err) => {
                self.fail(err);
                None
            }
        }
    }

    /// Add an expression to the projection (also the column list of DELETE).
    pub fn project(&mut self, expression: impl Into<String>) {
        self.projection.push(expression.into(), None);
    }

    /// Add a function call to the projection, aliased.
    pub fn project_function(&mut self, call: &FunctionCall, alias: &str) {
        self.projection
            .push(format!("{} AS {alias}", call.render()), None);

        for (rendered, value) in call.bound_values() {
            self.projection.values.push(Bound { rendered, value });
        }
    }

    /// WHERE relation carrying one bound value.
    pub fn relation(
        &mut self,
        relation: impl Into<String>,
        source: &dyn Debug,
        value: Result<Value, Error>,
    ) {
        let bound = self.bound(source, value);
        self.relations.push(relation.into(), bound);
    }

    /// WHERE relation on a secondary index; native ones count towards the
    /// implied ALLOW FILTERING.
    pub fn index_relation(
        &mut self,
        relation: impl Into<String>,
        native: bool,
        source: &dyn Debug,
        value: Result<Value, Error>,
    ) {
        if native {
            self.native_index_relations += 1;
        }
        self.relation(relation, source, value);
    }

    /// WHERE relation on a secondary index binding two values, such as a
    /// map entry lookup `col[?] = ?`.
    pub fn index_relation_pair(
        &mut self,
        relation: impl Into<String>,
        native: bool,
        first: (&dyn Debug, Result<Value, Error>),
        second: (&dyn Debug, Result<Value, Error>),
    ) {
        if native {
            self.native_index_relations += 1;
        }
        let first = self.bound(first.0, first.1);
        let second = self.bound(second.0, second.1);
        self.relations.items.push(relation.into());
        self.relations.values.extend(first.into_iter().chain(second));
    }

    /// Two-sided bound on the clustering column at key `position`. The lower
    /// value must sort strictly before the upper one in natural order.
    pub fn range_relations(
        &mut self,
        position: usize,
        lower: (String, &dyn Debug, Result<Value, Error>),
        upper: (String, &dyn Debug, Result<Value, Error>),
    ) {
        if let (Ok(low), Ok(high)) = (&lower.2, &upper.2)
            && low.strict_cmp(high) != Some(Ordering::Less)
        {
            self.fail(RangeError::NonMonotonicBound { position }.into());
        }

        self.relation(lower.0, lower.1, lower.2);
        self.relation(upper.0, upper.1, upper.2);
    }

    /// Relations and ordering produced by the range algorithm.
    pub fn range(&mut self, predicate: RangePredicate) {
        for (relation, value) in predicate.relations.into_iter().zip(predicate.values) {
            let rendered = format!("{value:?}");
            self.relations.push(relation, Some(Bound { rendered, value }));
        }
        self.order_by = predicate.order_by;
    }

    /// SET assignment carrying one bound value.
    pub fn assignment(
        &mut self,
        assignment: impl Into<String>,
        source: &dyn Debug,
        value: Result<Value, Error>,
    ) {
        let bound = self.bound(source, value);
        self.assignments.push(assignment.into(), bound);
    }

    /// SET assignment with no bound value (`col = null`).
    pub fn assignment_literal(&mut self, assignment: impl Into<String>) {
        self.assignments.push(assignment.into(), None);
    }

    /// IF condition carrying one bound value.
    pub fn condition(
        &mut self,
        condition: impl Into<String>,
        source: &dyn Debug,
        value: Result<Value, Error>,
    ) {
        let bound = self.bound(source, value);
        self.conditions.push(condition.into(), bound);
    }

    //
    // statement shaping
    //

    pub fn order_by(&mut self, items: Vec<String>) {
        self.order_by = items;
    }

    /// ORDER BY every clustering column of `E` in the given direction.
    pub fn ordering<E: Entity>(&mut self, ordering: OrderingMode) {
        self.order_by = E::clustering_columns()
            .into_iter()
            .map(|column| column.order_item(ordering))
            .collect();
    }

    pub const fn limit(&mut self, limit: u32) {
        self.limit = Some(limit);
    }

    pub const fn per_partition_limit(&mut self, limit: u32) {
        self.per_partition_limit = Some(limit);
    }

    pub const fn allow_filtering(&mut self) {
        self.allow_filtering = true;
    }

    pub const fn if_not_exists(&mut self) {
        self.if_not_exists = true;
    }

    pub const fn if_exists(&mut self) {
        self.if_exists = true;
    }

    pub const fn using_ttl(&mut self, seconds: u32) {
        self.ttl = Some(seconds);
    }

    pub const fn using_timestamp(&mut self, micros: i64) {
        self.timestamp = Some(micros);
    }

    pub const fn consistency(&mut self, consistency: Consistency) {
        self.options.consistency = Some(consistency);
    }

    pub const fn serial_consistency(&mut self, consistency: Consistency) {
        self.options.serial_consistency = Some(consistency);
    }

    pub const fn fetch_size(&mut self, fetch_size: u32) {
        self.options.fetch_size = Some(fetch_size);
    }

    pub fn paging_state(&mut self, paging_state: Vec<u8>) {
        self.options.paging_state = Some(paging_state);
    }

    //
    // rendering
    //

    fn using_clause(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(ttl) = self.ttl {
            parts.push(format!("TTL {ttl}"));
        }
        if let Some(timestamp) = self.timestamp {
            parts.push(format!("TIMESTAMP {timestamp}"));
        }

        (!parts.is_empty()).then(|| format!(" USING {}", parts.join(" AND ")))
    }

    fn where_clause(&self) -> String {
        if self.relations.items.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.relations.join(" AND "))
        }
    }

    fn if_clause(&self) -> String {
        if self.if_exists {
            " IF EXISTS".to_string()
        } else if self.conditions.items.is_empty() {
            String::new()
        } else {
            format!(" IF {}", self.conditions.join(" AND "))
        }
    }

    fn render_cql(&self) -> String {
        let table = &self.table;
        let using = self.using_clause().unwrap_or_default();

        match self.kind {
            StatementKind::Select | StatementKind::SelectJson => {
                let json = if self.kind == StatementKind::SelectJson {
                    "JSON "
                } else {
                    ""
                };
                let mut cql = format!(
                    "SELECT {json}{} FROM {table}{}",
                    self.projection.join(", "),
                    self.where_clause()
                );
                if !self.order_by.is_empty() {
                    cql.push_str(&format!(" ORDER BY {}", self.order_by.join(", ")));
                }
                if let Some(limit) = self.per_partition_limit {
                    cql.push_str(&format!(" PER PARTITION LIMIT {limit}"));
                }
                if let Some(limit) = self.limit {
                    cql.push_str(&format!(" LIMIT {limit}"));
                }
                if self.allow_filtering || self.native_index_relations > 1 {
                    cql.push_str(" ALLOW FILTERING");
                }
                cql
            }
            StatementKind::Insert => {
                let placeholders = vec!["?"; self.assignments.items.len()].join(", ");
                let exists = if self.if_not_exists { " IF NOT EXISTS" } else { "" };

                format!(
                    "INSERT INTO {table} ({}) VALUES ({placeholders}){exists}{using}",
                    self.assignments.join(", ")
                )
            }
            StatementKind::InsertJson => {
                let exists = if self.if_not_exists { " IF NOT EXISTS" } else { "" };

                format!("INSERT INTO {table} JSON ?{exists}{using}")
            }
            StatementKind::Update => format!(
                "UPDATE {table}{using} SET {}{}{}",
                self.assignments.join(", "),
                self.where_clause(),
                self.if_clause()
            ),
            StatementKind::Delete => {
                let columns = if self.projection.items.is_empty() {
                    String::new()
                } else {
                    format!(" {}", self.projection.join(", "))
                };

                format!(
                    "DELETE{columns} FROM {table}{using}{}{}",
                    self.where_clause(),
                    self.if_clause()
                )
            }
        }
    }

    fn render(&self) -> Statement {
        let (bound_values, encoded_values) = self
            .projection
            .values
            .iter()
            .chain(&self.assignments.values)
            .chain(&self.relations.values)
            // IF EXISTS replaces the condition list
            .chain(self.conditions.values.iter().filter(|_| !self.if_exists))
            .map(|bound| (bound.rendered.clone(), bound.value.clone()))
            .unzip();

        Statement {
            cql: self.render_cql(),
            bound_values,
            encoded_values,
            options: self.options.clone(),
        }
    }

    /// Render without executing. Fails with the first encoding error.
    pub fn statement(self) -> Result<Statement, Error> {
        self.take_statement().map(|(_, statement)| statement)
    }

    //
    // execution
    //

    fn take_statement(self) -> Result<(&'a dyn Executor, Statement), Error> {
        match self.error {
            Some(err) => Err(err),
            None => Ok((self.session, self.render())),
        }
    }

    /// Prepare and execute; a conditional write that was not applied fails
    /// with [`Error::LwtNotApplied`].
    pub fn execute_raw(self) -> Result<ResultSet, Error> {
        let (session, statement) = self.take_statement()?;
        debug!(cql = %statement.cql, values = ?statement.bound_values, "executing statement");

        let prepared = session.prepare(&statement.cql)?;
        let result = session.execute(&prepared, &statement)?;

        check_applied(result)
    }

    pub async fn execute_raw_async(self) -> Result<ResultSet, Error> {
        let (session, statement) = self.take_statement()?;
        debug!(cql = %statement.cql, values = ?statement.bound_values, "executing statement asynchronously");

        let prepared = session.prepare(&statement.cql)?;
        let result = session.execute_async(&prepared, &statement).await?;

        check_applied(result)
    }

    pub fn execute(self) -> Result<(), Error> {
        self.execute_raw().map(|_| ())
    }

    pub async fn execute_async(self) -> Result<(), Error> {
        self.execute_raw_async().await.map(|_| ())
    }

    pub fn get_rows(self) -> Result<Vec<Row>, Error> {
        Ok(self.execute_raw()?.rows)
    }

    pub fn get_list<E: Entity>(self) -> Result<Vec<E>, Error> {
        self.execute_raw()?.rows.iter().map(E::from_row).collect()
    }

    pub async fn get_list_async<E: Entity>(self) -> Result<Vec<E>, Error> {
        self.execute_raw_async()
            .await?
            .rows
            .iter()
            .map(E::from_row)
            .collect()
    }

    /// First row mapped to `E`, if any.
    pub fn get_one<E: Entity>(self) -> Result<Option<E>, Error> {
        self.execute_raw()?.rows.first().map(E::from_row).transpose()
    }

    pub fn get_json_list(self) -> Result<Vec<String>, Error> {
        self.execute_raw()?.rows.iter().map(json_column).collect()
    }

    pub fn get_json_one(self) -> Result<Option<String>, Error> {
        self.execute_raw()?.rows.first().map(json_column).transpose()
    }
}

fn check_applied(result: ResultSet) -> Result<ResultSet, Error> {
    match result.rows.first() {
        Some(row) if row.applied() == Some(false) => {
            warn!(current = ?row.columns, "conditional statement not applied");

            Err(Error::LwtNotApplied {
                current: row.clone(),
            })
        }
        _ => Ok(result),
    }
}

fn json_column(row: &Row) -> Result<String, Error> {
    match row.get("[json]") {
        Some(Value::Text(json)) => Ok(json.clone()),
        _ => Err(Error::MissingJson),
    }
}
