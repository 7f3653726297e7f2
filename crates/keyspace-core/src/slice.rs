//! Slice queries over one partition's clustering order.

use crate::{
    Error,
    entity::Entity,
    executor::{Executor, PreparedStatement, Row},
    query::QueryState,
    range::{self, BoundingMode, ClusteringColumn, KeyRange, OrderingMode},
    statement::{Consistency, Statement},
    value::Value,
};
use std::{cmp::Ordering, collections::VecDeque, marker::PhantomData};
use tracing::{debug, trace, warn};

///
/// SliceQuery
///
/// Range read bounded by start and end clustering tuples within one
/// partition. The bounds go through the compound-key range algorithm before
/// any statement is sent.
///

pub struct SliceQuery<'a, E> {
    session: &'a dyn Executor,
    partition: Result<Value, Error>,
    from: Vec<Value>,
    to: Vec<Value>,
    bounding: BoundingMode,
    ordering: OrderingMode,
    fetch_size: Option<u32>,
    limit: Option<u32>,
    consistency: Option<Consistency>,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> SliceQuery<'a, E> {
    /// `partition` is the partition key value; a composite key is one
    /// `Value::Tuple` in declared order.
    #[must_use]
    pub fn new(session: &'a dyn Executor, partition: Result<Value, Error>) -> Self {
        Self {
            session,
            partition,
            from: Vec::new(),
            to: Vec::new(),
            bounding: BoundingMode::default(),
            ordering: OrderingMode::default(),
            fetch_size: None,
            limit: None,
            consistency: None,
            _entity: PhantomData,
        }
    }

    #[must_use]
    pub fn from_clusterings(mut self, components: Vec<Value>) -> Self {
        self.from = components;
        self
    }

    #[must_use]
    pub fn to_clusterings(mut self, components: Vec<Value>) -> Self {
        self.to = components;
        self
    }

    #[must_use]
    pub const fn with_bounding(mut self, bounding: BoundingMode) -> Self {
        self.bounding = bounding;
        self
    }

    #[must_use]
    pub const fn with_ordering(mut self, ordering: OrderingMode) -> Self {
        self.ordering = ordering;
        self
    }

    #[must_use]
    pub const fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_consistency(mut self, consistency: Consistency) -> Self {
        self.consistency = Some(consistency);
        self
    }

    fn into_state(self) -> Result<(QueryState<'a>, Option<Tracked>), Error> {
        let partition = self.partition?;
        let range = resolve_slice(&partition, &self.from, &self.to)?;
        let clustering = E::clustering_columns();
        let predicate = range.to_predicate(
            &E::partition_columns(),
            &clustering,
            self.bounding,
            self.ordering,
        )?;

        let mut state = QueryState::select::<E>(self.session, false);
        state.range(predicate);
        if let Some(limit) = self.limit {
            state.limit(limit);
        }
        if let Some(fetch_size) = self.fetch_size {
            state.fetch_size(fetch_size);
        }
        if let Some(consistency) = self.consistency {
            state.consistency(consistency);
        }

        let tracked = clustering
            .get(range.varying_position() - 1)
            .map(|column| Tracked::new(*column, self.ordering));

        Ok((state, tracked))
    }

    pub fn statement(self) -> Result<Statement, Error> {
        self.into_state()?.0.statement()
    }

    pub fn get_list(self) -> Result<Vec<E>, Error> {
        self.into_state()?.0.get_list()
    }

    pub async fn get_list_async(self) -> Result<Vec<E>, Error> {
        self.into_state()?.0.get_list_async().await
    }

    /// Lazily page through the slice using the executor's paging state.
    pub fn pager(self) -> Result<SlicePager<'a, E>, Error> {
        let session = self.session;
        let (state, tracked) = self.into_state()?;
        let statement = state.statement()?;
        debug!(cql = %statement.cql, "opening slice pager");

        Ok(SlicePager {
            session,
            prepared: None,
            statement,
            buffer: VecDeque::new(),
            paging_state: None,
            exhausted: false,
            failed: false,
            tracked,
            _entity: PhantomData,
        })
    }
}

// partition key leads both sequences
fn resolve_slice(
    partition: &Value,
    from: &[Value],
    to: &[Value],
) -> Result<KeyRange<Option<Value>>, Error> {
    let sequence = |components: &[Value]| {
        std::iter::once(Some(partition.clone()))
            .chain(components.iter().cloned().map(Some))
            .collect::<Vec<_>>()
    };

    Ok(range::resolve(&sequence(from), &sequence(to))?)
}

///
/// Tracked
/// Varying clustering column and the last value seen on it.
///

struct Tracked {
    column: &'static str,
    ascending: bool,
    last: Option<Value>,
}

impl Tracked {
    fn new(column: ClusteringColumn, ordering: OrderingMode) -> Self {
        let ascending = column.ascending == (ordering == OrderingMode::Ascending);

        Self {
            column: column.name,
            ascending,
            last: None,
        }
    }

    fn observe(&mut self, row: &Row) -> Result<(), Error> {
        let Some(current) = row.get(self.column) else {
            return Ok(());
        };

        if let Some(previous) = &self.last {
            let backwards = match current.strict_cmp(previous) {
                Some(Ordering::Less) => self.ascending,
                Some(Ordering::Greater) => !self.ascending,
                _ => false,
            };
            if backwards {
                return Err(Error::PageOutOfOrder {
                    column: self.column,
                    previous: format!("{previous:?}"),
                    current: format!("{current:?}"),
                    direction: if self.ascending { "ascending" } else { "descending" },
                });
            }
        }
        self.last = Some(current.clone());

        Ok(())
    }
}

///
/// SlicePager
///

pub struct SlicePager<'a, E> {
    session: &'a dyn Executor,
    prepared: Option<PreparedStatement>,
    statement: Statement,
    buffer: VecDeque<Row>,
    paging_state: Option<Vec<u8>>,
    exhausted: bool,
    failed: bool,
    tracked: Option<Tracked>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SlicePager<'_, E> {
    fn fetch(&mut self) -> Result<(), Error> {
        let prepared = match &self.prepared {
            Some(prepared) => prepared.clone(),
            None => {
                let prepared = self.session.prepare(&self.statement.cql)?;
                self.prepared = Some(prepared.clone());
                prepared
            }
        };

        self.statement.options.paging_state = self.paging_state.take();
        let page = self.session.execute(&prepared, &self.statement)?;
        trace!(rows = page.rows.len(), more = page.paging_state.is_some(), "fetched slice page");

        self.exhausted = page.paging_state.is_none();
        self.paging_state = page.paging_state;
        self.buffer.extend(page.rows);

        Ok(())
    }

    fn next_row(&mut self) -> Result<Option<Row>, Error> {
        loop {
            if let Some(row) = self.buffer.pop_front() {
                if let Some(tracked) = &mut self.tracked {
                    tracked.observe(&row)?;
                }
                return Ok(Some(row));
            }
            if self.exhausted {
                return Ok(None);
            }
            self.fetch()?;
        }
    }
}

impl<E: Entity> Iterator for SlicePager<'_, E> {
    type Item = Result<E, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.next_row() {
            Ok(row) => row.map(|row| E::from_row(&row)),
            Err(err) => {
                warn!(error = %err, "slice pager stopped");
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::NativeCodec,
        entity::{ColumnKind, ColumnMeta, decode_column},
        executor::ResultSet,
        range::RangeError,
        testing::RecordingExecutor,
    };

    #[derive(Debug, PartialEq)]
    struct Reading {
        sensor: i64,
        day: String,
        seq: i32,
    }

    impl Entity for Reading {
        const KEYSPACE: Option<&'static str> = Some("metrics");
        const TABLE: &'static str = "reading";
        const COLUMNS: &'static [ColumnMeta] = &[
            ColumnMeta {
                name: "sensor",
                kind: ColumnKind::Partition,
                cql_type: "bigint",
                expression: "sensor",
            },
            ColumnMeta {
                name: "day",
                kind: ColumnKind::Clustering { ascending: true },
                cql_type: "text",
                expression: "day",
            },
            ColumnMeta {
                name: "seq",
                kind: ColumnKind::Clustering { ascending: false },
                cql_type: "int",
                expression: "seq",
            },
        ];

        fn from_row(row: &Row) -> Result<Self, Error> {
            Ok(Self {
                sensor: decode_column::<NativeCodec<i64>>(row, "sensor")?,
                day: decode_column::<NativeCodec<String>>(row, "day")?,
                seq: decode_column::<NativeCodec<i32>>(row, "seq")?,
            })
        }

        fn encode_columns(&self) -> Result<Vec<(&'static str, Value)>, Error> {
            Ok(vec![
                ("sensor", Value::BigInt(self.sensor)),
                ("day", Value::Text(self.day.clone())),
                ("seq", Value::Int(self.seq)),
            ])
        }
    }

    fn row(day: &str, seq: i32) -> Row {
        Row::default()
            .with("sensor", Value::BigInt(7))
            .with("day", Value::Text(day.into()))
            .with("seq", Value::Int(seq))
    }

    #[test]
    fn slice_statement_bounds_the_deepest_component() {
        let session = RecordingExecutor::new();
        let statement = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .from_clusterings(vec![Value::Text("mon".into()), Value::Int(10)])
            .to_clusterings(vec![Value::Text("mon".into()), Value::Int(12)])
            .with_bounding(BoundingMode::InclusiveStartBoundOnly)
            .limit(50)
            .statement()
            .unwrap();

        assert_eq!(
            statement.cql,
            "SELECT sensor, day, seq FROM metrics.reading WHERE sensor = ? AND day = ? \
             AND seq >= ? AND seq < ? ORDER BY day ASC, seq DESC LIMIT 50"
        );
        assert_eq!(statement.encoded_values.len(), 4);
    }

    #[test]
    fn invalid_ranges_fail_before_any_io() {
        let session = RecordingExecutor::new();
        let err = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .from_clusterings(vec![Value::Text("tue".into())])
            .to_clusterings(vec![Value::Text("mon".into())])
            .get_list()
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Range(RangeError::NonMonotonicBound { position: 1 })
        ));
        assert!(session.prepared().is_empty());
    }

    #[test]
    fn pager_follows_paging_state_across_pages() {
        let session = RecordingExecutor::new()
            .with_response(
                ResultSet::new(vec![row("mon", 1), row("tue", 1)]).with_paging_state(vec![1]),
            )
            .with_response(ResultSet::new(vec![row("wed", 3)]));

        let readings = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .with_fetch_size(2)
            .pager()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[2].day, "wed");

        let executed = session.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[0].options.paging_state, None);
        assert_eq!(executed[1].options.paging_state, Some(vec![1]));
        assert_eq!(session.prepared().len(), 1);
    }

    #[test]
    fn pager_rejects_a_page_that_goes_backwards() {
        let session = RecordingExecutor::new()
            .with_response(ResultSet::new(vec![row("tue", 1)]).with_paging_state(vec![1]))
            .with_response(ResultSet::new(vec![row("mon", 1)]));

        let mut pager = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .pager()
            .unwrap();

        assert!(pager.next().unwrap().is_ok());
        assert!(matches!(
            pager.next(),
            Some(Err(Error::PageOutOfOrder { column: "day", .. }))
        ));
        assert!(pager.next().is_none());
    }

    #[test]
    fn descending_scan_tracks_reversed_direction() {
        let session = RecordingExecutor::new().with_response(ResultSet::new(vec![
            row("wed", 1),
            row("tue", 1),
            row("mon", 1),
        ]));

        let readings = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .with_ordering(OrderingMode::Descending)
            .pager()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(readings.len(), 3);
        assert!(
            session.executed()[0]
                .cql
                .ends_with("ORDER BY day DESC, seq ASC")
        );
    }

    #[tokio::test]
    async fn async_list_decodes_rows() {
        let session =
            RecordingExecutor::new().with_response(ResultSet::new(vec![row("mon", 4)]));

        let readings = SliceQuery::<Reading>::new(&session, Ok(Value::BigInt(7)))
            .from_clusterings(vec![Value::Text("mon".into())])
            .get_list_async()
            .await
            .unwrap();

        assert_eq!(
            readings,
            vec![Reading {
                sensor: 7,
                day: "mon".into(),
                seq: 4
            }]
        );
    }
}
