use super::{KeyRange, RangeError};
use crate::value::Value;
use derive_more::Display;

///
/// BoundingMode
///
/// Inclusive or exclusive treatment of the start and end bound.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum BoundingMode {
    #[default]
    InclusiveBounds,
    ExclusiveBounds,
    InclusiveStartBoundOnly,
    InclusiveEndBoundOnly,
}

impl BoundingMode {
    const fn start_operator(self) -> &'static str {
        match self {
            Self::InclusiveBounds | Self::InclusiveStartBoundOnly => ">=",
            Self::ExclusiveBounds | Self::InclusiveEndBoundOnly => ">",
        }
    }

    const fn end_operator(self) -> &'static str {
        match self {
            Self::InclusiveBounds | Self::InclusiveEndBoundOnly => "<=",
            Self::ExclusiveBounds | Self::InclusiveStartBoundOnly => "<",
        }
    }
}

///
/// OrderingMode
///
/// Scan direction relative to the declared clustering order.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
pub enum OrderingMode {
    #[default]
    #[display("ascending")]
    Ascending,
    #[display("descending")]
    Descending,
}

///
/// ClusteringColumn
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClusteringColumn {
    pub name: &'static str,
    pub ascending: bool,
}

impl ClusteringColumn {
    #[must_use]
    pub const fn new(name: &'static str, ascending: bool) -> Self {
        Self { name, ascending }
    }

    /// ORDER BY item for this column under the requested scan direction.
    #[must_use]
    pub fn order_item(self, ordering: OrderingMode) -> String {
        let direction = match (self.ascending, ordering) {
            (true, OrderingMode::Ascending) | (false, OrderingMode::Descending) => "ASC",
            _ => "DESC",
        };

        format!("{} {direction}", self.name)
    }
}

///
/// RangePredicate
///
/// WHERE relations with their bound values, plus the ORDER BY items.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RangePredicate {
    pub relations: Vec<String>,
    pub values: Vec<Value>,
    pub order_by: Vec<String>,
}

impl RangePredicate {
    fn push(&mut self, column: &str, operator: &str, value: Value) {
        self.relations.push(format!("{column} {operator} ?"));
        self.values.push(value);
    }
}

impl KeyRange<Option<Value>> {
    /// Render the physical predicate.
    ///
    /// A composite partition key arrives as one `Value::Tuple` whose arity
    /// matches `partition_columns`. Range validity always used the natural
    /// order of the values; `ordering` only affects ORDER BY.
    pub fn to_predicate(
        &self,
        partition_columns: &[&'static str],
        clustering: &[ClusteringColumn],
        bounding: BoundingMode,
        ordering: OrderingMode,
    ) -> Result<RangePredicate, RangeError> {
        let mut predicate = RangePredicate::default();

        let Some((partition, fixed_clustering)) = self.fixed.split_first() else {
            return Ok(predicate);
        };

        // partition
        let partition = partition.clone().unwrap_or(Value::Null);
        match (partition_columns, partition) {
            ([column], value) => predicate.push(column, "=", value),
            (columns, Value::Tuple(items)) if items.len() == columns.len() => {
                for (column, value) in columns.iter().zip(items) {
                    predicate.push(column, "=", value);
                }
            }
            (columns, Value::Tuple(items)) => {
                return Err(RangeError::PartitionArity {
                    expected: columns.len(),
                    found: items.len(),
                });
            }
            (columns, _) => {
                return Err(RangeError::PartitionArity {
                    expected: columns.len(),
                    found: 1,
                });
            }
        }

        // clustering equality prefix, then the varying column
        let bounded = self.last_start.is_some() || self.last_end.is_some();
        let needed = fixed_clustering.len() + usize::from(bounded);
        if needed > clustering.len() {
            return Err(RangeError::TooManyComponents {
                expected: clustering.len(),
                found: needed,
            });
        }

        for (column, value) in clustering.iter().zip(fixed_clustering) {
            predicate.push(column.name, "=", value.clone().unwrap_or(Value::Null));
        }

        if let Some(varying) = clustering.get(fixed_clustering.len()) {
            if let Some(Some(start)) = &self.last_start {
                predicate.push(varying.name, bounding.start_operator(), start.clone());
            }
            if let Some(Some(end)) = &self.last_end {
                predicate.push(varying.name, bounding.end_operator(), end.clone());
            }
        }

        predicate.order_by = clustering
            .iter()
            .map(|column| column.order_item(ordering))
            .collect();

        Ok(predicate)
    }
}
