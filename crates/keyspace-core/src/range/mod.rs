//! Compound-key range algorithm.
//!
//! A range is described by two component sequences, `start` and `end`. The
//! first component of each is the partition key; the remaining ones follow
//! the clustering order. The same resolution runs at build time over
//! symbolic components (to decide which slice shapes the DSL exposes) and at
//! run time over live values (to bound a slice query).

mod predicate;
mod shape;

#[cfg(test)]
mod tests;

pub use predicate::{BoundingMode, ClusteringColumn, OrderingMode, RangePredicate};
pub use shape::{ShapeComponent, SliceShape, legal_slice_shapes};

use crate::value::Value;
use derive_more::Display;
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// Side
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Side {
    #[display("start")]
    Start,
    #[display("end")]
    End,
}

///
/// RangeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RangeError {
    #[error("gap in compound key: {side} component {position} follows an absent component")]
    GapInCompoundKey { side: Side, position: usize },

    #[error("partition key component is absent on the {side} side")]
    PartitionKeyAbsent { side: Side },

    #[error("start and end partition keys differ")]
    PartitionKeyMismatch,

    #[error("start depth {start} and end depth {end} differ by more than one")]
    DepthMismatch { start: usize, end: usize },

    #[error("start and end differ at component {position}, before the last bound")]
    PrefixMismatch { position: usize },

    #[error("component {position}: start bound must be strictly lower than end bound")]
    NonMonotonicBound { position: usize },

    #[error("range needs at least one clustering bound")]
    MissingBound,

    #[error("range has {found} clustering components but the key has only {expected}")]
    TooManyComponents { expected: usize, found: usize },

    #[error("partition key has {found} components, expected {expected}")]
    PartitionArity { expected: usize, found: usize },
}

///
/// KeyComponent
///
/// One slot of a compound key as seen by the range algorithm.
///

pub trait KeyComponent {
    fn is_absent(&self) -> bool;

    fn key_eq(&self, other: &Self) -> bool;

    fn key_cmp(&self, other: &Self) -> Option<Ordering>;
}

impl KeyComponent for Option<Value> {
    fn is_absent(&self) -> bool {
        self.as_ref().is_none_or(Value::is_null)
    }

    fn key_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    fn key_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Some(a), Some(b)) => a.strict_cmp(b),
            _ => None,
        }
    }
}

///
/// KeyRange
///
/// Resolved range: components fixed by equality (partition key first), then
/// the optional lower and upper bound on the next clustering component.
///

#[derive(Clone, Debug, PartialEq)]
pub struct KeyRange<C> {
    pub fixed: Vec<C>,
    pub last_start: Option<C>,
    pub last_end: Option<C>,
}

impl<C> KeyRange<C> {
    const fn unbounded() -> Self {
        Self {
            fixed: Vec::new(),
            last_start: None,
            last_end: None,
        }
    }

    /// Whether the range scans whole partitions (no clustering restriction).
    #[must_use]
    pub fn is_whole_partition(&self) -> bool {
        self.fixed.len() <= 1 && self.last_start.is_none() && self.last_end.is_none()
    }

    /// Sequence position of the component varying across the range.
    #[must_use]
    pub fn varying_position(&self) -> usize {
        self.fixed.len().max(1)
    }
}

/// Index of the last present component, `None` when every component is absent.
#[must_use]
pub fn last_non_null_index<C: KeyComponent>(components: &[C]) -> Option<usize> {
    components.iter().rposition(|c| !c.is_absent())
}

/// Reject a present component following an absent one.
pub fn check_no_hole<C: KeyComponent>(components: &[C], side: Side) -> Result<(), RangeError> {
    let mut absent_seen = false;

    for (position, component) in components.iter().enumerate() {
        if component.is_absent() {
            absent_seen = true;
        } else if absent_seen {
            return Err(RangeError::GapInCompoundKey { side, position });
        }
    }

    Ok(())
}

/// Resolve `start`/`end` into fixed components and last bounds.
pub fn resolve<C: KeyComponent + Clone>(start: &[C], end: &[C]) -> Result<KeyRange<C>, RangeError> {
    // both sides unset: whole-partition scan
    if start.is_empty() && end.is_empty() {
        return Ok(KeyRange::unbounded());
    }

    check_no_hole(start, Side::Start)?;
    check_no_hole(end, Side::End)?;

    let si = last_non_null_index(start).ok_or(RangeError::PartitionKeyAbsent { side: Side::Start })?;
    let ei = last_non_null_index(end).ok_or(RangeError::PartitionKeyAbsent { side: Side::End })?;

    if !start[0].key_eq(&end[0]) {
        return Err(RangeError::PartitionKeyMismatch);
    }
    if si.abs_diff(ei) > 1 {
        return Err(RangeError::DepthMismatch { start: si, end: ei });
    }

    if si == ei {
        if si == 0 {
            return Ok(KeyRange {
                fixed: vec![start[0].clone()],
                last_start: None,
                last_end: None,
            });
        }

        check_equal_prefix(start, end, si)?;

        if start[si].key_cmp(&end[si]) != Some(Ordering::Less) {
            return Err(RangeError::NonMonotonicBound { position: si });
        }

        return Ok(KeyRange {
            fixed: start[..si].to_vec(),
            last_start: Some(start[si].clone()),
            last_end: Some(end[si].clone()),
        });
    }

    let common = si.min(ei);
    check_equal_prefix(start, end, common + 1)?;

    let (last_start, last_end) = if si > ei {
        (Some(start[si].clone()), None)
    } else {
        (None, Some(end[ei].clone()))
    };

    Ok(KeyRange {
        fixed: start[..=common].to_vec(),
        last_start,
        last_end,
    })
}

/// Like [`resolve`], but a range without any clustering bound is rejected.
pub fn resolve_bounded<C: KeyComponent + Clone>(
    start: &[C],
    end: &[C],
) -> Result<KeyRange<C>, RangeError> {
    let range = resolve(start, end)?;
    if range.is_whole_partition() {
        return Err(RangeError::MissingBound);
    }

    Ok(range)
}

// components 1..upto must match pairwise; position 0 is checked separately
fn check_equal_prefix<C: KeyComponent>(
    start: &[C],
    end: &[C],
    upto: usize,
) -> Result<(), RangeError> {
    for position in 1..upto {
        if !start[position].key_eq(&end[position]) {
            return Err(RangeError::PrefixMismatch { position });
        }
    }

    Ok(())
}
