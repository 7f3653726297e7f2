use super::*;
use proptest::prelude::*;

fn int(v: i32) -> Option<Value> {
    Some(Value::Int(v))
}

fn text(v: &str) -> Option<Value> {
    Some(Value::Text(v.to_string()))
}

fn user_clustering() -> [ClusteringColumn; 2] {
    [
        ClusteringColumn::new("clust1", true),
        ClusteringColumn::new("clust2", false),
    ]
}

#[test]
fn equal_depth_bounds_must_increase() {
    let range = resolve(&[int(5), text("a"), int(10)], &[int(5), text("a"), int(12)]).unwrap();

    assert_eq!(range.fixed, vec![int(5), text("a")]);
    assert_eq!(range.last_start, Some(int(10)));
    assert_eq!(range.last_end, Some(int(12)));

    let reversed = resolve(&[int(5), text("a"), int(12)], &[int(5), text("a"), int(10)]);
    assert_eq!(reversed, Err(RangeError::NonMonotonicBound { position: 2 }));
}

#[test]
fn equal_bounds_are_rejected() {
    let err = resolve(&[int(5), int(7)], &[int(5), int(7)]).unwrap_err();

    assert_eq!(err, RangeError::NonMonotonicBound { position: 1 });
}

#[test]
fn unequal_depth_bounds_one_side() {
    let range = resolve(&[int(5), text("a")], &[int(5), text("a"), int(12)]).unwrap();

    assert_eq!(range.fixed, vec![int(5), text("a")]);
    assert_eq!(range.last_start, None);
    assert_eq!(range.last_end, Some(int(12)));

    let range = resolve(&[int(5), text("a"), int(3)], &[int(5), text("a"), None]).unwrap();
    assert_eq!(range.last_start, Some(int(3)));
    assert_eq!(range.last_end, None);
}

#[test]
fn unequal_depth_requires_equal_prefix() {
    let err = resolve(&[int(5), text("a")], &[int(5), text("b"), int(12)]).unwrap_err();

    assert_eq!(err, RangeError::PrefixMismatch { position: 1 });
}

#[test]
fn depth_difference_above_one_is_rejected() {
    let err = resolve(&[int(5)], &[int(5), text("a"), int(12)]).unwrap_err();

    assert_eq!(err, RangeError::DepthMismatch { start: 0, end: 2 });
}

#[test]
fn gaps_are_rejected_on_either_side() {
    let err = resolve(&[int(5), None, int(1)], &[int(5), text("a"), int(2)]).unwrap_err();
    assert_eq!(
        err,
        RangeError::GapInCompoundKey {
            side: Side::Start,
            position: 2
        }
    );

    let err = resolve(
        &[int(5), text("a")],
        &[int(5), Some(Value::Null), int(2)],
    )
    .unwrap_err();
    assert_eq!(
        err,
        RangeError::GapInCompoundKey {
            side: Side::End,
            position: 2
        }
    );
}

#[test]
fn partition_key_must_match_and_be_present() {
    assert_eq!(
        resolve(&[int(5), int(1)], &[int(6), int(2)]),
        Err(RangeError::PartitionKeyMismatch)
    );
    assert_eq!(
        resolve(&[None], &[int(6)]),
        Err(RangeError::PartitionKeyAbsent { side: Side::Start })
    );
    assert_eq!(
        resolve(&[int(6)], &[]),
        Err(RangeError::PartitionKeyAbsent { side: Side::End })
    );
}

#[test]
fn whole_partition_special_cases() {
    let empty: [Option<Value>; 0] = [];
    let range = resolve(&empty, &empty).unwrap();
    assert!(range.is_whole_partition());

    let range = resolve(&[int(5)], &[int(5), None]).unwrap();
    assert!(range.is_whole_partition());
    assert_eq!(range.fixed, vec![int(5)]);

    assert_eq!(
        resolve_bounded(&[int(5)], &[int(5)]),
        Err(RangeError::MissingBound)
    );
}

#[test]
fn predicate_renders_fixed_prefix_and_bounds() {
    let range = resolve(&[int(5), text("a")], &[int(5), text("a"), int(12)]).unwrap();
    let predicate = range
        .to_predicate(
            &["id"],
            &user_clustering(),
            BoundingMode::ExclusiveBounds,
            OrderingMode::Ascending,
        )
        .unwrap();

    assert_eq!(
        predicate.relations,
        vec!["id = ?", "clust1 = ?", "clust2 < ?"]
    );
    assert_eq!(predicate.values, vec![Value::Int(5), Value::Text("a".into()), Value::Int(12)]);
    assert_eq!(predicate.order_by, vec!["clust1 ASC", "clust2 DESC"]);
}

#[test]
fn predicate_descending_reverses_declared_order() {
    let range = resolve(&[int(5), text("a")], &[int(5), text("c")]).unwrap();
    let predicate = range
        .to_predicate(
            &["id"],
            &user_clustering(),
            BoundingMode::InclusiveStartBoundOnly,
            OrderingMode::Descending,
        )
        .unwrap();

    assert_eq!(
        predicate.relations,
        vec!["id = ?", "clust1 >= ?", "clust1 < ?"]
    );
    assert_eq!(predicate.order_by, vec!["clust1 DESC", "clust2 ASC"]);
}

#[test]
fn predicate_splits_composite_partition() {
    let partition = Some(Value::Tuple(vec![Value::Int(1), Value::Text("eu".into())]));
    let range = resolve(&[partition.clone()], &[partition]).unwrap();
    let predicate = range
        .to_predicate(
            &["tenant", "region"],
            &[],
            BoundingMode::default(),
            OrderingMode::default(),
        )
        .unwrap();

    assert_eq!(predicate.relations, vec!["tenant = ?", "region = ?"]);

    let err = range
        .to_predicate(&["a", "b", "c"], &[], BoundingMode::default(), OrderingMode::default())
        .unwrap_err();
    assert_eq!(err, RangeError::PartitionArity { expected: 3, found: 2 });
}

#[test]
fn predicate_rejects_ranges_deeper_than_the_key() {
    let range = resolve(&[int(1), int(2), int(3)], &[int(1), int(2), int(4)]).unwrap();
    let err = range
        .to_predicate(
            &["id"],
            &[ClusteringColumn::new("c", true)],
            BoundingMode::default(),
            OrderingMode::default(),
        )
        .unwrap_err();

    assert_eq!(err, RangeError::TooManyComponents { expected: 1, found: 2 });
}

#[test]
fn legal_shapes_cover_one_and_two_sided_bounds() {
    assert!(legal_slice_shapes(0).is_empty());

    for position in 1..5 {
        assert_eq!(
            legal_slice_shapes(position),
            vec![SliceShape::UPPER, SliceShape::LOWER, SliceShape::BOTH]
        );
    }
}

proptest! {
    #[test]
    fn two_sided_ranges_accept_exactly_increasing_bounds(
        pk in any::<i32>(),
        prefix in proptest::collection::vec(any::<i32>(), 0..3),
        a in any::<i32>(),
        b in any::<i32>(),
    ) {
        let mut start = vec![int(pk)];
        start.extend(prefix.iter().copied().map(int));
        let mut end = start.clone();
        start.push(int(a));
        end.push(int(b));

        let result = resolve(&start, &end);
        prop_assert_eq!(result.is_ok(), a < b);

        if let Ok(range) = result {
            prop_assert_eq!(range.fixed.len(), prefix.len() + 1);
            prop_assert_eq!(range.last_start, Some(int(a)));
            prop_assert_eq!(range.last_end, Some(int(b)));
        }
    }

    #[test]
    fn resolve_never_reports_a_range_with_holes(
        start in proptest::collection::vec(proptest::option::of(0i32..3), 0..5),
        end in proptest::collection::vec(proptest::option::of(0i32..3), 0..5),
    ) {
        let start: Vec<_> = start.into_iter().map(|v| v.map(Value::Int)).collect();
        let end: Vec<_> = end.into_iter().map(|v| v.map(Value::Int)).collect();

        if let Ok(range) = resolve(&start, &end) {
            prop_assert!(range.fixed.iter().all(|c| !c.is_absent()));
            prop_assert!(range.fixed.len() <= start.len().max(end.len()));
        }
    }
}
