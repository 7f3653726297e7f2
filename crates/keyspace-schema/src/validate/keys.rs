use crate::{
    error::{ErrorTree, Violation},
    model::{ColumnRole, EntityModel},
};

/// Whether `orders` is exactly `0..orders.len()`, each value once.
#[must_use]
pub fn is_contiguous(orders: &[u32]) -> bool {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();

    sorted
        .iter()
        .enumerate()
        .all(|(i, order)| usize::try_from(*order).is_ok_and(|order| order == i))
}

pub fn validate_keys(entity: &EntityModel, errs: &mut ErrorTree) {
    let mut partition = Vec::new();
    let mut clustering = Vec::new();
    for field in &entity.fields {
        match field.role {
            ColumnRole::Partition { order } => partition.push(order),
            ColumnRole::Clustering { order, .. } => clustering.push(order),
            _ => {}
        }
    }

    if partition.is_empty() {
        errs.add(Violation::MissingPartitionKey);
    }

    for (role, orders) in [("partition", partition), ("clustering", clustering)] {
        if !is_contiguous(&orders) {
            let mut found = orders;
            found.sort_unstable();
            errs.add(Violation::KeyOrderGap {
                role,
                expected: found.len(),
                found,
            });
        }
    }

    let has_clustering = entity.fields.iter().any(|f| f.role.is_clustering());
    for field in &entity.fields {
        if field.role.is_static() && !has_clustering {
            errs.add_for(field.name.clone(), Violation::StaticWithoutClustering);
        }
    }
}
