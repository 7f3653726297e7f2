use super::{
    EntityCx, FieldCx, Step, conditional_methods, consistency_methods, define_all, eq_method,
    forward_all, insert::using_methods, key_chain, range_methods, state, write_terminals,
};
use crate::profile::Feature;
use proc_macro2::{Ident, TokenStream};
use tracing::debug;

/// DELETE chains: the partition key is mandatory; clustering columns may
/// narrow the deletion. A whole partition or a full primary key can always
/// terminate; prefixes and slices need range deletes.
pub fn generate(cx: &EntityCx<'_>) -> TokenStream {
    let mut tokens = family(cx, "Delete", &cx.clustering());
    if !cx.statics().is_empty() {
        tokens.extend(family(cx, "DeleteStatic", &[]));
    }

    tokens
}

/// Entry state of a delete family.
pub fn entry(cx: &EntityCx<'_>, prefix: &str) -> Ident {
    cx.partition().first().map_or_else(
        || cx.item(&format!("{prefix}End")),
        |field| cx.item(&format!("{prefix}Where{}", field.pascal)),
    )
}

fn family(cx: &EntityCx<'_>, prefix: &str, clustering: &[&FieldCx<'_>]) -> TokenStream {
    let end = cx.item(&format!("{prefix}End"));
    let clustering_states = clustering
        .iter()
        .map(|field| cx.item(&format!("{prefix}Where{}", field.pascal)))
        .collect::<Vec<_>>();
    let after_partition = clustering_states.first().unwrap_or(&end);

    let range_delete = cx.has(Feature::ClusteringRangeDelete);
    let conditions = if prefix == "DeleteStatic" {
        Vec::new()
    } else {
        cx.conditional()
    };

    let mut tail = using_methods(false);
    tail.extend(consistency_methods());
    tail.extend(write_terminals());
    let (mut end_methods, conditional_states) = conditional_methods(cx, prefix, &conditions, &tail);
    end_methods.extend(tail);

    let (_, mut tokens) = key_chain(cx, prefix, &cx.partition(), after_partition);

    for (k, field) in clustering.iter().enumerate() {
        let next = clustering_states.get(k + 1).unwrap_or(&end);

        let mut methods = eq_method(field, &field.method("_eq"), Step::To(next));
        if range_delete {
            methods.extend(range_methods(field, k + 1, &end));
        }
        // k == 0 deletes the whole partition
        if k == 0 || range_delete {
            methods.extend(forward_all(&end_methods, &end));
        }

        tokens.extend(state(&clustering_states[k], &methods));
    }

    tokens.extend(state(&end, &define_all(&end_methods)));
    tokens.extend(conditional_states);
    debug!(entity = %cx.entity.name, family = prefix, range_delete, "generated delete family");

    tokens
}

/// Columns projected by `delete_static`.
pub fn static_columns(cx: &EntityCx<'_>) -> Vec<String> {
    cx.statics()
        .into_iter()
        .map(|field| field.column.clone())
        .collect()
}
