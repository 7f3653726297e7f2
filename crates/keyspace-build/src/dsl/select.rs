//! SELECT chains: one state per partition column, then one per clustering
//! column, then the end state.

use super::{
    EndMethod, EntityCx, Step, consistency_methods, define_all, eq_method, forward_all,
    from_json_method, in_method, param, range_methods, state, statement_terminal,
};
use crate::profile::Feature;
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use tracing::debug;

pub fn generate(cx: &EntityCx<'_>) -> TokenStream {
    let mut tokens = family(cx, false);
    if cx.has(Feature::JsonStatements) {
        tokens.extend(family(cx, true));
    }

    tokens
}

/// Entry state of the chain, the first partition column.
pub fn entry(cx: &EntityCx<'_>, json: bool) -> Ident {
    let prefix = prefix(json);
    cx.partition().first().map_or_else(
        || cx.item(&format!("{prefix}End")),
        |field| cx.item(&format!("{prefix}Where{}", field.pascal)),
    )
}

const fn prefix(json: bool) -> &'static str {
    if json { "SelectJson" } else { "Select" }
}

fn family(cx: &EntityCx<'_>, json: bool) -> TokenStream {
    let prefix = prefix(json);
    let partition = cx.partition();
    let clustering = cx.clustering();

    let end = cx.item(&format!("{prefix}End"));
    let partition_states = partition
        .iter()
        .map(|field| cx.item(&format!("{prefix}Where{}", field.pascal)))
        .collect::<Vec<_>>();
    let clustering_states = clustering
        .iter()
        .map(|field| cx.item(&format!("{prefix}Where{}", field.pascal)))
        .collect::<Vec<_>>();
    let end_methods = read_end_methods(cx, json, !clustering.is_empty());

    let mut tokens = quote!();

    // partition key, one column per state
    for (i, field) in partition.iter().enumerate() {
        let next = partition_states
            .get(i + 1)
            .or_else(|| clustering_states.first())
            .unwrap_or(&end);
        let step = Step::To(next);

        let mut methods = quote!();
        if i == 0 && !cx.generator.schema.functions.is_empty() {
            methods.extend(quote! {
                pub fn with_function(
                    mut self,
                    call: &::keyspace::core::query::function::FunctionCall,
                    alias: &str,
                ) -> Self {
                    self.state.project_function(call, alias);
                    self
                }
            });
        }
        methods.extend(eq_method(field, &field.ident, step));
        if i + 1 == partition.len() {
            methods.extend(in_method(field, step));
        }
        if cx.has(Feature::JsonRelations) {
            methods.extend(from_json_method(field, step));
        }

        tokens.extend(state(&partition_states[i], &methods));
    }

    // clustering columns: equality moves on, a slice ends the chain
    for (k, field) in clustering.iter().enumerate() {
        let next = clustering_states.get(k + 1).unwrap_or(&end);

        let mut methods = eq_method(field, &field.method("_eq"), Step::To(next));
        methods.extend(range_methods(field, k + 1, &end));
        methods.extend(forward_all(&end_methods, &end));

        tokens.extend(state(&clustering_states[k], &methods));
    }

    tokens.extend(state(&end, &define_all(&end_methods)));
    debug!(
        entity = %cx.entity.name,
        family = prefix,
        states = partition.len() + clustering.len() + 1,
        "generated select family"
    );

    tokens
}

/// Modifiers and terminals of a read end state.
pub fn read_end_methods(cx: &EntityCx<'_>, json: bool, ordering: bool) -> Vec<EndMethod> {
    let ident = &cx.ident;
    let mut methods = vec![EndMethod::modifier(
        "limit",
        vec![param("limit", quote!(u32))],
        quote!(self.state.limit(limit)),
    )];

    if cx.has(Feature::PerPartitionLimit) {
        methods.push(EndMethod::modifier(
            "per_partition_limit",
            vec![param("limit", quote!(u32))],
            quote!(self.state.per_partition_limit(limit)),
        ));
    }

    if ordering {
        methods.push(EndMethod::modifier(
            "with_natural_order",
            Vec::new(),
            quote!(self.state.ordering::<#ident>(::keyspace::core::range::OrderingMode::Ascending)),
        ));
        methods.push(EndMethod::modifier(
            "with_reversed_order",
            Vec::new(),
            quote!(self.state.ordering::<#ident>(::keyspace::core::range::OrderingMode::Descending)),
        ));
    }

    methods.extend(consistency_methods());
    methods.push(EndMethod::modifier(
        "with_fetch_size",
        vec![param("fetch_size", quote!(u32))],
        quote!(self.state.fetch_size(fetch_size)),
    ));
    methods.push(EndMethod::modifier(
        "with_paging_state",
        vec![param("paging_state", quote!(::std::vec::Vec<u8>))],
        quote!(self.state.paging_state(paging_state)),
    ));

    methods.push(statement_terminal());
    if json {
        methods.push(EndMethod::terminal(
            "get_json_list",
            quote!(::std::result::Result<::std::vec::Vec<::std::string::String>, ::keyspace::core::Error>),
            quote!(self.state.get_json_list()),
        ));
        methods.push(EndMethod::terminal(
            "get_json_one",
            quote!(::std::result::Result<::std::option::Option<::std::string::String>, ::keyspace::core::Error>),
            quote!(self.state.get_json_one()),
        ));
    } else {
        methods.push(EndMethod::terminal(
            "get_list",
            quote!(::std::result::Result<::std::vec::Vec<#ident>, ::keyspace::core::Error>),
            quote!(self.state.get_list::<#ident>()),
        ));
        methods.push(EndMethod::terminal(
            "get_one",
            quote!(::std::result::Result<::std::option::Option<#ident>, ::keyspace::core::Error>),
            quote!(self.state.get_one::<#ident>()),
        ));
        methods.push(EndMethod::terminal(
            "get_rows",
            quote!(::std::result::Result<::std::vec::Vec<::keyspace::core::executor::Row>, ::keyspace::core::Error>),
            quote!(self.state.get_rows()),
        ));
        methods.push(EndMethod::terminal_async(
            "get_list_async",
            quote!(::std::result::Result<::std::vec::Vec<#ident>, ::keyspace::core::Error>),
            quote!(self.state.get_list_async::<#ident>().await),
        ));
    }

    methods
}
