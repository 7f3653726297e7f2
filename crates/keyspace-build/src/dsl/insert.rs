use super::{EndMethod, EntityCx, consistency_methods, define_all, param, state, write_terminals};
use crate::profile::Feature;
use proc_macro2::TokenStream;
use quote::quote;

/// INSERT has a single state; both `insert` and `insert_json` land on it.
pub fn generate(cx: &EntityCx<'_>) -> TokenStream {
    if !cx.insertable() {
        return quote!();
    }

    let mut methods = Vec::new();
    if cx.has(Feature::LightweightTransactions) {
        methods.push(EndMethod::modifier(
            "if_not_exists",
            Vec::new(),
            quote!(self.state.if_not_exists()),
        ));
    }
    methods.extend(using_methods(true));
    methods.extend(consistency_methods());
    methods.extend(write_terminals());

    state(&cx.item("Insert"), &define_all(&methods))
}

/// `using_ttl` (when allowed) and `using_timestamp`.
pub fn using_methods(ttl: bool) -> Vec<EndMethod> {
    let mut methods = Vec::new();
    if ttl {
        methods.push(EndMethod::modifier(
            "using_ttl",
            vec![param("seconds", quote!(u32))],
            quote!(self.state.using_ttl(seconds)),
        ));
    }
    methods.push(EndMethod::modifier(
        "using_timestamp",
        vec![param("micros", quote!(i64))],
        quote!(self.state.using_timestamp(micros)),
    ));

    methods
}
