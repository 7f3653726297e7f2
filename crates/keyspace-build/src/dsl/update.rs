//! UPDATE chains.
//!
//! `Set` takes the first assignment, `SetOrWhere` takes more assignments or
//! the first key relation, then one state per remaining key column leads to
//! the end state. The static family restricts both to static columns and
//! the partition key.

use super::{
    EntityCx, FieldCx, Step, conditional_methods, consistency_methods, define_all, encode_native,
    eq_method, insert::using_methods, key_chain, parse_ident, state, write_terminals,
};
use crate::BuildError;
use keyspace_schema::model::ShapeKind;
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{Type, parse_quote};
use tracing::debug;

pub fn generate(cx: &EntityCx<'_>) -> Result<TokenStream, BuildError> {
    let mut tokens = quote!();

    let setters = setters(cx);
    if !setters.is_empty() {
        let mut keys = cx.partition();
        keys.extend(cx.clustering());
        tokens.extend(family(cx, "Update", &setters, &keys, &cx.conditional())?);
    }

    let statics = cx.statics();
    if !statics.is_empty() {
        let conditions = statics
            .iter()
            .copied()
            .filter(|field| !field.model.role.is_counter())
            .collect::<Vec<_>>();
        tokens.extend(family(cx, "UpdateStatic", &statics, &cx.partition(), &conditions)?);
    }

    Ok(tokens)
}

/// Columns the regular update family may assign.
pub fn setters<'c>(cx: &'c EntityCx<'_>) -> Vec<&'c FieldCx<'c>> {
    cx.fields
        .iter()
        .filter(|field| !field.model.is_key() && field.model.role.is_writable())
        .collect()
}

/// Entry state of an update family, when the family exists.
pub fn entry(cx: &EntityCx<'_>, prefix: &str) -> Ident {
    cx.item(&format!("{prefix}Set"))
}

fn family(
    cx: &EntityCx<'_>,
    prefix: &str,
    setters: &[&FieldCx<'_>],
    keys: &[&FieldCx<'_>],
    conditions: &[&FieldCx<'_>],
) -> Result<TokenStream, BuildError> {
    let Some((first_key, other_keys)) = keys.split_first() else {
        return Ok(quote!());
    };

    let start = entry(cx, prefix);
    let set_or_where = cx.item(&format!("{prefix}SetOrWhere"));
    let end = cx.item(&format!("{prefix}End"));

    let mut start_methods = quote!();
    let mut more_methods = quote!();
    for field in setters {
        start_methods.extend(setter_methods(cx, field, Step::To(&set_or_where))?);
        more_methods.extend(setter_methods(cx, field, Step::Stay)?);
    }

    let (second_state, key_states) = key_chain(cx, prefix, other_keys, &end);
    let after_first = second_state.as_ref().unwrap_or(&end);
    more_methods.extend(eq_method(first_key, &first_key.ident, Step::To(after_first)));

    let mut tail = using_methods(!cx.entity.has_counters());
    tail.extend(consistency_methods());
    tail.extend(write_terminals());
    let (mut end_methods, conditional_states) = conditional_methods(cx, prefix, conditions, &tail);
    end_methods.extend(tail);

    let mut tokens = state(&start, &start_methods);
    tokens.extend(state(&set_or_where, &more_methods));
    tokens.extend(key_states);
    tokens.extend(state(&end, &define_all(&end_methods)));
    tokens.extend(conditional_states);
    debug!(entity = %cx.entity.name, family = prefix, setters = setters.len(), "generated update family");

    Ok(tokens)
}

/// Assignment methods of one column; each leads to `step`.
fn setter_methods(
    cx: &EntityCx<'_>,
    field: &FieldCx<'_>,
    step: Step<'_>,
) -> Result<TokenStream, BuildError> {
    let column = &field.column;
    let ty = &field.value_ty;
    let (output, finish) = (step.output(), step.finish());

    if field.model.role.is_counter() {
        let counter: Type = parse_quote!(i64);
        let encoded = encode_native(column, &counter, &quote!(&by));
        let incr = field.method("_incr");
        let decr = field.method("_decr");
        let add = format!("{column} = {column} + ?");
        let sub = format!("{column} = {column} - ?");

        return Ok(quote! {
            pub fn #incr(mut self, by: i64) -> #output {
                self.state.assignment(#add, &by, #encoded);
                #finish
            }

            pub fn #decr(mut self, by: i64) -> #output {
                self.state.assignment(#sub, &by, #encoded);
                #finish
            }
        });
    }

    let set = field.method("_set");
    let set_null = field.method("_set_null");
    let assign = field.relation("=");
    let null = format!("{column} = null");
    let encoded = field.encode(&quote!(&value));

    let mut tokens = quote! {
        pub fn #set(mut self, value: #ty) -> #output {
            self.state.assignment(#assign, &value, #encoded);
            #finish
        }

        pub fn #set_null(mut self) -> #output {
            self.state.assignment_literal(#null);
            #finish
        }
    };

    let shape = &field.model.shape;
    if !field.native || shape.frozen {
        return Ok(tokens);
    }

    let whole = field.encode(&quote!(&values));
    let append = format!("{column} = {column} + ?");
    let prepend = format!("{column} = ? + {column}");
    let remove = format!("{column} = {column} - ?");

    match &shape.kind {
        ShapeKind::List(element) => {
            let element = cx.generator.native(element)?;
            let (append_to, prepend_to, remove_from, set_at) = (
                field.method("_append_to"),
                field.method("_prepend_to"),
                field.method("_remove_from"),
                field.method("_set_at_index"),
            );
            let at_index = format!("{column}[{{}}] = ?");
            let element_encoded = encode_native(column, &element, &quote!(&value));

            tokens.extend(quote! {
                pub fn #append_to(mut self, values: #ty) -> #output {
                    self.state.assignment(#append, &values, #whole);
                    #finish
                }

                pub fn #prepend_to(mut self, values: #ty) -> #output {
                    self.state.assignment(#prepend, &values, #whole);
                    #finish
                }

                pub fn #set_at(mut self, index: usize, value: #element) -> #output {
                    self.state.assignment(::std::format!(#at_index, index), &value, #element_encoded);
                    #finish
                }

                pub fn #remove_from(mut self, values: #ty) -> #output {
                    self.state.assignment(#remove, &values, #whole);
                    #finish
                }
            });
        }
        ShapeKind::Set(_) => {
            let (add_to, remove_from) = (field.method("_add_to"), field.method("_remove_from"));

            tokens.extend(quote! {
                pub fn #add_to(mut self, values: #ty) -> #output {
                    self.state.assignment(#append, &values, #whole);
                    #finish
                }

                pub fn #remove_from(mut self, values: #ty) -> #output {
                    self.state.assignment(#remove, &values, #whole);
                    #finish
                }
            });
        }
        ShapeKind::Map(key, _) => {
            let key = cx.generator.native(key)?;
            let keys: Type = parse_quote!(::std::collections::BTreeSet<#key>);
            let keys_encoded = encode_native(column, &keys, &quote!(&keys));
            let (put_to, remove_by_key) = (field.method("_put_to"), field.method("_remove_by_key"));
            let entries_encoded = field.encode(&quote!(&entries));

            tokens.extend(quote! {
                pub fn #put_to(mut self, entries: #ty) -> #output {
                    self.state.assignment(#append, &entries, #entries_encoded);
                    #finish
                }

                pub fn #remove_by_key(mut self, keys: #keys) -> #output {
                    self.state.assignment(#remove, &keys, #keys_encoded);
                    #finish
                }
            });
        }
        ShapeKind::Udt(name) => {
            let Some(udt) = cx.generator.schema.udt(name) else {
                return Ok(tokens);
            };

            for sub in &udt.fields {
                let sub_ident = parse_ident(&sub.name)?;
                let method = format_ident!("{}_{}_set", field.ident, sub_ident);
                let sub_ty = cx.generator.native(&sub.shape)?;
                let relation = format!("{column}.{} = ?", sub.column);
                let encoded = encode_native(column, &sub_ty, &quote!(&value));

                tokens.extend(quote! {
                    pub fn #method(mut self, value: #sub_ty) -> #output {
                        self.state.assignment(#relation, &value, #encoded);
                        #finish
                    }
                });
            }
        }
        ShapeKind::Scalar(_) | ShapeKind::Counter | ShapeKind::Tuple(_) => {}
    }

    Ok(tokens)
}
