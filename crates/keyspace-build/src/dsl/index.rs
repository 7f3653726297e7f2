//! Secondary-index SELECT chains.
//!
//! The start state offers one relation family per indexed column; the end
//! state accepts more relations (combined with AND), explicit filtering and
//! the usual read modifiers. More than one native index relation implies
//! ALLOW FILTERING.

use super::{
    EntityCx, FieldCx, Step, define_all, encode_native, select::read_end_methods, state,
};
use crate::{BuildError, profile::Feature};
use keyspace_schema::{
    decl::SasiMode,
    model::{IndexImplementation, IndexKind, ShapeKind, ValueShape},
    types::ScalarType,
};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::Type;
use tracing::debug;

pub fn generate(cx: &EntityCx<'_>) -> Result<TokenStream, BuildError> {
    if cx.entity.indexed_fields().is_empty() {
        return Ok(quote!());
    }

    let mut tokens = family(cx, false)?;
    if cx.has(Feature::JsonStatements) {
        tokens.extend(family(cx, true)?);
    }

    Ok(tokens)
}

/// Entry state of the index chain.
pub fn entry(cx: &EntityCx<'_>, json: bool) -> Ident {
    if json {
        cx.item("IndexSelectJson")
    } else {
        cx.item("IndexSelect")
    }
}

fn family(cx: &EntityCx<'_>, json: bool) -> Result<TokenStream, BuildError> {
    let start = entry(cx, json);
    let end = if json {
        cx.item("IndexSelectJsonEnd")
    } else {
        cx.item("IndexSelectEnd")
    };

    let mut start_methods = quote!();
    let mut end_methods = quote! {
        pub fn allow_filtering(mut self) -> Self {
            self.state.allow_filtering();
            self
        }
    };

    for field in cx.fields.iter().filter(|f| !f.model.indexes.is_empty()) {
        start_methods.extend(operators(cx, field, Step::To(&end))?);
        end_methods.extend(operators(cx, field, Step::Stay)?);
    }
    end_methods.extend(define_all(&read_end_methods(cx, json, false)));

    let mut tokens = state(&start, &start_methods);
    tokens.extend(state(&end, &end_methods));
    debug!(entity = %cx.entity.name, json, "generated index select family");

    Ok(tokens)
}

fn operators(
    cx: &EntityCx<'_>,
    field: &FieldCx<'_>,
    step: Step<'_>,
) -> Result<TokenStream, BuildError> {
    let mut tokens = quote!();
    let shape = &field.model.shape;
    let scalar = shape.as_scalar();
    // LIKE binds text; range operators need an ordered scalar
    let text = scalar.is_some_and(ScalarType::is_text);
    let ordered = scalar.is_some_and(|scalar| scalar.is_numeric() || scalar.is_temporal());

    for index in &field.model.indexes {
        let ops = Ops { field, step };

        match index.implementation {
            IndexImplementation::Native => match index.kind {
                IndexKind::Normal | IndexKind::Full => {
                    tokens.extend(ops.value("_eq", "=", true, None));
                }
                IndexKind::Collection | IndexKind::MapValue => {
                    let element = element_type(cx, shape)?;
                    tokens.extend(ops.value("_contains", "CONTAINS", true, Some(&element)));
                }
                IndexKind::MapKey => {
                    let key = match &shape.kind {
                        ShapeKind::Map(key, _) => cx.generator.native(key)?,
                        _ => field.value_ty.clone(),
                    };
                    tokens.extend(ops.value("_contains_key", "CONTAINS KEY", true, Some(&key)));
                }
                IndexKind::MapEntry => {
                    if let ShapeKind::Map(key, value) = &shape.kind {
                        let key = cx.generator.native(key)?;
                        let value = cx.generator.native(value)?;
                        tokens.extend(ops.entry(&key, &value));
                    }
                }
            },
            IndexImplementation::Sasi(options) => {
                tokens.extend(ops.value("_eq", "=", false, None));
                match options.mode {
                    SasiMode::Prefix if text => tokens.extend(ops.like("_starts_with", "", "%")),
                    SasiMode::Contains if text => {
                        tokens.extend(ops.like("_starts_with", "", "%"));
                        tokens.extend(ops.like("_ends_with", "%", ""));
                        tokens.extend(ops.like("_contains_text", "%", "%"));
                        tokens.extend(ops.like("_like", "", ""));
                    }
                    SasiMode::Prefix | SasiMode::Sparse if ordered => tokens.extend(ops.ranges()),
                    _ => {}
                }
            }
            IndexImplementation::DseSearch { full_text, .. } => {
                tokens.extend(ops.value("_eq", "=", false, None));
                if text {
                    tokens.extend(ops.like("_starts_with", "", "%"));
                    tokens.extend(ops.like("_ends_with", "%", ""));
                    tokens.extend(ops.like("_contains_text", "%", "%"));
                }
                if full_text {
                    tokens.extend(ops.solr_query());
                }
            }
        }
    }

    Ok(tokens)
}

// element type a CONTAINS relation binds
fn element_type(cx: &EntityCx<'_>, shape: &ValueShape) -> Result<Type, BuildError> {
    match &shape.kind {
        ShapeKind::List(element) | ShapeKind::Set(element) | ShapeKind::Map(_, element) => {
            cx.generator.native(element)
        }
        _ => cx.generator.native(shape),
    }
}

///
/// Ops
/// Relation methods of one indexed column.
///

struct Ops<'f, 'i> {
    field: &'f FieldCx<'f>,
    step: Step<'i>,
}

impl Ops<'_, '_> {
    /// Relation binding one value. `ty` overrides the field type, encoded
    /// with the built-in codec.
    fn value(&self, suffix: &str, operator: &str, native: bool, ty: Option<&Type>) -> TokenStream {
        let name = self.field.method(suffix);
        let relation = self.field.relation(operator);
        let (ty, encoded) = match ty {
            Some(ty) => (ty, encode_native(&self.field.column, ty, &quote!(&value))),
            None => (&self.field.value_ty, self.field.encode(&quote!(&value))),
        };
        let (output, finish) = (self.step.output(), self.step.finish());

        quote! {
            pub fn #name(mut self, value: #ty) -> #output {
                self.state.index_relation(#relation, #native, &value, #encoded);
                #finish
            }
        }
    }

    fn ranges(&self) -> TokenStream {
        [("_gt", ">"), ("_gte", ">="), ("_lt", "<"), ("_lte", "<=")]
            .into_iter()
            .map(|(suffix, operator)| self.value(suffix, operator, false, None))
            .collect()
    }

    /// `LIKE` with the argument wrapped in `before`/`after` wildcards.
    fn like(&self, suffix: &str, before: &str, after: &str) -> TokenStream {
        let name = self.field.method(suffix);
        let relation = self.field.relation("LIKE");
        let pattern = format!("{before}{{}}{after}");
        let (output, finish) = (self.step.output(), self.step.finish());

        quote! {
            pub fn #name(mut self, text: &str) -> #output {
                let pattern = ::std::format!(#pattern, text);
                self.state.index_relation(
                    #relation,
                    false,
                    &pattern,
                    Ok(::keyspace::core::value::Value::Text(pattern.clone())),
                );
                #finish
            }
        }
    }

    /// Map entry relation `col[?] = ?`.
    fn entry(&self, key: &Type, value: &Type) -> TokenStream {
        let name = self.field.method("_contains_entry");
        let column = &self.field.column;
        let relation = format!("{column}[?] = ?");
        let encoded_key = encode_native(column, key, &quote!(&key));
        let encoded_value = encode_native(column, value, &quote!(&value));
        let (output, finish) = (self.step.output(), self.step.finish());

        quote! {
            pub fn #name(mut self, key: #key, value: #value) -> #output {
                let encoded_key = #encoded_key;
                let encoded_value = #encoded_value;
                self.state.index_relation_pair(
                    #relation,
                    true,
                    (&key, encoded_key),
                    (&value, encoded_value),
                );
                #finish
            }
        }
    }

    /// Raw DSE search query against this column, `solr_query = 'col:query'`.
    fn solr_query(&self) -> TokenStream {
        let name = self.field.method("_solr_query");
        let template = format!("{}:{{}}", self.field.column.trim_matches('"'));
        let (output, finish) = (self.step.output(), self.step.finish());

        quote! {
            pub fn #name(mut self, query: &str) -> #output {
                let query = ::std::format!(#template, query);
                self.state.index_relation(
                    "solr_query = ?",
                    false,
                    &query,
                    Ok(::keyspace::core::value::Value::Text(query.clone())),
                );
                #finish
            }
        }
    }
}
