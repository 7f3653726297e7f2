use super::{EntityCx, delete, index, select, update};
use crate::profile::Feature;
use keyspace_schema::ddl;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// `<Entity>Manager`, the entry point holding the session. Every statement
/// family of the entity starts here.
pub fn generate(cx: &EntityCx<'_>) -> TokenStream {
    let ident = &cx.ident;
    let manager = cx.item("Manager");
    let json = cx.has(Feature::JsonStatements);

    let mut methods = read_methods(cx, json);
    methods.extend(slice_method(cx));

    if !cx.entity.is_view() {
        methods.extend(write_methods(cx, json));
    }

    if cx.generator.emit_ddl {
        let statements = ddl::entity_statements(cx.generator.schema, cx.entity);
        methods.extend(quote! {
            /// CREATE statements of this table and its indexes.
            #[must_use]
            pub const fn schema_statements() -> &'static [&'static str] {
                &[#(#statements),*]
            }
        });
    }

    let doc = format!(" Statement entry points for `{}`.", cx.entity.qualified_table());

    quote! {
        #[doc = #doc]
        #[derive(Clone, Copy)]
        pub struct #manager<'a> {
            session: &'a dyn ::keyspace::core::executor::Executor,
        }

        impl<'a> #manager<'a> {
            #[must_use]
            pub const fn new(session: &'a dyn ::keyspace::core::executor::Executor) -> Self {
                Self { session }
            }

            #methods
        }

        impl ::std::fmt::Debug for #manager<'_> {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(::std::stringify!(#manager))
                    .field("table", &<#ident as ::keyspace::core::entity::Entity>::qualified_table())
                    .finish_non_exhaustive()
            }
        }
    }
}

fn read_methods(cx: &EntityCx<'_>, json: bool) -> TokenStream {
    let ident = &cx.ident;
    let select = select::entry(cx, false);

    let mut tokens = quote! {
        pub fn select(&self) -> #select<'a> {
            #select {
                state: ::keyspace::core::query::QueryState::select::<#ident>(self.session, false),
            }
        }
    };

    if json {
        let select_json = select::entry(cx, true);
        tokens.extend(quote! {
            pub fn select_json(&self) -> #select_json<'a> {
                #select_json {
                    state: ::keyspace::core::query::QueryState::select::<#ident>(self.session, true),
                }
            }
        });
    }

    tokens
}

// partition-bounded slice reads over the clustering order
fn slice_method(cx: &EntityCx<'_>) -> TokenStream {
    if cx.clustering().is_empty() {
        return quote!();
    }

    let ident = &cx.ident;
    let partition = cx.partition();
    let names = partition.iter().map(|field| &field.ident).collect::<Vec<_>>();
    let types = partition.iter().map(|field| &field.value_ty);
    let encoded = partition
        .iter()
        .map(|field| {
            let name = &field.ident;
            field.encode(&quote!(&#name))
        })
        .collect::<Vec<_>>();

    let partition_value = match encoded.as_slice() {
        [single] => quote!(#single),
        _ => quote! {
            [#(#encoded),*]
                .into_iter()
                .collect::<::std::result::Result<::std::vec::Vec<_>, _>>()
                .map(::keyspace::core::value::Value::Tuple)
        },
    };

    quote! {
        /// Slice read within one partition, bounded by clustering tuples.
        pub fn slice(&self, #(#names: #types),*) -> ::keyspace::core::slice::SliceQuery<'a, #ident> {
            ::keyspace::core::slice::SliceQuery::new(self.session, #partition_value)
        }
    }
}

fn write_methods(cx: &EntityCx<'_>, json: bool) -> TokenStream {
    let ident = &cx.ident;
    let table = cx.table();
    let mut tokens = quote!();

    if cx.insertable() {
        let insert = cx.item("Insert");
        tokens.extend(quote! {
            pub fn insert(&self, entity: &#ident) -> #insert<'a> {
                #insert {
                    state: ::keyspace::core::query::QueryState::insert(self.session, entity),
                }
            }
        });

        if json {
            tokens.extend(quote! {
                pub fn insert_json(&self, json: &str) -> #insert<'a> {
                    #insert {
                        state: ::keyspace::core::query::QueryState::insert_json::<#ident>(self.session, json),
                    }
                }
            });
        }
    }

    let update_families = [
        ("update", "Update", !update::setters(cx).is_empty()),
        ("update_static", "UpdateStatic", !cx.statics().is_empty()),
    ];
    for (method, prefix, exists) in update_families {
        if !exists {
            continue;
        }
        let method = format_ident!("{method}");
        let entry = update::entry(cx, prefix);
        tokens.extend(quote! {
            pub fn #method(&self) -> #entry<'a> {
                #entry {
                    state: ::keyspace::core::query::QueryState::new(
                        self.session,
                        ::keyspace::core::query::StatementKind::Update,
                        #table,
                    ),
                }
            }
        });
    }

    let delete = delete::entry(cx, "Delete");
    tokens.extend(quote! {
        pub fn delete(&self) -> #delete<'a> {
            #delete {
                state: ::keyspace::core::query::QueryState::new(
                    self.session,
                    ::keyspace::core::query::StatementKind::Delete,
                    #table,
                ),
            }
        }
    });

    if !cx.statics().is_empty() {
        let delete_static = delete::entry(cx, "DeleteStatic");
        let columns = delete::static_columns(cx);
        tokens.extend(quote! {
            /// Deletes the static columns of one partition.
            pub fn delete_static(&self) -> #delete_static<'a> {
                let mut state = ::keyspace::core::query::QueryState::new(
                    self.session,
                    ::keyspace::core::query::StatementKind::Delete,
                    #table,
                );
                #( state.project(#columns); )*

                #delete_static { state }
            }
        });
    }

    if !cx.entity.indexed_fields().is_empty() {
        let index_select = index::entry(cx, false);
        tokens.extend(quote! {
            pub fn index_select(&self) -> #index_select<'a> {
                #index_select {
                    state: ::keyspace::core::query::QueryState::select::<#ident>(self.session, false),
                }
            }
        });

        if json {
            let index_select_json = index::entry(cx, true);
            tokens.extend(quote! {
                pub fn index_select_json(&self) -> #index_select_json<'a> {
                    #index_select_json {
                        state: ::keyspace::core::query::QueryState::select::<#ident>(self.session, true),
                    }
                }
            });
        }
    }

    tokens
}
