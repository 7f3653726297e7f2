use super::{EntityCx, FieldCx};
use keyspace_schema::model::ColumnRole;
use proc_macro2::TokenStream;
use quote::quote;

/// The entity struct and its `Entity` mapping.
pub fn generate(cx: &EntityCx<'_>) -> TokenStream {
    let ident = &cx.ident;
    let entity = cx.entity;

    let struct_fields = cx.fields.iter().map(|field| {
        let name = &field.ident;
        let ty = &field.value_ty;
        if field.optional() {
            quote!(pub #name: ::std::option::Option<#ty>)
        } else {
            quote!(pub #name: #ty)
        }
    });

    let keyspace = match &entity.keyspace {
        Some(keyspace) => quote!(::std::option::Option::Some(#keyspace)),
        None => quote!(::std::option::Option::None),
    };
    let table = &entity.table;
    let columns = cx.fields.iter().map(|field| column_meta(cx, field));
    let decoders = cx.fields.iter().map(decode);
    let encoders = cx
        .fields
        .iter()
        .filter(|field| is_inserted(field))
        .map(encode);

    quote! {
        #[derive(Clone, Debug, PartialEq)]
        pub struct #ident {
            #(#struct_fields,)*
        }

        impl ::keyspace::core::entity::Entity for #ident {
            const KEYSPACE: ::std::option::Option<&'static str> = #keyspace;
            const TABLE: &'static str = #table;
            const COLUMNS: &'static [::keyspace::core::entity::ColumnMeta] = &[
                #(#columns,)*
            ];

            fn from_row(
                row: &::keyspace::core::executor::Row,
            ) -> ::std::result::Result<Self, ::keyspace::core::Error> {
                ::std::result::Result::Ok(Self {
                    #(#decoders,)*
                })
            }

            fn encode_columns(
                &self,
            ) -> ::std::result::Result<
                ::std::vec::Vec<(&'static str, ::keyspace::core::value::Value)>,
                ::keyspace::core::Error,
            > {
                ::std::result::Result::Ok(::std::vec![
                    #(#encoders,)*
                ])
            }
        }
    }
}

// insert writes everything but computed and counter columns
const fn is_inserted(field: &FieldCx<'_>) -> bool {
    !matches!(
        field.model.role,
        ColumnRole::Computed | ColumnRole::Counter | ColumnRole::StaticCounter
    )
}

fn column_meta(cx: &EntityCx<'_>, field: &FieldCx<'_>) -> TokenStream {
    let name = &field.column;
    let kind = match field.model.role {
        ColumnRole::Partition { .. } => quote!(Partition),
        ColumnRole::Clustering { ascending, .. } => quote!(Clustering { ascending: #ascending }),
        ColumnRole::Static => quote!(Static),
        ColumnRole::StaticCounter => quote!(StaticCounter),
        ColumnRole::Counter => quote!(Counter),
        ColumnRole::Regular => quote!(Regular),
        ColumnRole::Computed => quote!(Computed),
    };
    let cql_type = cx.generator.schema.column_type(cx.entity, field.model);
    let expression = field.model.computed.as_ref().map_or_else(
        || field.column.clone(),
        |computed| {
            let targets = computed
                .targets
                .iter()
                .map(|target| {
                    cx.entity
                        .field(target)
                        .map_or_else(|| target.clone(), |f| f.column.clone())
                })
                .collect::<Vec<_>>();
            computed.expression(&targets)
        },
    );

    quote! {
        ::keyspace::core::entity::ColumnMeta {
            name: #name,
            kind: ::keyspace::core::entity::ColumnKind::#kind,
            cql_type: #cql_type,
            expression: #expression,
        }
    }
}

fn decode(field: &FieldCx<'_>) -> TokenStream {
    let name = &field.ident;
    let codec = &field.codec_ty;
    let column = &field.column;

    if field.optional() {
        quote!(#name: ::keyspace::core::entity::decode_optional_column::<#codec>(row, #column)?)
    } else {
        quote!(#name: ::keyspace::core::entity::decode_column::<#codec>(row, #column)?)
    }
}

fn encode(field: &FieldCx<'_>) -> TokenStream {
    let name = &field.ident;
    let codec = &field.codec_ty;
    let column = &field.column;

    if field.optional() {
        quote! {
            (#column, ::keyspace::core::codec::encode_optional_column::<#codec>(#column, self.#name.as_ref())?)
        }
    } else {
        let value = field.encode(&quote!(&self.#name));
        quote!((#column, #value?))
    }
}
