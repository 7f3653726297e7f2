use super::{Generator, parse_ident};
use crate::BuildError;
use keyspace_schema::{codec::is_orderable, model::UdtModel};
use proc_macro2::TokenStream;
use quote::quote;

/// A user type struct and its `ColumnValue` conversion. Fields map to the
/// UDT's named slots; absent slots read as `Null`.
pub fn generate(generator: &Generator<'_>, udt: &UdtModel) -> Result<TokenStream, BuildError> {
    let ident = parse_ident(&udt.name)?;

    let mut fields = Vec::new();
    let mut to_value = Vec::new();
    let mut from_value = Vec::new();
    let mut ordered = true;

    for field in &udt.fields {
        let name = parse_ident(&field.name)?;
        let ty = generator.native(&field.shape)?;
        let column = &field.column;
        ordered &= is_orderable(&field.shape, &generator.schema.udts);

        fields.push(quote!(pub #name: #ty));
        to_value.push(quote! {
            (
                #column.to_string(),
                ::keyspace::core::traits::ColumnValue::to_value(&self.#name),
            )
        });
        from_value.push(quote! {
            #name: ::keyspace::core::traits::udt_field(value, #column)?
        });
    }

    let derives = if ordered {
        quote!(#[derive(Clone, Debug, Eq, Ord, PartialEq, PartialOrd)])
    } else {
        quote!(#[derive(Clone, Debug, PartialEq)])
    };

    Ok(quote! {
        #derives
        pub struct #ident {
            #(#fields,)*
        }

        impl ::keyspace::core::traits::ColumnValue for #ident {
            fn to_value(&self) -> ::keyspace::core::value::Value {
                ::keyspace::core::value::Value::Udt(::std::vec![#(#to_value,)*])
            }

            fn from_value(
                value: &::keyspace::core::value::Value,
            ) -> ::std::option::Option<Self> {
                ::std::option::Option::Some(Self {
                    #(#from_value,)*
                })
            }
        }
    })
}
