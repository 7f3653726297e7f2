use super::{Generator, parse_ident};
use crate::BuildError;
use convert_case::{Case, Casing};
use keyspace_schema::model::FunctionModel;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use std::collections::BTreeMap;

/// `FunctionRegistry`: declared signatures plus one typed call builder per
/// function. Overloads sharing a name get an `_<n>` suffix in declaration
/// order.
pub fn generate(generator: &Generator<'_>) -> Result<TokenStream, BuildError> {
    let functions = &generator.schema.functions;

    let mut counts = BTreeMap::<&str, usize>::new();
    for function in functions {
        *counts.entry(function.name.as_str()).or_default() += 1;
    }

    let mut seen = BTreeMap::<&str, usize>::new();
    let mut builders = quote!();
    for function in functions {
        let overload = seen.entry(function.name.as_str()).or_default();
        let suffix = (counts[function.name.as_str()] > 1).then_some(*overload);
        *overload += 1;

        builders.extend(builder(generator, function, suffix)?);
    }

    let signatures = functions.iter().map(signature);

    Ok(quote! {
        /// Typed builders for the declared user functions.
        pub struct FunctionRegistry;

        impl FunctionRegistry {
            pub const SIGNATURES: &'static [::keyspace::core::query::function::FunctionSignature] =
                &[#(#signatures),*];

            #builders
        }
    })
}

fn builder(
    generator: &Generator<'_>,
    function: &FunctionModel,
    suffix: Option<usize>,
) -> Result<TokenStream, BuildError> {
    let base = function.name.to_case(Case::Snake);
    let name = match suffix {
        Some(n) => format_ident!("{base}_{n}"),
        None => parse_ident(&base)?,
    };

    let mut params = Vec::new();
    let mut types = Vec::new();
    for (param, shape) in &function.params {
        params.push(parse_ident(&param.to_case(Case::Snake))?);
        types.push(generator.native(shape)?);
    }

    let keyspace = match &function.keyspace {
        Some(keyspace) => quote!(::std::option::Option::Some(#keyspace)),
        None => quote!(::std::option::Option::None),
    };
    let function_name = &function.name;
    let doc = format!(" `{}`", function.signature());

    Ok(quote! {
        #[doc = #doc]
        #[must_use]
        pub fn #name(
            #(#params: ::keyspace::core::query::function::FunctionArg<#types>),*
        ) -> ::keyspace::core::query::function::FunctionCall {
            ::keyspace::core::query::function::FunctionCall::new(#keyspace, #function_name)
                #(.arg(#params))*
        }
    })
}

fn signature(function: &FunctionModel) -> TokenStream {
    let keyspace = match &function.keyspace {
        Some(keyspace) => quote!(::std::option::Option::Some(#keyspace)),
        None => quote!(::std::option::Option::None),
    };
    let name = &function.name;
    let params = function.params.iter().map(|(param, shape)| {
        let ty = shape.to_string();
        quote!((#param, #ty))
    });
    let returns = function.returns.to_string();
    let deterministic = function.deterministic;

    quote! {
        ::keyspace::core::query::function::FunctionSignature {
            keyspace: #keyspace,
            name: #name,
            params: &[#(#params),*],
            returns: #returns,
            deterministic: #deterministic,
        }
    }
}
