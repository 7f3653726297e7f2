//! DSL synthesis.
//!
//! Every statement family is a chain of type-state builders. Each state is
//! a thin struct around one `QueryState`; methods consume the state and
//! return its successor, so only legal statement shapes type-check.

mod delete;
mod entity;
mod functions;
mod index;
mod insert;
mod manager;
mod select;
mod udt;
mod update;

#[cfg(test)]
mod tests;

use crate::{
    BuildError,
    profile::{Capabilities, CapabilityError, Feature},
};
use convert_case::{Case, Casing};
use keyspace_core::range::{SliceShape, legal_slice_shapes};
use keyspace_schema::{
    Schema,
    codec::{ResolvedCodec, native_type},
    ddl,
    model::{
        EntityModel, FieldModel, IndexImplementation, IndexKind, IndexModel, ShapeKind,
        ValueShape,
    },
};
use proc_macro2::{Ident, TokenStream};
use quote::{format_ident, quote};
use syn::{Type, parse_str};
use tracing::{debug, info};

///
/// Generator
///

pub struct Generator<'a> {
    schema: &'a Schema,
    capabilities: &'a Capabilities,
    emit_ddl: bool,
}

impl<'a> Generator<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, capabilities: &'a Capabilities, emit_ddl: bool) -> Self {
        Self {
            schema,
            capabilities,
            emit_ddl,
        }
    }

    /// Synthesize every item for the schema, or fail without output.
    pub fn generate(&self) -> Result<TokenStream, BuildError> {
        self.check_capabilities()?;

        let mut tokens = quote!();
        for udt in &self.schema.udts {
            tokens.extend(udt::generate(self, udt)?);
        }

        for entity in &self.schema.entities {
            let cx = EntityCx::new(self, entity)?;

            tokens.extend(entity::generate(&cx));
            tokens.extend(select::generate(&cx));
            if !entity.is_view() {
                tokens.extend(insert::generate(&cx));
                tokens.extend(update::generate(&cx)?);
                tokens.extend(delete::generate(&cx));
                tokens.extend(index::generate(&cx)?);
            }
            tokens.extend(manager::generate(&cx));

            info!(entity = %entity.name, table = %entity.qualified_table(), "generated entity DSL");
        }

        if !self.schema.functions.is_empty() {
            tokens.extend(functions::generate(self)?);
        }

        if self.emit_ddl {
            let statements = ddl::schema_statements(self.schema);
            tokens.extend(quote! {
                /// Every CREATE statement of the schema, dependencies first.
                pub const SCHEMA_STATEMENTS: &[&str] = &[#(#statements),*];
            });
        }

        Ok(tokens)
    }

    #[must_use]
    pub fn has(&self, feature: Feature) -> bool {
        self.capabilities.has(feature)
    }

    /// Reject any declared construct the selected profile cannot express.
    pub fn check_capabilities(&self) -> Result<(), CapabilityError> {
        let capabilities = self.capabilities;

        for entity in &self.schema.entities {
            if entity.is_view() {
                capabilities.require(Feature::MaterializedViews)?;
            }

            for field in &entity.fields {
                if field.role.is_static() {
                    capabilities.require(Feature::StaticColumns)?;
                }
                if self.is_unfrozen_udt(&field.shape) {
                    capabilities.require(Feature::NonFrozenUdt)?;
                }
                for index in &field.indexes {
                    if let Some(feature) = index_feature(index) {
                        capabilities.require(feature)?;
                    }
                }
            }
        }

        if !self.schema.functions.is_empty() {
            capabilities.require(Feature::UserFunctions)?;
        }

        Ok(())
    }

    fn is_unfrozen_udt(&self, shape: &ValueShape) -> bool {
        matches!(&shape.kind, ShapeKind::Udt(name) if !shape.frozen && self.schema.udt(name).is_some())
    }

    /// Rust type of a storage shape under the built-in mapping.
    pub(crate) fn native(&self, shape: &ValueShape) -> Result<Type, BuildError> {
        let ty = native_type(shape, &self.schema.udts).map_err(|e| BuildError::Resolve {
            ty: shape.to_string(),
            source: e,
        })?;

        parse_type(&ty)
    }
}

const fn index_feature(index: &IndexModel) -> Option<Feature> {
    match index.implementation {
        IndexImplementation::Sasi(_) => Some(Feature::SasiIndex),
        IndexImplementation::DseSearch { .. } => Some(Feature::DseSearch),
        IndexImplementation::Native => match index.kind {
            IndexKind::Normal => None,
            IndexKind::Full => Some(Feature::FullCollectionIndex),
            IndexKind::Collection | IndexKind::MapValue => Some(Feature::CollectionIndex),
            IndexKind::MapKey => Some(Feature::MapKeyIndex),
            IndexKind::MapEntry => Some(Feature::MapEntryIndex),
        },
    }
}

//
// parsing helpers
//

pub(crate) fn parse_ident(input: &str) -> Result<Ident, BuildError> {
    parse_str::<Ident>(input).map_err(|e| BuildError::Syntax {
        kind: "identifier",
        input: input.to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn parse_type(input: &str) -> Result<Type, BuildError> {
    parse_str::<Type>(input).map_err(|e| BuildError::Syntax {
        kind: "type",
        input: input.to_string(),
        message: e.to_string(),
    })
}

///
/// EntityCx
/// Everything the family generators need about one entity.
///

pub(crate) struct EntityCx<'a> {
    pub generator: &'a Generator<'a>,
    pub entity: &'a EntityModel,
    pub ident: Ident,
    pub fields: Vec<FieldCx<'a>>,
}

impl<'a> EntityCx<'a> {
    fn new(generator: &'a Generator<'a>, entity: &'a EntityModel) -> Result<Self, BuildError> {
        let fields = entity
            .ordered_fields()
            .into_iter()
            .map(|field| FieldCx::new(generator, entity, field))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            generator,
            entity,
            ident: parse_ident(&entity.name)?,
            fields,
        })
    }

    /// Name of a generated item belonging to this entity.
    pub fn item(&self, suffix: &str) -> Ident {
        format_ident!("{}{}", self.ident, suffix)
    }

    pub fn has(&self, feature: Feature) -> bool {
        self.generator.has(feature)
    }

    pub fn partition(&self) -> Vec<&FieldCx<'a>> {
        self.fields
            .iter()
            .filter(|f| f.model.role.is_partition())
            .collect()
    }

    pub fn clustering(&self) -> Vec<&FieldCx<'a>> {
        self.fields
            .iter()
            .filter(|f| f.model.role.is_clustering())
            .collect()
    }

    pub fn statics(&self) -> Vec<&FieldCx<'a>> {
        self.fields
            .iter()
            .filter(|f| f.model.role.is_static())
            .collect()
    }

    /// Columns an `IF col = ?` condition may test.
    pub fn conditional(&self) -> Vec<&FieldCx<'a>> {
        self.fields
            .iter()
            .filter(|f| !f.model.is_key() && f.model.role.is_writable() && !f.model.role.is_counter())
            .collect()
    }

    /// Whether INSERT applies: base tables without counters.
    pub fn insertable(&self) -> bool {
        !self.entity.is_view() && !self.entity.has_counters()
    }

    pub fn table(&self) -> TokenStream {
        let ident = &self.ident;
        quote!(<#ident as ::keyspace::core::entity::Entity>::qualified_table())
    }
}

///
/// FieldCx
///

pub(crate) struct FieldCx<'a> {
    pub model: &'a FieldModel,
    pub ident: Ident,
    pub pascal: String,
    pub column: String,
    pub value_ty: Type,
    pub codec_ty: Type,
    pub native: bool,
}

impl<'a> FieldCx<'a> {
    fn new(
        generator: &Generator<'_>,
        entity: &EntityModel,
        model: &'a FieldModel,
    ) -> Result<Self, BuildError> {
        let codec = generator
            .schema
            .codec(entity, model)
            .ok_or_else(|| BuildError::MissingCodec {
                entity: entity.name.clone(),
                field: model.name.clone(),
            })?;

        Ok(Self {
            model,
            ident: parse_ident(&model.name)?,
            pascal: model.name.to_case(Case::Pascal),
            column: model.column.clone(),
            value_ty: parse_type(codec.rust_type())?,
            codec_ty: parse_type(&codec.codec_type())?,
            native: matches!(codec, ResolvedCodec::Native { .. }),
        })
    }

    /// Method name `<field><suffix>`.
    pub fn method(&self, suffix: &str) -> Ident {
        format_ident!("{}{}", self.ident, suffix)
    }

    /// Whether the struct field is an `Option`.
    pub const fn optional(&self) -> bool {
        self.model.optional && !self.model.is_key()
    }

    /// Encode `value` (an expression of type `&value_ty`) with the field codec.
    pub fn encode(&self, value: &TokenStream) -> TokenStream {
        let codec = &self.codec_ty;
        let column = &self.column;

        quote!(::keyspace::core::codec::encode_column::<#codec>(#column, #value))
    }

    /// Relation text `<column> <operator> ?`.
    pub fn relation(&self, operator: &str) -> String {
        format!("{} {operator} ?", self.column)
    }
}

/// Encode `value` with the built-in codec of `ty`, reporting `column`.
pub(crate) fn encode_native(column: &str, ty: &Type, value: &TokenStream) -> TokenStream {
    quote! {
        ::keyspace::core::codec::encode_column::<::keyspace::core::codec::NativeCodec<#ty>>(#column, #value)
    }
}

//
// builder states
//

/// One builder state around the query state.
pub(crate) fn state(ident: &Ident, methods: &TokenStream) -> TokenStream {
    quote! {
        #[must_use]
        pub struct #ident<'a> {
            state: ::keyspace::core::query::QueryState<'a>,
        }

        impl<'a> #ident<'a> {
            #methods
        }
    }
}

///
/// Step
/// Where a relation or assignment method leads.
///

#[derive(Clone, Copy)]
pub(crate) enum Step<'i> {
    To(&'i Ident),
    Stay,
}

impl Step<'_> {
    pub fn output(self) -> TokenStream {
        match self {
            Self::To(next) => quote!(#next<'a>),
            Self::Stay => quote!(Self),
        }
    }

    pub fn finish(self) -> TokenStream {
        match self {
            Self::To(next) => quote!(#next { state: self.state }),
            Self::Stay => quote!(self),
        }
    }
}

/// `<field>(value)`: equality relation on a key column.
pub(crate) fn eq_method(field: &FieldCx<'_>, name: &Ident, step: Step<'_>) -> TokenStream {
    let ty = &field.value_ty;
    let relation = field.relation("=");
    let encode = field.encode(&quote!(&value));
    let (output, finish) = (step.output(), step.finish());

    quote! {
        pub fn #name(mut self, value: #ty) -> #output {
            self.state.relation(#relation, &value, #encode);
            #finish
        }
    }
}

/// `<field>_in(values)`: IN relation, legal on the last partition column.
pub(crate) fn in_method(field: &FieldCx<'_>, step: Step<'_>) -> TokenStream {
    let name = field.method("_in");
    let ty = &field.value_ty;
    let codec = &field.codec_ty;
    let column = &field.column;
    let relation = field.relation("IN");
    let (output, finish) = (step.output(), step.finish());

    quote! {
        pub fn #name(mut self, values: ::std::vec::Vec<#ty>) -> #output {
            let encoded = ::keyspace::core::codec::encode_column_list::<#codec>(#column, &values);
            self.state.relation(#relation, &values, encoded);
            #finish
        }
    }
}

/// `<field>_from_json(json)`: equality against a JSON literal.
pub(crate) fn from_json_method(field: &FieldCx<'_>, step: Step<'_>) -> TokenStream {
    let name = field.method("_from_json");
    let relation = format!("{} = fromJson(?)", field.column);
    let (output, finish) = (step.output(), step.finish());

    quote! {
        pub fn #name(mut self, json: &str) -> #output {
            self.state.relation(
                #relation,
                &json,
                Ok(::keyspace::core::value::Value::Text(json.to_string())),
            );
            #finish
        }
    }
}

/// Slice methods on the clustering column at key `position`, one family per
/// shape the range algorithm accepts there.
pub(crate) fn range_methods(field: &FieldCx<'_>, position: usize, end: &Ident) -> TokenStream {
    let ty = &field.value_ty;
    let mut tokens = quote!();

    for shape in legal_slice_shapes(position) {
        let sides: &[(&str, &str, Option<&str>)] = match shape {
            SliceShape::LOWER => &[("_gt", ">", None), ("_gte", ">=", None)],
            SliceShape::UPPER => &[("_lt", "<", None), ("_lte", "<=", None)],
            _ => &[
                ("_gt_and_lt", ">", Some("<")),
                ("_gt_and_lte", ">", Some("<=")),
                ("_gte_and_lt", ">=", Some("<")),
                ("_gte_and_lte", ">=", Some("<=")),
            ],
        };

        for (suffix, first, second) in sides {
            let name = field.method(suffix);
            match second {
                None => {
                    let relation = field.relation(first);
                    let encode = field.encode(&quote!(&value));
                    tokens.extend(quote! {
                        pub fn #name(mut self, value: #ty) -> #end<'a> {
                            self.state.relation(#relation, &value, #encode);
                            #end { state: self.state }
                        }
                    });
                }
                Some(second) => {
                    let lower_relation = field.relation(first);
                    let upper_relation = field.relation(second);
                    let encode_lower = field.encode(&quote!(&lower));
                    let encode_upper = field.encode(&quote!(&upper));
                    tokens.extend(quote! {
                        pub fn #name(mut self, lower: #ty, upper: #ty) -> #end<'a> {
                            let low = #encode_lower;
                            let high = #encode_upper;
                            self.state.range_relations(
                                #position,
                                (#lower_relation.to_string(), &lower, low),
                                (#upper_relation.to_string(), &upper, high),
                            );
                            #end { state: self.state }
                        }
                    });
                }
            }
        }
    }

    tokens
}

///
/// EndMethod
///
/// A method of a terminal-capable state. Earlier states that may already
/// terminate forward to it through the end state.
///

pub(crate) struct EndMethod {
    name: Ident,
    params: Vec<(Ident, TokenStream)>,
    kind: EndKind,
    body: TokenStream,
}

enum EndKind {
    Modifier,
    Transition(Ident),
    Terminal { output: TokenStream, asyncness: bool },
}

impl EndMethod {
    /// Method returning the same state after touching `self.state`.
    pub fn modifier(name: &str, params: Vec<(Ident, TokenStream)>, body: TokenStream) -> Self {
        Self {
            name: format_ident!("{name}"),
            params,
            kind: EndKind::Modifier,
            body,
        }
    }

    /// Method touching `self.state`, then moving on to state `to`.
    pub fn transition(
        name: &str,
        params: Vec<(Ident, TokenStream)>,
        body: TokenStream,
        to: &Ident,
    ) -> Self {
        Self {
            name: format_ident!("{name}"),
            params,
            kind: EndKind::Transition(to.clone()),
            body,
        }
    }

    /// Method consuming the state; `body` is the returned expression.
    pub fn terminal(name: &str, output: TokenStream, body: TokenStream) -> Self {
        Self {
            name: format_ident!("{name}"),
            params: Vec::new(),
            kind: EndKind::Terminal {
                output,
                asyncness: false,
            },
            body,
        }
    }

    pub fn terminal_async(name: &str, output: TokenStream, body: TokenStream) -> Self {
        Self {
            kind: EndKind::Terminal {
                output,
                asyncness: true,
            },
            ..Self::terminal(name, quote!(), body)
        }
    }

    fn signature_parts(&self) -> (Vec<&Ident>, Vec<&TokenStream>) {
        self.params.iter().map(|(name, ty)| (name, ty)).unzip()
    }

    /// The method as defined on the end state.
    pub fn define(&self) -> TokenStream {
        let name = &self.name;
        let body = &self.body;
        let (names, types) = self.signature_parts();

        match &self.kind {
            EndKind::Modifier => quote! {
                pub fn #name(mut self, #(#names: #types),*) -> Self {
                    #body;
                    self
                }
            },
            EndKind::Transition(to) => quote! {
                pub fn #name(mut self, #(#names: #types),*) -> #to<'a> {
                    #body;
                    #to { state: self.state }
                }
            },
            EndKind::Terminal {
                output,
                asyncness: false,
            } => quote! {
                pub fn #name(self) -> #output {
                    #body
                }
            },
            EndKind::Terminal {
                output,
                asyncness: true,
            } => quote! {
                pub async fn #name(self) -> #output {
                    #body
                }
            },
        }
    }

    /// The method on an earlier state, delegating to `end`.
    pub fn forward(&self, end: &Ident) -> TokenStream {
        let name = &self.name;
        let (names, types) = self.signature_parts();

        match &self.kind {
            EndKind::Modifier => quote! {
                pub fn #name(self, #(#names: #types),*) -> #end<'a> {
                    #end { state: self.state }.#name(#(#names),*)
                }
            },
            EndKind::Transition(to) => quote! {
                pub fn #name(self, #(#names: #types),*) -> #to<'a> {
                    #end { state: self.state }.#name(#(#names),*)
                }
            },
            EndKind::Terminal {
                output,
                asyncness: false,
            } => quote! {
                pub fn #name(self) -> #output {
                    #end { state: self.state }.#name()
                }
            },
            EndKind::Terminal {
                output,
                asyncness: true,
            } => quote! {
                pub async fn #name(self) -> #output {
                    #end { state: self.state }.#name().await
                }
            },
        }
    }
}

pub(crate) fn define_all(methods: &[EndMethod]) -> TokenStream {
    methods.iter().map(EndMethod::define).collect()
}

pub(crate) fn forward_all(methods: &[EndMethod], end: &Ident) -> TokenStream {
    methods.iter().map(|method| method.forward(end)).collect()
}

pub(crate) fn param(name: &str, ty: TokenStream) -> (Ident, TokenStream) {
    (format_ident!("{name}"), ty)
}

//
// shared end methods
//

pub(crate) fn consistency_methods() -> Vec<EndMethod> {
    vec![
        EndMethod::modifier(
            "with_consistency",
            vec![param(
                "consistency",
                quote!(::keyspace::core::statement::Consistency),
            )],
            quote!(self.state.consistency(consistency)),
        ),
        EndMethod::modifier(
            "with_serial_consistency",
            vec![param(
                "consistency",
                quote!(::keyspace::core::statement::Consistency),
            )],
            quote!(self.state.serial_consistency(consistency)),
        ),
    ]
}

pub(crate) fn statement_terminal() -> EndMethod {
    EndMethod::terminal(
        "statement",
        quote!(::std::result::Result<::keyspace::core::statement::Statement, ::keyspace::core::Error>),
        quote!(self.state.statement()),
    )
}

/// `statement`, `execute`, `execute_async`.
pub(crate) fn write_terminals() -> Vec<EndMethod> {
    vec![
        statement_terminal(),
        EndMethod::terminal(
            "execute",
            quote!(::std::result::Result<(), ::keyspace::core::Error>),
            quote!(self.state.execute()),
        ),
        EndMethod::terminal_async(
            "execute_async",
            quote!(::std::result::Result<(), ::keyspace::core::Error>),
            quote!(self.state.execute_async().await),
        ),
    ]
}

/// Lightweight-transaction methods of a write end state.
///
/// `if_exists` and the `if_<field>_eq` conditions lead to separate states,
/// so one statement never carries both. Each of those states keeps `tail`.
/// Returns the end-state methods and the two state definitions.
pub(crate) fn conditional_methods(
    cx: &EntityCx<'_>,
    prefix: &str,
    fields: &[&FieldCx<'_>],
    tail: &[EndMethod],
) -> (Vec<EndMethod>, TokenStream) {
    if !cx.has(Feature::LightweightTransactions) {
        return (Vec::new(), quote!());
    }

    let exists = cx.item(&format!("{prefix}IfExists"));
    let mut methods = vec![EndMethod::transition(
        "if_exists",
        Vec::new(),
        quote!(self.state.if_exists()),
        &exists,
    )];
    let mut tokens = state(&exists, &define_all(tail));

    if !fields.is_empty() {
        let conditional = cx.item(&format!("{prefix}If"));
        let mut more = Vec::new();
        for field in fields {
            let ty = &field.value_ty;
            let condition = field.relation("=");
            let encode = field.encode(&quote!(&value));
            let name = format!("if_{}_eq", field.ident);
            let body = quote!(self.state.condition(#condition, &value, #encode));

            methods.push(EndMethod::transition(
                &name,
                vec![param("value", quote!(#ty))],
                body.clone(),
                &conditional,
            ));
            more.push(EndMethod::modifier(
                &name,
                vec![param("value", quote!(#ty))],
                body,
            ));
        }

        let mut defined = define_all(&more);
        defined.extend(define_all(tail));
        tokens.extend(state(&conditional, &defined));
    }

    (methods, tokens)
}

/// Chain of key states for write statements: one state per key column,
/// each with a single equality method, ending in `end`.
pub(crate) fn key_chain(
    cx: &EntityCx<'_>,
    prefix: &str,
    keys: &[&FieldCx<'_>],
    end: &Ident,
) -> (Option<Ident>, TokenStream) {
    let mut tokens = quote!();
    let idents = keys
        .iter()
        .map(|field| cx.item(&format!("{prefix}Where{}", field.pascal)))
        .collect::<Vec<_>>();

    for (i, field) in keys.iter().enumerate() {
        let next = idents.get(i + 1).unwrap_or(end);
        let methods = eq_method(field, &field.ident, Step::To(next));
        tokens.extend(state(&idents[i], &methods));
    }
    debug!(entity = %cx.entity.name, family = prefix, states = keys.len(), "generated key chain");

    (idents.into_iter().next(), tokens)
}
