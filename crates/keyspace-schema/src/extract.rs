//! Declaration to model extraction.
//!
//! Extraction is total over well-formed input: every problem found in one
//! declaration lands in the returned `ErrorTree` (routed by field) instead of
//! stopping at the first.

use crate::{
    decl::{
        EntityDecl, EnumEncoding, FieldDecl, FunctionDecl, IndexDecl, IndexKindDecl, IndexUsing,
        Naming, UdtDecl,
    },
    error::{ErrorTree, Violation},
    model::{
        CodecMarker, ColumnRole, ComputedModel, EntityModel, FieldModel, FunctionModel,
        IndexImplementation, IndexKind, IndexModel, IndexSlot, SasiOptions, ShapeKind,
        UdtFieldModel, UdtModel, ValueShape,
    },
    types::{ScalarType, TypeExpr},
};
use convert_case::{Case, Casing};

///
/// ExtractOptions
/// Schema-wide defaults an entity may override.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct ExtractOptions<'a> {
    pub keyspace: Option<&'a str>,
    pub naming: Naming,
}

/// Extract one entity. `udts` resolves type references to CQL type names.
pub fn extract_entity(
    decl: &EntityDecl,
    udts: &[UdtModel],
    options: ExtractOptions<'_>,
) -> Result<EntityModel, ErrorTree> {
    let mut errs = ErrorTree::new();
    let naming = decl.naming.unwrap_or(options.naming);

    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        match extract_field(field, udts, naming) {
            Ok(model) => fields.push(model),
            Err(tree) => errs.route(field.name.clone()).merge(tree),
        }
    }
    errs.result()?;

    let has_clustering = fields.iter().any(|field| field.role.is_clustering());
    let mut payload = fields
        .iter()
        .filter(|field| !field.is_key() && field.role != ColumnRole::Computed)
        .peekable();
    let clustered_counter =
        has_clustering && payload.peek().is_some() && payload.all(|field| field.role.is_counter());

    Ok(EntityModel {
        name: decl.name.clone(),
        table: decl
            .table
            .clone()
            .unwrap_or_else(|| decl.name.to_case(Case::Snake)),
        keyspace: decl
            .keyspace
            .clone()
            .or_else(|| options.keyspace.map(ToString::to_string)),
        fields,
        view_of: decl.view_of.clone(),
        naming,
        clustered_counter,
    })
}

/// Extract one user-defined type.
pub fn extract_udt(
    decl: &UdtDecl,
    declared: &[UdtDecl],
    options: ExtractOptions<'_>,
) -> Result<UdtModel, ErrorTree> {
    let mut errs = ErrorTree::new();
    let names = udt_type_names(declared);

    let mut fields = Vec::with_capacity(decl.fields.len());
    for field in &decl.fields {
        let shape = field
            .ty
            .parse::<TypeExpr>()
            .map_err(Violation::from)
            .and_then(|expr| {
                let mut markers = Vec::new();
                let shape = build_shape(&expr, false, 0, &names, &mut markers);
                if markers.is_empty() {
                    Ok(shape)
                } else {
                    Err(Violation::Other(
                        "user type fields cannot carry index markers".to_string(),
                    ))
                }
            });

        match shape {
            Ok(shape) => fields.push(UdtFieldModel {
                name: field.name.clone(),
                column: field
                    .column
                    .clone()
                    .unwrap_or_else(|| column_name(&field.name, options.naming)),
                shape,
            }),
            Err(violation) => errs.add_for(field.name.clone(), violation),
        }
    }
    errs.result()?;

    Ok(UdtModel {
        name: decl.name.clone(),
        type_name: udt_type_name(decl),
        keyspace: decl
            .keyspace
            .clone()
            .or_else(|| options.keyspace.map(ToString::to_string)),
        fields,
    })
}

/// Extract a function declaration. UDT references resolve like field types.
pub fn extract_function(
    decl: &FunctionDecl,
    udts: &[UdtModel],
    options: ExtractOptions<'_>,
) -> Result<FunctionModel, ErrorTree> {
    let mut errs = ErrorTree::new();
    let names = udts
        .iter()
        .map(|udt| (udt.name.clone(), udt.type_name.clone()))
        .collect::<Vec<_>>();

    let mut parse = |route: &str, ty: &str| match ty.parse::<TypeExpr>() {
        Ok(expr) => Some(build_shape(&expr, false, 0, &names, &mut Vec::new())),
        Err(e) => {
            errs.add_for(route.to_string(), e);
            None
        }
    };

    let params = decl
        .params
        .iter()
        .filter_map(|param| Some((param.name.clone(), parse(&param.name, &param.ty)?)))
        .collect::<Vec<_>>();
    let returns = parse("returns", &decl.returns);
    errs.result()?;

    let returns = returns.ok_or_else(|| ErrorTree::from(Violation::MissingType))?;

    Ok(FunctionModel {
        keyspace: decl
            .keyspace
            .clone()
            .or_else(|| options.keyspace.map(ToString::to_string)),
        name: decl.name.clone(),
        params,
        returns,
        deterministic: decl.deterministic,
    })
}

/// CQL column name for a Rust field name under `naming`.
#[must_use]
pub fn column_name(field: &str, naming: Naming) -> String {
    match naming {
        Naming::SnakeCase if is_snake_case(field) => field.to_string(),
        Naming::SnakeCase => field.to_case(Case::Snake),
        Naming::LowerCase => field.to_ascii_lowercase(),
        Naming::CaseSensitive => format!("\"{field}\""),
    }
}

/// Lowercase ASCII words joined by single underscores; digits may follow a
/// letter (`clust1` is snake case).
#[must_use]
pub fn is_snake_case(ident: &str) -> bool {
    ident.starts_with(|c: char| c.is_ascii_lowercase())
        && !ident.ends_with('_')
        && !ident.contains("__")
        && ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn udt_type_name(decl: &UdtDecl) -> String {
    decl.type_name
        .clone()
        .unwrap_or_else(|| decl.name.to_case(Case::Snake))
}

fn udt_type_names(declared: &[UdtDecl]) -> Vec<(String, String)> {
    declared
        .iter()
        .map(|udt| (udt.name.clone(), udt_type_name(udt)))
        .collect()
}

//
// fields
//

fn extract_field(
    decl: &FieldDecl,
    udts: &[UdtModel],
    naming: Naming,
) -> Result<FieldModel, ErrorTree> {
    let mut errs = ErrorTree::new();
    let names = udts
        .iter()
        .map(|udt| (udt.name.clone(), udt.type_name.clone()))
        .collect::<Vec<_>>();

    let codec = codec_marker(decl, &mut errs);
    let expr = match (&decl.ty, &codec) {
        (Some(ty), _) => match ty.parse::<TypeExpr>() {
            Ok(expr) => Some(expr),
            Err(e) => {
                errs.add(e);
                None
            }
        },
        (
            None,
            CodecMarker::Enumerated {
                encoding: EnumEncoding::Ordinal,
                ..
            },
        ) => Some(TypeExpr::Scalar(ScalarType::Int)),
        (None, CodecMarker::Enumerated { .. } | CodecMarker::Json { .. }) => {
            Some(TypeExpr::Scalar(ScalarType::Text))
        }
        (None, _) => {
            errs.add(Violation::MissingType);
            None
        }
    };

    let mut markers = Vec::new();
    let shape = expr.map(|expr| build_shape(&expr, false, 0, &names, &mut markers));

    let role = field_role(decl, shape.as_ref(), &mut errs);

    let mut indexes = Vec::new();
    for marker in markers {
        match marker {
            Some((slot, kind)) => indexes.push(IndexModel {
                kind,
                implementation: IndexImplementation::Native,
                name: None,
                slot,
            }),
            None => errs.add(Violation::Other(
                "index marker must sit directly inside a list, set or map".to_string(),
            )),
        }
    }
    if let (Some(index), Some(shape)) = (&decl.index, &shape) {
        indexes.insert(0, field_index(index, shape));
    }

    errs.result()?;
    let shape = shape.ok_or_else(|| ErrorTree::from(Violation::MissingType))?;

    let computed = decl.computed.as_ref().map(|computed| ComputedModel {
        function: computed.function.clone(),
        targets: computed.targets.clone(),
        alias: computed.alias.clone(),
    });
    let column = match (&decl.column, &computed) {
        (Some(column), _) => column.clone(),
        (None, Some(computed)) => computed.alias.clone(),
        (None, None) => column_name(&decl.name, naming),
    };

    Ok(FieldModel {
        name: decl.name.clone(),
        column,
        shape,
        role,
        indexes,
        codec,
        computed,
        optional: decl.optional,
    })
}

fn codec_marker(decl: &FieldDecl, errs: &mut ErrorTree) -> CodecMarker {
    let declared = [
        decl.codec.is_some(),
        decl.enumerated.is_some(),
        decl.json.is_some(),
    ];
    if declared.into_iter().filter(|set| *set).count() > 1 {
        errs.add(Violation::ConflictingCodecs);
    }

    if let Some(codec) = &decl.codec {
        CodecMarker::Explicit {
            path: codec.path.clone(),
            rust_type: codec.rust_type.clone(),
        }
    } else if let Some(enumerated) = &decl.enumerated {
        CodecMarker::Enumerated {
            rust_type: enumerated.rust_type.clone(),
            encoding: enumerated.encoding,
        }
    } else if let Some(json) = &decl.json {
        CodecMarker::Json {
            rust_type: json.rust_type.clone(),
        }
    } else {
        CodecMarker::None
    }
}

// partition > clustering > computed > static/counter > regular
fn field_role(decl: &FieldDecl, shape: Option<&ValueShape>, errs: &mut ErrorTree) -> ColumnRole {
    let markers = [
        ("partition", decl.partition.is_some()),
        ("clustering", decl.clustering.is_some()),
        ("computed", decl.computed.is_some()),
        ("static", decl.is_static),
    ]
    .into_iter()
    .filter_map(|(name, set)| set.then_some(name))
    .collect::<Vec<_>>();

    if markers.len() > 1 {
        errs.add(Violation::ConflictingRoles {
            markers: markers.join(", "),
        });
    }

    let counter = shape.is_some_and(ValueShape::is_counter);

    if let Some(order) = decl.partition {
        ColumnRole::Partition { order }
    } else if let Some(clustering) = decl.clustering {
        ColumnRole::Clustering {
            order: clustering.order,
            ascending: clustering.asc,
        }
    } else if decl.computed.is_some() {
        ColumnRole::Computed
    } else if decl.is_static && counter {
        ColumnRole::StaticCounter
    } else if decl.is_static {
        ColumnRole::Static
    } else if counter {
        ColumnRole::Counter
    } else {
        ColumnRole::Regular
    }
}

fn field_index(decl: &IndexDecl, shape: &ValueShape) -> IndexModel {
    let kind = decl.kind.map_or_else(
        || default_index_kind(shape),
        |kind| match kind {
            IndexKindDecl::Normal => IndexKind::Normal,
            IndexKindDecl::Full => IndexKind::Full,
            IndexKindDecl::Collection => IndexKind::Collection,
            IndexKindDecl::MapKey => IndexKind::MapKey,
            IndexKindDecl::MapValue => IndexKind::MapValue,
            IndexKindDecl::MapEntry => IndexKind::MapEntry,
        },
    );
    let slot = match kind {
        IndexKind::Normal | IndexKind::Full | IndexKind::MapEntry => IndexSlot::Field,
        IndexKind::Collection => IndexSlot::Element,
        IndexKind::MapKey => IndexSlot::MapKey,
        IndexKind::MapValue => IndexSlot::MapValue,
    };

    let implementation = match decl.using {
        IndexUsing::Native => IndexImplementation::Native,
        IndexUsing::Sasi => {
            let sasi = decl.sasi.clone().unwrap_or_default();
            IndexImplementation::Sasi(SasiOptions {
                mode: sasi.mode,
                analyzed: sasi.analyzed,
                analyzer: sasi.analyzer,
                case_sensitive: sasi.case_sensitive,
                normalization: sasi.normalization,
            })
        }
        IndexUsing::DseSearch => {
            let dse = decl.dse.unwrap_or_default();
            IndexImplementation::DseSearch {
                full_text: dse.full_text,
                case_sensitive: dse.case_sensitive,
            }
        }
    };

    IndexModel {
        kind,
        implementation,
        name: decl.name.clone(),
        slot,
    }
}

const fn default_index_kind(shape: &ValueShape) -> IndexKind {
    match shape.kind {
        ShapeKind::List(_) | ShapeKind::Set(_) if !shape.frozen => IndexKind::Collection,
        ShapeKind::Map(..) if !shape.frozen => IndexKind::MapValue,
        ShapeKind::List(_) | ShapeKind::Set(_) | ShapeKind::Map(..) => IndexKind::Full,
        _ => IndexKind::Normal,
    }
}

//
// shapes
//

// Index marker found while unwrapping; `None` when it sits where no index
// slot exists (tuple items, anything below the first nesting level).
type Marker = Option<(IndexSlot, IndexKind)>;

// Unwrap a type expression to its natural arity. `frozen` is inherited by
// the whole subtree.
fn build_shape(
    expr: &TypeExpr,
    frozen: bool,
    depth: usize,
    udts: &[(String, String)],
    markers: &mut Vec<Marker>,
) -> ValueShape {
    let child = |inner: &TypeExpr, slot: Marker, markers: &mut Vec<Marker>| {
        let (inner, indexed) = strip_index(inner);
        if indexed {
            markers.push(slot.filter(|_| depth == 0));
        }
        Box::new(build_shape(inner, frozen, depth + 1, udts, markers))
    };

    let kind = match expr {
        TypeExpr::Scalar(scalar) => ShapeKind::Scalar(*scalar),
        TypeExpr::Counter => ShapeKind::Counter,
        TypeExpr::Frozen(inner) => return build_shape(inner, true, depth, udts, markers),
        TypeExpr::Indexed(inner) => {
            markers.push((depth == 0).then_some((IndexSlot::Field, IndexKind::Normal)));
            return build_shape(inner, frozen, depth, udts, markers);
        }
        TypeExpr::List(inner) => ShapeKind::List(child(
            inner,
            Some((IndexSlot::Element, IndexKind::Collection)),
            markers,
        )),
        TypeExpr::Set(inner) => ShapeKind::Set(child(
            inner,
            Some((IndexSlot::Element, IndexKind::Collection)),
            markers,
        )),
        TypeExpr::Map(key, value) => ShapeKind::Map(
            child(key, Some((IndexSlot::MapKey, IndexKind::MapKey)), markers),
            child(value, Some((IndexSlot::MapValue, IndexKind::MapValue)), markers),
        ),
        TypeExpr::Tuple(items) => ShapeKind::Tuple(
            items
                .iter()
                .map(|item| *child(item, None, markers))
                .collect(),
        ),
        TypeExpr::Udt(name) => ShapeKind::Udt(
            udts.iter()
                .find(|(decl, type_name)| {
                    decl.eq_ignore_ascii_case(name) || type_name.eq_ignore_ascii_case(name)
                })
                .map_or_else(|| name.clone(), |(_, type_name)| type_name.clone()),
        ),
    };

    ValueShape::new(kind, frozen, depth)
}

fn strip_index(expr: &TypeExpr) -> (&TypeExpr, bool) {
    match expr {
        TypeExpr::Indexed(inner) => (inner, true),
        other => (other, false),
    }
}
