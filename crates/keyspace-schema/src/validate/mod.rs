//! Structural validation of an extracted batch.

pub mod columns;
pub mod frozen;
pub mod functions;
pub mod index;
pub mod keys;
pub mod view;


use crate::{
    codec::{self, CodecRegistry},
    err,
    error::{ErrorTree, Violation},
    model::{EntityModel, FunctionModel, UdtModel},
};
use std::collections::BTreeMap;

/// Run full validation in a staged, deterministic order: user types, base
/// tables, then views against their already checked bases.
pub fn validate_schema(
    entities: &[EntityModel],
    udts: &[UdtModel],
    functions: &[FunctionModel],
    registry: &CodecRegistry,
) -> Result<(), ErrorTree> {
    let mut errs = ErrorTree::new();

    // Phase 1: user types.
    for udt in udts {
        validate_udt(udt, udts, errs.route(udt.name.clone()));
    }

    // Phase 2: base tables.
    for entity in entities.iter().filter(|e| !e.is_view()) {
        validate_entity(entity, udts, registry, errs.route(entity.name.clone()));
    }

    // Phase 3: views, one pass, bases resolved within the batch.
    let by_name = entities
        .iter()
        .map(|e| (e.name.as_str(), e))
        .collect::<BTreeMap<_, _>>();
    for view in entities.iter().filter(|e| e.is_view()) {
        let errs = errs.route(view.name.clone());
        validate_entity(view, udts, registry, errs);

        let base = view
            .view_of
            .as_deref()
            .and_then(|base| by_name.get(base).copied());
        view::validate_view(view, base, errs);
    }

    // Phase 4: schema-wide invariants.
    validate_global(entities, udts, &mut errs);
    functions::validate_functions(functions, udts, errs.route("function"));

    errs.result()
}

fn validate_entity(
    entity: &EntityModel,
    udts: &[UdtModel],
    registry: &CodecRegistry,
    errs: &mut ErrorTree,
) {
    columns::validate_entity_name(&entity.name, errs);
    columns::validate_table_name(&entity.table, errs);
    keys::validate_keys(entity, errs);
    columns::validate_duplicates(entity, errs);

    for field in &entity.fields {
        let route = errs.route(field.name.clone());

        columns::validate_field_name(field, route);
        frozen::validate_nesting(&field.shape, route);
        if field.is_key() {
            frozen::validate_key_shape(&field.shape, route);
        }
        index::validate_indexes(field, route);
    }

    columns::validate_counters(entity, errs);
    columns::validate_computed(entity, errs);
    columns::validate_codecs(entity, udts, registry, errs);
}

fn validate_udt(udt: &UdtModel, udts: &[UdtModel], errs: &mut ErrorTree) {
    columns::validate_entity_name(&udt.name, errs);

    for field in &udt.fields {
        let route = errs.route(field.name.clone());
        columns::validate_udt_field_name(&field.name, route);
        frozen::validate_udt_field(&field.shape, route);

        let unknown = columns::unknown_udts(&field.shape, udts);
        if unknown.is_empty() {
            // user type fields only carry built-in mappings
            if let Err(e) = codec::native_type(&field.shape, udts) {
                route.add(e);
            }
        }
        for name in unknown {
            route.add(Violation::UnknownUdt { name });
        }
    }

    if references(udt, &udt.type_name, udts, 0) {
        err!(errs, "user type '{}' contains itself", udt.type_name);
    }
}

// Whether `udt` reaches `target` through its field types.
fn references(udt: &UdtModel, target: &str, udts: &[UdtModel], depth: usize) -> bool {
    if depth > udts.len() {
        return false;
    }

    udt.fields.iter().any(|field| {
        field.shape.udt_names().into_iter().any(|name| {
            name == target
                || udts
                    .iter()
                    .find(|u| u.type_name == name)
                    .is_some_and(|next| references(next, target, udts, depth + 1))
        })
    })
}

fn validate_global(entities: &[EntityModel], udts: &[UdtModel], errs: &mut ErrorTree) {
    let mut names = BTreeMap::new();
    for name in entities
        .iter()
        .map(|e| e.name.as_str())
        .chain(udts.iter().map(|u| u.name.as_str()))
    {
        *names.entry(name).or_insert(0usize) += 1;
    }
    for (name, count) in names {
        if count > 1 {
            errs.add(Violation::DuplicateEntity {
                entity: name.to_string(),
            });
        }
    }

    let mut tables = BTreeMap::new();
    for entity in entities {
        if let Some(prev) = tables.insert(entity.qualified_table(), entity.name.as_str()) {
            err!(
                errs,
                "duplicate table '{}' for '{prev}' and '{}'",
                entity.qualified_table(),
                entity.name
            );
        }
    }
}
