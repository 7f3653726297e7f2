use crate::{
    MAX_ENTITY_NAME_LEN, MAX_FIELD_NAME_LEN,
    codec::{CodecRegistry, ResolveError},
    error::{ErrorTree, Violation},
    extract::is_snake_case,
    model::{ColumnRole, EntityModel, FieldModel, ShapeKind, UdtModel, ValueShape},
};
use std::collections::BTreeSet;

/// CQL keywords that cannot be used as unquoted identifiers.
pub const CQL_RESERVED: &[&str] = &[
    "add", "allow", "alter", "and", "apply", "asc", "authorize", "batch", "begin", "by",
    "columnfamily", "create", "delete", "desc", "describe", "drop", "entries", "execute", "from",
    "full", "grant", "if", "in", "index", "infinity", "insert", "into", "is", "keyspace", "limit",
    "materialized", "modify", "nan", "norecursive", "not", "null", "of", "on", "or", "order",
    "primary", "rename", "replace", "revoke", "schema", "select", "set", "table", "to", "token",
    "truncate", "unlogged", "update", "use", "using", "view", "where", "with",
];

/// Rust keywords, strict and reserved, that cannot name generated items.
pub const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate",
    "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "self", "Self", "static", "struct", "super", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

//
// identifiers
//

pub fn validate_entity_name(name: &str, errs: &mut ErrorTree) {
    check_identifier(name, MAX_ENTITY_NAME_LEN, errs);
    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        errs.add(Violation::InvalidIdentifier {
            ident: name.to_string(),
            reason: "type names start with an uppercase letter",
        });
    }
}

pub fn validate_table_name(table: &str, errs: &mut ErrorTree) {
    if CQL_RESERVED.contains(&table.to_ascii_lowercase().as_str()) {
        errs.add(Violation::ReservedWord {
            ident: table.to_string(),
        });
    }
}

pub fn validate_field_name(field: &FieldModel, errs: &mut ErrorTree) {
    check_identifier(&field.name, MAX_FIELD_NAME_LEN, errs);
    if !is_snake_case(&field.name) {
        errs.add(Violation::InvalidIdentifier {
            ident: field.name.clone(),
            reason: "field names must be snake_case",
        });
    }
    if RUST_KEYWORDS.contains(&field.name.as_str()) {
        errs.add(Violation::ReservedWord {
            ident: field.name.clone(),
        });
    }

    let quoted = field.column.starts_with('"');
    if !quoted && CQL_RESERVED.contains(&field.column.to_ascii_lowercase().as_str()) {
        errs.add(Violation::ReservedWord {
            ident: field.column.clone(),
        });
    }
}

/// User type fields become struct fields; keys, roles and columns do not apply.
pub fn validate_udt_field_name(name: &str, errs: &mut ErrorTree) {
    check_identifier(name, MAX_FIELD_NAME_LEN, errs);
    if !is_snake_case(name) {
        errs.add(Violation::InvalidIdentifier {
            ident: name.to_string(),
            reason: "field names must be snake_case",
        });
    }
    if RUST_KEYWORDS.contains(&name) {
        errs.add(Violation::ReservedWord {
            ident: name.to_string(),
        });
    }
}

fn check_identifier(ident: &str, max_len: usize, errs: &mut ErrorTree) {
    let reason = if ident.is_empty() {
        Some("must not be empty")
    } else if !ident.is_ascii() {
        Some("must be ASCII")
    } else if ident.len() > max_len {
        Some("is too long")
    } else if !ident.starts_with(|c: char| c.is_ascii_alphabetic())
        || !ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Some("must start with a letter and hold only letters, digits and underscores")
    } else {
        None
    };

    if let Some(reason) = reason {
        errs.add(Violation::InvalidIdentifier {
            ident: ident.to_string(),
            reason,
        });
    }
}

//
// columns
//

pub fn validate_duplicates(entity: &EntityModel, errs: &mut ErrorTree) {
    let mut names = BTreeSet::new();
    let mut columns = BTreeSet::new();

    for field in &entity.fields {
        if !names.insert(field.name.as_str()) {
            errs.add(Violation::DuplicateField {
                field: field.name.clone(),
            });
        }
        if !columns.insert(field.column.as_str()) {
            errs.add(Violation::DuplicateColumn {
                column: field.column.clone(),
            });
        }
    }
}

/// Counters stay out of keys, and a table holding one holds only counters
/// outside its primary key.
pub fn validate_counters(entity: &EntityModel, errs: &mut ErrorTree) {
    for field in &entity.fields {
        if field.is_key() && field.shape.is_counter() {
            errs.add_for(
                field.name.clone(),
                Violation::CounterPlacement {
                    reason: "cannot be a key column",
                },
            );
        }
    }

    if !entity.has_counters() {
        return;
    }

    for field in &entity.fields {
        let payload = !field.is_key() && field.role != ColumnRole::Computed;
        if payload && !field.role.is_counter() {
            errs.add(Violation::CounterTableMixed {
                column: field.column.clone(),
            });
        }
    }
}

pub fn validate_computed(entity: &EntityModel, errs: &mut ErrorTree) {
    for field in &entity.fields {
        let Some(computed) = &field.computed else {
            continue;
        };

        for target in &computed.targets {
            let reason = match entity.field(target) {
                None => Some("is not a field of this entity"),
                Some(target) if target.is_key() => Some("is a key column"),
                Some(target) if target.role == ColumnRole::Computed => Some("is itself computed"),
                Some(_) => None,
            };
            if let Some(reason) = reason {
                errs.add_for(
                    field.name.clone(),
                    Violation::ComputedTarget {
                        target: target.clone(),
                        reason,
                    },
                );
            }
        }
    }
}

//
// types
//

/// User type references resolve, and every field has exactly one codec.
pub fn validate_codecs(
    entity: &EntityModel,
    udts: &[UdtModel],
    registry: &CodecRegistry,
    errs: &mut ErrorTree,
) {
    for field in &entity.fields {
        let route = errs.route(field.name.clone());

        let json_top_level = matches!(
            &field.shape.kind,
            ShapeKind::Udt(name) if registry.is_json_type(name)
        );
        let unknown = unknown_udts(&field.shape, udts);
        if !json_top_level && !unknown.is_empty() {
            for name in unknown {
                route.add(Violation::UnknownUdt { name });
            }
            continue;
        }

        match registry.resolve(field, udts) {
            Ok(_) => {}
            Err(ResolveError::UnknownUdt { name }) => route.add(Violation::UnknownUdt { name }),
            Err(e) => route.add(e),
        }
    }
}

pub fn unknown_udts(shape: &ValueShape, udts: &[UdtModel]) -> Vec<String> {
    shape
        .udt_names()
        .into_iter()
        .filter(|name| udts.iter().all(|udt| udt.type_name != *name))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn violations(f: impl FnOnce(&mut ErrorTree)) -> Vec<Violation> {
        let mut errs = ErrorTree::new();
        f(&mut errs);

        errs.flatten().into_iter().map(|(_, v)| v).collect()
    }

    #[test]
    fn identifiers_are_bounded_ascii() {
        assert!(violations(|errs| check_identifier("created_at", 48, errs)).is_empty());
        assert_eq!(violations(|errs| check_identifier("", 48, errs)).len(), 1);
        assert_eq!(violations(|errs| check_identifier("naïve", 48, errs)).len(), 1);
        assert_eq!(
            violations(|errs| check_identifier(&"a".repeat(49), 48, errs)).len(),
            1
        );
        assert_eq!(violations(|errs| check_identifier("1st", 48, errs)).len(), 1);
    }

    #[test]
    fn reserved_table_names_are_rejected() {
        assert_eq!(
            violations(|errs| validate_table_name("Order", errs)),
            vec![Violation::ReservedWord {
                ident: "Order".into()
            }]
        );
        assert!(violations(|errs| validate_table_name("orders", errs)).is_empty());
    }
}
