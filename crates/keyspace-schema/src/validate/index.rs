use crate::{
    decl::SasiMode,
    error::{ErrorTree, Violation},
    model::{
        ColumnRole, FieldModel, IndexImplementation, IndexKind, IndexModel, IndexSlot, ShapeKind,
        ValueShape,
    },
    types::ScalarType,
};

pub fn validate_indexes(field: &FieldModel, errs: &mut ErrorTree) {
    if field.indexes.is_empty() {
        return;
    }

    if field.indexes.len() > 1 {
        errs.add(Violation::MultipleIndexes {
            count: field.indexes.len(),
        });
    }
    if field.is_key() {
        errs.add(Violation::KeyIndexed);
    }
    if field.role == ColumnRole::Computed {
        errs.add(Violation::ComputedKeyOrIndexed);
    }
    if field.role.is_counter() {
        errs.add(Violation::CounterPlacement {
            reason: "cannot be indexed",
        });
    }

    for index in &field.indexes {
        validate_kind(index, &field.shape, errs);
        validate_implementation(index, &field.shape, errs);
    }
}

fn validate_kind(index: &IndexModel, shape: &ValueShape, errs: &mut ErrorTree) {
    let mismatch = || Violation::IndexKindMismatch {
        kind: index.kind.to_string(),
        shape: shape.to_string(),
    };
    let open_map = matches!(shape.kind, ShapeKind::Map(..)) && !shape.frozen;
    let open_list_or_set =
        matches!(shape.kind, ShapeKind::List(_) | ShapeKind::Set(_)) && !shape.frozen;

    match index.kind {
        IndexKind::Normal if shape.is_collection() => errs.add(mismatch()),
        IndexKind::Full if !shape.is_collection() => errs.add(mismatch()),
        IndexKind::Full if !shape.frozen => errs.add(Violation::FullIndexRequiresFrozen),
        IndexKind::Collection if !(open_list_or_set || open_map) => errs.add(mismatch()),
        IndexKind::MapKey | IndexKind::MapValue | IndexKind::MapEntry if !open_map => {
            errs.add(mismatch());
        }
        _ => {}
    }
}

fn validate_implementation(index: &IndexModel, shape: &ValueShape, errs: &mut ErrorTree) {
    let ineligible = || Violation::IndexImplementationIneligible {
        implementation: index.implementation.label(),
        shape: shape.to_string(),
    };

    match index.implementation {
        IndexImplementation::Native => {}
        IndexImplementation::Sasi(options) => {
            let Some(scalar) = indexed_scalar(index, shape) else {
                errs.add(ineligible());
                return;
            };
            let eligible = scalar.is_text()
                || scalar.is_numeric()
                || scalar.is_temporal()
                || scalar.is_uuid();
            let mode_fits = match options.mode {
                SasiMode::Prefix => true,
                SasiMode::Contains => scalar.is_text(),
                SasiMode::Sparse => !scalar.is_text(),
            };
            if !eligible || !mode_fits || (options.analyzed && !scalar.is_text()) {
                errs.add(ineligible());
            }
        }
        IndexImplementation::DseSearch { full_text, .. } => {
            let Some(scalar) = indexed_scalar(index, shape) else {
                errs.add(ineligible());
                return;
            };
            let eligible = scalar.is_text()
                || scalar.is_numeric()
                || scalar.is_temporal()
                || scalar.is_uuid()
                || scalar == ScalarType::Boolean;
            if !eligible || (full_text && !scalar.is_text()) {
                errs.add(ineligible());
            }
        }
    }
}

// Custom implementations index a single scalar per row.
const fn indexed_scalar(index: &IndexModel, shape: &ValueShape) -> Option<ScalarType> {
    match (index.slot, index.kind) {
        (IndexSlot::Field, IndexKind::Normal) => shape.as_scalar(),
        _ => None,
    }
}
