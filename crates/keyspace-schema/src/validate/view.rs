use crate::{
    error::{ErrorTree, Violation},
    model::{ColumnRole, EntityModel},
};

/// Materialized view rules, checked against an already validated base.
pub fn validate_view(view: &EntityModel, base: Option<&EntityModel>, errs: &mut ErrorTree) {
    let Some(base_name) = &view.view_of else {
        return;
    };
    let Some(base) = base else {
        errs.add(Violation::ViewBaseMissing {
            base: base_name.clone(),
        });
        return;
    };

    if base.is_view() {
        errs.add(Violation::ViewBaseInvalid {
            base: base_name.clone(),
            reason: "it is itself a view",
        });
    }
    if base.has_counters() {
        errs.add(Violation::ViewBaseInvalid {
            base: base_name.clone(),
            reason: "it holds counter columns",
        });
    }

    for field in &view.fields {
        let route = errs.route(field.name.clone());
        if !field.indexes.is_empty() {
            route.add(Violation::ViewIndexed);
        }
        if field.role.is_static() {
            route.add(Violation::ViewStatic);
        }
        if field.role == ColumnRole::Computed {
            continue;
        }

        let matches = base
            .field(&field.name)
            .is_some_and(|b| b.column == field.column && b.shape.same_type(&field.shape));
        if !matches {
            route.add(Violation::ViewFieldMismatch);
        }
    }

    for base_key in base.fields.iter().filter(|f| f.is_key()) {
        if !view
            .field(&base_key.name)
            .is_some_and(|f| f.is_key())
        {
            errs.add(Violation::ViewMissingBaseKey {
                column: base_key.column.clone(),
            });
        }
    }

    for composite in base
        .fields
        .iter()
        .filter(|f| f.shape.is_collection() || f.shape.is_udt())
    {
        if view.field(&composite.name).is_none() {
            errs.add(Violation::ViewMissingBaseComposite {
                column: composite.column.clone(),
            });
        }
    }

    let extra = view
        .fields
        .iter()
        .filter(|f| f.is_key())
        .filter(|f| !base.field(&f.name).is_some_and(|b| b.is_key()))
        .map(|f| f.column.clone())
        .collect::<Vec<_>>();
    if extra.len() > 1 {
        errs.add(Violation::ViewExtraKeys { columns: extra });
    }
}
