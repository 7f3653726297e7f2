use crate::{
    error::{ErrorTree, Violation},
    model::{ShapeKind, ValueShape},
};

/// Composite values below the top level must be frozen; counters never nest.
pub fn validate_nesting(shape: &ValueShape, errs: &mut ErrorTree) {
    for (child, path) in labelled_children(shape, "") {
        check_nested(child, &path, errs);
    }
}

/// Same rules for a UDT field, which already sits inside a composite.
pub fn validate_udt_field(shape: &ValueShape, errs: &mut ErrorTree) {
    check_nested(shape, "field", errs);
}

/// Key columns holding a composite must be frozen as a whole.
pub fn validate_key_shape(shape: &ValueShape, errs: &mut ErrorTree) {
    if shape.is_composite() && !shape.frozen {
        errs.add(Violation::UnfrozenKey {
            shape: shape.to_string(),
        });
    }
}

fn check_nested(shape: &ValueShape, path: &str, errs: &mut ErrorTree) {
    if shape.is_counter() {
        errs.add(Violation::CounterPlacement {
            reason: "cannot be nested inside a composite",
        });
    }
    if shape.is_composite() && !shape.frozen {
        errs.add(Violation::UnfrozenNested {
            composite: shape.describe(),
            path: path.to_string(),
        });
    }

    for (child, child_path) in labelled_children(shape, path) {
        check_nested(child, &child_path, errs);
    }
}

fn labelled_children<'a>(shape: &'a ValueShape, prefix: &str) -> Vec<(&'a ValueShape, String)> {
    let join = |label: &str| {
        if prefix.is_empty() {
            label.to_string()
        } else {
            format!("{prefix}.{label}")
        }
    };

    match &shape.kind {
        ShapeKind::List(inner) | ShapeKind::Set(inner) => vec![(inner.as_ref(), join("element"))],
        ShapeKind::Map(key, value) => vec![
            (key.as_ref(), join("key")),
            (value.as_ref(), join("value")),
        ],
        ShapeKind::Tuple(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| (item, join(&i.to_string())))
            .collect(),
        ShapeKind::Scalar(_) | ShapeKind::Counter | ShapeKind::Udt(_) => Vec::new(),
    }
}
