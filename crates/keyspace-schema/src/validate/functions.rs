use crate::{
    codec::native_type,
    error::{ErrorTree, Violation},
    model::{FunctionModel, UdtModel},
};
use std::collections::BTreeSet;

/// Signatures are unique and every parameter and return type maps to a
/// Rust type.
pub fn validate_functions(functions: &[FunctionModel], udts: &[UdtModel], errs: &mut ErrorTree) {
    let mut seen = BTreeSet::new();

    for function in functions {
        let signature = function.signature();
        let route = errs.route(signature.clone());

        if !seen.insert(signature.clone()) {
            route.add(Violation::DuplicateFunction { signature });
        }

        let types = function
            .params
            .iter()
            .map(|(_, shape)| shape)
            .chain(std::iter::once(&function.returns));
        for shape in types {
            if native_type(shape, udts).is_err() {
                route.add(Violation::UnknownFunctionType {
                    ty: shape.to_string(),
                });
            }
        }
    }
}
