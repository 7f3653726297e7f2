use crate::{codec::ResolveError, types::ParseError};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

///
/// err
/// Push a formatted free-form violation onto an `ErrorTree`.
///

#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {{
        $errs.add($crate::error::Violation::Other(format!($($arg)*)));
    }};
}

///
/// Violation
///
/// One declaration problem. Routes (entity, field) live on the tree.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum Violation {
    #[error("computed field must not be a key column or indexed")]
    ComputedKeyOrIndexed,

    #[error("computed target '{target}' {reason}")]
    ComputedTarget { target: String, reason: &'static str },

    #[error("at most one of codec, enumerated and json may be set")]
    ConflictingCodecs,

    #[error("conflicting role markers: {markers}")]
    ConflictingRoles { markers: String },

    #[error("counter {reason}")]
    CounterPlacement { reason: &'static str },

    #[error("counter table column '{column}' is not a counter")]
    CounterTableMixed { column: String },

    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    #[error("duplicate entity '{entity}'")]
    DuplicateEntity { entity: String },

    #[error("duplicate field '{field}'")]
    DuplicateField { field: String },

    #[error("duplicate function signature {signature}")]
    DuplicateFunction { signature: String },

    #[error("FULL index requires a frozen collection")]
    FullIndexRequiresFrozen,

    #[error("{implementation} index cannot be placed on {shape}")]
    IndexImplementationIneligible {
        implementation: &'static str,
        shape: String,
    },

    #[error("{kind} index is not valid on {shape}")]
    IndexKindMismatch { kind: String, shape: String },

    #[error("invalid identifier '{ident}': {reason}")]
    InvalidIdentifier { ident: String, reason: &'static str },

    #[error("key columns cannot be indexed")]
    KeyIndexed,

    #[error("{role} key orders must be 0..{expected} without gaps or duplicates, found {found:?}")]
    KeyOrderGap {
        role: &'static str,
        expected: usize,
        found: Vec<u32>,
    },

    #[error("missing partition key")]
    MissingPartitionKey,

    #[error("field needs a type")]
    MissingType,

    #[error("{count} indexes declared, at most one is allowed per field")]
    MultipleIndexes { count: usize },

    #[error("{0}")]
    Other(String),

    #[error("identifier '{ident}' is a reserved word")]
    ReservedWord { ident: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("static columns require at least one clustering column")]
    StaticWithoutClustering,

    #[error("invalid type: {0}")]
    TypeParse(#[from] ParseError),

    #[error("key column of type {shape} must be frozen")]
    UnfrozenKey { shape: String },

    #[error("{composite} nested at '{path}' must be frozen")]
    UnfrozenNested { composite: &'static str, path: String },

    #[error("function type '{ty}' cannot be resolved")]
    UnknownFunctionType { ty: String },

    #[error("unknown user type '{name}'")]
    UnknownUdt { name: String },

    #[error("base '{base}' cannot back a view: {reason}")]
    ViewBaseInvalid { base: String, reason: &'static str },

    #[error("base '{base}' of view is not declared")]
    ViewBaseMissing { base: String },

    #[error("view has {} key columns not in the base key: {columns:?}", .columns.len())]
    ViewExtraKeys { columns: Vec<String> },

    #[error("view field does not match base field by name and type")]
    ViewFieldMismatch,

    #[error("views cannot declare indexes")]
    ViewIndexed,

    #[error("view is missing base collection or UDT column '{column}'")]
    ViewMissingBaseComposite { column: String },

    #[error("view does not key on base key column '{column}'")]
    ViewMissingBaseKey { column: String },

    #[error("views cannot carry static columns")]
    ViewStatic,
}

///
/// ErrorTree
///
/// Accumulated violations, keyed by route (entity, then field). A validation
/// pass never stops at the first problem.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ErrorTree {
    violations: Vec<Violation>,
    children: BTreeMap<String, ErrorTree>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, violation: impl Into<Violation>) {
        self.violations.push(violation.into());
    }

    pub fn add_for(&mut self, route: impl Into<String>, violation: impl Into<Violation>) {
        self.children.entry(route.into()).or_default().add(violation);
    }

    /// Child tree for `route`, created on first use.
    pub fn route(&mut self, route: impl Into<String>) -> &mut Self {
        self.children.entry(route.into()).or_default()
    }

    pub fn merge(&mut self, other: Self) {
        self.violations.extend(other.violations);
        for (route, child) in other.children {
            self.route(route).merge(child);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty() && self.children.values().all(Self::is_empty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len() + self.children.values().map(Self::len).sum::<usize>()
    }

    /// Every violation with its dotted route, depth first.
    #[must_use]
    pub fn flatten(&self) -> Vec<(String, Violation)> {
        let mut out = Vec::new();
        self.flatten_into("", &mut out);

        out
    }

    fn flatten_into(&self, prefix: &str, out: &mut Vec<(String, Violation)>) {
        for violation in &self.violations {
            out.push((prefix.to_string(), violation.clone()));
        }
        for (route, child) in &self.children {
            let path = if prefix.is_empty() {
                route.clone()
            } else {
                format!("{prefix}.{route}")
            };
            child.flatten_into(&path, out);
        }
    }

    /// Violations at `route` (dotted), without descending further.
    #[must_use]
    pub fn at(&self, route: &str) -> Vec<&Violation> {
        let mut node = self;
        for segment in route.split('.').filter(|s| !s.is_empty()) {
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }

        node.violations.iter().collect()
    }

    /// Whether any violation anywhere satisfies `predicate`.
    pub fn contains(&self, predicate: impl Fn(&Violation) -> bool) -> bool {
        self.flatten().iter().any(|(_, violation)| predicate(violation))
    }

    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (route, violation)) in self.flatten().into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if route.is_empty() {
                write!(f, "{violation}")?;
            } else {
                write!(f, "{route}: {violation}")?;
            }
        }

        Ok(())
    }
}

impl From<Violation> for ErrorTree {
    fn from(violation: Violation) -> Self {
        let mut tree = Self::new();
        tree.add(violation);

        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_nest_and_flatten_in_order() {
        let mut errs = ErrorTree::new();
        errs.route("User").add_for("id", Violation::KeyIndexed);
        errs.add_for("User", Violation::MissingPartitionKey);
        err!(errs, "schema-level {}", "note");

        let flat = errs.flatten();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].0, "");
        assert_eq!(flat[1], ("User".to_string(), Violation::MissingPartitionKey));
        assert_eq!(flat[2], ("User.id".to_string(), Violation::KeyIndexed));
        assert_eq!(errs.at("User.id"), vec![&Violation::KeyIndexed]);
    }

    #[test]
    fn empty_routes_do_not_count() {
        let mut errs = ErrorTree::new();
        errs.route("User").route("id");

        assert!(errs.is_empty());
        assert!(errs.result().is_ok());
    }

    #[test]
    fn display_prefixes_routes() {
        let mut errs = ErrorTree::new();
        errs.route("User").add_for("tags", Violation::ViewIndexed);

        assert_eq!(errs.to_string(), "User.tags: views cannot declare indexes");
    }
}
