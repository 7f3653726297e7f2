use crate::types::ScalarType;
use std::fmt;

///
/// ValueShape
///
/// Storage shape of a column or of one nested slot. `frozen` is effective:
/// a `frozen<...>` marker sets it on its whole subtree.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValueShape {
    pub kind: ShapeKind,
    pub frozen: bool,
    pub depth: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShapeKind {
    Scalar(ScalarType),
    Counter,
    List(Box<ValueShape>),
    Set(Box<ValueShape>),
    Map(Box<ValueShape>, Box<ValueShape>),
    Tuple(Vec<ValueShape>),
    Udt(String),
}

impl ValueShape {
    #[must_use]
    pub const fn new(kind: ShapeKind, frozen: bool, depth: usize) -> Self {
        Self {
            kind,
            frozen,
            depth,
        }
    }

    #[must_use]
    pub const fn scalar(scalar: ScalarType) -> Self {
        Self::new(ShapeKind::Scalar(scalar), false, 0)
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<ScalarType> {
        match self.kind {
            ShapeKind::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_counter(&self) -> bool {
        matches!(self.kind, ShapeKind::Counter)
    }

    #[must_use]
    pub const fn is_collection(&self) -> bool {
        matches!(
            self.kind,
            ShapeKind::List(_) | ShapeKind::Set(_) | ShapeKind::Map(..)
        )
    }

    #[must_use]
    pub const fn is_composite(&self) -> bool {
        !matches!(self.kind, ShapeKind::Scalar(_) | ShapeKind::Counter)
    }

    #[must_use]
    pub const fn is_udt(&self) -> bool {
        matches!(self.kind, ShapeKind::Udt(_))
    }

    /// Short name of the outermost constructor.
    #[must_use]
    pub const fn describe(&self) -> &'static str {
        match self.kind {
            ShapeKind::Scalar(_) => "scalar",
            ShapeKind::Counter => "counter",
            ShapeKind::List(_) => "list",
            ShapeKind::Set(_) => "set",
            ShapeKind::Map(..) => "map",
            ShapeKind::Tuple(_) => "tuple",
            ShapeKind::Udt(_) => "user type",
        }
    }

    /// Direct children (element, key and value, tuple items).
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            ShapeKind::List(inner) | ShapeKind::Set(inner) => vec![inner],
            ShapeKind::Map(key, value) => vec![key, value],
            ShapeKind::Tuple(items) => items.iter().collect(),
            ShapeKind::Scalar(_) | ShapeKind::Counter | ShapeKind::Udt(_) => Vec::new(),
        }
    }

    /// Whether any node of the subtree satisfies `predicate`.
    pub fn any(&self, predicate: &impl Fn(&Self) -> bool) -> bool {
        predicate(self) || self.children().into_iter().any(|child| child.any(predicate))
    }

    /// User type names referenced anywhere in the subtree.
    #[must_use]
    pub fn udt_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_udts(&mut names);

        names
    }

    fn collect_udts<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let ShapeKind::Udt(name) = &self.kind {
            out.push(name);
        }
        for child in self.children() {
            child.collect_udts(out);
        }
    }

    /// Same CQL type, ignoring nesting depth.
    #[must_use]
    pub fn same_type(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, parent_frozen: bool) -> fmt::Result {
        let wrap = self.frozen && !parent_frozen && self.is_composite();
        if wrap {
            write!(f, "frozen<")?;
        }

        match &self.kind {
            ShapeKind::Scalar(scalar) => write!(f, "{scalar}")?,
            ShapeKind::Counter => write!(f, "counter")?,
            ShapeKind::List(inner) => {
                write!(f, "list<")?;
                inner.render(f, self.frozen)?;
                write!(f, ">")?;
            }
            ShapeKind::Set(inner) => {
                write!(f, "set<")?;
                inner.render(f, self.frozen)?;
                write!(f, ">")?;
            }
            ShapeKind::Map(key, value) => {
                write!(f, "map<")?;
                key.render(f, self.frozen)?;
                write!(f, ", ")?;
                value.render(f, self.frozen)?;
                write!(f, ">")?;
            }
            ShapeKind::Tuple(items) => {
                write!(f, "tuple<")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.render(f, self.frozen)?;
                }
                write!(f, ">")?;
            }
            ShapeKind::Udt(name) => write!(f, "{name}")?,
        }

        if wrap {
            write!(f, ">")?;
        }

        Ok(())
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, false)
    }
}
