use crate::{traits::ColumnValue, value::Value};
use std::fmt::Debug;

///
/// FunctionArg
///
/// One argument of a user function call: a column of the queried table, or
/// a literal bound as a parameter.
///

#[derive(Clone, Debug, PartialEq)]
pub enum FunctionArg<T> {
    Column(&'static str),
    Literal(T),
}

impl<T> FunctionArg<T> {
    #[must_use]
    pub const fn column(name: &'static str) -> Self {
        Self::Column(name)
    }

    #[must_use]
    pub const fn literal(value: T) -> Self {
        Self::Literal(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum CallArg {
    Column(&'static str),
    Bound { rendered: String, value: Value },
}

///
/// FunctionCall
///

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionCall {
    name: String,
    args: Vec<CallArg>,
}

impl FunctionCall {
    #[must_use]
    pub fn new(keyspace: Option<&str>, name: &str) -> Self {
        let name = match keyspace {
            Some(keyspace) => format!("{keyspace}.{name}"),
            None => name.to_string(),
        };

        Self {
            name,
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg<T: ColumnValue + Debug>(mut self, arg: FunctionArg<T>) -> Self {
        self.args.push(match arg {
            FunctionArg::Column(column) => CallArg::Column(column),
            FunctionArg::Literal(value) => CallArg::Bound {
                rendered: format!("{value:?}"),
                value: value.to_value(),
            },
        });

        self
    }

    /// Call expression with `?` in place of each literal.
    #[must_use]
    pub fn render(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|arg| match arg {
                CallArg::Column(column) => *column,
                CallArg::Bound { .. } => "?",
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("{}({args})", self.name)
    }

    /// Literal arguments in placeholder order.
    #[must_use]
    pub fn bound_values(&self) -> Vec<(String, Value)> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                CallArg::Column(_) => None,
                CallArg::Bound { rendered, value } => Some((rendered.clone(), value.clone())),
            })
            .collect()
    }
}

///
/// FunctionSignature
///
/// Metadata of one declared function, emitted into the generated registry.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FunctionSignature {
    pub keyspace: Option<&'static str>,
    pub name: &'static str,
    pub params: &'static [(&'static str, &'static str)],
    pub returns: &'static str,
    pub deterministic: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_become_placeholders() {
        let call = FunctionCall::new(Some("app"), "score")
            .arg(FunctionArg::<i64>::column("points"))
            .arg(FunctionArg::literal(2i32));

        assert_eq!(call.render(), "app.score(points, ?)");
        assert_eq!(call.bound_values(), vec![("2".to_string(), Value::Int(2))]);
    }
}
