//! CQL type expressions as written in declarations.

use derive_more::Display;
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

///
/// ScalarType
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ScalarType {
    #[display("ascii")]
    Ascii,
    #[display("bigint")]
    BigInt,
    #[display("blob")]
    Blob,
    #[display("boolean")]
    Boolean,
    #[display("date")]
    Date,
    #[display("decimal")]
    Decimal,
    #[display("double")]
    Double,
    #[display("duration")]
    Duration,
    #[display("float")]
    Float,
    #[display("inet")]
    Inet,
    #[display("int")]
    Int,
    #[display("smallint")]
    SmallInt,
    #[display("text")]
    Text,
    #[display("time")]
    Time,
    #[display("timestamp")]
    Timestamp,
    #[display("timeuuid")]
    TimeUuid,
    #[display("tinyint")]
    TinyInt,
    #[display("uuid")]
    Uuid,
    #[display("varchar")]
    Varchar,
    #[display("varint")]
    VarInt,
}

impl ScalarType {
    const ALL: [Self; 20] = [
        Self::Ascii,
        Self::BigInt,
        Self::Blob,
        Self::Boolean,
        Self::Date,
        Self::Decimal,
        Self::Double,
        Self::Duration,
        Self::Float,
        Self::Inet,
        Self::Int,
        Self::SmallInt,
        Self::Text,
        Self::Time,
        Self::Timestamp,
        Self::TimeUuid,
        Self::TinyInt,
        Self::Uuid,
        Self::Varchar,
        Self::VarInt,
    ];

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|scalar| scalar.to_string().eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Ascii | Self::Text | Self::Varchar)
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::TinyInt
                | Self::SmallInt
                | Self::Int
                | Self::BigInt
                | Self::Float
                | Self::Double
                | Self::VarInt
                | Self::Decimal
        )
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }

    /// Date-like scalars that text-search index implementations accept.
    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::Timestamp | Self::Date)
    }

    #[must_use]
    pub const fn is_uuid(self) -> bool {
        matches!(self, Self::Uuid | Self::TimeUuid)
    }
}

///
/// TypeExpr
///
/// Parsed type expression. `Indexed` marks a nested slot carrying a
/// secondary index; the extractor strips it into an index model.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TypeExpr {
    Scalar(ScalarType),
    Counter,
    List(Box<Self>),
    Set(Box<Self>),
    Map(Box<Self>, Box<Self>),
    Tuple(Vec<Self>),
    Frozen(Box<Self>),
    Indexed(Box<Self>),
    Udt(String),
}

impl FromStr for TypeExpr {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let expr = parser.parse_expr()?;
        parser.skip_ws();
        if parser.pos < parser.input.len() {
            return Err(parser.error("unexpected trailing input"));
        }

        Ok(expr)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Counter => write!(f, "counter"),
            Self::List(inner) => write!(f, "list<{inner}>"),
            Self::Set(inner) => write!(f, "set<{inner}>"),
            Self::Map(key, value) => write!(f, "map<{key}, {value}>"),
            Self::Tuple(items) => {
                let items = items.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "tuple<{}>", items.join(", "))
            }
            Self::Frozen(inner) => write!(f, "frozen<{inner}>"),
            Self::Indexed(inner) => write!(f, "indexed<{inner}>"),
            Self::Udt(name) => write!(f, "{name}"),
        }
    }
}

///
/// ParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("{message} at position {position} in '{input}'")]
pub struct ParseError {
    pub input: String,
    pub position: usize,
    pub message: String,
}

///
/// Parser
/// Recursive descent over the raw expression.
///

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    const fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            input: self.input.to_string(),
            position: self.pos,
            message: message.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{expected}'")))
        }
    }

    fn ident(&mut self) -> Result<&'a str, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected a type name"));
        }

        Ok(&self.input[start..self.pos])
    }

    fn parse_args(&mut self) -> Result<Vec<TypeExpr>, ParseError> {
        self.expect('<')?;
        let mut args = vec![self.parse_expr()?];
        loop {
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                    args.push(self.parse_expr()?);
                }
                Some('>') => {
                    self.pos += 1;
                    return Ok(args);
                }
                _ => return Err(self.error("expected ',' or '>'")),
            }
        }
    }

    fn parse_unary(&mut self, name: &str) -> Result<Box<TypeExpr>, ParseError> {
        let start = self.pos;
        let mut args = self.parse_args()?;
        if args.len() != 1 {
            self.pos = start;
            return Err(self.error(format!("{name} takes exactly one type argument")));
        }

        Ok(Box::new(args.remove(0)))
    }

    fn parse_expr(&mut self) -> Result<TypeExpr, ParseError> {
        let name = self.ident()?;
        let lower = name.to_ascii_lowercase();

        let expr = match lower.as_str() {
            "counter" => TypeExpr::Counter,
            "list" => TypeExpr::List(self.parse_unary("list")?),
            "set" => TypeExpr::Set(self.parse_unary("set")?),
            "frozen" => TypeExpr::Frozen(self.parse_unary("frozen")?),
            "indexed" => TypeExpr::Indexed(self.parse_unary("indexed")?),
            "map" => {
                let start = self.pos;
                let mut args = self.parse_args()?;
                if args.len() != 2 {
                    self.pos = start;
                    return Err(self.error("map takes exactly two type arguments"));
                }
                let value = args.remove(1);
                let key = args.remove(0);
                TypeExpr::Map(Box::new(key), Box::new(value))
            }
            "tuple" => TypeExpr::Tuple(self.parse_args()?),
            _ => match ScalarType::from_name(&lower) {
                Some(scalar) => TypeExpr::Scalar(scalar),
                None => TypeExpr::Udt(name.to_string()),
            },
        };

        Ok(expr)
    }
}

impl TypeExpr {
    /// Whether the expression mentions `indexed<...>` anywhere.
    #[must_use]
    pub fn has_index_marker(&self) -> bool {
        match self {
            Self::Indexed(_) => true,
            Self::List(inner) | Self::Set(inner) | Self::Frozen(inner) => inner.has_index_marker(),
            Self::Map(key, value) => key.has_index_marker() || value.has_index_marker(),
            Self::Tuple(items) => items.iter().any(Self::has_index_marker),
            Self::Scalar(_) | Self::Counter | Self::Udt(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeExpr {
        s.parse().expect("valid type expression")
    }

    #[test]
    fn parses_nested_collections() {
        assert_eq!(
            parse("list<frozen<tuple<int, text>>>"),
            TypeExpr::List(Box::new(TypeExpr::Frozen(Box::new(TypeExpr::Tuple(vec![
                TypeExpr::Scalar(ScalarType::Int),
                TypeExpr::Scalar(ScalarType::Text),
            ])))))
        );
        assert_eq!(
            parse(" map < text , indexed<bigint> > "),
            TypeExpr::Map(
                Box::new(TypeExpr::Scalar(ScalarType::Text)),
                Box::new(TypeExpr::Indexed(Box::new(TypeExpr::Scalar(
                    ScalarType::BigInt
                ))))
            )
        );
    }

    #[test]
    fn keywords_are_case_insensitive_and_udts_keep_case() {
        assert_eq!(parse("BIGINT"), TypeExpr::Scalar(ScalarType::BigInt));
        assert_eq!(parse("Address"), TypeExpr::Udt("Address".into()));
        assert_eq!(parse("Counter"), TypeExpr::Counter);
    }

    #[test]
    fn display_round_trips_the_canonical_form() {
        for s in [
            "map<text, frozen<list<int>>>",
            "tuple<uuid, timestamp, address>",
            "set<indexed<text>>",
        ] {
            assert_eq!(parse(s).to_string(), s);
        }
    }

    #[test]
    fn errors_carry_position() {
        let err = "map<text>".parse::<TypeExpr>().unwrap_err();
        assert_eq!(err.position, 3);

        let err = "list<int".parse::<TypeExpr>().unwrap_err();
        assert_eq!(err.position, 8);

        let err = "int>".parse::<TypeExpr>().unwrap_err();
        assert_eq!(err.message, "unexpected trailing input");
        assert_eq!(err.position, 3);
    }

    #[test]
    fn marker_detection_descends_everywhere() {
        assert!(parse("map<indexed<text>, int>").has_index_marker());
        assert!(!parse("frozen<list<int>>").has_index_marker());
    }
}
