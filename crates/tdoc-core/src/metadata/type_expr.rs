use std::fmt;

use crate::error::ParseError;

/// Deepest container nesting a type expression may use.
pub const MAX_TYPE_NESTING: usize = 64;

/// Built-in Thrift types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Void,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
}

impl BaseType {
    fn from_keyword(word: &str) -> Option<BaseType> {
        Some(match word {
            "void" => BaseType::Void,
            "bool" => BaseType::Bool,
            "byte" | "i8" => BaseType::Byte,
            "i16" => BaseType::I16,
            "i32" => BaseType::I32,
            "i64" => BaseType::I64,
            "double" => BaseType::Double,
            "string" => BaseType::String,
            "binary" => BaseType::Binary,
            _ => return None,
        })
    }
}

/// A parsed Thrift type expression such as `map<string, list<Foo>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Base(BaseType),
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A user-defined name: struct, union, enum, exception or typedef.
    Named(String),
}

impl TypeExpr {
    pub fn parse(input: &str) -> Result<TypeExpr, ParseError> {
        let mut parser = Parser {
            input,
            pos: 0,
            depth: 0,
        };
        let expr = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(expr)
    }

    /// Rewrite every bare name through `qualify`.
    pub fn map_names(self, qualify: &impl Fn(&str) -> String) -> TypeExpr {
        match self {
            TypeExpr::Base(b) => TypeExpr::Base(b),
            TypeExpr::List(e) => TypeExpr::List(Box::new(e.map_names(qualify))),
            TypeExpr::Set(e) => TypeExpr::Set(Box::new(e.map_names(qualify))),
            TypeExpr::Map(k, v) => {
                TypeExpr::Map(Box::new(k.map_names(qualify)), Box::new(v.map_names(qualify)))
            }
            TypeExpr::Named(n) => TypeExpr::Named(qualify(&n)),
        }
    }

    /// Every user-defined name mentioned by this expression.
    pub fn names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeExpr::Base(_) => {}
            TypeExpr::List(e) | TypeExpr::Set(e) => e.collect_names(out),
            TypeExpr::Map(k, v) => {
                k.collect_names(out);
                v.collect_names(out);
            }
            TypeExpr::Named(n) => out.push(n),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Base(b) => write!(f, "{}", format!("{b:?}").to_lowercase()),
            TypeExpr::List(e) => write!(f, "list<{e}>"),
            TypeExpr::Set(e) => write!(f, "set<{e}>"),
            TypeExpr::Map(k, v) => write!(f, "map<{k}, {v}>"),
            TypeExpr::Named(n) => f.write_str(n),
        }
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn parse_type(&mut self) -> Result<TypeExpr, ParseError> {
        self.skip_ws();
        let word = self.ident()?;
        match word {
            "list" => {
                let mut args = self.type_args(1)?;
                Ok(TypeExpr::List(Box::new(args.remove(0))))
            }
            "set" => {
                let mut args = self.type_args(1)?;
                Ok(TypeExpr::Set(Box::new(args.remove(0))))
            }
            "map" => {
                let mut args = self.type_args(2)?;
                let value = args.remove(1);
                let key = args.remove(0);
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            _ => match BaseType::from_keyword(word) {
                Some(base) => Ok(TypeExpr::Base(base)),
                None => Ok(TypeExpr::Named(word.to_string())),
            },
        }
    }

    fn type_args(&mut self, count: usize) -> Result<Vec<TypeExpr>, ParseError> {
        self.expect('<')?;
        if self.depth == MAX_TYPE_NESTING {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let mut args = Vec::with_capacity(count);
        for i in 0..count {
            if i > 0 {
                self.expect(',')?;
            }
            args.push(self.parse_type()?);
        }
        self.expect('>')?;
        self.depth -= 1;
        Ok(args)
    }

    fn ident(&mut self) -> Result<&'a str, ParseError> {
        let rest: &'a str = &self.input[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        let word = &rest[..len];
        if word.starts_with('.') || word.ends_with('.') || word.contains("..") {
            return Err(self.error("malformed qualified name"));
        }
        self.pos += len;
        Ok(word)
    }

    fn expect(&mut self, c: char) -> Result<(), ParseError> {
        self.skip_ws();
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn skip_ws(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, reason: &str) -> ParseError {
        ParseError::InvalidTypeExpr {
            expr: self.input.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_types() {
        assert_eq!(TypeExpr::parse("i32").unwrap(), TypeExpr::Base(BaseType::I32));
        assert_eq!(TypeExpr::parse(" binary ").unwrap(), TypeExpr::Base(BaseType::Binary));
        assert_eq!(TypeExpr::parse("i8").unwrap(), TypeExpr::Base(BaseType::Byte));
    }

    #[test]
    fn test_parse_nested_containers() {
        let expr = TypeExpr::parse("map<string, list<set<com.example.Foo>>>").unwrap();
        assert_eq!(
            expr,
            TypeExpr::Map(
                Box::new(TypeExpr::Base(BaseType::String)),
                Box::new(TypeExpr::List(Box::new(TypeExpr::Set(Box::new(
                    TypeExpr::Named("com.example.Foo".to_string())
                )))))
            )
        );
        assert_eq!(expr.to_string(), "map<string, list<set<com.example.Foo>>>");
        assert_eq!(expr.names(), vec!["com.example.Foo"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(TypeExpr::parse("").is_err());
        assert!(TypeExpr::parse("list<i32").is_err());
        assert!(TypeExpr::parse("map<i32>").is_err());
        assert!(TypeExpr::parse("i32 i64").is_err());
        assert!(TypeExpr::parse("foo..Bar").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}i32{}", "list<".repeat(depth), ">".repeat(depth));
        assert!(TypeExpr::parse(&nested(MAX_TYPE_NESTING)).is_ok());

        match TypeExpr::parse(&nested(200_000)) {
            Err(ParseError::InvalidTypeExpr { reason, .. }) => {
                assert!(reason.starts_with("nesting too deep"), "{reason}")
            }
            other => panic!("expected nesting error, got {other:?}"),
        }
    }

    #[test]
    fn test_map_names() {
        let expr = TypeExpr::parse("list<Foo>")
            .unwrap()
            .map_names(&|n| format!("ns.{n}"));
        assert_eq!(expr, TypeExpr::List(Box::new(TypeExpr::Named("ns.Foo".to_string()))));
    }
}
