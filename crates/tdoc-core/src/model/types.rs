use serde::{Deserialize, Serialize};

/// A fully resolved type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypeInfo {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    /// Raw bytes. Never conflated with `String`, even though both share a wire encoding.
    Binary,
    Struct(StructInfo),
    Enum(EnumInfo),
    Exception(ExceptionInfo),
    List { element: Box<TypeInfo> },
    Set { element: Box<TypeInfo> },
    Map { key: Box<TypeInfo>, value: Box<TypeInfo> },
    /// A typedef alias whose definition is looked up by name downstream.
    Unresolved(UnresolvedClassInfo),
}

impl TypeInfo {
    pub fn list(element: TypeInfo) -> Self {
        TypeInfo::List {
            element: Box::new(element),
        }
    }

    pub fn set(element: TypeInfo) -> Self {
        TypeInfo::Set {
            element: Box::new(element),
        }
    }

    pub fn map(key: TypeInfo, value: TypeInfo) -> Self {
        TypeInfo::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn unresolved(kind: UnresolvedKind, name: impl Into<String>) -> Self {
        TypeInfo::Unresolved(UnresolvedClassInfo {
            kind,
            name: name.into(),
            doc_string: None,
        })
    }

    /// The named class this type denotes, if it is a struct, enum or exception.
    pub fn as_class(&self) -> Option<ClassInfo> {
        match self {
            TypeInfo::Struct(s) => Some(ClassInfo::Struct(s.clone())),
            TypeInfo::Enum(e) => Some(ClassInfo::Enum(e.clone())),
            TypeInfo::Exception(e) => Some(ClassInfo::Exception(e.clone())),
            _ => None,
        }
    }

    /// Short human-readable signature, e.g. `map<string, list<com.example.Foo>>`.
    pub fn signature(&self) -> String {
        match self {
            TypeInfo::Void => "void".to_string(),
            TypeInfo::Bool => "bool".to_string(),
            TypeInfo::I8 => "i8".to_string(),
            TypeInfo::I16 => "i16".to_string(),
            TypeInfo::I32 => "i32".to_string(),
            TypeInfo::I64 => "i64".to_string(),
            TypeInfo::Double => "double".to_string(),
            TypeInfo::String => "string".to_string(),
            TypeInfo::Binary => "binary".to_string(),
            TypeInfo::Struct(s) => s.name.clone(),
            TypeInfo::Enum(e) => e.name.clone(),
            TypeInfo::Exception(e) => e.name.clone(),
            TypeInfo::List { element } => format!("list<{}>", element.signature()),
            TypeInfo::Set { element } => format!("set<{}>", element.signature()),
            TypeInfo::Map { key, value } => {
                format!("map<{}, {}>", key.signature(), value.signature())
            }
            TypeInfo::Unresolved(u) => u.name.clone(),
        }
    }
}

impl From<ClassInfo> for TypeInfo {
    fn from(class: ClassInfo) -> Self {
        match class {
            ClassInfo::Struct(s) => TypeInfo::Struct(s),
            ClassInfo::Enum(e) => TypeInfo::Enum(e),
            ClassInfo::Exception(e) => TypeInfo::Exception(e),
        }
    }
}

/// A named type with a globally unique qualified name.
///
/// Two instances denote the same entity iff their qualified names are equal.
/// `PartialEq` is structural and is used to detect conflicting definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClassInfo {
    Struct(StructInfo),
    Enum(EnumInfo),
    Exception(ExceptionInfo),
}

impl ClassInfo {
    pub fn name(&self) -> &str {
        match self {
            ClassInfo::Struct(s) => &s.name,
            ClassInfo::Enum(e) => &e.name,
            ClassInfo::Exception(e) => &e.name,
        }
    }

    pub fn doc_string(&self) -> Option<&str> {
        match self {
            ClassInfo::Struct(s) => s.doc_string.as_deref(),
            ClassInfo::Enum(e) => e.doc_string.as_deref(),
            ClassInfo::Exception(e) => e.doc_string.as_deref(),
        }
    }

    /// Declared fields; enums have none.
    pub fn fields(&self) -> &[FieldInfo] {
        match self {
            ClassInfo::Struct(s) => &s.fields,
            ClassInfo::Enum(_) => &[],
            ClassInfo::Exception(e) => &e.fields,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ClassInfo::Struct(_) => "struct",
            ClassInfo::Enum(_) => "enum",
            ClassInfo::Exception(_) => "exception",
        }
    }
}

/// A struct (or union) with fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

/// An enum with constant names in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumInfo {
    pub name: String,
    pub constants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

/// An exception with fields in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    pub name: String,
    pub fields: Vec<FieldInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

/// Field requirement as declared in the IDL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRequirement {
    Required,
    Optional,
    #[default]
    Default,
}

/// A struct field, exception field, or function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub requirement: FieldRequirement,
    pub type_info: TypeInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

impl FieldInfo {
    pub fn new(
        name: impl Into<String>,
        requirement: FieldRequirement,
        type_info: TypeInfo,
    ) -> Self {
        Self {
            name: name.into(),
            requirement,
            type_info,
            doc_string: None,
        }
    }
}

/// What kind of definition an unresolved alias stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedKind {
    Struct,
    Enum,
    List,
    Map,
    Set,
}

/// A named forward reference to a definition not expanded at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedClassInfo {
    pub kind: UnresolvedKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature() {
        let ty = TypeInfo::map(
            TypeInfo::String,
            TypeInfo::list(TypeInfo::unresolved(UnresolvedKind::Struct, "com.example.Foo")),
        );
        assert_eq!(ty.signature(), "map<string, list<com.example.Foo>>");
    }

    #[test]
    fn test_string_and_binary_differ() {
        assert_ne!(TypeInfo::String, TypeInfo::Binary);
    }

    #[test]
    fn test_class_round_trip_through_type_info() {
        let class = ClassInfo::Enum(EnumInfo {
            name: "com.example.Color".to_string(),
            constants: vec!["RED".to_string(), "GREEN".to_string()],
            doc_string: None,
        });
        let ty = TypeInfo::from(class.clone());
        assert_eq!(ty.as_class(), Some(class));
        assert!(TypeInfo::list(TypeInfo::I32).as_class().is_none());
    }

    #[test]
    fn test_enum_has_no_fields() {
        let class = ClassInfo::Enum(EnumInfo {
            name: "E".to_string(),
            constants: vec![],
            doc_string: Some("doc".to_string()),
        });
        assert!(class.fields().is_empty());
        assert_eq!(class.doc_string(), Some("doc"));
        assert_eq!(class.kind(), "enum");
    }
}
