use crate::error::GenerateError;
use crate::metadata::{
    DocStrings, FieldDescriptor, MetadataProvider, TType, ValueDescriptor, doc_key,
};
use crate::model::{
    EnumInfo, ExceptionInfo, FieldInfo, StructInfo, TypeInfo, UnresolvedClassInfo, UnresolvedKind,
};

/// Nesting limit for inline type expansion.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Converts provider descriptors into `TypeInfo` trees, attaching doc strings on the way.
pub struct TypeResolver<'a, P: MetadataProvider + ?Sized> {
    provider: &'a P,
    doc_strings: &'a DocStrings,
    max_depth: usize,
}

impl<'a, P: MetadataProvider + ?Sized> TypeResolver<'a, P> {
    pub fn new(provider: &'a P, doc_strings: &'a DocStrings) -> Self {
        Self {
            provider,
            doc_strings,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn doc(&self, key: &str) -> Option<String> {
        self.doc_strings.get(key).cloned()
    }

    pub fn resolve(&self, value: &ValueDescriptor) -> Result<TypeInfo, GenerateError> {
        self.resolve_at(value, 0)
    }

    /// Resolve a field declared inside `namespace`; its doc lives at `namespace.field`.
    pub fn resolve_field(
        &self,
        field: &FieldDescriptor,
        namespace: &str,
    ) -> Result<FieldInfo, GenerateError> {
        self.field_at(field, namespace, 0)
    }

    pub fn resolve_struct(&self, name: &str) -> Result<StructInfo, GenerateError> {
        self.struct_at(name, 0)
    }

    pub fn resolve_exception(&self, name: &str) -> Result<ExceptionInfo, GenerateError> {
        self.exception_at(name, 0)
    }

    pub fn resolve_enum(&self, name: &str) -> Result<EnumInfo, GenerateError> {
        Ok(EnumInfo {
            name: name.to_string(),
            constants: self.provider.enum_constants(name)?,
            doc_string: self.doc(name),
        })
    }

    fn resolve_at(&self, value: &ValueDescriptor, depth: usize) -> Result<TypeInfo, GenerateError> {
        let type_info = match value {
            ValueDescriptor::Void => TypeInfo::Void,
            ValueDescriptor::Bool => TypeInfo::Bool,
            ValueDescriptor::Byte => TypeInfo::I8,
            ValueDescriptor::I16 => TypeInfo::I16,
            ValueDescriptor::I32 => TypeInfo::I32,
            ValueDescriptor::I64 => TypeInfo::I64,
            ValueDescriptor::Double => TypeInfo::Double,
            ValueDescriptor::String => TypeInfo::String,
            ValueDescriptor::Binary => TypeInfo::Binary,
            ValueDescriptor::Struct(name) => TypeInfo::Struct(self.struct_at(name, depth)?),
            ValueDescriptor::Exception(name) => {
                TypeInfo::Exception(self.exception_at(name, depth)?)
            }
            ValueDescriptor::Enum(name) => TypeInfo::Enum(self.resolve_enum(name)?),
            ValueDescriptor::List(element) => {
                TypeInfo::list(self.resolve_at(element, self.descend(depth, "list")?)?)
            }
            ValueDescriptor::Set(element) => {
                TypeInfo::set(self.resolve_at(element, self.descend(depth, "set")?)?)
            }
            ValueDescriptor::Map(key, value) => {
                let depth = self.descend(depth, "map")?;
                TypeInfo::map(self.resolve_at(key, depth)?, self.resolve_at(value, depth)?)
            }
            ValueDescriptor::Typedef { ttype, name } => self.placeholder(*ttype, name)?,
        };
        Ok(type_info)
    }

    /// Named references stay unexpanded; only their kind and doc are recorded.
    fn placeholder(&self, ttype: TType, name: &str) -> Result<TypeInfo, GenerateError> {
        let kind = match ttype {
            TType::Struct => UnresolvedKind::Struct,
            TType::Enum => UnresolvedKind::Enum,
            TType::List => UnresolvedKind::List,
            TType::Map => UnresolvedKind::Map,
            TType::Set => UnresolvedKind::Set,
            other => {
                return Err(GenerateError::MalformedDescriptor {
                    context: name.to_string(),
                    reason: format!("unexpected typedef type: {}", other.code()),
                });
            }
        };
        Ok(TypeInfo::Unresolved(UnresolvedClassInfo {
            kind,
            name: name.to_string(),
            doc_string: self.doc(name),
        }))
    }

    fn struct_at(&self, name: &str, depth: usize) -> Result<StructInfo, GenerateError> {
        let depth = self.descend(depth, name)?;
        let fields = self.provider.struct_fields(name)?;
        Ok(StructInfo {
            name: name.to_string(),
            fields: self.fields_at(&fields, name, depth)?,
            doc_string: self.doc(name),
        })
    }

    fn exception_at(&self, name: &str, depth: usize) -> Result<ExceptionInfo, GenerateError> {
        let depth = self.descend(depth, name)?;
        let fields = self.provider.exception_fields(name)?;
        Ok(ExceptionInfo {
            name: name.to_string(),
            fields: self.fields_at(&fields, name, depth)?,
            doc_string: self.doc(name),
        })
    }

    fn fields_at(
        &self,
        fields: &[FieldDescriptor],
        namespace: &str,
        depth: usize,
    ) -> Result<Vec<FieldInfo>, GenerateError> {
        fields
            .iter()
            .map(|f| self.field_at(f, namespace, depth))
            .collect()
    }

    fn field_at(
        &self,
        field: &FieldDescriptor,
        namespace: &str,
        depth: usize,
    ) -> Result<FieldInfo, GenerateError> {
        Ok(FieldInfo {
            name: field.name.clone(),
            requirement: field.requirement,
            type_info: self.resolve_at(&field.value, depth)?,
            doc_string: self.doc(&doc_key(namespace, &field.name)),
        })
    }

    fn descend(&self, depth: usize, context: &str) -> Result<usize, GenerateError> {
        if depth >= self.max_depth {
            return Err(GenerateError::MalformedDescriptor {
                context: context.to_string(),
                reason: format!("type nesting exceeds {} levels", self.max_depth),
            });
        }
        Ok(depth + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::metadata::{MetadataRegistry, MethodDescriptor};
    use crate::model::FieldRequirement;

    const TYPES: &str = r#"
namespace: ns
structs:
  Foo:
    doc: A foo.
    fields:
      - { name: id, type: i64, requirement: required, doc: Identifier. }
      - { name: color, type: Color }
      - { name: self_ref, type: Foo, requirement: optional }
      - { name: ids, type: IdList }
      - { name: raw, type: binary }
enums:
  Color:
    doc: Colors.
    constants: [RED, GREEN]
typedefs:
  IdList: "list<i64>"
exceptions:
  Oops:
    fields:
      - { name: reason, type: string }
docstrings:
  ns.IdList: A list of ids.
"#;

    #[test]
    fn test_resolve_struct_with_docs() {
        let registry = MetadataRegistry::from_yaml(TYPES).unwrap();
        let docs = registry.doc_strings();
        let resolver = TypeResolver::new(&registry, &docs);

        let foo = resolver.resolve_struct("ns.Foo").unwrap();
        assert_eq!(foo.doc_string.as_deref(), Some("A foo."));
        assert_eq!(foo.fields.len(), 5);

        let id = &foo.fields[0];
        assert_eq!(id.type_info, TypeInfo::I64);
        assert_eq!(id.requirement, FieldRequirement::Required);
        assert_eq!(id.doc_string.as_deref(), Some("Identifier."));

        match &foo.fields[1].type_info {
            TypeInfo::Enum(color) => {
                assert_eq!(color.constants, vec!["RED", "GREEN"]);
                assert_eq!(color.doc_string.as_deref(), Some("Colors."));
            }
            other => panic!("expected enum, got {other:?}"),
        }

        match &foo.fields[2].type_info {
            TypeInfo::Unresolved(self_ref) => {
                assert_eq!(self_ref.kind, UnresolvedKind::Struct);
                assert_eq!(self_ref.name, "ns.Foo");
                assert_eq!(self_ref.doc_string.as_deref(), Some("A foo."));
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
        match &foo.fields[3].type_info {
            TypeInfo::Unresolved(alias) => {
                assert_eq!(alias.kind, UnresolvedKind::List);
                assert_eq!(alias.doc_string.as_deref(), Some("A list of ids."));
            }
            other => panic!("expected placeholder, got {other:?}"),
        }
        assert_eq!(foo.fields[4].type_info, TypeInfo::Binary);
    }

    #[test]
    fn test_resolve_nested_containers() {
        let registry = MetadataRegistry::from_yaml(TYPES).unwrap();
        let docs = registry.doc_strings();
        let resolver = TypeResolver::new(&registry, &docs);
        let value = ValueDescriptor::Map(
            Box::new(ValueDescriptor::String),
            Box::new(ValueDescriptor::List(Box::new(ValueDescriptor::Set(Box::new(
                ValueDescriptor::Byte,
            ))))),
        );
        let resolved = resolver.resolve(&value).unwrap();
        assert_eq!(resolved.signature(), "map<string, list<set<i8>>>");
    }

    #[test]
    fn test_resolve_exception() {
        let registry = MetadataRegistry::from_yaml(TYPES).unwrap();
        let docs = registry.doc_strings();
        let resolver = TypeResolver::new(&registry, &docs);
        let oops = resolver.resolve_exception("ns.Oops").unwrap();
        assert_eq!(oops.fields[0].name, "reason");
        assert!(matches!(
            resolver.resolve_exception("ns.Missing"),
            Err(GenerateError::MetadataUnavailable(_))
        ));
    }

    /// Hands out whatever descriptor it was built with, cyclic or not.
    struct RawProvider {
        fields: Vec<FieldDescriptor>,
    }

    impl MetadataProvider for RawProvider {
        fn list_methods(&self, service: &str) -> Result<Vec<MethodDescriptor>, MetadataError> {
            Err(MetadataError::Unavailable(service.to_string()))
        }

        fn struct_fields(&self, _name: &str) -> Result<Vec<FieldDescriptor>, MetadataError> {
            Ok(self.fields.clone())
        }

        fn enum_constants(&self, name: &str) -> Result<Vec<String>, MetadataError> {
            Err(MetadataError::Unavailable(name.to_string()))
        }

        fn exception_fields(&self, _name: &str) -> Result<Vec<FieldDescriptor>, MetadataError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_unexpected_typedef_type() {
        let provider = RawProvider { fields: vec![] };
        let docs = DocStrings::new();
        let resolver = TypeResolver::new(&provider, &docs);
        let err = resolver
            .resolve(&ValueDescriptor::Typedef {
                ttype: TType::I32,
                name: "Weird".to_string(),
            })
            .unwrap_err();
        assert_eq!(
            err,
            GenerateError::MalformedDescriptor {
                context: "Weird".to_string(),
                reason: "unexpected typedef type: 8".to_string(),
            }
        );
    }

    #[test]
    fn test_cyclic_provider_hits_depth_cap() {
        let provider = RawProvider {
            fields: vec![FieldDescriptor::new(
                "next",
                ValueDescriptor::Struct("Loop".to_string()),
            )],
        };
        let docs = DocStrings::new();
        let resolver = TypeResolver::new(&provider, &docs).with_max_depth(8);
        let err = resolver.resolve_struct("Loop").unwrap_err();
        assert!(matches!(err, GenerateError::MalformedDescriptor { .. }));
    }

    #[test]
    fn test_missing_enum_is_unavailable() {
        let provider = RawProvider { fields: vec![] };
        let docs = DocStrings::new();
        let resolver = TypeResolver::new(&provider, &docs);
        assert_eq!(
            resolver.resolve(&ValueDescriptor::Enum("E".to_string())),
            Err(GenerateError::MetadataUnavailable("E".to_string()))
        );
    }
}
