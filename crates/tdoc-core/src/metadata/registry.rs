use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::debug;

use super::descriptor::{
    BASE_EXCEPTION, FieldDescriptor, MethodDescriptor, SUCCESS_FIELD, TType, ValueDescriptor,
};
use super::file::{EnumDef, FieldDef, RegistryFile};
use super::type_expr::{BaseType, TypeExpr};
use super::{DocStrings, MetadataProvider, doc_key, interface_service};
use crate::error::{MetadataError, ParseError};
use crate::model::FieldRequirement;

/// A validated, in-memory metadata source built from one or more registry files.
///
/// All names are fully qualified. Every cycle of struct references is cut at one edge per
/// loop, and the cut references are reported as typedef-style named references.
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    services: IndexMap<String, Service>,
    structs: IndexMap<String, Composite>,
    exceptions: IndexMap<String, Exception>,
    enums: IndexMap<String, EnumDef>,
    typedefs: IndexMap<String, TypeExpr>,
    doc_strings: DocStrings,
    /// Owner to referenced struct pairs lowered by name.
    cycle_cuts: HashMap<String, HashSet<String>>,
}

#[derive(Debug, Clone)]
struct Field {
    name: String,
    requirement: FieldRequirement,
    ty: TypeExpr,
}

#[derive(Debug, Clone)]
struct Method {
    name: String,
    params: Vec<Field>,
    returns: TypeExpr,
    throws: Vec<Field>,
    oneway: bool,
}

#[derive(Debug, Clone)]
struct Service {
    methods: Vec<Method>,
}

#[derive(Debug, Clone)]
struct Composite {
    fields: Vec<Field>,
}

#[derive(Debug, Clone)]
struct Exception {
    fields: Option<Vec<Field>>,
}

/// What a qualified name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Definition {
    Struct,
    Exception,
    Enum,
    Typedef,
}

impl MetadataRegistry {
    /// Merge and validate registry files.
    pub fn build(files: impl IntoIterator<Item = RegistryFile>) -> Result<Self, ParseError> {
        let mut registry = MetadataRegistry::default();
        for file in files {
            registry.add_file(file)?;
        }
        registry.validate()?;
        registry.cycle_cuts = registry.find_cycle_cuts();
        debug!(
            "built metadata registry: {} services, {} types",
            registry.services.len(),
            registry.type_count()
        );
        Ok(registry)
    }

    pub fn from_yaml(input: &str) -> Result<Self, ParseError> {
        Self::build([super::from_yaml(input)?])
    }

    pub fn from_json(input: &str) -> Result<Self, ParseError> {
        Self::build([super::from_json(input)?])
    }

    /// Add another file. On error the registry is left unchanged.
    pub fn merge(&mut self, file: RegistryFile) -> Result<(), ParseError> {
        let mut merged = self.clone();
        merged.add_file(file)?;
        merged.validate()?;
        merged.cycle_cuts = merged.find_cycle_cuts();
        *self = merged;
        Ok(())
    }

    pub fn service_names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn type_count(&self) -> usize {
        self.structs.len() + self.exceptions.len() + self.enums.len() + self.typedefs.len()
    }

    fn add_file(&mut self, file: RegistryFile) -> Result<(), ParseError> {
        let namespace = file.namespace;
        let qualify = |name: &str| {
            if name.contains('.') || namespace.is_empty() {
                name.to_string()
            } else {
                format!("{namespace}.{name}")
            }
        };

        for (name, def) in file.services {
            let name = qualify(&name);
            self.ensure_undefined(&name)?;
            self.add_doc(&name, def.doc);
            let mut methods = Vec::with_capacity(def.methods.len());
            for method in def.methods {
                let key = doc_key(&name, &method.name);
                self.add_doc(&key, method.doc);
                let returns = match method.returns {
                    Some(expr) => TypeExpr::parse(&expr)?.map_names(&qualify),
                    None => TypeExpr::Base(BaseType::Void),
                };
                methods.push(Method {
                    params: self.convert_fields(&key, method.params, &qualify)?,
                    throws: self.convert_fields(&key, method.throws, &qualify)?,
                    name: method.name,
                    returns,
                    oneway: method.oneway,
                });
            }
            self.services.insert(name, Service { methods });
        }

        for (name, def) in file.structs.into_iter().chain(file.unions) {
            let name = qualify(&name);
            self.ensure_undefined(&name)?;
            self.add_doc(&name, def.doc);
            let fields = self.convert_fields(&name, def.fields, &qualify)?;
            self.structs.insert(name, Composite { fields });
        }

        for (name, def) in file.exceptions {
            let name = qualify(&name);
            self.ensure_undefined(&name)?;
            self.add_doc(&name, def.doc);
            let fields = match def.fields {
                Some(fields) => Some(self.convert_fields(&name, fields, &qualify)?),
                None => None,
            };
            self.exceptions.insert(name, Exception { fields });
        }

        for (name, mut def) in file.enums {
            let name = qualify(&name);
            self.ensure_undefined(&name)?;
            self.add_doc(&name, def.doc.take());
            self.enums.insert(name, def);
        }

        for (name, expr) in file.typedefs {
            let name = qualify(&name);
            self.ensure_undefined(&name)?;
            let target = TypeExpr::parse(&expr)?.map_names(&qualify);
            self.typedefs.insert(name, target);
        }

        self.doc_strings.extend(file.docstrings);
        Ok(())
    }

    fn convert_fields(
        &mut self,
        namespace: &str,
        defs: Vec<FieldDef>,
        qualify: &impl Fn(&str) -> String,
    ) -> Result<Vec<Field>, ParseError> {
        defs.into_iter()
            .map(|def| {
                self.add_doc(&doc_key(namespace, &def.name), def.doc);
                Ok(Field {
                    ty: TypeExpr::parse(&def.type_expr)?.map_names(qualify),
                    name: def.name,
                    requirement: def.requirement,
                })
            })
            .collect()
    }

    fn add_doc(&mut self, key: &str, doc: Option<String>) {
        if let Some(doc) = doc {
            self.doc_strings.insert(key.to_string(), doc);
        }
    }

    fn ensure_undefined(&self, name: &str) -> Result<(), ParseError> {
        if self.services.contains_key(name) || self.definition(name).is_some() {
            return Err(ParseError::DuplicateDefinition(name.to_string()));
        }
        Ok(())
    }

    fn definition(&self, name: &str) -> Option<Definition> {
        if self.structs.contains_key(name) {
            Some(Definition::Struct)
        } else if self.exceptions.contains_key(name) {
            Some(Definition::Exception)
        } else if self.enums.contains_key(name) {
            Some(Definition::Enum)
        } else if self.typedefs.contains_key(name) {
            Some(Definition::Typedef)
        } else {
            None
        }
    }

    fn validate(&self) -> Result<(), ParseError> {
        for name in self.typedefs.keys() {
            self.typedef_target(name)?;
        }

        let check = |ty: &TypeExpr, context: &str| -> Result<(), ParseError> {
            for name in ty.names() {
                if self.definition(name).is_none() {
                    return Err(ParseError::UndefinedType {
                        name: name.to_string(),
                        context: context.to_string(),
                    });
                }
            }
            Ok(())
        };

        for (name, target) in &self.typedefs {
            check(target, name)?;
        }
        for (name, def) in &self.structs {
            for field in &def.fields {
                check(&field.ty, &doc_key(name, &field.name))?;
            }
        }
        for (name, def) in &self.exceptions {
            for field in def.fields.iter().flatten() {
                check(&field.ty, &doc_key(name, &field.name))?;
            }
        }
        for (service, def) in &self.services {
            for method in &def.methods {
                let context = doc_key(service, &method.name);
                check(&method.returns, &context)?;
                for field in method.params.iter().chain(&method.throws) {
                    check(&field.ty, &doc_key(&context, &field.name))?;
                }
                self.validate_method(&context, method)?;
            }
        }
        Ok(())
    }

    fn validate_method(&self, context: &str, method: &Method) -> Result<(), ParseError> {
        let invalid = |reason: &str| ParseError::InvalidMethod {
            method: context.to_string(),
            reason: reason.to_string(),
        };
        if method.oneway
            && (method.returns != TypeExpr::Base(BaseType::Void) || !method.throws.is_empty())
        {
            return Err(invalid("oneway methods cannot return a value or throw"));
        }
        for field in &method.throws {
            if self.exception_name(&field.ty)?.is_none() {
                return Err(invalid(&format!("'{}' is not an exception", field.ty)));
            }
        }
        Ok(())
    }

    /// Follow a typedef chain to the first non-alias type expression.
    fn typedef_target<'a>(&'a self, alias: &'a str) -> Result<&'a TypeExpr, ParseError> {
        let mut seen = HashSet::new();
        let mut current = alias;
        loop {
            if !seen.insert(current) {
                return Err(ParseError::TypedefCycle(alias.to_string()));
            }
            let target = self.typedefs.get(current).ok_or_else(|| {
                ParseError::UndefinedType {
                    name: current.to_string(),
                    context: alias.to_string(),
                }
            })?;
            match target {
                TypeExpr::Named(next) if self.typedefs.contains_key(next) => {
                    current = next.as_str()
                }
                _ => return Ok(target),
            }
        }
    }

    /// Qualified exception name denoted by `ty`, looking through typedefs.
    fn exception_name<'a>(&'a self, ty: &'a TypeExpr) -> Result<Option<&'a str>, ParseError> {
        let ty = match ty {
            TypeExpr::Named(name) if self.typedefs.contains_key(name) => {
                self.typedef_target(name)?
            }
            other => other,
        };
        Ok(match ty {
            TypeExpr::Named(name) if self.exceptions.contains_key(name) => Some(name.as_str()),
            _ => None,
        })
    }

    fn composite_fields(&self, name: &str) -> &[Field] {
        if let Some(def) = self.structs.get(name) {
            &def.fields
        } else if let Some(def) = self.exceptions.get(name) {
            def.fields.as_deref().unwrap_or(&[])
        } else {
            &[]
        }
    }

    /// Whether struct `from` refers, directly or through other inline struct fields, to `to`.
    fn reaches(&self, from: &str, to: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![from.to_string()];
        while let Some(name) = stack.pop() {
            for field in self.composite_fields(&name) {
                for dep in field.ty.names() {
                    if dep == to {
                        return true;
                    }
                    if matches!(
                        self.definition(dep),
                        Some(Definition::Struct | Definition::Exception)
                    ) && visited.insert(dep)
                    {
                        stack.push(dep.to_string());
                    }
                }
            }
        }
        false
    }

    /// Struct and exception names referenced inline by the fields of `name`.
    fn composite_refs(&self, name: &str) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::new();
        for field in self.composite_fields(name) {
            for dep in field.ty.names() {
                let composite = matches!(
                    self.definition(dep),
                    Some(Definition::Struct | Definition::Exception)
                );
                if composite && !refs.contains(&dep) {
                    refs.push(dep);
                }
            }
        }
        refs
    }

    /// Pick the references to lower by name so that no struct expands into itself.
    ///
    /// Each strongly connected group of structs is walked depth-first from its
    /// last-declared member, following only references inside the group. Back edges of
    /// that walk are cut, so the last-declared member expands every other member inline.
    fn find_cycle_cuts(&self) -> HashMap<String, HashSet<String>> {
        let order: Vec<&str> = self
            .structs
            .keys()
            .chain(self.exceptions.keys())
            .map(String::as_str)
            .collect();
        let mut cuts: HashMap<String, HashSet<String>> = HashMap::new();
        let mut visited: HashSet<&str> = HashSet::new();

        for &root in order.iter().rev() {
            if visited.contains(root) || !self.reaches(root, root) {
                continue;
            }
            visited.insert(root);
            let mut on_path: Vec<&str> = vec![root];
            let mut pending: Vec<Vec<&str>> = vec![self.group_refs(root)];
            while let Some(refs) = pending.last_mut() {
                let Some(next) = refs.pop() else {
                    pending.pop();
                    on_path.pop();
                    continue;
                };
                let Some(&owner) = on_path.last() else {
                    break;
                };
                if on_path.contains(&next) {
                    cuts.entry(owner.to_string())
                        .or_default()
                        .insert(next.to_string());
                } else if visited.insert(next) {
                    on_path.push(next);
                    pending.push(self.group_refs(next));
                }
            }
        }
        cuts
    }

    /// References of `name` that lead back to it, in reverse field order for popping.
    fn group_refs(&self, name: &str) -> Vec<&str> {
        let mut refs: Vec<&str> = self
            .composite_refs(name)
            .into_iter()
            .filter(|dep| self.reaches(dep, name))
            .collect();
        refs.reverse();
        refs
    }

    fn lower_fields(
        &self,
        fields: &[Field],
        owner: Option<&str>,
    ) -> Result<Vec<FieldDescriptor>, MetadataError> {
        fields
            .iter()
            .map(|f| {
                Ok(FieldDescriptor {
                    name: f.name.clone(),
                    requirement: f.requirement,
                    value: self.lower(&f.ty, owner)?,
                })
            })
            .collect()
    }

    /// Convert a type expression to the descriptor shape the resolver consumes.
    fn lower(&self, ty: &TypeExpr, owner: Option<&str>) -> Result<ValueDescriptor, MetadataError> {
        Ok(match ty {
            TypeExpr::Base(base) => lower_base(*base),
            TypeExpr::List(e) => ValueDescriptor::List(Box::new(self.lower(e, owner)?)),
            TypeExpr::Set(e) => ValueDescriptor::Set(Box::new(self.lower(e, owner)?)),
            TypeExpr::Map(k, v) => ValueDescriptor::Map(
                Box::new(self.lower(k, owner)?),
                Box::new(self.lower(v, owner)?),
            ),
            TypeExpr::Named(name) => match self.definition(name) {
                Some(definition @ (Definition::Struct | Definition::Exception)) => {
                    let cyclic = owner.is_some_and(|owner| {
                        self.cycle_cuts
                            .get(owner)
                            .is_some_and(|targets| targets.contains(name))
                    });
                    if cyclic {
                        ValueDescriptor::Typedef {
                            ttype: TType::Struct,
                            name: name.clone(),
                        }
                    } else if definition == Definition::Exception {
                        ValueDescriptor::Exception(name.clone())
                    } else {
                        ValueDescriptor::Struct(name.clone())
                    }
                }
                Some(Definition::Enum) => ValueDescriptor::Enum(name.clone()),
                Some(Definition::Typedef) => self.lower_alias(name)?,
                None => return Err(MetadataError::Unavailable(name.clone())),
            },
        })
    }

    fn lower_alias(&self, alias: &str) -> Result<ValueDescriptor, MetadataError> {
        let target = self.typedef_target(alias).map_err(|e| MetadataError::Malformed {
            context: alias.to_string(),
            reason: e.to_string(),
        })?;
        let ttype = match target {
            TypeExpr::Base(base) => return Ok(lower_base(*base)),
            TypeExpr::List(_) => TType::List,
            TypeExpr::Set(_) => TType::Set,
            TypeExpr::Map(_, _) => TType::Map,
            TypeExpr::Named(name) => match self.definition(name) {
                Some(Definition::Struct | Definition::Exception) => TType::Struct,
                Some(Definition::Enum) => TType::Enum,
                _ => return Err(MetadataError::Unavailable(name.clone())),
            },
        };
        Ok(ValueDescriptor::Typedef {
            ttype,
            name: alias.to_string(),
        })
    }

    fn lower_method(
        &self,
        method: &Method,
        service: &str,
    ) -> Result<MethodDescriptor, MetadataError> {
        let result_fields = if method.oneway {
            None
        } else {
            let mut fields = Vec::with_capacity(method.throws.len() + 1);
            if method.returns != TypeExpr::Base(BaseType::Void) {
                fields.push(FieldDescriptor::new(
                    SUCCESS_FIELD,
                    self.lower(&method.returns, None)?,
                ));
            }
            for field in &method.throws {
                fields.push(FieldDescriptor {
                    name: field.name.clone(),
                    requirement: FieldRequirement::Default,
                    value: self.lower(&field.ty, None)?,
                });
            }
            Some(fields)
        };

        let mut exceptions = Vec::with_capacity(method.throws.len() + 1);
        for field in &method.throws {
            let name = self
                .exception_name(&field.ty)
                .ok()
                .flatten()
                .ok_or_else(|| MetadataError::Unavailable(field.ty.to_string()))?;
            exceptions.push(name.to_string());
        }
        exceptions.push(BASE_EXCEPTION.to_string());

        Ok(MethodDescriptor {
            name: method.name.clone(),
            args_type: format!("{service}.{}_args", method.name),
            parameters: self.lower_fields(&method.params, None)?,
            result_fields,
            exceptions,
        })
    }
}

fn lower_base(base: BaseType) -> ValueDescriptor {
    match base {
        BaseType::Void => ValueDescriptor::Void,
        BaseType::Bool => ValueDescriptor::Bool,
        BaseType::Byte => ValueDescriptor::Byte,
        BaseType::I16 => ValueDescriptor::I16,
        BaseType::I32 => ValueDescriptor::I32,
        BaseType::I64 => ValueDescriptor::I64,
        BaseType::Double => ValueDescriptor::Double,
        BaseType::String => ValueDescriptor::String,
        BaseType::Binary => ValueDescriptor::Binary,
    }
}

impl MetadataProvider for MetadataRegistry {
    fn enclosing_service(&self, interface: &str) -> Result<String, MetadataError> {
        let service = interface_service(interface);
        if self.services.contains_key(service) {
            Ok(service.to_string())
        } else {
            Err(MetadataError::Unavailable(interface.to_string()))
        }
    }

    fn list_methods(&self, service: &str) -> Result<Vec<MethodDescriptor>, MetadataError> {
        let def = self
            .services
            .get(service)
            .ok_or_else(|| MetadataError::Unavailable(service.to_string()))?;
        def.methods
            .iter()
            .map(|m| self.lower_method(m, service))
            .collect()
    }

    fn struct_fields(&self, name: &str) -> Result<Vec<FieldDescriptor>, MetadataError> {
        match self.definition(name) {
            Some(Definition::Struct | Definition::Exception) => {
                self.lower_fields(self.composite_fields(name), Some(name))
            }
            _ => Err(MetadataError::Unavailable(name.to_string())),
        }
    }

    fn enum_constants(&self, name: &str) -> Result<Vec<String>, MetadataError> {
        self.enums
            .get(name)
            .map(|def| def.constants.clone())
            .ok_or_else(|| MetadataError::Unavailable(name.to_string()))
    }

    fn exception_fields(&self, name: &str) -> Result<Vec<FieldDescriptor>, MetadataError> {
        let def = self
            .exceptions
            .get(name)
            .ok_or_else(|| MetadataError::Unavailable(name.to_string()))?;
        match &def.fields {
            Some(fields) => self.lower_fields(fields, Some(name)),
            None => Ok(Vec::new()),
        }
    }

    fn doc_strings(&self) -> DocStrings {
        self.doc_strings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"
namespace: com.example
structs:
  Node:
    fields:
      - { name: value, type: i32 }
      - { name: children, type: "list<Node>" }
  Ping:
    fields:
      - { name: pong, type: Pong, requirement: optional }
  Pong:
    fields:
      - { name: ping, type: Ping }
  Holder:
    fields:
      - { name: ping, type: Ping }
"#;

    #[test]
    fn test_self_reference_lowers_to_named_reference() {
        let registry = MetadataRegistry::from_yaml(TREE).unwrap();
        let fields = registry.struct_fields("com.example.Node").unwrap();
        assert_eq!(fields[0].value, ValueDescriptor::I32);
        assert_eq!(
            fields[1].value,
            ValueDescriptor::List(Box::new(ValueDescriptor::Typedef {
                ttype: TType::Struct,
                name: "com.example.Node".to_string(),
            }))
        );
    }

    #[test]
    fn test_mutual_reference_cuts_forward_edge() {
        let registry = MetadataRegistry::from_yaml(TREE).unwrap();
        // Pong is declared last, so the walk starts there and only Ping.pong is cut.
        let ping = registry.struct_fields("com.example.Ping").unwrap();
        assert_eq!(
            ping[0].value,
            ValueDescriptor::Typedef {
                ttype: TType::Struct,
                name: "com.example.Pong".to_string(),
            }
        );
        assert_eq!(ping[0].requirement, FieldRequirement::Optional);
        let pong = registry.struct_fields("com.example.Pong").unwrap();
        assert_eq!(
            pong[0].value,
            ValueDescriptor::Struct("com.example.Ping".to_string())
        );

        // Holder is outside the cycle, so it still gets an inline reference.
        let holder = registry.struct_fields("com.example.Holder").unwrap();
        assert_eq!(
            holder[0].value,
            ValueDescriptor::Struct("com.example.Ping".to_string())
        );
    }

    #[test]
    fn test_longer_cycle_is_cut_once() {
        let yaml = r#"
namespace: ns
structs:
  A:
    fields:
      - { name: b, type: B }
  B:
    fields:
      - { name: c, type: C }
  C:
    fields:
      - { name: a, type: A }
"#;
        let registry = MetadataRegistry::from_yaml(yaml).unwrap();
        let inline = |owner: &str| {
            let fields = registry.struct_fields(owner).unwrap();
            matches!(fields[0].value, ValueDescriptor::Struct(_))
        };
        // The walk starts at C, the last declaration, and meets C again from B.
        assert!(inline("ns.A"));
        assert!(!inline("ns.B"));
        assert!(inline("ns.C"));
    }

    #[test]
    fn test_typedef_lowering() {
        let yaml = r#"
namespace: ns
structs:
  S:
    fields:
      - { name: a, type: Id }
      - { name: b, type: Ids }
      - { name: c, type: Alias }
typedefs:
  Id: i64
  Ids: "list<Id>"
  Alias: Other
  Other: S
"#;
        let registry = MetadataRegistry::from_yaml(yaml).unwrap();
        let fields = registry.struct_fields("ns.S").unwrap();
        assert_eq!(fields[0].value, ValueDescriptor::I64);
        assert_eq!(
            fields[1].value,
            ValueDescriptor::Typedef {
                ttype: TType::List,
                name: "ns.Ids".to_string()
            }
        );
        assert_eq!(
            fields[2].value,
            ValueDescriptor::Typedef {
                ttype: TType::Struct,
                name: "ns.Alias".to_string()
            }
        );
    }

    #[test]
    fn test_methods_and_exceptions() {
        let yaml = r#"
namespace: ns
services:
  Svc:
    methods:
      - name: get
        params:
          - { name: id, type: i64 }
        returns: string
        throws:
          - { name: nf, type: NotFound }
      - name: fire
        oneway: true
exceptions:
  NotFound:
    fields:
      - { name: message, type: string }
  Opaque: {}
"#;
        let registry = MetadataRegistry::from_yaml(yaml).unwrap();
        let methods = registry.list_methods("ns.Svc").unwrap();
        assert_eq!(methods.len(), 2);

        let get = &methods[0];
        assert_eq!(get.args_type, "ns.Svc.get_args");
        assert_eq!(get.success_field().unwrap().value, ValueDescriptor::String);
        assert_eq!(get.exceptions, vec!["ns.NotFound", BASE_EXCEPTION]);

        let fire = &methods[1];
        assert!(fire.is_oneway());
        assert_eq!(fire.exceptions, vec![BASE_EXCEPTION]);

        assert!(registry.exception_fields("ns.Opaque").unwrap().is_empty());
        assert!(matches!(
            registry.exception_fields("ns.Missing"),
            Err(MetadataError::Unavailable(_))
        ));
    }

    #[test]
    fn test_enclosing_service() {
        let registry =
            MetadataRegistry::from_yaml("namespace: ns\nservices:\n  Svc: {}\n").unwrap();
        assert_eq!(registry.enclosing_service("ns.Svc$AsyncIface").unwrap(), "ns.Svc");
        assert_eq!(registry.enclosing_service("ns.Svc").unwrap(), "ns.Svc");
        assert!(registry.enclosing_service("ns.Other$Iface").is_err());
    }

    #[test]
    fn test_inline_docs_are_exported() {
        let yaml = r#"
namespace: ns
services:
  Svc:
    doc: The service.
    methods:
      - name: get
        doc: Gets.
        params:
          - { name: id, type: i64, doc: The id. }
structs:
  S:
    doc: A struct.
    fields:
      - { name: f, type: i32, doc: A field. }
docstrings:
  ns.S: Overridden.
"#;
        let docs = MetadataRegistry::from_yaml(yaml).unwrap().doc_strings();
        assert_eq!(docs["ns.Svc"], "The service.");
        assert_eq!(docs["ns.Svc.get"], "Gets.");
        assert_eq!(docs["ns.Svc.get.id"], "The id.");
        assert_eq!(docs["ns.S.f"], "A field.");
        assert_eq!(docs["ns.S"], "Overridden.");
    }

    #[test]
    fn test_validation_errors() {
        let undefined = "structs:\n  S:\n    fields:\n      - { name: f, type: Missing }\n";
        assert!(matches!(
            MetadataRegistry::from_yaml(undefined),
            Err(ParseError::UndefinedType { .. })
        ));

        let cycle = "typedefs:\n  A: B\n  B: A\n";
        assert!(matches!(
            MetadataRegistry::from_yaml(cycle),
            Err(ParseError::TypedefCycle(_))
        ));

        let oneway = r#"
services:
  Svc:
    methods:
      - { name: m, returns: i32, oneway: true }
"#;
        assert!(matches!(
            MetadataRegistry::from_yaml(oneway),
            Err(ParseError::InvalidMethod { .. })
        ));

        let not_exception = r#"
structs:
  S: {}
services:
  Svc:
    methods:
      - name: m
        throws:
          - { name: e, type: S }
"#;
        assert!(matches!(
            MetadataRegistry::from_yaml(not_exception),
            Err(ParseError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn test_merge_rejects_duplicates() {
        let a = super::super::from_yaml("namespace: ns\nstructs:\n  S: {}\n").unwrap();
        let b =
            super::super::from_yaml("namespace: ns\nenums:\n  S: { constants: [A] }\n").unwrap();
        assert!(matches!(
            MetadataRegistry::build([a, b]),
            Err(ParseError::DuplicateDefinition(name)) if name == "ns.S"
        ));
    }

    #[test]
    fn test_merge_is_atomic() {
        let mut registry =
            MetadataRegistry::from_yaml("namespace: ns\nstructs:\n  S: {}\n").unwrap();
        let dangling = super::super::from_yaml(
            "namespace: ns\nstructs:\n  T:\n    fields:\n      - { name: u, type: U }\n",
        )
        .unwrap();
        assert!(matches!(
            registry.merge(dangling),
            Err(ParseError::UndefinedType { .. })
        ));
        assert_eq!(registry.type_count(), 1);

        let more =
            super::super::from_yaml("namespace: ns\nenums:\n  E: { constants: [A] }\n").unwrap();
        registry.merge(more).unwrap();
        assert_eq!(registry.enum_constants("ns.E").unwrap(), vec!["A"]);
    }

    #[test]
    fn test_merge_allows_cross_file_references() {
        let a = super::super::from_yaml(
            "namespace: a\nstructs:\n  S:\n    fields:\n      - { name: t, type: b.T }\n",
        )
        .unwrap();
        let b = super::super::from_yaml("namespace: b\nstructs:\n  T: {}\n").unwrap();
        let registry = MetadataRegistry::build([a, b]).unwrap();
        assert_eq!(registry.type_count(), 2);
        assert_eq!(
            registry.struct_fields("a.S").unwrap()[0].value,
            ValueDescriptor::Struct("b.T".to_string())
        );
    }
}
