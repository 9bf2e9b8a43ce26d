use indexmap::IndexMap;

use crate::error::GenerateError;
use crate::model::{ClassInfo, ExceptionInfo, FieldInfo, FunctionInfo, TypeInfo};

/// Named classes reachable from a set of types, deduplicated by qualified name.
///
/// A class is recorded after everything its fields reference. Placeholders are never
/// recorded. Two structurally different classes under one name are a conflict.
#[derive(Debug, Default)]
pub struct ClassSet {
    classes: IndexMap<String, ClassInfo>,
}

impl ClassSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn collect(&mut self, type_info: &TypeInfo) -> Result<(), GenerateError> {
        match type_info {
            TypeInfo::Struct(s) => {
                self.collect_fields(&s.fields)?;
                self.insert(
                    &s.name,
                    |c| matches!(c, ClassInfo::Struct(existing) if existing == s),
                    || ClassInfo::Struct(s.clone()),
                )
            }
            TypeInfo::Exception(e) => self.collect_exception(e),
            TypeInfo::Enum(e) => self.insert(
                &e.name,
                |c| matches!(c, ClassInfo::Enum(existing) if existing == e),
                || ClassInfo::Enum(e.clone()),
            ),
            TypeInfo::List { element } | TypeInfo::Set { element } => self.collect(element),
            TypeInfo::Map { key, value } => {
                self.collect(key)?;
                self.collect(value)
            }
            _ => Ok(()),
        }
    }

    pub fn collect_exception(&mut self, exception: &ExceptionInfo) -> Result<(), GenerateError> {
        self.collect_fields(&exception.fields)?;
        self.insert(
            &exception.name,
            |c| matches!(c, ClassInfo::Exception(existing) if existing == exception),
            || ClassInfo::Exception(exception.clone()),
        )
    }

    /// Classes of a function: return type, then parameters, then declared exceptions.
    pub fn collect_function(&mut self, function: &FunctionInfo) -> Result<(), GenerateError> {
        self.collect(&function.return_type_info)?;
        self.collect_fields(&function.parameters)?;
        for exception in &function.exceptions {
            self.collect_exception(exception)?;
        }
        Ok(())
    }

    /// Union another class map into this one.
    pub fn merge(&mut self, classes: &IndexMap<String, ClassInfo>) -> Result<(), GenerateError> {
        for (name, class) in classes {
            self.insert(name, |c| c == class, || class.clone())?;
        }
        Ok(())
    }

    /// The collected classes ordered by qualified name.
    pub fn into_sorted(self) -> IndexMap<String, ClassInfo> {
        let mut classes = self.classes;
        classes.sort_keys();
        classes
    }

    fn collect_fields(&mut self, fields: &[FieldInfo]) -> Result<(), GenerateError> {
        for field in fields {
            self.collect(&field.type_info)?;
        }
        Ok(())
    }

    fn insert(
        &mut self,
        name: &str,
        same: impl FnOnce(&ClassInfo) -> bool,
        make: impl FnOnce() -> ClassInfo,
    ) -> Result<(), GenerateError> {
        match self.classes.get(name) {
            Some(existing) if same(existing) => Ok(()),
            Some(_) => Err(GenerateError::DuplicateQualifiedName(name.to_string())),
            None => {
                self.classes.insert(name.to_string(), make());
                Ok(())
            }
        }
    }
}
