use crate::model::FieldRequirement;

/// Qualified name of the catch-all exception every Thrift method implicitly declares.
pub const BASE_EXCEPTION: &str = "org.apache.thrift.TException";

/// Name of the result field that carries a method's return value.
pub const SUCCESS_FIELD: &str = "success";

/// Thrift wire type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TType {
    Stop,
    Void,
    Bool,
    Byte,
    Double,
    I16,
    I32,
    I64,
    String,
    Struct,
    Map,
    Set,
    List,
    Enum,
}

impl TType {
    pub fn from_code(code: u8) -> Option<TType> {
        Some(match code {
            0 => TType::Stop,
            1 => TType::Void,
            2 => TType::Bool,
            3 => TType::Byte,
            4 => TType::Double,
            6 => TType::I16,
            8 => TType::I32,
            10 => TType::I64,
            11 => TType::String,
            12 => TType::Struct,
            13 => TType::Map,
            14 => TType::Set,
            15 => TType::List,
            16 => TType::Enum,
            _ => return None,
        })
    }

    pub fn code(&self) -> u8 {
        match self {
            TType::Stop => 0,
            TType::Void => 1,
            TType::Bool => 2,
            TType::Byte => 3,
            TType::Double => 4,
            TType::I16 => 6,
            TType::I32 => 8,
            TType::I64 => 10,
            TType::String => 11,
            TType::Struct => 12,
            TType::Map => 13,
            TType::Set => 14,
            TType::List => 15,
            TType::Enum => 16,
        }
    }
}

/// The declared value type of a field, as reported by a metadata provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueDescriptor {
    Void,
    Bool,
    Byte,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    /// Inline reference to a struct or union definition.
    Struct(String),
    /// Inline reference to an exception used as a value.
    Exception(String),
    Enum(String),
    List(Box<ValueDescriptor>),
    Set(Box<ValueDescriptor>),
    Map(Box<ValueDescriptor>, Box<ValueDescriptor>),
    /// A named alias whose definition is not expanded by the resolver.
    Typedef { ttype: TType, name: String },
}

impl ValueDescriptor {
    pub fn ttype(&self) -> TType {
        match self {
            ValueDescriptor::Void => TType::Void,
            ValueDescriptor::Bool => TType::Bool,
            ValueDescriptor::Byte => TType::Byte,
            ValueDescriptor::I16 => TType::I16,
            ValueDescriptor::I32 => TType::I32,
            ValueDescriptor::I64 => TType::I64,
            ValueDescriptor::Double => TType::Double,
            ValueDescriptor::String | ValueDescriptor::Binary => TType::String,
            ValueDescriptor::Struct(_) | ValueDescriptor::Exception(_) => TType::Struct,
            ValueDescriptor::Enum(_) => TType::Enum,
            ValueDescriptor::List(_) => TType::List,
            ValueDescriptor::Set(_) => TType::Set,
            ValueDescriptor::Map(_, _) => TType::Map,
            ValueDescriptor::Typedef { ttype, .. } => *ttype,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub requirement: FieldRequirement,
    pub value: ValueDescriptor,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, value: ValueDescriptor) -> Self {
        Self {
            name: name.into(),
            requirement: FieldRequirement::Default,
            value,
        }
    }
}

/// One method of a service interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub name: String,
    /// Name of the argument struct; sample requests are keyed by it.
    pub args_type: String,
    pub parameters: Vec<FieldDescriptor>,
    /// Fields of the result struct. `None` for oneway methods.
    pub result_fields: Option<Vec<FieldDescriptor>>,
    /// Declared exception types in declaration order, possibly including `BASE_EXCEPTION`.
    pub exceptions: Vec<String>,
}

impl MethodDescriptor {
    pub fn success_field(&self) -> Option<&FieldDescriptor> {
        self.result_fields
            .as_ref()?
            .iter()
            .find(|f| f.name == SUCCESS_FIELD)
    }

    pub fn is_oneway(&self) -> bool {
        self.result_fields.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttype_codes() {
        for code in 0..=20u8 {
            if let Some(t) = TType::from_code(code) {
                assert_eq!(t.code(), code);
            }
        }
        assert_eq!(TType::from_code(5), None);
        assert_eq!(TType::from_code(16), Some(TType::Enum));
    }

    #[test]
    fn test_binary_shares_string_wire_type() {
        assert_eq!(ValueDescriptor::Binary.ttype(), TType::String);
        assert_ne!(ValueDescriptor::Binary, ValueDescriptor::String);
    }

    #[test]
    fn test_success_field() {
        let method = MethodDescriptor {
            name: "get".to_string(),
            args_type: "S.get_args".to_string(),
            parameters: vec![],
            result_fields: Some(vec![
                FieldDescriptor::new("success", ValueDescriptor::I64),
                FieldDescriptor::new("err", ValueDescriptor::Exception("E".to_string())),
            ]),
            exceptions: vec!["E".to_string()],
        };
        assert_eq!(method.success_field().map(|f| &f.value), Some(&ValueDescriptor::I64));
        assert!(!method.is_oneway());
    }
}
