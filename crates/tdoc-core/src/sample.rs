use indexmap::IndexMap;
use serde_json::Value;

use crate::error::SampleEncodingError;
use crate::metadata::MethodDescriptor;
use crate::model::{FieldInfo, TypeInfo};

/// Example request values keyed by the argument type name of the method they belong to.
pub type SampleRequests = IndexMap<String, Value>;

/// Turns an example request into the text shown next to a function in the docs.
pub trait SampleEncoder {
    fn encode(
        &self,
        function: &str,
        parameters: &[FieldInfo],
        value: &Value,
    ) -> Result<String, SampleEncodingError>;
}

/// Encodes samples as compact JSON after checking them against the declared parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSampleEncoder;

impl SampleEncoder for JsonSampleEncoder {
    fn encode(
        &self,
        function: &str,
        parameters: &[FieldInfo],
        value: &Value,
    ) -> Result<String, SampleEncodingError> {
        let fail = |reason: String| SampleEncodingError {
            function: function.to_string(),
            reason,
        };

        let object = value
            .as_object()
            .ok_or_else(|| fail("sample request must be an object".to_string()))?;
        for (name, arg) in object {
            let param = parameters
                .iter()
                .find(|p| &p.name == name)
                .ok_or_else(|| fail(format!("unknown parameter '{name}'")))?;
            if !conforms(&param.type_info, arg) {
                return Err(fail(format!(
                    "parameter '{name}' does not match {}",
                    param.type_info.signature()
                )));
            }
        }
        serde_json::to_string(value).map_err(|e| fail(e.to_string()))
    }
}

fn conforms(ty: &TypeInfo, value: &Value) -> bool {
    match ty {
        TypeInfo::Void => value.is_null(),
        TypeInfo::Bool => value.is_boolean(),
        TypeInfo::I8 => fits(value, |v| i8::try_from(v).is_ok()),
        TypeInfo::I16 => fits(value, |v| i16::try_from(v).is_ok()),
        TypeInfo::I32 => fits(value, |v| i32::try_from(v).is_ok()),
        TypeInfo::I64 => value.is_i64(),
        TypeInfo::Double => value.is_number(),
        TypeInfo::String | TypeInfo::Binary => value.is_string(),
        TypeInfo::Enum(e) => match value {
            Value::String(s) => e.constants.contains(s),
            other => other.is_i64(),
        },
        TypeInfo::Struct(s) => fields_conform(&s.fields, value),
        TypeInfo::Exception(e) => fields_conform(&e.fields, value),
        TypeInfo::List { element } | TypeInfo::Set { element } => value
            .as_array()
            .is_some_and(|items| items.iter().all(|item| conforms(element, item))),
        TypeInfo::Map { key, value: inner } => value.as_object().is_some_and(|entries| {
            entries
                .iter()
                .all(|(k, v)| key_conforms(key, k) && conforms(inner, v))
        }),
        TypeInfo::Unresolved(_) => true,
    }
}

/// JSON object keys are strings, so non-string map keys are checked by their text.
fn key_conforms(ty: &TypeInfo, key: &str) -> bool {
    match ty {
        TypeInfo::String | TypeInfo::Binary | TypeInfo::Unresolved(_) => true,
        TypeInfo::Bool => matches!(key, "true" | "false"),
        TypeInfo::Enum(e) => e.constants.iter().any(|c| c == key) || key.parse::<i64>().is_ok(),
        _ => serde_json::from_str::<Value>(key).is_ok_and(|parsed| conforms(ty, &parsed)),
    }
}

fn fits(value: &Value, check: impl Fn(i64) -> bool) -> bool {
    value.as_i64().is_some_and(check)
}

fn fields_conform(fields: &[FieldInfo], value: &Value) -> bool {
    value.as_object().is_some_and(|object| {
        object.iter().all(|(name, v)| {
            fields
                .iter()
                .find(|f| &f.name == name)
                .is_some_and(|f| conforms(&f.type_info, v))
        })
    })
}

/// Sample requests paired with the encoder that renders them.
#[derive(Clone, Copy, Default)]
pub struct Samples<'a> {
    requests: Option<&'a SampleRequests>,
    encoder: Option<&'a dyn SampleEncoder>,
}

impl<'a> Samples<'a> {
    pub fn new(requests: &'a SampleRequests, encoder: Option<&'a dyn SampleEncoder>) -> Self {
        Self {
            requests: Some(requests),
            encoder,
        }
    }

    /// Encoded sample for `method`, or an empty string when none is available.
    pub fn encode(
        &self,
        method: &MethodDescriptor,
        function: &str,
        parameters: &[FieldInfo],
    ) -> Result<String, SampleEncodingError> {
        let sample = self.requests.and_then(|r| r.get(&method.args_type));
        match (sample, self.encoder) {
            (Some(value), Some(encoder)) => encoder.encode(function, parameters, value),
            _ => Ok(String::new()),
        }
    }
}
