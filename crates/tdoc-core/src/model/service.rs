use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{ClassInfo, ExceptionInfo, FieldInfo, TypeInfo};

/// Thrift serialization format an endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SerializationFormat {
    #[serde(rename = "tbinary")]
    Binary,
    #[serde(rename = "tcompact")]
    Compact,
    #[serde(rename = "tjson")]
    Json,
    #[serde(rename = "ttext")]
    Text,
}

impl SerializationFormat {
    pub const ALL: [SerializationFormat; 4] = [
        SerializationFormat::Binary,
        SerializationFormat::Compact,
        SerializationFormat::Json,
        SerializationFormat::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SerializationFormat::Binary => "tbinary",
            SerializationFormat::Compact => "tcompact",
            SerializationFormat::Json => "tjson",
            SerializationFormat::Text => "ttext",
        }
    }

    pub fn all() -> BTreeSet<SerializationFormat> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for SerializationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One example header set, header name to value, in insertion order.
pub type ExampleHeaders = IndexMap<String, String>;

/// A network endpoint serving a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointInfo {
    pub host_pattern: String,
    pub path: String,
    /// Service name within a multiplexed endpoint; empty for the default entry.
    pub service_name: String,
    pub default_format: SerializationFormat,
    pub allowed_formats: BTreeSet<SerializationFormat>,
}

impl EndpointInfo {
    /// Display ordering key.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.path, &self.service_name)
    }
}

/// A resolved service method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub return_type_info: TypeInfo,
    pub parameters: Vec<FieldInfo>,
    pub exceptions: Vec<ExceptionInfo>,
    /// Encoded example request; empty when no sample was supplied.
    pub sample_request: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
}

/// A resolved service with everything reachable from its functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    pub name: String,
    pub functions: IndexMap<String, FunctionInfo>,
    pub classes: IndexMap<String, ClassInfo>,
    pub endpoints: Vec<EndpointInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<String>,
    pub example_headers: Vec<ExampleHeaders>,
}

/// The normalized output graph for every documented service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServiceSpecification {
    pub services: IndexMap<String, ServiceInfo>,
    pub classes: IndexMap<String, ClassInfo>,
}
