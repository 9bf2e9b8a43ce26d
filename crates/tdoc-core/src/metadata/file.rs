use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::FieldRequirement;

/// Registry format version understood by this crate.
pub const REGISTRY_VERSION: u32 = 1;

/// On-disk description of one Thrift namespace, as written by hand or by an IDL dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryFile {
    pub version: u32,

    /// Prefix applied to every bare (dot-free) name in this file.
    pub namespace: String,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub services: IndexMap<String, ServiceDef>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub structs: IndexMap<String, StructDef>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub unions: IndexMap<String, StructDef>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub enums: IndexMap<String, EnumDef>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub exceptions: IndexMap<String, ExceptionDef>,

    /// Alias name to aliased type expression.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub typedefs: IndexMap<String, String>,

    /// Extra doc strings keyed exactly as they will be looked up.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub docstrings: IndexMap<String, String>,
}

impl Default for RegistryFile {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            namespace: String::new(),
            services: IndexMap::new(),
            structs: IndexMap::new(),
            unions: IndexMap::new(),
            enums: IndexMap::new(),
            exceptions: IndexMap::new(),
            typedefs: IndexMap::new(),
            docstrings: IndexMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<FieldDef>,

    /// Return type expression; absent means `void`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub throws: Vec<FieldDef>,

    #[serde(default)]
    pub oneway: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,

    #[serde(rename = "type")]
    pub type_expr: String,

    #[serde(default)]
    pub requirement: FieldRequirement,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnumDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default)]
    pub constants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExceptionDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    /// `None` when the exception carries no field metadata at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<FieldDef>>,
}
