use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported registry version: {0}")]
    UnsupportedVersion(u32),

    #[error("invalid type expression '{expr}': {reason}")]
    InvalidTypeExpr { expr: String, reason: String },

    #[error("undefined type '{name}' referenced from {context}")]
    UndefinedType { name: String, context: String },

    #[error("invalid method {method}: {reason}")]
    InvalidMethod { method: String, reason: String },

    #[error("duplicate definition: {0}")]
    DuplicateDefinition(String),

    #[error("typedef cycle through: {0}")]
    TypedefCycle(String),
}

/// Failures reported by a `MetadataProvider`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("no metadata available for {0}")]
    Unavailable(String),

    #[error("malformed descriptor in {context}: {reason}")]
    Malformed { context: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot encode sample for {function}: {reason}")]
pub struct SampleEncodingError {
    pub function: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("malformed descriptor in {context}: {reason}")]
    MalformedDescriptor { context: String, reason: String },

    #[error("conflicting definitions for {0}")]
    DuplicateQualifiedName(String),

    #[error("sample encoding failed: {0}")]
    SampleEncoding(#[from] SampleEncodingError),
}

impl From<MetadataError> for GenerateError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::Unavailable(name) => GenerateError::MetadataUnavailable(name),
            MetadataError::Malformed { context, reason } => {
                GenerateError::MalformedDescriptor { context, reason }
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml_ng::Error,
    },

    #[error("invalid binding for {path}: {reason}")]
    InvalidBinding { path: String, reason: String },
}
