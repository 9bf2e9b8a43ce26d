pub mod descriptor;
pub mod file;
pub mod registry;
pub mod type_expr;

use indexmap::IndexMap;

use crate::error::{MetadataError, ParseError};
pub use descriptor::{
    BASE_EXCEPTION, FieldDescriptor, MethodDescriptor, SUCCESS_FIELD, TType, ValueDescriptor,
};
use file::{REGISTRY_VERSION, RegistryFile};
pub use registry::MetadataRegistry;

/// Doc strings keyed by `namespace + "." + member` or by a bare qualified type name.
pub type DocStrings = IndexMap<String, String>;

/// Build the doc-string lookup key for a member of `namespace`.
pub fn doc_key(namespace: &str, member: &str) -> String {
    if namespace.is_empty() {
        member.to_string()
    } else {
        format!("{namespace}.{member}")
    }
}

/// Strip the `$Iface` style suffix from an interface reference.
pub fn interface_service(interface: &str) -> &str {
    interface
        .split_once('$')
        .map_or(interface, |(service, _)| service)
}

/// Source of service, struct, enum and exception metadata.
///
/// Implementations must never describe an infinitely expanding type: a struct field whose
/// type closes a cycle back to an enclosing struct has to be reported as
/// `ValueDescriptor::Typedef` rather than as an inline `ValueDescriptor::Struct`.
/// The resolver performs no cycle detection of its own beyond a depth cap.
pub trait MetadataProvider {
    /// Map an interface reference (`pkg.Service$AsyncIface`) to its service's qualified name.
    fn enclosing_service(&self, interface: &str) -> Result<String, MetadataError> {
        Ok(interface_service(interface).to_string())
    }

    /// Methods of a service in declaration order.
    fn list_methods(&self, service: &str) -> Result<Vec<MethodDescriptor>, MetadataError>;

    fn struct_fields(&self, name: &str) -> Result<Vec<FieldDescriptor>, MetadataError>;

    fn enum_constants(&self, name: &str) -> Result<Vec<String>, MetadataError>;

    /// Fields of an exception; empty when the exception declares no metadata.
    fn exception_fields(&self, name: &str) -> Result<Vec<FieldDescriptor>, MetadataError>;

    fn doc_strings(&self) -> DocStrings {
        DocStrings::new()
    }
}

/// Parse a registry file from YAML.
pub fn from_yaml(input: &str) -> Result<RegistryFile, ParseError> {
    let file: RegistryFile = serde_yaml_ng::from_str(input)?;
    validate_version(&file)?;
    Ok(file)
}

/// Parse a registry file from JSON.
pub fn from_json(input: &str) -> Result<RegistryFile, ParseError> {
    let file: RegistryFile = serde_json::from_str(input)?;
    validate_version(&file)?;
    Ok(file)
}

fn validate_version(file: &RegistryFile) -> Result<(), ParseError> {
    if file.version != REGISTRY_VERSION {
        return Err(ParseError::UnsupportedVersion(file.version));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_key() {
        assert_eq!(doc_key("com.example.Foo", "bar"), "com.example.Foo.bar");
        assert_eq!(doc_key("", "Foo"), "Foo");
    }

    #[test]
    fn test_interface_service() {
        assert_eq!(interface_service("com.example.Foo$AsyncIface"), "com.example.Foo");
        assert_eq!(interface_service("com.example.Foo$Iface$Extra"), "com.example.Foo");
        assert_eq!(interface_service("com.example.Foo"), "com.example.Foo");
    }

    #[test]
    fn test_unsupported_version() {
        let err = from_yaml("version: 7\n").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_missing_version_defaults() {
        let file = from_json(r#"{"namespace": "ns"}"#).unwrap();
        assert_eq!(file.version, REGISTRY_VERSION);
        assert_eq!(file.namespace, "ns");
    }
}
