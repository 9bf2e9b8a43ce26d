use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{ExampleHeaders, SerializationFormat};
use crate::sample::SampleRequests;
use crate::transform::{
    DEFAULT_MAX_DEPTH, GenerateInput, GenerateOptions, PathMapping, ServiceBinding,
};

/// Top-level project configuration loaded from `.tdoc.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TdocConfig {
    /// Registry files, merged in order.
    pub registries: Vec<String>,
    pub output: OutputConfig,
    pub generation: GenerationConfig,
    pub bindings: Vec<BindingConfig>,
    /// Example header sets keyed by qualified service name.
    pub example_headers: IndexMap<String, Vec<ExampleHeaders>>,
    /// Example requests keyed by argument type (`pkg.Service.method_args`).
    pub sample_requests: SampleRequests,
}

impl Default for TdocConfig {
    fn default() -> Self {
        Self {
            registries: vec!["thrift-metadata.yaml".to_string()],
            output: OutputConfig::default(),
            generation: GenerationConfig::default(),
            bindings: Vec::new(),
            example_headers: IndexMap::new(),
            sample_requests: SampleRequests::new(),
        }
    }
}

impl TdocConfig {
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            fail_fast: self.generation.fail_fast,
            max_depth: self.generation.max_depth,
        }
    }

    pub fn generate_input(&self) -> Result<GenerateInput, ConfigError> {
        Ok(GenerateInput {
            bindings: self
                .bindings
                .iter()
                .map(BindingConfig::to_binding)
                .collect::<Result<_, _>>()?,
            example_headers: self.example_headers.clone(),
            sample_requests: self.sample_requests.clone(),
        })
    }
}

/// Where and how the specification is written.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination file; stdout when unset.
    pub path: Option<String>,
    pub format: OutputFormat,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: OutputFormat::Json,
            pretty: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub fail_fast: bool,
    pub max_depth: usize,
    /// Render `sample_requests` into each function's sample field.
    pub encode_samples: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_depth: DEFAULT_MAX_DEPTH,
            encode_samples: true,
        }
    }
}

/// One Thrift endpoint. Exactly one of `path` and `prefix` must be set.
#[derive(Debug, Clone, Deserialize)]
pub struct BindingConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_format")]
    pub default_format: SerializationFormat,
    /// All formats when unset.
    #[serde(default)]
    pub allowed_formats: Option<Vec<SerializationFormat>>,
    /// Multiplexed service name (`""` for the default) to interface references.
    pub services: IndexMap<String, Vec<String>>,
}

fn default_host() -> String {
    "*".to_string()
}

fn default_format() -> SerializationFormat {
    SerializationFormat::Binary
}

impl BindingConfig {
    pub fn to_binding(&self) -> Result<ServiceBinding, ConfigError> {
        let path = match (&self.path, &self.prefix) {
            (Some(path), None) => PathMapping::Exact(path.clone()),
            (None, Some(prefix)) => PathMapping::Prefix(prefix.clone()),
            (Some(path), Some(_)) => return Err(self.invalid(path, "both path and prefix set")),
            (None, None) => {
                return Err(self.invalid("<unset>", "one of path or prefix is required"));
            }
        };

        let mut allowed_formats: BTreeSet<SerializationFormat> = match &self.allowed_formats {
            Some(formats) => formats.iter().copied().collect(),
            None => SerializationFormat::all(),
        };
        allowed_formats.insert(self.default_format);

        Ok(ServiceBinding {
            host_pattern: self.host.clone(),
            path,
            default_format: self.default_format,
            allowed_formats,
            entries: self.services.clone(),
        })
    }

    fn invalid(&self, path: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidBinding {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".tdoc.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<TdocConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: TdocConfig =
        serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# tdoc configuration
registries:
  - thrift-metadata.yaml

output:
  # path: thrift-spec.json   # stdout when unset
  format: json               # json | yaml
  pretty: true

generation:
  fail_fast: false           # abort on the first failing service
  max_depth: 64              # type nesting limit
  encode_samples: true

bindings: []
  # - path: /thrift/hello
  #   host: "*"
  #   default_format: tbinary           # tbinary | tcompact | tjson | ttext
  #   allowed_formats: [tbinary, tjson]
  #   services:
  #     "": [com.example.HelloService$AsyncIface]

example_headers: {}
  # com.example.HelloService:
  #   - { authorization: "bearer token" }

sample_requests: {}
  # com.example.HelloService.hello_args: { name: world }
"#
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = TdocConfig::default();
        assert_eq!(config.registries, vec!["thrift-metadata.yaml"]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.path.is_none());
        assert!(!config.generation.fail_fast);
        assert_eq!(config.generation.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.bindings.is_empty());
    }

    #[test]
    fn test_default_content_parses() {
        let config: TdocConfig = serde_yaml_ng::from_str(default_config_content()).unwrap();
        assert_eq!(config.registries, vec!["thrift-metadata.yaml"]);
        assert!(config.generate_input().unwrap().bindings.is_empty());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
registries: [a.yaml, b.yaml]
output:
  path: out/spec.yaml
  format: yaml
generation:
  fail_fast: true
  max_depth: 16
bindings:
  - path: /hello
    default_format: tjson
    allowed_formats: [tbinary]
    services:
      "": [demo.HelloService$AsyncIface]
      extra: [demo.ExtraService]
  - prefix: /any
    host: api.example.com
    services:
      "": [demo.HelloService]
example_headers:
  demo.HelloService:
    - { x-trace: "1" }
sample_requests:
  demo.HelloService.hello_args: { name: world }
"#;
        let config: TdocConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.registries.len(), 2);
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert_eq!(config.output.path.as_deref(), Some("out/spec.yaml"));
        assert!(config.generate_options().fail_fast);
        assert_eq!(config.generate_options().max_depth, 16);

        let input = config.generate_input().unwrap();
        let hello = &input.bindings[0];
        assert_eq!(hello.path, PathMapping::Exact("/hello".to_string()));
        assert_eq!(hello.host_pattern, "*");
        assert_eq!(hello.default_format, SerializationFormat::Json);
        assert_eq!(
            hello.allowed_formats,
            BTreeSet::from([SerializationFormat::Binary, SerializationFormat::Json])
        );
        assert_eq!(hello.entries["extra"], vec!["demo.ExtraService"]);

        let any = &input.bindings[1];
        assert_eq!(any.path, PathMapping::Prefix("/any".to_string()));
        assert_eq!(any.allowed_formats, SerializationFormat::all());

        assert_eq!(input.example_headers["demo.HelloService"][0]["x-trace"], "1");
        assert_eq!(
            input.sample_requests["demo.HelloService.hello_args"],
            serde_json::json!({"name": "world"})
        );
    }

    #[test]
    fn test_binding_requires_one_path() {
        let yaml = "bindings:\n  - services: {\"\": [a.B]}\n";
        let config: TdocConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(matches!(
            config.generate_input(),
            Err(ConfigError::InvalidBinding { .. })
        ));

        let yaml = "bindings:\n  - { path: /a, prefix: /b, services: {} }\n";
        let config: TdocConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert!(config.generate_input().is_err());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(load_config(&path).unwrap().is_none());

        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "registries: [services.yaml]").unwrap();
        let config = load_config(&path).unwrap().unwrap();
        assert_eq!(config.registries, vec!["services.yaml"]);

        fs::write(&path, "registries: {").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }
}
