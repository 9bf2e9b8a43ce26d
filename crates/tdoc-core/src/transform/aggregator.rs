use std::collections::BTreeSet;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::error::GenerateError;
use crate::metadata::MetadataProvider;
use crate::model::{EndpointInfo, ExampleHeaders, SerializationFormat, ServiceSpecification};
use crate::sample::{SampleEncoder, SampleRequests, Samples};

use super::class_collector::ClassSet;
use super::function_builder::build_service;
use super::type_resolver::DEFAULT_MAX_DEPTH;

/// Knobs for a generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Abort on the first failing service instead of recording it and moving on.
    pub fail_fast: bool,
    pub max_depth: usize,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            fail_fast: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// How a binding is routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMapping {
    Exact(String),
    /// Prefix routes have no single path to document and produce no endpoint.
    Prefix(String),
}

impl PathMapping {
    pub fn exact_path(&self) -> Option<&str> {
        match self {
            PathMapping::Exact(path) => Some(path),
            PathMapping::Prefix(_) => None,
        }
    }
}

/// One registered Thrift endpoint and the interfaces it serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceBinding {
    pub host_pattern: String,
    pub path: PathMapping,
    pub default_format: SerializationFormat,
    pub allowed_formats: BTreeSet<SerializationFormat>,
    /// Multiplexed service name (empty for the default entry) to the interfaces it implements.
    pub entries: IndexMap<String, Vec<String>>,
}

/// Everything a run needs besides the metadata itself.
#[derive(Debug, Clone, Default)]
pub struct GenerateInput {
    pub bindings: Vec<ServiceBinding>,
    /// Example header sets keyed by qualified service name.
    pub example_headers: IndexMap<String, Vec<ExampleHeaders>>,
    pub sample_requests: SampleRequests,
}

/// Endpoints and example headers gathered for one service across all bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceEntry {
    pub service: String,
    pub endpoints: Vec<EndpointInfo>,
    pub example_headers: Vec<ExampleHeaders>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFailure {
    pub service: String,
    pub error: GenerateError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOutcome {
    pub specification: ServiceSpecification,
    /// Services left out of the specification, in the order they failed.
    pub failures: Vec<ServiceFailure>,
}

/// Fold bindings into one entry per service, in first-registration order.
///
/// Each (binding, interface) pair contributes an endpoint when the binding has an exact
/// path, and appends the service's configured example headers. Interfaces the provider
/// cannot place are reported as failures keyed by the interface name.
pub fn group_bindings<P: MetadataProvider + ?Sized>(
    provider: &P,
    bindings: &[ServiceBinding],
    example_headers: &IndexMap<String, Vec<ExampleHeaders>>,
) -> (Vec<ServiceEntry>, Vec<ServiceFailure>) {
    let mut entries: IndexMap<String, ServiceEntry> = IndexMap::new();
    let mut failures = Vec::new();

    for binding in bindings {
        for (service_name, interfaces) in &binding.entries {
            for interface in interfaces {
                let service = match provider.enclosing_service(interface) {
                    Ok(service) => service,
                    Err(err) => {
                        failures.push(ServiceFailure {
                            service: interface.clone(),
                            error: err.into(),
                        });
                        continue;
                    }
                };

                let entry = entries
                    .entry(service.clone())
                    .or_insert_with(|| ServiceEntry {
                        service: service.clone(),
                        ..ServiceEntry::default()
                    });

                if let Some(path) = binding.path.exact_path() {
                    entry.endpoints.push(EndpointInfo {
                        host_pattern: binding.host_pattern.clone(),
                        path: path.to_string(),
                        service_name: service_name.clone(),
                        default_format: binding.default_format,
                        allowed_formats: binding.allowed_formats.clone(),
                    });
                }

                if let Some(headers) = example_headers.get(&service) {
                    entry.example_headers.extend(headers.iter().cloned());
                }
            }
        }
    }

    (entries.into_values().collect(), failures)
}

/// Build the full specification for every service reachable from `input.bindings`.
///
/// Services that fail are skipped and reported in `GenerateOutcome::failures` unless
/// `options.fail_fast` is set. Conflicting class definitions across services always abort.
pub fn generate<P: MetadataProvider + ?Sized>(
    provider: &P,
    input: &GenerateInput,
    encoder: Option<&dyn SampleEncoder>,
    options: &GenerateOptions,
) -> Result<GenerateOutcome, GenerateError> {
    // Phase 1: Group bindings by service
    let (entries, mut failures) =
        group_bindings(provider, &input.bindings, &input.example_headers);
    if options.fail_fast {
        if let Some(failure) = failures.first() {
            return Err(failure.error.clone());
        }
    }
    for failure in &failures {
        warn!("Skipping {}: {}", failure.service, failure.error);
    }

    // Phase 2: Build each service and union their classes
    let samples = Samples::new(&input.sample_requests, encoder);
    let (specification, service_failures) =
        generate_entries(provider, entries, &samples, options)?;
    failures.extend(service_failures);

    info!(
        "Generated specification: {} services, {} classes, {} failures",
        specification.services.len(),
        specification.classes.len(),
        failures.len()
    );

    Ok(GenerateOutcome {
        specification,
        failures,
    })
}

/// Build every grouped service in isolation, then union their classes.
pub fn generate_entries<P: MetadataProvider + ?Sized>(
    provider: &P,
    entries: Vec<ServiceEntry>,
    samples: &Samples<'_>,
    options: &GenerateOptions,
) -> Result<(ServiceSpecification, Vec<ServiceFailure>), GenerateError> {
    let mut failures = Vec::new();
    let mut services = IndexMap::with_capacity(entries.len());
    for entry in entries {
        let service = entry.service;
        match build_service(
            provider,
            &service,
            entry.endpoints,
            entry.example_headers,
            samples,
            options,
        ) {
            Ok(info) => {
                services.insert(service, info);
            }
            Err(error) if options.fail_fast => return Err(error),
            Err(error) => {
                warn!("Skipping service {service}: {error}");
                failures.push(ServiceFailure { service, error });
            }
        }
    }
    services.sort_keys();

    let mut classes = ClassSet::new();
    for service in services.values() {
        classes.merge(&service.classes)?;
    }
    debug!("Services: {:?}", services.keys().collect::<Vec<_>>());

    Ok((
        ServiceSpecification {
            services,
            classes: classes.into_sorted(),
        },
        failures,
    ))
}
