use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::GenerateError;
use crate::metadata::{BASE_EXCEPTION, MetadataProvider, MethodDescriptor, doc_key};
use crate::model::{EndpointInfo, ExampleHeaders, FunctionInfo, ServiceInfo, TypeInfo};
use crate::sample::Samples;

use super::aggregator::GenerateOptions;
use super::class_collector::ClassSet;
use super::type_resolver::TypeResolver;

/// Build one function of the service `namespace`.
///
/// Parameter docs are looked up at `namespace.method.param`. Methods without a success
/// result (void or oneway) return `TypeInfo::Void`. The implicit base exception is dropped.
pub fn build_function<P: MetadataProvider + ?Sized>(
    resolver: &TypeResolver<'_, P>,
    method: &MethodDescriptor,
    namespace: &str,
    samples: &Samples<'_>,
) -> Result<FunctionInfo, GenerateError> {
    let function_key = doc_key(namespace, &method.name);

    let parameters = method
        .parameters
        .iter()
        .map(|p| resolver.resolve_field(p, &function_key))
        .collect::<Result<Vec<_>, _>>()?;

    let return_type_info = match method.success_field() {
        Some(success) => resolver.resolve(&success.value)?,
        None => TypeInfo::Void,
    };

    let exceptions = method
        .exceptions
        .iter()
        .filter(|name| name.as_str() != BASE_EXCEPTION)
        .map(|name| resolver.resolve_exception(name))
        .collect::<Result<Vec<_>, _>>()?;

    let sample_request = samples.encode(method, &function_key, &parameters)?;

    Ok(FunctionInfo {
        name: method.name.clone(),
        return_type_info,
        parameters,
        exceptions,
        sample_request,
        doc_string: resolver.doc(&function_key),
    })
}

/// Build a service with its functions, reachable classes and sorted endpoints.
pub fn build_service<P: MetadataProvider + ?Sized>(
    provider: &P,
    service: &str,
    mut endpoints: Vec<EndpointInfo>,
    example_headers: Vec<ExampleHeaders>,
    samples: &Samples<'_>,
    options: &GenerateOptions,
) -> Result<ServiceInfo, GenerateError> {
    let doc_strings = provider.doc_strings();
    let resolver = TypeResolver::new(provider, &doc_strings).with_max_depth(options.max_depth);

    let methods = provider.list_methods(service)?;
    let mut functions = IndexMap::with_capacity(methods.len());
    let mut classes = ClassSet::new();
    for method in &methods {
        let function = build_function(&resolver, method, service, samples)?;
        classes.collect_function(&function)?;
        if functions.insert(function.name.clone(), function).is_some() {
            warn!("Service {service} declares method {} more than once", method.name);
        }
    }

    endpoints.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    debug!(
        "Built service {service}: {} functions, {} classes, {} endpoints",
        functions.len(),
        classes.len(),
        endpoints.len()
    );

    Ok(ServiceInfo {
        name: service.to_string(),
        functions,
        classes: classes.into_sorted(),
        endpoints,
        doc_string: resolver.doc(service),
        example_headers,
    })
}
