pub mod aggregator;
pub mod class_collector;
pub mod function_builder;
pub mod type_resolver;

pub use aggregator::{
    GenerateInput, GenerateOptions, GenerateOutcome, PathMapping, ServiceBinding, ServiceEntry,
    ServiceFailure, generate, generate_entries, group_bindings,
};
pub use class_collector::ClassSet;
pub use function_builder::{build_function, build_service};
pub use type_resolver::{DEFAULT_MAX_DEPTH, TypeResolver};
