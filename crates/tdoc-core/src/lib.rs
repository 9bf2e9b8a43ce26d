pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod sample;
pub mod transform;

pub use error::{ConfigError, GenerateError, MetadataError, ParseError};
pub use metadata::{MetadataProvider, MetadataRegistry};
pub use model::ServiceSpecification;
pub use sample::{JsonSampleEncoder, SampleEncoder};
pub use transform::{GenerateInput, GenerateOptions, GenerateOutcome, generate};
