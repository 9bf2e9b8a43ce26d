use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use log::info;

use tdoc_core::config::{self, CONFIG_FILE_NAME, OutputFormat, TdocConfig};
use tdoc_core::metadata::{self, MetadataProvider, MetadataRegistry};
use tdoc_core::model::{SerializationFormat, ServiceSpecification};
use tdoc_core::sample::{JsonSampleEncoder, SampleEncoder, Samples};
use tdoc_core::transform;

#[derive(Parser)]
#[command(name = "tdoc", about = "Thrift service specification generator", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the service specification described by the config file
    Generate {
        /// Path to the config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file (overrides the config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (overrides the config)
        #[arg(long)]
        format: Option<FormatArg>,
    },

    /// Validate one or more metadata registry files
    Validate {
        /// Registry files (YAML or JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Print a summary of the services in metadata registry files
    Inspect {
        /// Registry files (YAML or JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: FormatArg,
    },

    /// Initialize a new tdoc configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            config,
            output,
            format,
        } => cmd_generate(config, output, format),

        Commands::Validate { inputs } => cmd_validate(&inputs),

        Commands::Inspect { inputs, format } => cmd_inspect(&inputs, format),

        Commands::Init { force } => cmd_init(force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "tdoc", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Load the config file, falling back to defaults when it doesn't exist.
fn load_config(path: Option<PathBuf>) -> Result<TdocConfig> {
    let explicit = path.is_some();
    let path = path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    match config::load_config(&path)? {
        Some(cfg) => Ok(cfg),
        None if explicit => anyhow::bail!("config file {} not found", path.display()),
        None => Ok(TdocConfig::default()),
    }
}

/// Read and merge registry files into one provider.
fn load_registry(paths: &[PathBuf]) -> Result<MetadataRegistry> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("yaml");
        let file = match ext {
            "json" => metadata::from_json(&content),
            _ => metadata::from_yaml(&content),
        }
        .with_context(|| format!("failed to parse {}", path.display()))?;
        files.push(file);
    }
    let registry = MetadataRegistry::build(files).context("invalid metadata registry")?;
    Ok(registry)
}

fn render(spec: &ServiceSpecification, format: OutputFormat, pretty: bool) -> Result<String> {
    let text = match format {
        OutputFormat::Yaml => serde_yaml_ng::to_string(spec)?,
        OutputFormat::Json if pretty => serde_json::to_string_pretty(spec)? + "\n",
        OutputFormat::Json => serde_json::to_string(spec)? + "\n",
    };
    Ok(text)
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

fn cmd_generate(
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    format: Option<FormatArg>,
) -> Result<()> {
    let cfg = load_config(config)?;
    let registries: Vec<PathBuf> = cfg.registries.iter().map(PathBuf::from).collect();
    let registry = load_registry(&registries)?;

    if cfg.bindings.is_empty() {
        eprintln!("No bindings configured. Add a `bindings` section to your config.");
        return Ok(());
    }

    let input = cfg.generate_input()?;
    let json_encoder = JsonSampleEncoder;
    let encoder = cfg
        .generation
        .encode_samples
        .then_some(&json_encoder as &dyn SampleEncoder);
    let outcome = transform::generate(&registry, &input, encoder, &cfg.generate_options())?;

    for failure in &outcome.failures {
        eprintln!("  skipped {}: {}", failure.service, failure.error);
    }

    let format = format.map(OutputFormat::from).unwrap_or(cfg.output.format);
    let content = render(&outcome.specification, format, cfg.output.pretty)?;
    let output = output.or_else(|| cfg.output.path.as_ref().map(PathBuf::from));
    match output {
        Some(path) => {
            write_output(&path, &content)?;
            eprintln!(
                "Generated {} services, {} classes → {}",
                outcome.specification.services.len(),
                outcome.specification.classes.len(),
                path.display()
            );
        }
        None => print!("{content}"),
    }

    if !outcome.failures.is_empty() {
        eprintln!("{} services could not be documented.", outcome.failures.len());
    }
    Ok(())
}

fn cmd_validate(inputs: &[PathBuf]) -> Result<()> {
    let registry = load_registry(inputs)?;

    let services: Vec<&str> = registry.service_names().collect();
    eprintln!("Valid metadata registry");
    eprintln!("  Files: {}", inputs.len());
    eprintln!("  Services: {}", services.len());
    eprintln!("  Types: {}", registry.type_count());

    // Also resolve every service so provider errors surface here
    let input = transform::GenerateInput {
        bindings: vec![transform::ServiceBinding {
            host_pattern: "*".to_string(),
            path: transform::PathMapping::Prefix("/".to_string()),
            default_format: SerializationFormat::Binary,
            allowed_formats: SerializationFormat::all(),
            entries: [(
                String::new(),
                services.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
            )]
            .into_iter()
            .collect(),
        }],
        ..Default::default()
    };
    let options = transform::GenerateOptions {
        fail_fast: true,
        ..Default::default()
    };
    let outcome = transform::generate(&registry, &input, None, &options)?;
    info!("resolved {} classes", outcome.specification.classes.len());
    eprintln!("  Classes: {}", outcome.specification.classes.len());

    eprintln!("Validation successful.");
    Ok(())
}

fn cmd_inspect(inputs: &[PathBuf], format: FormatArg) -> Result<()> {
    let registry = load_registry(inputs)?;
    let summary = build_inspect_summary(&registry)?;

    match format {
        FormatArg::Yaml => {
            let yaml = serde_yaml_ng::to_string(&summary)?;
            print!("{}", yaml);
        }
        FormatArg::Json => {
            let json = serde_json::to_string_pretty(&summary)?;
            println!("{}", json);
        }
    }

    Ok(())
}

fn build_inspect_summary(registry: &MetadataRegistry) -> Result<serde_json::Value> {
    let doc_strings = registry.doc_strings();
    let resolver = transform::TypeResolver::new(registry, &doc_strings);

    let mut services = Vec::new();
    for service in registry.service_names() {
        let mut functions = Vec::new();
        for method in registry.list_methods(service)? {
            let function =
                transform::build_function(&resolver, &method, service, &Samples::default())?;
            let params: Vec<String> = function
                .parameters
                .iter()
                .map(|p| format!("{}: {}", p.name, p.type_info.signature()))
                .collect();
            functions.push(serde_json::json!({
                "name": function.name,
                "params": params,
                "returns": function.return_type_info.signature(),
                "oneway": method.is_oneway(),
                "throws": function.exceptions.iter().map(|e| &e.name).collect::<Vec<_>>(),
            }));
        }
        services.push(serde_json::json!({
            "name": service,
            "functions": functions,
        }));
    }

    Ok(serde_json::json!({
        "services": services,
        "types": registry.type_count(),
    }))
}

fn cmd_init(force: bool) -> Result<()> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
