use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use fiche_core::config::{export_base_url_from_env_value, pathology_config_path_from_env_value};
use fiche_core::constants::{EXPORT_BASE_URL_ENV, PATHOLOGY_CONFIG_ENV};
use fiche_core::{
    CoreConfig, Layout, PathologyPanel, PathologyRegistry, PatientRecord, ProfileService,
};
use fiche_render::{ExportAdapter, InteractiveAdapter, MarkdownWriter, RenderAdapter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fiche")]
#[command(about = "Pathology profile display and export CLI")]
struct Cli {
    /// Generated pathology config file (overrides FICHE_PATHOLOGY_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Export base URL for media references (overrides FICHE_EXPORT_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured pathologies
    Pathologies,
    /// List the sections of a pathology
    Sections {
        /// Pathology id
        pathology: String,
    },
    /// Print the interactive panels of a patient record as JSON
    Show {
        /// Patient record JSON file
        #[arg(long)]
        record: PathBuf,
        /// Only this pathology
        #[arg(long)]
        pathology: Option<String>,
    },
    /// Print the export documents of a patient record
    Export {
        /// Patient record JSON file
        #[arg(long)]
        record: PathBuf,
        /// Only this pathology
        #[arg(long)]
        pathology: Option<String>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
    /// Print the export URL of a media reference
    Resolve {
        /// Media reference as stored in a record
        uri: String,
    },
    /// Validate a generated pathology config file
    CheckConfig {
        /// Config file (YAML or JSON)
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Markdown,
}

/// Entry point for the `fiche` CLI.
///
/// # Environment Variables
/// - `FICHE_EXPORT_BASE_URL`: origin of the image proxy used in exports (default: "http://localhost:3000")
/// - `FICHE_PATHOLOGY_CONFIG`: generated pathology config replacing the built-in one
/// - `RUST_LOG`: log filter (default directive: "fiche=info")
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fiche=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let output = run(cli)?;
    print!("{output}");
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let Cli {
        config,
        base_url,
        command,
    } = cli;

    let load_service = || -> anyhow::Result<ProfileService> {
        let cfg = core_config(config, base_url)?;
        ProfileService::new(Arc::new(cfg)).context("loading pathology config")
    };

    let output = match command {
        Commands::Pathologies => list_pathologies(load_service()?.registry()),
        Commands::Sections { pathology } => list_sections(&load_service()?, &pathology),
        Commands::Show { record, pathology } => {
            let service = load_service()?;
            let record = read_record(&record)?;
            let panels = select_panels(&service, &record, pathology.as_deref());
            let rendered = InteractiveAdapter::new().render_all(&panels);
            format!("{}\n", serde_json::to_string_pretty(&rendered)?)
        }
        Commands::Export {
            record,
            pathology,
            format,
        } => {
            let service = load_service()?;
            let record = read_record(&record)?;
            let panels = select_panels(&service, &record, pathology.as_deref());
            let documents = ExportAdapter::new(service.media_resolver()).render_all(&panels);
            match format {
                ExportFormat::Json => format!("{}\n", serde_json::to_string_pretty(&documents)?),
                ExportFormat::Markdown => MarkdownWriter::new().write_all(&documents),
            }
        }
        Commands::Resolve { uri } => {
            format!("{}\n", load_service()?.media_resolver().resolve(&uri))
        }
        // Validates the given file only; the configured registry is not loaded.
        Commands::CheckConfig { file } => check_config(&file)?,
    };

    Ok(output)
}

/// Flags take precedence over the environment.
fn core_config(config: Option<PathBuf>, base_url: Option<String>) -> anyhow::Result<CoreConfig> {
    let base_url = match base_url {
        Some(url) => url,
        None => export_base_url_from_env_value(std::env::var(EXPORT_BASE_URL_ENV).ok())?,
    };
    let config = config.or_else(|| {
        pathology_config_path_from_env_value(std::env::var(PATHOLOGY_CONFIG_ENV).ok())
    });

    let cfg = CoreConfig::new(base_url, config)?;
    match cfg.pathology_config_path() {
        Some(path) => tracing::debug!("using pathology config {}", path.display()),
        None => tracing::debug!("using built-in pathology config"),
    }
    tracing::debug!("export base URL {}", cfg.export_base_url());
    Ok(cfg)
}

fn read_record(path: &Path) -> anyhow::Result<PatientRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading record {}", path.display()))?;
    PatientRecord::from_json_str(&text)
        .with_context(|| format!("parsing record {}", path.display()))
}

fn select_panels(
    service: &ProfileService,
    record: &PatientRecord,
    pathology: Option<&str>,
) -> Vec<PathologyPanel> {
    match pathology {
        Some(id) => service.panel(record, id).into_iter().collect(),
        None => service.panels(record),
    }
}

fn list_pathologies(registry: &PathologyRegistry) -> String {
    if registry.is_empty() {
        return "No pathologies configured.\n".to_string();
    }

    registry
        .pathologies()
        .map(|config| {
            format!(
                "{}\t{} ({} sections)\n",
                config.id(),
                config.title(),
                config.sections().len()
            )
        })
        .collect()
}

fn list_sections(service: &ProfileService, pathology: &str) -> String {
    let mut output = String::new();
    for section in service.sections_for(pathology) {
        let layout = match section.layout() {
            Layout::List => "list",
            Layout::Grid => "grid",
        };
        output.push_str(&format!("{}\t{}\t{}\n", section.id(), section.title(), layout));

        if section.is_implicit() {
            output.push_str(&format!("  {}.*\n", section.id()));
        }
        for field in section.fields() {
            output.push_str(&format!("  {field}\n"));
        }
    }
    output
}

fn check_config(file: &Path) -> anyhow::Result<String> {
    let registry = PathologyRegistry::from_path(file)
        .with_context(|| format!("validating {}", file.display()))?;

    let sections: usize = registry.pathologies().map(|p| p.sections().len()).sum();
    let fields: usize = registry.pathologies().map(|p| p.descriptors().len()).sum();

    Ok(format!(
        "{}: {} pathologies, {} sections, {} field descriptors\n",
        file.display(),
        registry.len(),
        sections,
        fields
    ))
}
