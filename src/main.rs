use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use fhir::{FhirVersion, ResourceType};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use viz_core::constants::{EMBED_REFERENCES_ENV, FHIR_VERSION_ENV};
use viz_core::{
    Renderer, View, VizConfig, VizError, dispatch, load_record_set, render_record_set, schema_for,
    schemas,
};

mod table;

#[derive(Parser)]
#[command(name = "fhir-viz")]
#[command(about = "Render FHIR clinical records as text tables")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a record file (JSON or YAML bundle, array or single resource)
    Render {
        /// Path to the record file
        file: PathBuf,
        /// Schema version of the records (e.g. 4.0.0 or R4)
        #[arg(long)]
        fhir_version: Option<FhirVersion>,
        /// Only render this resource type; an unknown type renders nothing
        #[arg(long)]
        resource_type: Option<String>,
        /// Do not resolve report results and care plan goals into nested rows
        #[arg(long)]
        no_embed_references: bool,
        /// Print the rendered views as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the column headers of a resource type as JSON
    Columns {
        /// Resource type tag (e.g. Condition)
        resource_type: String,
        /// Schema version (e.g. 4.0.0 or R4)
        #[arg(long)]
        fhir_version: Option<FhirVersion>,
    },
    /// List the resource types that can be rendered
    Types,
    /// Print every table schema as JSON
    Schemas,
}

/// Entry point for the `fhir-viz` command line tool.
///
/// # Environment Variables
/// - `FHIR_VERSION`: schema version of the records (default: "4.0.0")
/// - `VIZ_EMBED_REFERENCES`: resolve references into nested rows (default: "true")
/// - `RUST_LOG`: log filter; logs go to stderr
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fhir_viz=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = VizConfig::from_env_values(
        std::env::var(FHIR_VERSION_ENV).ok(),
        std::env::var(EMBED_REFERENCES_ENV).ok(),
    )?;
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Render {
            file,
            fhir_version,
            resource_type,
            no_embed_references,
            json,
        }) => {
            let config = config
                .with_fhir_version(fhir_version.unwrap_or(config.fhir_version()))
                .with_embed_references(config.embed_references() && !no_embed_references);

            let records = load_record_set(&file, config.embed_references())
                .with_context(|| format!("failed to load {}", file.display()))?;
            tracing::info!(
                "++ Rendering {} records from {} as FHIR {}",
                records.len(),
                file.display(),
                config.fhir_version()
            );

            let views = select_views(
                render_record_set(&records, config.fhir_version()),
                resource_type.as_deref(),
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&views)?);
            } else if views.is_empty() {
                println!("No records to display.");
            } else {
                let painted: Vec<String> = views.iter().map(table::paint).collect();
                print!("{}", painted.join("\n"));
            }
        }
        Some(Commands::Columns {
            resource_type,
            fhir_version,
        }) => {
            let parsed = parse_resource_type(&resource_type)?;
            let Some(schema) = schema_for(parsed) else {
                bail!("{parsed} is shown as a summary, not a table");
            };
            let version = fhir_version.unwrap_or(config.fhir_version());
            println!("{}", serde_json::to_string(&schema.headers(version))?);
        }
        Some(Commands::Types) => {
            for resource_type in ResourceType::ALL {
                match dispatch(resource_type.as_str()) {
                    Some(Renderer::Table(schema)) => println!("{resource_type}\t{}", schema.title),
                    Some(Renderer::PatientSummary) => println!("{resource_type}\tPatient summary"),
                    None => {}
                }
            }
        }
        Some(Commands::Schemas) => {
            let all: Vec<_> = schemas().collect();
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        None => {
            println!("Use 'fhir-viz --help' for commands");
        }
    }

    Ok(())
}

fn parse_resource_type(tag: &str) -> Result<ResourceType, VizError> {
    ResourceType::from_tag(tag).ok_or_else(|| VizError::UnknownResourceType(tag.to_string()))
}

/// Keep only the views for `tag`. An unknown tag is logged and selects nothing.
fn select_views(views: Vec<View>, tag: Option<&str>) -> Vec<View> {
    let Some(tag) = tag else {
        return views;
    };
    let Some(only) = ResourceType::from_tag(tag) else {
        tracing::warn!(resource_type = tag, "no renderer for resource type; rendering nothing");
        return Vec::new();
    };
    views
        .into_iter()
        .filter(|view| view.resource_type() == Some(only))
        .collect()
}
