//! dtoregen: regenerate a DTO and its mapper, keeping custom code from the previous version.
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::Parser;
use dtoregen::{config, merge, metadata::EntityMetadata, skeleton::GenerationOptions};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dtoregen")]
#[command(about = "Regenerate C# DTOs and mappers, keeping hand-written code", long_about = None)]
struct Args {
    /// Entity to generate from: a C# source file or a JSON metadata file
    #[arg(value_name = "ENTITY")]
    entity: PathBuf,

    /// Previously generated DTO file whose custom code should be kept
    #[arg(long, short = 'x', value_name = "DTO")]
    existing: Option<PathBuf>,

    /// Related entities whose properties are flattened into the DTO
    #[arg(long, short = 'r', value_name = "FILE")]
    related: Vec<PathBuf>,

    /// Namespace of the generated classes
    #[arg(long)]
    namespace: Option<String>,

    /// Name of the generated DTO class
    #[arg(long)]
    dto_name: Option<String>,

    /// Name of the DTO class of the entity's base class
    #[arg(long)]
    base_dto_name: Option<String>,

    /// Write the result to this file instead of stdout
    #[arg(long, short = 'o', value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print a JSON summary of the preserved code to stderr
    #[arg(long)]
    report: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let cfg = config::Config::load().context("Failed to load dtoregen.toml")?;

    // Override config with command line args
    let mut options = GenerationOptions::from(&cfg);
    options.namespace = args.namespace;
    options.dto_name = args.dto_name;
    options.base_dto_name = args.base_dto_name;

    let mut metadata = load_entity(&args.entity)?;
    let related = args
        .related
        .iter()
        .map(|path| load_entity(path))
        .collect::<anyhow::Result<Vec<_>>>()?;
    metadata.attach_related(&related);

    let previous = match &args.existing {
        Some(path) if path.exists() => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        Some(path) => {
            debug!("{} does not exist yet, generating fresh", path.display());
            None
        }
        None => None,
    };

    let result = merge(&metadata, previous.as_deref(), &options).with_context(|| {
        args.existing.as_ref().map_or_else(
            || format!("Failed to generate DTO for {}", args.entity.display()),
            |existing| format!("Failed to regenerate {}", existing.display()),
        )
    })?;
    let text = result.render(options.indent_width);

    if let Some(path) = &args.output {
        fs::write(path, &text).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    } else {
        print!("{text}");
    }

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(())
}

fn load_entity(path: &Path) -> anyhow::Result<EntityMetadata> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let metadata = if path.extension().is_some_and(|ext| ext == "json") {
        EntityMetadata::from_json(&contents)
    } else {
        EntityMetadata::from_source(&contents)
    };
    metadata.with_context(|| format!("Failed to load entity from {}", path.display()))
}
