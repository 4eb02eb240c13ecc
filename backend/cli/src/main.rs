mod config;
mod demo;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use plugboard_config::{apply_all_defaults, write_config, PlugboardConfig};
use plugboard_plugins::{
    discovery_source, DirectorySource, Discoverer, PluginResolver, ResolveOptions,
};

use config::LoadedConfig;
use demo::BasePlugin;
use terminal_output::{
    note_error, note_info, note_success, note_warn, render_table, styled, Column, DIM,
};

#[derive(Parser)]
#[command(name = "plugboard")]
#[command(about = "plugboard: discover and resolve installed plugins")]
#[command(version)]
struct Cli {
    /// Config file (default: $PLUGBOARD_CONFIG_DIR/config.yaml or ~/.plugboard/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered bindings
    List {
        /// Only bindings in this group
        #[arg(short, long)]
        group: Option<String>,
        /// Only bindings with this name
        #[arg(short, long)]
        name: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Scan plugin roots and report which manifests load
    Check,
    /// Resolve the demo `foo.Base` interface against the configured roots
    Demo {
        /// Install the demo `foo` and `other` components into the first root first
        #[arg(long)]
        install: bool,
    },
    /// Write a config file with default values
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        return init(cli.config, force).await;
    }

    let LoadedConfig {
        path,
        config,
        warnings,
    } = config::load(cli.config.as_deref()).await?;
    let logging = &config.logging;
    plugboard_logging::init_logger(logging.dir.as_deref(), logging.level(), logging.is_json());
    info!(
        config = %path.display(),
        roots = config.discovery.roots.len(),
        "Loaded plugboard config"
    );
    for warning in &warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }

    match cli.command {
        Commands::List { group, name, json } => {
            list(&config, group.as_deref(), name.as_deref(), json)?
        }
        Commands::Check => check(&config)?,
        Commands::Demo { install } => run_demo(&config, install).await?,
        Commands::Init { .. } => unreachable!("handled before config is loaded"),
    }

    Ok(())
}

fn list(
    config: &PlugboardConfig,
    group: Option<&str>,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    let bindings = Discoverer::new(discovery_source(&config.discovery)).filtered(group, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bindings)?);
        return Ok(());
    }
    if bindings.is_empty() {
        note_info("No bindings found");
        return Ok(());
    }

    let columns = [
        Column::left("Group"),
        Column::left("Name"),
        Column::left("Target"),
        Column::left("Package"),
        Column::right("Version"),
    ];
    let rows: Vec<Vec<String>> = bindings
        .iter()
        .map(|b| {
            vec![
                b.group().to_string(),
                b.name().to_string(),
                b.target().to_string(),
                b.owner_package().to_string(),
                b.owner_version().map_or_else(|| styled("-", DIM), str::to_string),
            ]
        })
        .collect();
    print!("{}", render_table(&columns, &rows));
    Ok(())
}

fn check(config: &PlugboardConfig) -> Result<()> {
    let discovery = &config.discovery;
    let source = DirectorySource::new(discovery.roots.iter().cloned())
        .with_manifest_file(discovery.manifest_file())
        .with_parallel(discovery.is_parallel());

    for root in source.roots() {
        if !root.exists() {
            note_warn(&format!("Plugin root {} does not exist", root.display()));
        }
    }

    let scanned = source.inspect()?;
    let mut failed = 0;
    for component in &scanned {
        match &component.outcome {
            Ok(metadata) => note_success(&format!(
                "{} ({}): {} binding(s) from {}",
                metadata.package,
                metadata.version.as_deref().unwrap_or("unversioned"),
                metadata.bindings().count(),
                component.dir.display()
            )),
            Err(reason) => {
                failed += 1;
                note_error(&format!("{}: {reason}", component.dir.display()));
            }
        }
    }

    println!();
    if failed > 0 {
        bail!("{failed} of {} manifest(s) failed to load", scanned.len());
    }
    note_success(&format!("{} manifest(s) loaded", scanned.len()));
    Ok(())
}

async fn run_demo(config: &PlugboardConfig, install: bool) -> Result<()> {
    if install {
        let Some(root) = config.discovery.roots.first() else {
            bail!("No plugin root configured to install the demo into");
        };
        demo::install(root).await?;
        note_info(&format!("Installed demo components into {}", root.display()));
    }

    let resolver = PluginResolver::from_config(config, Arc::new(demo::registry()));
    let interface = demo::interface();

    let report = resolver.resolve_all_report(&interface, &ResolveOptions::default())?;
    for warning in report.warnings() {
        note_warn(&warning.to_string());
    }
    let rows: Vec<Vec<String>> = report
        .candidates()
        .iter()
        .map(|c| {
            let describe = c
                .value()
                .downcast_ref::<BasePlugin>()
                .map(|p| p.describe())
                .unwrap_or_default();
            vec![
                c.binding().to_string(),
                if c.is_external() { "external" } else { "internal" }.to_string(),
                describe,
            ]
        })
        .collect();
    if !rows.is_empty() {
        let columns = [Column::left("Binding"), Column::left("Kind"), Column::left("Says")];
        print!("{}", render_table(&columns, &rows));
    }

    match resolver.resolve_one_as::<BasePlugin>(&interface) {
        Ok(plugin) => note_success(&format!("{interface} resolved: {}", plugin.describe())),
        Err(e) => note_error(&e.to_string()),
    }
    Ok(())
}

async fn init(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let path = config::resolve_path(explicit.as_deref());
    if path.exists() && !force {
        bail!("{} already exists; pass --force to overwrite", path.display());
    }
    let base_dir = path.parent().map(PathBuf::from).unwrap_or_default();
    let config = apply_all_defaults(PlugboardConfig::default(), &base_dir);
    write_config(&config, &path).await?;
    note_success(&format!("Wrote {}", path.display()));
    Ok(())
}
