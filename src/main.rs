// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Species Curator CLI
//!
//! Serves the curation API and offers the same inventory and blacklist
//! operations from the terminal.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use species_curator::blacklist::ToggleAction;
use species_curator::config::AppConfig;
use species_curator::inventory::Inventory;
use species_curator::manifest::{IgnoreRules, ManifestGenerator};
use species_curator::stats::StatsSession;
use species_curator::Result;

/// Species Curator - species image inventory and blacklist service
#[derive(Parser, Debug)]
#[command(name = "species-curator")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Curate per-species image folders", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Collection root holding one folder per species (overrides config)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the curation web server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Open browser automatically
        #[arg(long)]
        open: bool,
    },

    /// List curatable species
    Species,

    /// List the eligible images of a species
    Images {
        /// Species folder name
        species: String,
    },

    /// Inspect or edit a species blacklist
    Blacklist {
        #[command(subcommand)]
        action: BlacklistCommands,
    },

    /// Show global curation statistics
    Stats,

    /// Write manifest.json files for the collection
    Manifest {
        /// Print manifests instead of writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BlacklistCommands {
    /// Show the raw blacklist of a species
    Show {
        species: String,
    },

    /// Blacklist one or more images
    Add {
        species: String,
        #[arg(required = true)]
        images: Vec<String>,
    },

    /// Remove one or more images from the blacklist
    Remove {
        species: String,
        #[arg(required = true)]
        images: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = AppConfig::load(&cli.config)?;
    if let Some(root) = &cli.root {
        config.collection_root = root.to_string_lossy().to_string();
    }
    let json = cli.format == "json";

    match cli.command {
        Some(Commands::Serve { host, port, open }) => run_serve(config, host, port, open).await,
        Some(Commands::Species) => run_species(&config, json),
        Some(Commands::Images { species }) => run_images(&config, &species, json),
        Some(Commands::Blacklist { action }) => run_blacklist(&config, action, json),
        Some(Commands::Stats) => run_stats(&config, json),
        Some(Commands::Manifest { dry_run }) => run_manifest(&config, dry_run),
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        None => run_serve(config, None, None, false).await,
    }
}

/// Run the web server
async fn run_serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    open: bool,
) -> Result<()> {
    if let Some(host) = host {
        config.web.host = host;
    }
    if let Some(port) = port {
        config.web.port = port;
    }

    if open {
        let url = format!("http://{}:{}", config.web.host, config.web.port);
        if let Err(e) = open_browser(&url) {
            error!("Failed to open browser: {}", e);
        }
    }

    species_curator::web::start_server(config).await
}

fn run_species(config: &AppConfig, json: bool) -> Result<()> {
    let species = Inventory::new(config).list_species()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&species)?);
        return Ok(());
    }

    for s in &species {
        println!(
            "  {:<32} {:<28} {}",
            s.name,
            s.vernacular_name.as_deref().unwrap_or(&s.display_name),
            s.scientific_name.as_deref().unwrap_or("-")
        );
    }
    println!("\n{} species", species.len());
    Ok(())
}

fn run_images(config: &AppConfig, species: &str, json: bool) -> Result<()> {
    let listing = Inventory::new(config).list_images(species)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    for image in &listing.images {
        let marker = if image.is_blacklisted { "x" } else { " " };
        println!("  [{}] {}", marker, image.name);
    }
    println!(
        "\n{}: {} images, {} blacklisted",
        listing.species, listing.total_images, listing.blacklisted_count
    );
    Ok(())
}

fn run_blacklist(config: &AppConfig, action: BlacklistCommands, json: bool) -> Result<()> {
    let inventory = Inventory::new(config);

    let (species, images, action) = match action {
        BlacklistCommands::Show { species } => {
            let list = inventory.blacklist(&species)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                println!("Blacklist for {} ({} entries):", species, list.len());
                for name in list {
                    println!("  {}", name);
                }
            }
            return Ok(());
        }
        BlacklistCommands::Add { species, images } => (species, images, ToggleAction::Add),
        BlacklistCommands::Remove { species, images } => (species, images, ToggleAction::Remove),
    };

    for image in images {
        let blacklisted = inventory.store().toggle(&species, &image, action)?;
        if json {
            println!(
                "{}",
                serde_json::json!({ "imageName": image, "action": action, "isBlacklisted": blacklisted })
            );
        } else {
            println!("  {} {} -> blacklisted: {}", action, image, blacklisted);
        }
    }
    Ok(())
}

fn run_stats(config: &AppConfig, json: bool) -> Result<()> {
    let session = StatsSession::initialize(&Inventory::new(config))?;
    let stats = session.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(stats)?);
    } else {
        println!("Curation Statistics:");
        println!("  Species: {}", stats.species_count);
        println!("  Images: {}", stats.total_images);
        println!("  Blacklisted: {}", stats.total_blacklisted);
    }
    Ok(())
}

fn run_manifest(config: &AppConfig, dry_run: bool) -> Result<()> {
    let ignore_path = ManifestGenerator::ignore_file_path(config);
    let rules = IgnoreRules::load(&ignore_path)?;
    if !rules.is_empty() {
        info!("Loaded {} ignore patterns from {:?}", rules.len(), ignore_path);
    }
    let generator = ManifestGenerator::new(config, rules);

    if dry_run {
        for dir in generator.directories()? {
            let manifest = generator.build(&dir)?;
            println!("{}:\n{}", dir.display(), serde_json::to_string_pretty(&manifest)?);
        }
        return Ok(());
    }

    let report = generator.generate_all()?;
    println!(
        "Generated manifests for {} directories ({} images)",
        report.directories, report.images
    );
    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            info!("Loaded from {:?}", config_path);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }
    Ok(())
}

fn open_browser(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/c", "start", url])
            .spawn()?;
    }
    Ok(())
}
