//! # Guided Kitchen CLI (`kitchen`)
//!
//! Browse a folder of recipes, ask questions about them, and get walked
//! through cooking one step at a time.
//!
//! ## Usage
//!
//! ```bash
//! kitchen --config ./config/kitchen.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `kitchen list` | List every recipe by name |
//! | `kitchen get <name>` | Show one recipe (`--raw` for the source JSON) |
//! | `kitchen search [keyword]` | Find recipes whose name contains a keyword |
//! | `kitchen ask "<question>"` | Ask a question, optionally about `--recipe <name>` |
//! | `kitchen cook <name>` | Print the ingredients and every step in order |
//! | `kitchen check` | Load the recipe folder and report what was found |
//! | `kitchen serve` | Start the HTTP server |
//!
//! Log verbosity follows `-v` (`info`, `-v` debug, `-vv` trace). `RUST_LOG`
//! overrides it. Logs go to stderr; command output goes to stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use guided_kitchen::catalog::Catalog;
use guided_kitchen::config::{self, Config};
use guided_kitchen::kitchen::Kitchen;
use guided_kitchen::loader::LoadReport;
use guided_kitchen::server;
use guided_kitchen_core::answer::Answerer;
use guided_kitchen_core::session::Advance;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Guided Kitchen: a recipe index and step-by-step cooking assistant.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(name = "kitchen", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/kitchen.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every recipe by name, in load order.
    List,

    /// Show one recipe.
    Get {
        /// Recipe name (case-insensitive).
        name: String,

        /// Print the original JSON document instead of the normalized view.
        #[arg(long)]
        raw: bool,
    },

    /// Find recipes whose name contains a keyword. No keyword lists all.
    Search {
        #[arg(default_value = "")]
        keyword: String,
    },

    /// Ask a question about a recipe.
    Ask {
        question: String,

        /// Recipe the question is about.
        #[arg(long)]
        recipe: Option<String>,
    },

    /// Walk through a recipe from the first step to completion.
    Cook {
        name: String,
    },

    /// Load the recipe folder and print the load report.
    ///
    /// Exits non-zero when no recipe could be loaded.
    Check,

    /// Start the HTTP server.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config_or_default(&cli.config)?;
    debug!(config = %cli.config.display(), dir = %cfg.recipes.dir.display(), "configuration loaded");

    match cli.command {
        Commands::List => {
            let (kitchen, _) = offline_kitchen(&cfg)?;
            let names = kitchen.list_recipe_names();
            if names.is_empty() {
                println!("No recipes found in {}", cfg.recipes.dir.display());
            }
            for name in names {
                println!("{}", name);
            }
        }
        Commands::Get { name, raw } => {
            let (kitchen, _) = offline_kitchen(&cfg)?;
            let recipe = kitchen.get_recipe(&name)?;
            if raw {
                println!("{}", serde_json::to_string_pretty(&recipe.raw)?);
            } else {
                println!("{}", recipe.display_name);
                println!("{}", recipe.description);
                println!();
                println!("Ingredients:");
                for ingredient in &recipe.ingredients {
                    println!("  - {}", ingredient);
                }
                println!();
                println!("Steps:");
                for (i, step) in recipe.steps.iter().enumerate() {
                    println!("  {}. {}", i + 1, step);
                }
            }
        }
        Commands::Search { keyword } => {
            let (kitchen, _) = offline_kitchen(&cfg)?;
            let results = kitchen.search(&keyword);
            if results.is_empty() {
                println!("No recipes match '{}'", keyword);
            }
            for name in results {
                println!("{}", name);
            }
        }
        Commands::Ask { question, recipe } => {
            let (kitchen, _) = Kitchen::from_config(&cfg)?;
            let reply = kitchen.ask(&question, recipe.as_deref(), None).await?;
            println!("{}", reply.answer);
        }
        Commands::Cook { name } => {
            let (kitchen, _) = offline_kitchen(&cfg)?;
            cook(&kitchen, &name)?;
        }
        Commands::Check => {
            let (catalog, report) = Catalog::load(&cfg.recipes)?;
            print_report(&report, &catalog.fingerprint());
            if catalog.is_empty() {
                anyhow::bail!("no recipes loaded from {}", cfg.recipes.dir.display());
            }
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .init();
}

/// A kitchen without the generative source, for commands that never ask.
fn offline_kitchen(cfg: &Config) -> Result<(Kitchen, LoadReport)> {
    let (catalog, report) = Catalog::load(&cfg.recipes)?;
    Ok((Kitchen::offline(catalog, Answerer::random()), report))
}

fn cook(kitchen: &Kitchen, name: &str) -> Result<()> {
    let start = kitchen.start_cooking(None, name)?;
    println!("Cooking {} ({} steps)", start.recipe_name, start.total_steps);
    println!();
    println!("Ingredients:");
    for ingredient in &start.ingredients {
        println!("  - {}", ingredient);
    }
    println!();

    loop {
        match kitchen.advance_step(None)? {
            Advance::Step {
                text,
                step_number,
                total_steps,
            } => println!("Step {}/{}: {}", step_number, total_steps, text),
            Advance::Completed { message, .. } => {
                println!();
                println!("{}", message);
                return Ok(());
            }
        }
    }
}

fn print_report(report: &LoadReport, fingerprint: &str) {
    println!("Recipes folder: {}", report.directory.display());
    if report.seeded_sample {
        println!("  folder was missing; created it with a sample recipe");
    } else if report.directory_missing {
        println!("  folder is missing");
    }
    println!("  files scanned:  {}", report.files_scanned);
    println!("  recipes loaded: {}", report.recipes_loaded);
    println!("  fingerprint:    {}", fingerprint);
    for key in &report.duplicates {
        println!("  duplicate name: {} (later definition kept)", key);
    }
    for skipped in &report.skipped {
        println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
    }
}
