//! CLI entry point for quire

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quire::config::SortOrder;

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "Publish Markdown essays with draft handling and revision deduplication", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the public folder
    #[command(alias = "g")]
    Build {
        /// Publish drafts as well
        #[arg(long)]
        drafts: bool,

        /// Order the output oldest first
        #[arg(long)]
        oldest_first: bool,

        /// Publish every revision instead of only canonical ones
        #[arg(long)]
        no_dedupe: bool,
    },

    /// List documents, revision clusters or failures
    List {
        /// Type of content to list (documents, clusters, failures)
        #[arg(default_value = "documents")]
        r#type: String,
    },

    /// Clean the public folder
    Clean,

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "quire=debug,info"
    } else {
        "quire=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build {
            drafts,
            oldest_first,
            no_dedupe,
        } => {
            let mut site = quire::Site::new(&base_dir)?;
            if drafts {
                site.config.publish.include_drafts = true;
            }
            if oldest_first {
                site.config.publish.sort_order = SortOrder::OldestFirst;
            }
            if no_dedupe {
                site.config.publish.dedupe = false;
            }

            tracing::info!("Building {:?}", site.source_dir);
            let report = site.build()?;
            print!("{}", report.summary());
        }

        Commands::List { r#type } => {
            let site = quire::Site::new(&base_dir)?;
            quire::commands::list::run(&site, &r#type)?;
        }

        Commands::Clean => {
            let site = quire::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("quire version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
