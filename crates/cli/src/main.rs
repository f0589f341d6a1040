//! Storecraft CLI - database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations (schema and session store)
//! sc-cli migrate
//!
//! # Load a demo business with storefronts and products
//! sc-cli seed demo crates/cli/seed/demo.yaml
//!
//! # Export or import a storefront's products
//! sc-cli csv export night-owl -o products.csv
//! sc-cli csv import night-owl products.csv
//!
//! # Print the web app manifest a storefront would publish
//! sc-cli manifest show night-owl
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "sc-cli")]
#[command(author, version, about = "Storecraft CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Product CSV import and export
    Csv {
        #[command(subcommand)]
        action: CsvAction,
    },
    /// Web app manifests
    Manifest {
        #[command(subcommand)]
        action: ManifestAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create a demo business from a YAML file
    Demo {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CsvAction {
    /// Write every product of a storefront as CSV
    Export {
        /// Storefront slug
        slug: String,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Add the rows of a CSV file as new products
    Import {
        /// Storefront slug
        slug: String,

        /// CSV file to read
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum ManifestAction {
    /// Print the manifest JSON and any missing required fields
    Show {
        /// Storefront slug
        slug: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await,
        Commands::Seed {
            target: SeedTarget::Demo { file },
        } => commands::seed::demo(&file).await,
        Commands::Csv { action } => match action {
            CsvAction::Export { slug, output } => {
                commands::csv::export(&slug, output.as_deref()).await
            }
            CsvAction::Import { slug, file } => commands::csv::import(&slug, &file).await,
        },
        Commands::Manifest {
            action: ManifestAction::Show { slug },
        } => commands::manifest::show(&slug).await,
    }
}
