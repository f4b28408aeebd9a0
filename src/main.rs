//! price-compare - Stateless marketplace price comparison
//!
//! Serves the comparison endpoint over HTTP, or runs a single comparison from the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand};
use price_compare::compare::{CompareRequest, Comparator};
use price_compare::config::{Config, OutputFormat};
use price_compare::countries::{select_countries, Country};
use price_compare::format::Formatter;
use price_compare::server;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "price-compare",
    version,
    about = "Compare marketplace prices for a product across countries",
    long_about = "Aggregates Mercado Libre and Google Shopping offers, normalizes them to USD, and reports the cheapest offer per country."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP endpoint
    Serve {
        /// Address to listen on (e.g., 127.0.0.1:3000)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one comparison and print the result
    #[command(alias = "c")]
    Compare {
        /// Product brand
        brand: String,

        /// Product model
        model: String,

        /// Countries to search (comma-separated, default MX,US,CO)
        #[arg(long, value_delimiter = ',')]
        countries: Option<Vec<String>>,

        /// Product GTIN
        #[arg(long)]
        gtin: Option<String>,

        /// Output format
        #[arg(short, long)]
        format: Option<OutputFormat>,
    },

    /// List supported countries
    Countries,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => Level::INFO,
        _ => Level::WARN,
    };
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(default_level.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut config = Config::load(cli.config.as_deref())?.with_env();

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            server::serve(&config).await?;
        }

        Commands::Compare { brand, model, countries, gtin, format } => {
            if brand.trim().is_empty() || model.trim().is_empty() {
                anyhow::bail!("brand and model are required");
            }
            if let Some(format) = format {
                config.format = format;
            }

            let request = CompareRequest {
                brand,
                model,
                countries: select_countries(countries.as_deref()),
                gtin,
            };

            let comparator = Comparator::from_config(&config)?;
            let report = comparator.compare(&request).await?;
            println!("{}", Formatter::new(config.format).format_report(&report));
        }

        Commands::Countries => {
            println!("Supported countries:\n");
            println!("{:<6} {:<10} {:<14}", "Code", "Currency", "Catalog site");
            println!("{:-<6} {:-<10} {:-<14}", "", "", "");

            for country in Country::all() {
                println!(
                    "{:<6} {:<10} {:<14}",
                    country.code(),
                    country.currency(),
                    country.catalog_site().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
