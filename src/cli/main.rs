//! Command-line lookup over the zip code directory.
//!
//! Prints plain text by default, or JSON with `--json`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use phzip::{DirectoryConfig, SearchField, SearchParams, ZipDirectory};

#[derive(Parser, Debug)]
#[command(name = "phzip")]
#[command(about = "Look up Philippine zip codes")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data file (JSON or CSV, optionally .gz); overrides the config
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Location of a zip code
    Zip { code: String },

    /// Zip codes of a city or municipality
    City { name: String },

    /// Search city, province and region names
    Search {
        query: String,

        /// Field to search (repeatable): city_municipality, province, region
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// contains, startswith or exact
        #[arg(short, long = "match", default_value = "contains")]
        match_kind: String,
    },

    /// All regions
    Regions,

    /// Provinces of a region
    Provinces { region: String },

    /// Cities and municipalities of a province
    Cities { province: String },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns `false` when a zip code lookup found nothing.
fn run(args: Args) -> Result<bool> {
    let mut config = match &args.config {
        Some(path) => DirectoryConfig::load_from_file(path)?,
        None => DirectoryConfig::default(),
    };
    if let Some(data) = &args.data {
        config = config.with_data_path(data);
    }
    debug!(?config, "Starting phzip");

    let directory = ZipDirectory::new(config);
    let out = Output { json: args.json };

    match args.command {
        Command::Zip { code } => match directory.find_by_zip(&code)? {
            Some(record) => out.print(record, |r| r.to_string())?,
            None => {
                out.not_found(&format!("No location for zip code {code}"))?;
                return Ok(false);
            }
        },
        Command::City { name } => {
            let rows = directory.find_by_city(&name)?;
            if rows.is_empty() && !out.json {
                println!("No zip codes for {name}");
            } else {
                out.print(&*rows, |rows| {
                    rows.iter()
                        .map(|r| format!("{} {}, {}", r.zip_code, r.province, r.region))
                        .collect::<Vec<_>>()
                        .join("\n")
                })?;
            }
        }
        Command::Search {
            query,
            fields,
            match_kind,
        } => {
            let fields: Vec<&str> = if fields.is_empty() {
                SearchField::all().iter().map(|f| f.as_str()).collect()
            } else {
                fields.iter().map(String::as_str).collect()
            };
            let params = SearchParams::parse(query, &fields, &match_kind)
                .context("Invalid search arguments")?;

            let records = directory.search(&params)?;
            out.print(&*records, |records| {
                records
                    .iter()
                    .map(|r| r.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }
        Command::Regions => out.print_names(&directory.get_regions()?)?,
        Command::Provinces { region } => out.print_names(&directory.get_provinces(&region)?)?,
        Command::Cities { province } => out.print_names(&directory.get_cities(&province)?)?,
    }

    Ok(true)
}

struct Output {
    json: bool,
}

impl Output {
    fn print<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            let text = text(value);
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Ok(())
    }

    fn print_names(&self, names: &[String]) -> Result<()> {
        self.print(names, |names| names.join("\n"))
    }

    fn not_found(&self, message: &str) -> Result<()> {
        if self.json {
            println!("null");
        } else {
            eprintln!("{message}");
        }
        Ok(())
    }
}
