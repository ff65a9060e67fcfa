//! CLI tool to load KBOB, EC3 and OpenEPD datasets into the catalog.
//!
//! Usage:
//!   cargo run --bin import-catalog -- data/kbob.json --source kbob

use std::env;
use std::path::PathBuf;

use ifc_lca_lib::config::Config;
use ifc_lca_lib::db::DbPool;
use ifc_lca_lib::models::CatalogSource;
use ifc_lca_lib::services::catalog_import;

fn parse_args() -> Result<Option<(PathBuf, Option<CatalogSource>)>, String> {
    let mut path: Option<PathBuf> = None;
    let mut source: Option<CatalogSource> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--source" | "-s" => {
                let value = args.next().unwrap_or_default();
                source = Some(CatalogSource::parse(&value).ok_or_else(|| {
                    format!("Invalid source '{}'. Must be: kbob, ec3, openepd", value)
                })?);
            }
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') => {
                return Err(format!("Unknown argument: {}", other));
            }
            other => path = Some(PathBuf::from(other)),
        }
    }

    let path = path.ok_or("a dataset file is required")?;
    Ok(Some((path, source)))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_target(false).init();

    let (path, source) = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match DbPool::new(&config).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error connecting to database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        eprintln!("Error running migrations: {}", e);
        std::process::exit(1);
    }

    let summary = match catalog_import::import_file(pool.connection(), &path, source).await {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error importing {}: {}", path.display(), e);
            std::process::exit(1);
        }
    };

    println!();
    println!("  Imported {}", path.display());
    println!("  Inserted: {}", summary.inserted);
    println!("  Updated:  {}", summary.updated);
    for (source, count) in &summary.per_source {
        println!("  {:<9} {}", format!("{}:", source), count);
    }
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: import-catalog <file.json> [--source <source>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --source, -s  Only import records of this source: kbob, ec3, openepd");
    eprintln!("  --help, -h    Show this help");
    eprintln!();
}
