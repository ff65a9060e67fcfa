//! CLI tool to generate API keys.
//!
//! Usage:
//!   cargo run --bin generate-api-key -- --name "Design team" --role contributor --expires-in 365d

use std::env;

use ifc_lca_lib::config::Config;
use ifc_lca_lib::db::DbPool;
use ifc_lca_lib::models::ApiKeyRole;
use ifc_lca_lib::services::api_key;

struct Args {
    name: String,
    role: ApiKeyRole,
    expires_in: Option<String>,
}

fn parse_args() -> Result<Option<Args>, String> {
    let mut name: Option<String> = None;
    let mut role = "contributor".to_string();
    let mut expires_in: Option<String> = None;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--name" | "-n" => name = args.next(),
            "--role" | "-r" => role = args.next().unwrap_or_default(),
            "--expires-in" | "-e" => expires_in = args.next(),
            "--help" | "-h" => return Ok(None),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    let name = name.ok_or("--name is required")?;
    let role = ApiKeyRole::parse(&role).ok_or_else(|| {
        format!(
            "Invalid role '{}'. Must be: admin, contributor, viewer",
            role
        )
    })?;

    Ok(Some(Args {
        name,
        role,
        expires_in,
    }))
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = match parse_args() {
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

    let (full_key, api_key) =
        match api_key::create_key(&pool, &args.name, args.role, args.expires_in.as_deref()).await
        {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error generating key: {}", e);
                std::process::exit(1);
            }
        };

    println!();
    println!("  ID:      {}", api_key.id);
    println!("  Name:    {}", api_key.name);
    println!("  Role:    {}", api_key.role);
    println!("  Prefix:  {}", api_key.key_prefix);
    match api_key.expires_at {
        Some(expires) => println!("  Expires: {}", expires.to_rfc3339()),
        None => println!("  Expires: Never"),
    }
    println!();
    println!("  Key:     {}", full_key);
    println!();
    println!("  Save this key! It cannot be retrieved later.");
    println!();
}

fn print_usage() {
    eprintln!();
    eprintln!("Usage: generate-api-key --name <name> [--role <role>] [--expires-in <duration>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --name, -n        Name for the API key (required)");
    eprintln!("  --role, -r        Role: admin, contributor, viewer (default: contributor)");
    eprintln!("  --expires-in, -e  Expiration: 30d, 12w, 6m, 1y (default: never)");
    eprintln!("  --help, -h        Show this help");
    eprintln!();
}
