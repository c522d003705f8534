use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Client;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

mod check;

// ── CLI definition ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "keyward", about = "keyward — license-key registry", version)]
struct Cli {
    /// keyward server URL (default: http://localhost:8080 or $KEYWARD_SERVER)
    #[arg(long, env = "KEYWARD_SERVER", default_value = "http://localhost:8080")]
    server: String,

    /// Admin key for server auth ($KEYWARD_ADMIN_KEY)
    #[arg(long, env = "KEYWARD_ADMIN_KEY")]
    admin_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the keyward HTTP server
    Serve {
        /// Path to a JSON config file with admin_key and database_path
        #[arg(long)]
        config: Option<PathBuf>,
        /// Port to listen on (default: $KEYWARD_PORT or 8080)
        #[arg(long, env = "KEYWARD_PORT", default_value = "8080")]
        port: u16,
        /// Host to bind (default: $KEYWARD_HOST or 0.0.0.0)
        #[arg(long, env = "KEYWARD_HOST", default_value = "0.0.0.0")]
        host: String,
    },
    /// Register a new license key
    Add {
        /// The key string to store
        key: String,
    },
    /// List all stored keys
    List,
    /// Fetch a key by id
    Get {
        /// Key id
        id: i64,
    },
    /// Delete a key by id
    Delete {
        /// Key id
        id: i64,
    },
    /// Ask a remote instance whether a key is valid
    Check {
        /// The key string to check
        key: String,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KEYWARD_LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port, host } => {
            cmd_serve(config.as_deref(), host, port, cli.admin_key).await
        }

        Commands::Add { key } => {
            let admin_key = require_admin_key(&cli.admin_key)?;
            cmd_add(&cli.server, &admin_key, &key).await
        }

        Commands::List => {
            let admin_key = require_admin_key(&cli.admin_key)?;
            cmd_list(&cli.server, &admin_key).await
        }

        Commands::Get { id } => {
            let admin_key = require_admin_key(&cli.admin_key)?;
            cmd_get(&cli.server, &admin_key, id).await
        }

        Commands::Delete { id } => {
            let admin_key = require_admin_key(&cli.admin_key)?;
            cmd_delete(&cli.server, &admin_key, id).await
        }

        Commands::Check { key } => {
            let admin_key = require_admin_key(&cli.admin_key)?;
            cmd_check(&cli.server, &admin_key, &key).await
        }
    }
}

// ── Command implementations ───────────────────────────────────────────────────

async fn cmd_serve(
    config: Option<&Path>,
    host: String,
    port: u16,
    admin_key: Option<String>,
) -> Result<()> {
    let mut cfg = match config {
        Some(path) => keyward_server::ServerConfig::from_config(
            keyward_server::Config::load(path)?,
        ),
        None => {
            let admin_key = admin_key.context(
                "an admin key is required: pass --config or --admin-key / KEYWARD_ADMIN_KEY",
            )?;
            if admin_key.is_empty() {
                anyhow::bail!("admin key must not be empty");
            }
            keyward_server::ServerConfig {
                host: String::new(),
                port: 0,
                admin_key,
                database_path: None,
                cors_origins: std::env::var("KEYWARD_CORS_ORIGINS").ok(),
            }
        }
    };
    // CLI flags (with their env defaults) decide the listen address.
    cfg.host = host;
    cfg.port = port;

    keyward_server::run(cfg).await
}

async fn cmd_add(server: &str, admin_key: &str, key: &str) -> Result<()> {
    let client = Client::new();
    let resp = client
        .post(format!("{}/api/keys", server.trim_end_matches('/')))
        .header("Authorization", admin_key)
        .json(&serde_json::json!({ "key": key }))
        .send()
        .await
        .context("HTTP request failed")?;

    let status = resp.status();
    let json: Value = resp.json().await.context("parse response")?;

    if status.is_success() {
        println!("✓ added key {} (id {})", key, json["id"]);
    } else {
        anyhow::bail!(
            "server returned {status}: {}",
            json["error"].as_str().unwrap_or("")
        );
    }
    Ok(())
}

#[derive(serde::Deserialize)]
struct KeyItem {
    id: i64,
    key: String,
}

async fn cmd_list(server: &str, admin_key: &str) -> Result<()> {
    let client = Client::new();
    let resp = client
        .get(format!("{}/api/keys", server.trim_end_matches('/')))
        .header("Authorization", admin_key)
        .send()
        .await
        .context("HTTP request failed")?;

    if !resp.status().is_success() {
        let status = resp.status();
        anyhow::bail!("server returned {status}");
    }

    let keys: Vec<KeyItem> = resp.json().await.context("parse key list")?;
    if keys.is_empty() {
        println!("(no keys)");
        return Ok(());
    }
    for k in &keys {
        println!("  {:>6}  {}", k.id, k.key);
    }
    Ok(())
}

async fn cmd_get(server: &str, admin_key: &str, id: i64) -> Result<()> {
    let client = Client::new();
    let resp = client
        .get(format!("{}/api/keys/{}", server.trim_end_matches('/'), id))
        .header("Authorization", admin_key)
        .send()
        .await
        .context("HTTP request failed")?;

    let status = resp.status();
    let json: Value = resp.json().await.context("parse response")?;

    if status.is_success() {
        println!("{}", json["key"].as_str().unwrap_or(""));
    } else {
        anyhow::bail!("{}", json["error"].as_str().unwrap_or("unknown error"));
    }
    Ok(())
}

async fn cmd_delete(server: &str, admin_key: &str, id: i64) -> Result<()> {
    let client = Client::new();
    let resp = client
        .delete(format!("{}/api/keys/{}", server.trim_end_matches('/'), id))
        .header("Authorization", admin_key)
        .send()
        .await
        .context("HTTP request failed")?;

    if resp.status().is_success() {
        println!("✓ deleted {id}");
    } else {
        let status = resp.status();
        let json: Value = resp.json().await.unwrap_or_default();
        anyhow::bail!(
            "server returned {status}: {}",
            json["error"].as_str().unwrap_or("")
        );
    }
    Ok(())
}

async fn cmd_check(server: &str, admin_key: &str, key: &str) -> Result<()> {
    if check::is_key_found(server, key, admin_key).await {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        std::process::exit(1);
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn require_admin_key(admin_key: &Option<String>) -> Result<String> {
    admin_key
        .clone()
        .context("--admin-key / KEYWARD_ADMIN_KEY is required for this command")
}
