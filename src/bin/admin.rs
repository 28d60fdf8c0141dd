//! CLI administration tool for safe-shortener.
//!
//! Inspects links and runs ad-hoc threat checks without going through the
//! HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # Link and click totals
//! cargo run --bin admin -- stats
//!
//! # Details of one link
//! cargo run --bin admin -- link show aZ3kP9
//!
//! # Check URLs with the configured threat API client
//! cargo run --bin admin -- check-url https://example.com http://malware.test
//!
//! # Database diagnostics
//! cargo run --bin admin -- db check
//! cargo run --bin admin -- db info
//! ```
//!
//! Reads the same environment (and `.env`) as the server.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;

use safe_shortener::config::Config;
use safe_shortener::domain::repositories::LinkRepository;
use safe_shortener::infrastructure::cache::NullCache;
use safe_shortener::infrastructure::persistence::PgLinkRepository;
use safe_shortener::infrastructure::threat_check::{SafeBrowsingClient, ThreatChecker};
use safe_shortener::server::connect_pool;

#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show link and click totals
    Stats,

    /// Inspect links
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Check URLs against the threat intelligence API
    CheckUrl {
        /// URLs to check (up to 500)
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show a link by short code
    Show { code: String },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::CheckUrl { urls } => check_urls(&config, urls).await?,
        Commands::Stats => handle_stats(&connect_pool(&config).await?).await?,
        Commands::Link { action } => handle_link_action(action, connect_pool(&config).await?).await?,
        Commands::Db { action } => handle_db_action(action, &connect_pool(&config).await?).await?,
    }

    Ok(())
}

async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let (links, clicks): (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(click_count), 0)::BIGINT FROM links")
            .fetch_one(pool)
            .await?;

    println!("  Links:  {}", links.to_string().bright_green().bold());
    println!("  Clicks: {}", clicks.to_string().bright_green().bold());
    println!();

    Ok(())
}

async fn handle_link_action(action: LinkAction, pool: PgPool) -> Result<()> {
    let repo = PgLinkRepository::new(Arc::new(pool));

    match action {
        LinkAction::Show { code } => {
            let link = repo
                .find_by_code(&code)
                .await
                .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
                .with_context(|| format!("No link with code '{code}'"))?;

            println!("{}", "🔗 Link".bright_blue().bold());
            println!();
            println!("  Code:    {}", link.short_code.cyan());
            println!("  Target:  {}", link.long_url.bright_white());
            println!("  Clicks:  {}", link.click_count.to_string().bright_green());
            println!(
                "  Created: {}",
                link.created_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string()
                    .bright_black()
            );
            println!();
        }
    }

    Ok(())
}

/// Runs a check without the cache so every URL reaches the API.
async fn check_urls(config: &Config, urls: Vec<String>) -> Result<()> {
    println!("{}", "🛡️  Threat check".bright_blue().bold());
    println!();

    let client = SafeBrowsingClient::new(config.threat_check_config(), Arc::new(NullCache::new()))
        .context("Failed to build threat check client")?;

    let results = client
        .check_urls(&urls)
        .await
        .map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))?;

    for result in &results {
        if result.is_safe {
            println!("  {} {}", "SAFE  ".green().bold(), result.url);
        } else {
            println!("  {} {}", "UNSAFE".red().bold(), result.url);
            for threat in &result.threats {
                println!(
                    "         {} {}",
                    threat.threat_type.yellow(),
                    threat.description.bright_black()
                );
            }
        }
    }

    let flagged = results.iter().filter(|r| !r.is_safe).count();
    println!();
    println!(
        "  Checked: {}, flagged: {}",
        results.len().to_string().bright_white().bold(),
        if flagged == 0 {
            flagged.to_string().green().bold()
        } else {
            flagged.to_string().red().bold()
        }
    );
    println!();

    Ok(())
}

async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await
                .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
