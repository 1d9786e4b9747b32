use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use newswatch::{HistoryFilter, NewsApiConfig, NewsWatch, RefreshOutcome, SearchOutcome, User};
use tracing::info;
use uuid::Uuid;

/// Keyword news tracking: quota-gated searches against a news provider,
/// cached results, cooldown-limited refreshes, and a filterable history.
///
/// The `batch-refresh` subcommand is meant to be driven by an external
/// scheduler such as cron; hourly is the documented default interval.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// News provider API key
    #[arg(long, env = "NEWS_API_KEY", default_value = "")]
    api_key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema (idempotent)
    Init,
    /// Register a user; non-privileged users get a profile with the default quota
    AddUser {
        username: String,
        #[arg(long)]
        staff: bool,
        #[arg(long)]
        superuser: bool,
    },
    /// Set a user's keyword quota
    SetQuota { username: String, quota: i32 },
    /// Block or unblock a user
    Block {
        username: String,
        #[arg(long)]
        unblock: bool,
    },
    /// Search the news provider for a keyword and persist the results
    Search {
        username: String,
        keyword: String,
        /// Bypass the 15-minute recency check
        #[arg(long)]
        force: bool,
    },
    /// Fetch newer articles for an existing keyword search
    Refresh { username: String, search_id: Uuid },
    /// Show the user's tracked keywords and their articles
    History {
        username: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Refresh every tracked keyword system-wide (scheduler entry point)
    BatchRefresh,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = NewsApiConfig {
        api_key: cli.api_key.clone(),
        ..NewsApiConfig::default()
    };

    let watch = NewsWatch::connect(&cli.database_url, config)
        .await
        .context("failed to connect to the database")?;

    match cli.command {
        Command::Init => {
            watch.setup_schema().await?;
            println!("schema ready");
        }
        Command::AddUser {
            username,
            staff,
            superuser,
        } => {
            let user = watch.create_user(&username, staff, superuser).await?;
            println!("created user {} ({})", user.username, user.id);
        }
        Command::SetQuota { username, quota } => {
            let user = require_user(&watch, &username).await?;
            watch.set_quota(user.id, quota).await?;
            println!("quota for {} set to {}", username, quota);
        }
        Command::Block { username, unblock } => {
            let user = require_user(&watch, &username).await?;
            watch.set_blocked(user.id, !unblock).await?;
            println!(
                "{} is now {}",
                username,
                if unblock { "unblocked" } else { "blocked" }
            );
        }
        Command::Search {
            username,
            keyword,
            force,
        } => {
            let user = require_user(&watch, &username).await?;
            match watch.search(&user, &keyword, force).await? {
                SearchOutcome::Fetched {
                    search,
                    articles,
                    remaining_quota,
                } => {
                    println!(
                        "fetched {} articles for '{}' (search {})",
                        articles.len(),
                        search.keyword,
                        search.id
                    );
                    if let Some(remaining) = remaining_quota {
                        println!("remaining keyword quota: {}", remaining);
                    }
                }
                SearchOutcome::NeedsConfirmation { search, articles } => {
                    println!(
                        "'{}' was searched at {}; {} stored articles follow. \
                         Re-run with --force to fetch again.",
                        search.keyword,
                        search.searched_at,
                        articles.len()
                    );
                    for article in &articles {
                        println!("  {} | {} | {}", article.published_at, article.source_name, article.title);
                    }
                }
            }
        }
        Command::Refresh {
            username,
            search_id,
        } => {
            let user = require_user(&watch, &username).await?;
            match watch.refresh(&user, search_id).await? {
                RefreshOutcome::Refreshed { new_articles } => {
                    println!("refresh added {} new articles", new_articles);
                }
                RefreshOutcome::RateLimited { next_allowed_at } => {
                    println!("refresh rate limited; try again after {}", next_allowed_at);
                }
            }
        }
        Command::History {
            username,
            date,
            source,
            language,
        } => {
            let user = require_user(&watch, &username).await?;
            let filter = HistoryFilter {
                date,
                source,
                language,
            };
            let history = watch.history(&user, &filter).await?;

            for entry in &history.entries {
                println!(
                    "{} (searched {}, {} articles)",
                    entry.search.keyword,
                    entry.search.searched_at,
                    entry.articles.len()
                );
                for article in &entry.articles {
                    println!(
                        "  {} | {} | {} | {}",
                        article.published_at, article.source_name, article.language, article.title
                    );
                }
            }
            println!("sources: {}", history.sources.join(", "));
            println!("languages: {}", history.languages.join(", "));
        }
        Command::BatchRefresh => {
            let outcome = watch.run_batch_refresh().await?;
            info!(
                "batch refresh done: {} keywords, {} failed, {} new articles",
                outcome.keywords_total, outcome.keywords_failed, outcome.articles_added
            );
            println!(
                "refreshed {} keywords ({} failed), {} new articles",
                outcome.keywords_total, outcome.keywords_failed, outcome.articles_added
            );
        }
    }

    Ok(())
}

async fn require_user(watch: &NewsWatch, username: &str) -> anyhow::Result<User> {
    match watch.find_user(username).await? {
        Some(user) => Ok(user),
        None => bail!("no such user: {}", username),
    }
}
