use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{self, EnvFilter};

use gitscout::client::SearchClient;
use gitscout::config::{ClientConfig, NavigationConfig};
use gitscout::navigation::{
    FileSessionStore, MemoryHistory, MemorySessionStore, NavigationController, SessionStore,
};
use gitscout::view::TerminalView;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Search GitHub repositories from the terminal",
    long_about = None
)]
#[command(propagate_version = true)]
struct Cli {
    /// Root of the GitHub REST API (overrides GITSCOUT_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<url::Url>,

    /// Results per page, 1-100 (overrides GITSCOUT_PER_PAGE)
    #[arg(long, global = true)]
    per_page: Option<u8>,

    /// Seconds a search result stays cached (overrides GITSCOUT_CACHE_TTL_SECS)
    #[arg(long, global = true)]
    cache_ttl_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search and print the results
    Search {
        /// Search query; may contain qualifiers like 'language:rust'
        ///
        /// Empty searches the most-starred repositories.
        #[arg(default_value = "")]
        query: String,

        /// Result page number
        #[arg(long, default_value = "1")]
        page: u32,

        /// Print the raw result page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse results interactively; the last query and page are restored on the next run
    Browse {
        /// Session file (defaults to the user cache directory)
        #[arg(long)]
        session_file: Option<PathBuf>,

        /// Milliseconds of idle input before a typed query is searched
        #[arg(long, default_value = "400")]
        debounce_ms: u64,
    },
}

const BROWSE_HELP: &str = "\
Type a query to search. Commands:
  :n / :p       next / previous page
  :page N       jump to page N
  :b / :f       history back / forward
  :o N          open details of card N
  :c            clear the query
  :q            quit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr) // Use stderr for logging
        .with_target(false)
        .init();

    let mut config = ClientConfig::from_env();
    if let Some(api_base) = cli.api_base {
        config.api_base = api_base;
    }
    if let Some(per_page) = cli.per_page {
        if !(1..=100).contains(&per_page) {
            bail!("--per-page must be between 1 and 100");
        }
        config.per_page = per_page;
    }
    if let Some(secs) = cli.cache_ttl_secs {
        config.cache_ttl = Duration::from_secs(secs);
    }
    tracing::debug!("Using API base {}", config.api_base);

    match cli.command {
        Commands::Search { query, page, json } => run_search(config, &query, page, json).await,
        Commands::Browse {
            session_file,
            debounce_ms,
        } => run_browse(config, session_file, Duration::from_millis(debounce_ms)).await,
    }
}

async fn run_search(config: ClientConfig, query: &str, page: u32, json: bool) -> Result<()> {
    let per_page = config.per_page;
    let client = Arc::new(SearchClient::new(config));

    if json {
        let result = client.search(query, page, per_page).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let nav = NavigationController::new(
        client,
        Arc::new(TerminalView::new()),
        Arc::new(MemoryHistory::default()),
        Arc::new(MemorySessionStore::new()),
        NavigationConfig {
            per_page,
            ..NavigationConfig::default()
        },
    );
    nav.navigate(query, page).await;
    Ok(())
}

async fn run_browse(
    config: ClientConfig,
    session_file: Option<PathBuf>,
    debounce: Duration,
) -> Result<()> {
    let per_page = config.per_page;
    let session_path = session_file.unwrap_or_else(FileSessionStore::default_path);
    tracing::info!("Using session file {}", session_path.display());
    let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::open(session_path));

    let nav = Arc::new(NavigationController::new(
        Arc::new(SearchClient::new(config)),
        Arc::new(TerminalView::new()),
        Arc::new(MemoryHistory::default()),
        session,
        NavigationConfig { debounce, per_page },
    ));

    println!("{}", BROWSE_HELP);
    nav.start().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let mut parts = line.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default();
        let argument = parts.next().map(str::trim);

        match command {
            "" => {}
            ":q" => break,
            ":h" | ":help" => println!("{}", BROWSE_HELP),
            ":n" => {
                if !nav.go_next().await {
                    println!("(already on the last page)");
                }
            }
            ":p" => {
                if !nav.go_prev().await {
                    println!("(already on the first page)");
                }
            }
            ":page" => match argument.and_then(|a| a.parse::<u32>().ok()) {
                Some(n) if n >= 1 => nav.set_page(n).await,
                _ => println!("usage: :page N"),
            },
            ":b" => {
                if !nav.go_back().await {
                    println!("(no earlier entry)");
                }
            }
            ":f" => {
                if !nav.go_forward().await {
                    println!("(no later entry)");
                }
            }
            ":c" => nav.clear_query().await,
            ":o" => {
                let results = nav.results();
                match argument
                    .and_then(|a| a.parse::<usize>().ok())
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| results.get(i))
                {
                    Some(repo) => {
                        nav.open_detail(repo).await;
                    }
                    None => println!("usage: :o N (1-{})", results.len()),
                }
            }
            other if other.starts_with(':') => println!("unknown command {}, :h for help", other),
            _ => nav.schedule_query(line),
        }
    }

    nav.shutdown();
    Ok(())
}
