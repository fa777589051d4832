use anyhow::Context;
use clap::{Parser, Subcommand};
use memedash::app::LiveListClient;
use memedash::config::Config;
use memedash::feeds::api::ApiClient;
use memedash::feeds::{AlertStatus, Backend, TokenRequest};
use memedash::tokens::DEFAULT_SUPPLY;
use serde::Serialize;
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Terminal dashboard for meme-coin alerts, influencer tweets and creator tokens.
#[derive(Parser)]
#[command(name = "memedash", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the server base URL from the config.
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the live dashboard (default).
    Dashboard,
    /// Print the current alert page.
    Alerts,
    /// Print recent influencer tweets.
    Tweets,
    /// Print creator tokens.
    Tokens,
    /// Print tracked influencers.
    Influencers,
    /// Print one alert.
    Alert { id: String },
    /// Change an alert's status.
    SetStatus { id: String, status: AlertStatus },
    /// Dismiss an alert.
    Dismiss { id: String },
    /// Scan trending memes for new matches.
    Scan,
    /// Analyze a piece of content for meme potential.
    Analyze { content: String },
    /// Run a safety analysis on a coin contract.
    AnalyzeCoin {
        address: String,
        #[arg(long, default_value = "ethereum")]
        blockchain: String,
    },
    /// Create a creator token.
    CreateToken {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        creator: String,
        #[arg(long, default_value_t = DEFAULT_SUPPLY)]
        supply: u64,
        #[arg(long, default_value = "")]
        description: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Dashboard);

    init_tracing(matches!(command, Commands::Dashboard))?;

    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let config = Config::load(cli.config.as_deref())
        .context("failed to load config")?
        .with_base_url(cli.base_url);

    if let Commands::Dashboard = command {
        let client = LiveListClient::from_config(&config);
        return memedash::ui::run(client, &config).await;
    }

    let api = ApiClient::new(
        &config.server.base_url,
        Duration::from_secs(config.server.request_timeout_secs),
    );
    run_command(&api, command).await
}

async fn run_command(api: &dyn Backend, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Dashboard => Ok(()),
        Commands::Alerts => print_json(&api.fetch_alerts().await?),
        Commands::Tweets => print_json(&api.fetch_tweets().await?),
        Commands::Tokens => print_json(&api.fetch_tokens().await?),
        Commands::Influencers => print_json(&api.fetch_influencers().await?),
        Commands::Alert { id } => print_json(&api.fetch_alert(&id).await?),
        Commands::SetStatus { id, status } => {
            api.update_alert_status(&id, status).await?;
            println!("Alert {} marked {}", id, status);
            Ok(())
        }
        Commands::Dismiss { id } => {
            api.update_alert_status(&id, AlertStatus::Dismissed).await?;
            println!("Alert {} dismissed", id);
            Ok(())
        }
        Commands::Scan => {
            let summary = api.scan_trending().await?;
            println!("Found {} trending memes", summary.count);
            Ok(())
        }
        Commands::Analyze { content } => {
            if content.trim().is_empty() {
                anyhow::bail!("Please enter content to analyze");
            }
            print_json(&api.analyze_content(&content).await?)
        }
        Commands::AnalyzeCoin {
            address,
            blockchain,
        } => {
            if address.trim().is_empty() {
                anyhow::bail!("Please enter a coin address");
            }
            print_json(&api.analyze_coin(&address, &blockchain).await?)
        }
        Commands::CreateToken {
            name,
            symbol,
            creator,
            supply,
            description,
        } => {
            let request = TokenRequest {
                name,
                symbol: symbol.to_uppercase(),
                creator: creator.trim_start_matches('@').to_string(),
                initial_supply: supply,
                description,
            };
            request.validate()?;
            print_json(&api.create_token(&request).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The dashboard owns the terminal, so it logs to a file under the cache dir.
/// One-shot commands log to stderr.
fn init_tracing(to_file: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("memedash=info"));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(());
    }

    let Some(dir) = dirs::cache_dir().map(|d| d.join("memedash")) else {
        return Ok(());
    };
    fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    let file = File::create(dir.join("memedash.log")).context("opening log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}
