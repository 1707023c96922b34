use anyhow::Result;
use bigbrain_bot::{chain, Config, GameBot, HttpChain, VolumeBot};
use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bigbrain-bot")]
#[command(about = "BigBrain Battle Arena testnet bots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch for GameStarted events and complete games as the AI opponent
    Game,
    /// Generate randomized trading volume against the token factory
    Volume,
    /// Create a single random token and exit
    CreateToken,
    /// Deposit AVAX into the game's reward pool and exit
    Deposit {
        #[arg(required = true)]
        amount_avax: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::from_default_env().add_directive("bigbrain_bot=info".parse()?);
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Game => run_game().await,
        Commands::Volume => run_volume().await,
        Commands::CreateToken => run_create_token().await,
        Commands::Deposit { amount_avax } => run_deposit(amount_avax).await,
    }
}

fn shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current cycle");
            handle.store(true, Ordering::SeqCst);
        }
    });
    flag
}

async fn run_game() -> Result<()> {
    let config = Config::from_env()?;
    info!("starting game bot on chain {}", config.chain_id);
    let chain = Arc::new(HttpChain::connect(&config.rpc_url)?);
    let wallet = chain::wallet_from_key(&config.private_key, config.chain_id)?;
    let bot = Arc::new(GameBot::new(chain, wallet, config));
    bot.run(shutdown_flag()).await
}

async fn run_volume() -> Result<()> {
    let config = Config::from_env()?;
    info!("starting volume bot on chain {}", config.chain_id);
    let chain = Arc::new(HttpChain::connect(&config.rpc_url)?);
    let wallet = chain::wallet_from_key(&config.private_key, config.chain_id)?;
    let bot = VolumeBot::new(chain, wallet, config);
    bot.run(shutdown_flag()).await
}

async fn run_create_token() -> Result<()> {
    let config = Config::from_env()?;
    let chain = Arc::new(HttpChain::connect(&config.rpc_url)?);
    let wallet = chain::wallet_from_key(&config.private_key, config.chain_id)?;
    let bot = VolumeBot::new(chain, wallet, config);
    let spec = bigbrain_bot::policy::random_token_spec(&mut rand::thread_rng());
    bot.create_token(&spec).await?;
    Ok(())
}

async fn run_deposit(amount_avax: f64) -> Result<()> {
    let config = Config::from_env()?;
    let chain = Arc::new(HttpChain::connect(&config.rpc_url)?);
    let wallet = chain::wallet_from_key(&config.private_key, config.chain_id)?;
    let bot = GameBot::new(chain, wallet, config);
    bot.deposit_to_pool(amount_avax).await
}
