use crate::chain::get_contract_config;
use anyhow::{Context, Result};
use ethers::types::Address;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub private_key: String,
    pub rpc_url: String,
    pub chain_id: u64,
    pub game_contract: Address,
    pub factory_contract: Address,
    /// Trade size bounds for the volume bot, in whole AVAX.
    pub min_trade_avax: f64,
    pub max_trade_avax: f64,
    /// Sleep bounds between volume-bot cycles, seconds.
    pub min_interval_secs: u64,
    pub max_interval_secs: u64,
    /// Probability of creating a new token on a cycle, in [0, 1].
    pub create_token_chance: f64,
    /// Game feed polling cadence, seconds.
    pub poll_interval_secs: u64,
    /// How long to wait for a transaction receipt before giving up.
    pub receipt_timeout_secs: u64,
    /// Warn when the AVAX reward pool drops below this, in whole AVAX.
    pub pool_warn_avax: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let private_key = env::var("BOT_PRIVATE_KEY").context("BOT_PRIVATE_KEY not set")?;
        let private_key = private_key.trim().to_string();

        let chain_id: u64 = env::var("CHAIN_ID")
            .unwrap_or_else(|_| "43113".to_string())
            .parse()
            .unwrap_or(43113);

        let rpc_url = env::var("RPC_URL")
            .unwrap_or_else(|_| "https://api.avax-test.network/ext/bc/C/rpc".to_string());

        let defaults = get_contract_config(chain_id);
        let game_contract = env::var("GAME_CONTRACT_ADDRESS")
            .unwrap_or(defaults.game)
            .parse::<Address>()
            .context("GAME_CONTRACT_ADDRESS is not a valid address")?;
        let factory_contract = env::var("FACTORY_ADDRESS")
            .unwrap_or(defaults.factory)
            .parse::<Address>()
            .context("FACTORY_ADDRESS is not a valid address")?;

        let min_trade_avax: f64 = env::var("MIN_TRADE_AVAX")
            .unwrap_or_else(|_| "0.001".to_string())
            .parse()
            .unwrap_or(0.001);
        let max_trade_avax: f64 = env::var("MAX_TRADE_AVAX")
            .unwrap_or_else(|_| "0.01".to_string())
            .parse()
            .unwrap_or(0.01);

        let min_interval_secs: u64 = env::var("MIN_INTERVAL_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let max_interval_secs: u64 = env::var("MAX_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let create_token_chance: f64 = env::var("CREATE_TOKEN_CHANCE")
            .unwrap_or_else(|_| "0.05".to_string())
            .parse()
            .unwrap_or(0.05);

        let poll_interval_secs: u64 = env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .unwrap_or(3);
        let receipt_timeout_secs: u64 = env::var("RECEIPT_TIMEOUT_SECS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .unwrap_or(120);
        let pool_warn_avax: f64 = env::var("POOL_WARN_AVAX")
            .unwrap_or_else(|_| "0.01".to_string())
            .parse()
            .unwrap_or(0.01);

        let config = Config {
            private_key,
            rpc_url,
            chain_id,
            game_contract,
            factory_contract,
            min_trade_avax,
            max_trade_avax,
            min_interval_secs,
            max_interval_secs,
            create_token_chance,
            poll_interval_secs,
            receipt_timeout_secs,
            pool_warn_avax,
        };
        config.validate()?;
        Ok(config)
    }

    /// Fail fast on nonsense before any loop starts.
    fn validate(&self) -> Result<()> {
        crate::chain::wallet_from_key(&self.private_key, self.chain_id)
            .context("BOT_PRIVATE_KEY is not a valid secp256k1 key")?;
        if self.min_trade_avax <= 0.0 || self.max_trade_avax < self.min_trade_avax {
            anyhow::bail!(
                "bad trade bounds: min={} max={}",
                self.min_trade_avax,
                self.max_trade_avax
            );
        }
        if self.max_interval_secs < self.min_interval_secs {
            anyhow::bail!(
                "bad interval bounds: min={} max={}",
                self.min_interval_secs,
                self.max_interval_secs
            );
        }
        if !(0.0..=1.0).contains(&self.create_token_chance) {
            anyhow::bail!("CREATE_TOKEN_CHANCE must be in [0, 1]");
        }
        Ok(())
    }
}
