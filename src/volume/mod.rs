//! Randomized trading volume against the bonding-curve token factory:
//! buy/sell at random sizes on a random cadence, with an occasional freshly
//! created token.

use crate::chain::{
    decode_address_array, decode_string, decode_u8, decode_uint, encode_balance_of, encode_buy,
    encode_create_token, encode_get_all_tokens, encode_get_token_state, encode_last_price,
    encode_name, encode_sell, encode_symbol, ChainRpc,
};
use crate::config::Config;
use crate::error::BotError;
use crate::policy::{
    buy_amount_avax, choose_trade_side, random_token_spec, sell_fraction, should_create_token,
    wei_to_tokens, TradeSide, TokenSpec,
};
use crate::tx::{submit_call, CallRequest};
use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::{format_ether, parse_ether};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Refresh the tradeable-token list every this many cycles.
const REFRESH_EVERY_CYCLES: u64 = 20;

/// Token states the factory reports as open for trading.
const STATE_TRADING: u8 = 1;
const STATE_RESUMED: u8 = 4;

/// Minimum gas balance, in AVAX, before a token creation is attempted.
const CREATE_BALANCE_FLOOR_AVAX: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub address: Address,
    pub name: String,
    pub symbol: String,
}

pub struct VolumeBot {
    chain: Arc<dyn ChainRpc>,
    wallet: LocalWallet,
    config: Config,
}

impl VolumeBot {
    pub fn new(chain: Arc<dyn ChainRpc>, wallet: LocalWallet, config: Config) -> Self {
        Self { chain, wallet, config }
    }

    fn view_call(&self, to: Address, data: Bytes) -> TypedTransaction {
        TransactionRequest::new().from(self.wallet.address()).to(to).data(data).into()
    }

    async fn avax_balance(&self) -> Result<f64> {
        let wei = self.chain.get_balance(self.wallet.address()).await?;
        Ok(format_ether(wei).parse().unwrap_or(0.0))
    }

    async fn token_balance(&self, token: Address) -> Result<U256> {
        let data = encode_balance_of(self.wallet.address());
        let out = self.chain.call(&self.view_call(token, data)).await?;
        decode_uint(&out)
    }

    async fn last_price(&self, token: Address) -> f64 {
        let call = self.view_call(self.config.factory_contract, encode_last_price(token));
        match self.chain.call(&call).await.and_then(|out| decode_uint(&out)) {
            Ok(wei) => format_ether(wei).parse().unwrap_or(0.0),
            Err(e) => {
                warn!("could not read price for {:?}: {}", token, e);
                0.0
            }
        }
    }

    /// Pull the factory's token list and keep only the ones still trading.
    /// A token that fails its metadata reads is skipped, not fatal.
    pub async fn refresh_tokens(&self) -> Result<Vec<TokenInfo>> {
        let out = self
            .chain
            .call(&self.view_call(self.config.factory_contract, encode_get_all_tokens()))
            .await
            .context("getAllTokens call")?;
        let addresses = decode_address_array(&out)?;

        let mut tokens = Vec::new();
        for address in addresses {
            match self.read_token(address).await {
                Ok(Some(info)) => {
                    info!("  tradeable: {} ({}) - {:?}", info.name, info.symbol, address);
                    tokens.push(info);
                }
                Ok(None) => info!("  skipping {:?} (not trading)", address),
                Err(e) => warn!("  error reading token {:?}: {}", address, e),
            }
        }
        info!("loaded {} tradeable tokens", tokens.len());
        Ok(tokens)
    }

    async fn read_token(&self, address: Address) -> Result<Option<TokenInfo>> {
        let state_call =
            self.view_call(self.config.factory_contract, encode_get_token_state(address));
        let state = decode_u8(&self.chain.call(&state_call).await?)?;
        if state != STATE_TRADING && state != STATE_RESUMED {
            return Ok(None);
        }
        let name = decode_string(&self.chain.call(&self.view_call(address, encode_name())).await?)?;
        let symbol =
            decode_string(&self.chain.call(&self.view_call(address, encode_symbol())).await?)?;
        Ok(Some(TokenInfo { address, name, symbol }))
    }

    async fn submit(&self, request: CallRequest) -> Result<(), BotError> {
        let timeout = Duration::from_secs(self.config.receipt_timeout_secs);
        match submit_call(self.chain.as_ref(), &self.wallet, self.config.chain_id, request, timeout)
            .await
        {
            Ok(summary) => {
                info!("confirmed: tx {:?}, gas {}", summary.tx_hash, summary.gas_used);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn execute_buy(&self, token: &TokenInfo, amount_avax: f64) -> Result<(), BotError> {
        info!("BUY {:.6} AVAX of {} ({})", amount_avax, token.name, token.symbol);
        let value = parse_ether(amount_avax)
            .map_err(|e| BotError::SimulatedRevert(format!("bad buy amount: {}", e)))?;
        let request = CallRequest::new(self.config.factory_contract, encode_buy(token.address))
            .with_value(value);
        self.submit(request).await
    }

    async fn execute_sell(&self, token: &TokenInfo, amount: U256) -> Result<(), BotError> {
        info!("SELL {:.6} {} tokens", wei_to_tokens(amount), token.symbol);
        let request =
            CallRequest::new(self.config.factory_contract, encode_sell(token.address, amount));
        self.submit(request).await
    }

    pub async fn create_token(&self, spec: &TokenSpec) -> Result<(), BotError> {
        info!("creating token {} ({}) - image {}", spec.name, spec.symbol, spec.image_url);
        let data = encode_create_token(&spec.name, &spec.symbol, &spec.image_url, Address::zero());
        self.submit(CallRequest::new(self.config.factory_contract, data)).await
    }

    /// One trading cycle against the current token list. Returns true when
    /// the token list should be refreshed before the next cycle.
    async fn trade_cycle(&self, tokens: &[TokenInfo]) -> Result<bool> {
        let balance = self.avax_balance().await.context("balance query")?;

        let (create_roll, side_roll, size_roll, pick) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen::<f64>(),
                rng.gen::<f64>(),
                rng.gen::<f64>(),
                if tokens.is_empty() { 0 } else { rng.gen_range(0..tokens.len()) },
            )
        };

        if should_create_token(self.config.create_token_chance, create_roll)
            && balance > CREATE_BALANCE_FLOOR_AVAX
        {
            let spec = {
                let mut rng = rand::thread_rng();
                random_token_spec(&mut rng)
            };
            if let Err(e) = self.create_token(&spec).await {
                warn!("token creation failed: {}", e);
            }
            return Ok(true);
        }

        if tokens.is_empty() || balance < self.config.min_trade_avax * 2.0 {
            info!("skipping cycle: {} tokens, {:.6} AVAX", tokens.len(), balance);
            return Ok(tokens.is_empty());
        }

        let token = &tokens[pick];
        let holdings = self.token_balance(token.address).await.unwrap_or_default();
        let price = self.last_price(token.address).await;
        info!(
            "selected {} ({}): holdings {:.6}, price {:.8} AVAX, balance {:.6} AVAX",
            token.name,
            token.symbol,
            wei_to_tokens(holdings),
            price,
            balance
        );

        match choose_trade_side(holdings, side_roll) {
            TradeSide::Buy => {
                let amount = buy_amount_avax(
                    self.config.min_trade_avax,
                    self.config.max_trade_avax,
                    balance,
                    size_roll,
                );
                if let Err(e) = self.execute_buy(token, amount).await {
                    warn!("buy failed: {}", e);
                }
            }
            TradeSide::Sell => {
                let fraction = sell_fraction(size_roll);
                let amount = holdings / U256::from(1000u64)
                    * U256::from((fraction * 1000.0) as u64);
                if amount.is_zero() {
                    info!("not enough tokens to sell");
                } else if let Err(e) = self.execute_sell(token, amount).await {
                    warn!("sell failed: {}", e);
                }
            }
        }
        Ok(false)
    }

    pub async fn run(&self, shutdown: Arc<AtomicBool>) -> Result<()> {
        let starting_balance = self.avax_balance().await.context("startup balance query")?;
        info!("volume bot starting");
        info!("account: {:?}", self.wallet.address());
        info!("factory: {:?}", self.config.factory_contract);
        info!("starting balance: {:.6} AVAX", starting_balance);
        info!(
            "trade size {:.4}-{:.4} AVAX, interval {}-{}s, create chance {:.1}%",
            self.config.min_trade_avax,
            self.config.max_trade_avax,
            self.config.min_interval_secs,
            self.config.max_interval_secs,
            self.config.create_token_chance * 100.0
        );

        let mut tokens = self.refresh_tokens().await.unwrap_or_else(|e| {
            warn!("initial token fetch failed: {}", e);
            Vec::new()
        });

        let mut cycle: u64 = 0;
        while !shutdown.load(Ordering::SeqCst) {
            cycle += 1;
            info!("[{}] cycle #{}", chrono::Local::now().format("%H:%M:%S"), cycle);

            let stale = cycle % REFRESH_EVERY_CYCLES == 0 || tokens.is_empty();
            if stale {
                match self.refresh_tokens().await {
                    Ok(t) => tokens = t,
                    Err(e) => warn!("token refresh failed: {}", e),
                }
            }

            match self.trade_cycle(&tokens).await {
                Ok(true) => match self.refresh_tokens().await {
                    Ok(t) => tokens = t,
                    Err(e) => warn!("token refresh failed: {}", e),
                },
                Ok(false) => {}
                Err(e) => warn!("cycle error: {} - continuing", e),
            }

            if cycle % 10 == 0 {
                if let Ok(balance) = self.avax_balance().await {
                    info!("status: cycle #{}, balance {:.6} AVAX, {} tokens", cycle, balance, tokens.len());
                }
            }

            let delay = {
                let mut rng = rand::thread_rng();
                rng.gen_range(self.config.min_interval_secs..=self.config.max_interval_secs)
            };
            info!("waiting {}s until next trade", delay);
            tokio::time::sleep(Duration::from_secs(delay)).await;
        }

        let ending_balance = self.avax_balance().await.unwrap_or(starting_balance);
        let delta = ending_balance - starting_balance;
        info!("stopped after {} cycles", cycle);
        info!("starting balance: {:.6} AVAX", starting_balance);
        info!("ending balance: {:.6} AVAX ({:+.6})", ending_balance, delta);
        Ok(())
    }
}
