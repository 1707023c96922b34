//! The arena opponent: watches `GameStarted` and completes each game with a
//! randomized outcome and a line of flavor text.

mod messages;

use crate::chain::{
    encode_calculate_potential_reward, encode_complete_game, encode_deposit_avax,
    encode_get_avax_reward_pool, ChainRpc, GameStartedEvent,
};
use crate::config::Config;
use crate::error::BotError;
use crate::feed::{run_game_feed, ProcessedSet};
use crate::policy::{decide_outcome, wei_to_tokens, GameKind, Outcome};
use crate::tx::{submit_call, CallRequest};
use anyhow::{Context, Result};
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::utils::{format_ether, parse_ether};
use rand::Rng;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How many handled game ids the dedup window remembers.
const PROCESSED_CAPACITY: usize = 1024;

pub struct GameBot {
    chain: Arc<dyn ChainRpc>,
    wallet: LocalWallet,
    config: Config,
}

impl GameBot {
    pub fn new(chain: Arc<dyn ChainRpc>, wallet: LocalWallet, config: Config) -> Self {
        Self { chain, wallet, config }
    }

    fn view_call(&self, data: Bytes) -> TypedTransaction {
        TransactionRequest::new()
            .from(self.wallet.address())
            .to(self.config.game_contract)
            .data(data)
            .into()
    }

    async fn reward_pool(&self) -> Result<U256> {
        let out = self.chain.call(&self.view_call(encode_get_avax_reward_pool())).await?;
        crate::chain::decode_uint(&out)
    }

    /// Best effort; the completion still goes out if the preview call fails.
    async fn potential_reward(&self, burned: U256, game_type: u8, outcome: Outcome) -> U256 {
        let data = encode_calculate_potential_reward(burned, game_type, outcome.code());
        match self.chain.call(&self.view_call(data)).await.and_then(|out| {
            crate::chain::decode_uint(&out)
        }) {
            Ok(v) => v,
            Err(e) => {
                warn!("could not preview reward: {}", e);
                U256::zero()
            }
        }
    }

    async fn check_reward_pool(&self) {
        match self.reward_pool().await {
            Ok(pool) => {
                let pool_avax: f64 = format_ether(pool).parse().unwrap_or(0.0);
                info!("AVAX reward pool: {:.6}", pool_avax);
                if pool_avax < self.config.pool_warn_avax {
                    warn!("reward pool is low ({:.6} AVAX) - consider a deposit", pool_avax);
                }
            }
            Err(e) => warn!("could not check reward pool: {}", e),
        }
    }

    /// Soft preflight: verifies the endpoint and contract answer before the
    /// loop starts. Only connectivity to the chain itself is fatal.
    pub async fn startup_check(&self) -> Result<()> {
        let balance = self.chain.get_balance(self.wallet.address()).await.context("balance query")?;
        info!("bot wallet: {:?}", self.wallet.address());
        info!("bot balance: {} AVAX", format_ether(balance));
        let head = self.chain.get_block_number().await.context("block number query")?;
        info!("current block: {}", head);
        self.check_reward_pool().await;
        // probe with a 1000-token burn, the smallest interesting game
        let probe = self
            .potential_reward(U256::exp10(21), 0, Outcome::PlayerVictory)
            .await;
        info!("probe reward calculation: {} AVAX", format_ether(probe));
        Ok(())
    }

    /// Handle one `GameStarted` event end to end. `Ok(true)` marks the game
    /// id processed; classified failures leave it eligible for a retry on
    /// the next poll.
    pub async fn handle_game(&self, event: GameStartedEvent) -> Result<bool> {
        let burned_tokens = wei_to_tokens(event.burned_amount);
        let kind = GameKind::from_code(event.game_type);
        info!(
            "new game #{} from {:?}: type {:?}, burned {:.0} BBT",
            event.game_id, event.player, kind, burned_tokens
        );

        let (outcome, thinking_secs) = {
            let mut rng = rand::thread_rng();
            (
                decide_outcome(kind, burned_tokens, rng.gen::<f64>()),
                rng.gen_range(1..=5u64),
            )
        };

        let reward = self.potential_reward(event.burned_amount, event.game_type, outcome).await;
        let reward_avax: f64 = format_ether(reward).parse().unwrap_or(0.0);
        let ai_message = {
            let mut rng = rand::thread_rng();
            messages::compose(&mut rng, outcome, burned_tokens, reward_avax)
        };
        info!("chosen outcome: {} - \"{}\"", outcome.label(), ai_message);

        if let Ok(pool) = self.reward_pool().await {
            if pool < reward {
                warn!(
                    "reward pool short: have {} AVAX, need {} AVAX",
                    format_ether(pool),
                    format_ether(reward)
                );
                // proceed; the dry run in submit_call is the real gate
            }
        }

        // a little latency sells the illusion of deliberation
        tokio::time::sleep(Duration::from_secs(thinking_secs)).await;

        let request = CallRequest::new(
            self.config.game_contract,
            encode_complete_game(event.game_id, outcome.code(), &ai_message),
        );
        let timeout = Duration::from_secs(self.config.receipt_timeout_secs);
        match submit_call(self.chain.as_ref(), &self.wallet, self.config.chain_id, request, timeout)
            .await
        {
            Ok(summary) => {
                info!(
                    "game #{} completed: {} | reward {} AVAX | tx {:?} | gas {}",
                    event.game_id,
                    outcome.label(),
                    format_ether(reward),
                    summary.tx_hash,
                    summary.gas_used
                );
                self.check_reward_pool().await;
                Ok(true)
            }
            Err(BotError::SimulatedRevert(msg)) => {
                warn!("game #{}: completion would revert, nothing sent: {}", event.game_id, msg);
                Ok(false)
            }
            Err(BotError::OnChainRevert { tx_hash, gas_used }) => {
                warn!(
                    "game #{}: completion reverted on chain: tx {:?}, gas {} spent",
                    event.game_id, tx_hash, gas_used
                );
                Ok(false)
            }
            Err(BotError::Timeout { tx_hash }) => {
                // the tx may still land; do not mark processed, do not resend
                // blindly - the next attempt re-estimates and re-reads a
                // fresh nonce.
                warn!("game #{}: no receipt for {:?} in time", event.game_id, tx_hash);
                Ok(false)
            }
            Err(e) => {
                warn!("game #{}: {}", event.game_id, e);
                Ok(false)
            }
        }
    }

    pub async fn run(self: Arc<Self>, shutdown: Arc<AtomicBool>) -> Result<()> {
        self.startup_check().await?;
        info!("monitoring game contract {:?}", self.config.game_contract);

        let mut processed = ProcessedSet::new(PROCESSED_CAPACITY);
        let poll = Duration::from_secs(self.config.poll_interval_secs);
        let bot = self.clone();
        run_game_feed(
            self.chain.as_ref(),
            self.config.game_contract,
            poll,
            shutdown.as_ref(),
            &mut processed,
            move |event| {
                let bot = bot.clone();
                async move { bot.handle_game(event).await }
            },
        )
        .await
    }

    /// One-shot: top up the contract's AVAX reward pool.
    pub async fn deposit_to_pool(&self, amount_avax: f64) -> Result<()> {
        let amount = parse_ether(amount_avax).context("bad deposit amount")?;
        let balance = self.chain.get_balance(self.wallet.address()).await?;
        if balance < amount {
            anyhow::bail!(
                "insufficient bot balance: have {} AVAX, need {} AVAX",
                format_ether(balance),
                format_ether(amount)
            );
        }
        let request =
            CallRequest::new(self.config.game_contract, encode_deposit_avax()).with_value(amount);
        let timeout = Duration::from_secs(self.config.receipt_timeout_secs);
        let summary =
            submit_call(self.chain.as_ref(), &self.wallet, self.config.chain_id, request, timeout)
                .await?;
        info!("deposited {} AVAX to the reward pool: tx {:?}", amount_avax, summary.tx_hash);
        self.check_reward_pool().await;
        Ok(())
    }
}
