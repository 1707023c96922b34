//! Log polling for `GameStarted` events.
//!
//! Each round fetches the head height, scans a bounded backward window, and
//! hands undecoded-yet game ids to the handler. RPC failures back off and
//! retry; a bad event or a failing handler skips that one event only.

use crate::chain::{decode_game_started, game_started_topic, ChainRpc, GameStartedEvent};
use crate::error::BotError;
use anyhow::Result;
use ethers::types::{Address, Filter, U256};
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Never look back further than this many blocks in one round.
const MAX_LOOKBACK_BLOCKS: u64 = 10;

/// Sleep after a failed RPC round before trying again.
const BACKOFF_SECS: u64 = 10;

/// Fixed-capacity dedup of handled game ids. Oldest entries are evicted once
/// capacity is reached; memory only, so a restart may reprocess events still
/// inside the polling window.
pub struct ProcessedSet {
    capacity: usize,
    order: VecDeque<U256>,
    seen: HashSet<U256>,
}

impl ProcessedSet {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ProcessedSet needs room for at least one id");
        Self { capacity, order: VecDeque::with_capacity(capacity), seen: HashSet::new() }
    }

    pub fn contains(&self, id: &U256) -> bool {
        self.seen.contains(id)
    }

    pub fn insert(&mut self, id: U256) {
        if self.seen.contains(&id) {
            return;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.seen.insert(id);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One polling round over `[max(last_seen, head - lookback), head]`.
/// Returns the new last-seen height. The handler returns `Ok(true)` once an
/// event is fully handled; only then is its id marked as processed.
pub async fn poll_round<F, Fut>(
    chain: &dyn ChainRpc,
    game_contract: Address,
    last_seen: u64,
    processed: &mut ProcessedSet,
    on_game: &mut F,
) -> Result<u64>
where
    F: FnMut(GameStartedEvent) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let head = chain.get_block_number().await?;
    let from = last_seen.max(head.saturating_sub(MAX_LOOKBACK_BLOCKS));

    let filter = Filter::new()
        .address(game_contract)
        .topic0(game_started_topic())
        .from_block(from)
        .to_block(head);
    let logs = chain.get_logs(&filter).await?;

    for log in &logs {
        let event = match decode_game_started(log) {
            Ok(ev) => ev,
            Err(BotError::MalformedPayload(msg)) => {
                warn!("skipping malformed event: {}", msg);
                continue;
            }
            Err(e) => {
                warn!("skipping event: {}", e);
                continue;
            }
        };
        if processed.contains(&event.game_id) {
            continue;
        }
        let game_id = event.game_id;
        match on_game(event).await {
            Ok(true) => processed.insert(game_id),
            Ok(false) => {}
            Err(e) => warn!("handler failed for game #{}: {}", game_id, e),
        }
    }

    Ok(last_seen.max(head))
}

/// Run polling rounds until the shutdown flag flips. In-flight RPC calls are
/// not cancelled; the flag is checked between rounds.
pub async fn run_game_feed<F, Fut>(
    chain: &dyn ChainRpc,
    game_contract: Address,
    poll_interval: Duration,
    shutdown: &AtomicBool,
    processed: &mut ProcessedSet,
    mut on_game: F,
) -> Result<()>
where
    F: FnMut(GameStartedEvent) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let mut last_seen = chain.get_block_number().await?;
    info!("listening for games from block {}", last_seen);

    while !shutdown.load(Ordering::SeqCst) {
        match poll_round(chain, game_contract, last_seen, processed, &mut on_game).await {
            Ok(height) => {
                last_seen = height;
                tokio::time::sleep(poll_interval).await;
            }
            Err(e) => {
                warn!("poll failed: {} - retrying in {}s", e, BACKOFF_SECS);
                tokio::time::sleep(Duration::from_secs(BACKOFF_SECS)).await;
            }
        }
    }
    info!("game feed stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::tests::MockChain;
    use ethers::abi::{self, Token};
    use ethers::types::{Bytes, Log, H256};
    use std::sync::atomic::AtomicUsize;

    fn game_log(game_id: u64) -> Log {
        let mut id = [0u8; 32];
        id[24..].copy_from_slice(&game_id.to_be_bytes());
        let data = abi::encode(&[
            Token::Uint(U256::from(1000u64)),
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::from(1_700_000_000u64)),
        ]);
        Log {
            address: Address::repeat_byte(0x33),
            topics: vec![
                game_started_topic(),
                H256::from(id),
                H256::from(Address::repeat_byte(0x01)),
                H256::from(Address::repeat_byte(0x02)),
            ],
            data: Bytes::from(data),
            ..Default::default()
        }
    }

    #[test]
    fn processed_set_evicts_oldest_at_capacity() {
        let mut set = ProcessedSet::new(2);
        set.insert(U256::from(1u64));
        set.insert(U256::from(2u64));
        set.insert(U256::from(3u64));
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&U256::from(1u64)));
        assert!(set.contains(&U256::from(2u64)));
        assert!(set.contains(&U256::from(3u64)));
    }

    #[test]
    fn processed_set_ignores_duplicate_inserts() {
        let mut set = ProcessedSet::new(2);
        set.insert(U256::from(9u64));
        set.insert(U256::from(9u64));
        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn handled_event_is_not_redispatched_on_repoll() {
        let chain = MockChain::default();
        chain.logs.lock().unwrap().push(game_log(42));

        let contract = Address::repeat_byte(0x33);
        let mut processed = ProcessedSet::new(16);
        let calls = AtomicUsize::new(0);
        let mut handler = |_ev: GameStartedEvent| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        };

        // same log returned by two consecutive polling rounds
        let h = poll_round(&chain, contract, 100, &mut processed, &mut handler).await.unwrap();
        poll_round(&chain, contract, h, &mut processed, &mut handler).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(processed.contains(&U256::from(42u64)));
    }

    #[tokio::test]
    async fn unhandled_event_is_retried_next_round() {
        let chain = MockChain::default();
        chain.logs.lock().unwrap().push(game_log(43));

        let contract = Address::repeat_byte(0x33);
        let mut processed = ProcessedSet::new(16);
        let calls = AtomicUsize::new(0);
        let mut handler = |_ev: GameStartedEvent| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            // fail the first attempt, succeed the second
            async move { if n == 0 { anyhow::bail!("pool empty") } else { Ok(true) } }
        };

        let h = poll_round(&chain, contract, 100, &mut processed, &mut handler).await.unwrap();
        poll_round(&chain, contract, h, &mut processed, &mut handler).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(processed.contains(&U256::from(43u64)));
    }

    #[tokio::test]
    async fn malformed_log_is_skipped_without_poisoning_the_round() {
        let chain = MockChain::default();
        {
            let mut logs = chain.logs.lock().unwrap();
            let mut bad = game_log(1);
            bad.topics.truncate(2);
            logs.push(bad);
            logs.push(game_log(2));
        }

        let mut processed = ProcessedSet::new(16);
        let calls = AtomicUsize::new(0);
        let mut handler = |_ev: GameStartedEvent| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok(true) }
        };

        poll_round(&chain, Address::repeat_byte(0x33), 100, &mut processed, &mut handler)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(processed.contains(&U256::from(2u64)));
    }
}
