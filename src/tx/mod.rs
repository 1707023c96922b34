//! Build, sign, broadcast, and classify one contract call at a time.
//!
//! Gas estimation runs first and acts as the error-avoidance gate: if the
//! dry run fails nothing is ever broadcast. One broadcast per successful
//! build; a fresh attempt, if the caller makes one, re-reads a fresh nonce.

use crate::chain::ChainRpc;
use crate::error::BotError;
use ethers::prelude::*;
use ethers::signers::Signer;
use ethers::types::transaction::eip2718::TypedTransaction;
use std::time::Duration;
use tracing::{debug, info};

/// Fixed headroom added to the gas estimate.
pub const GAS_BUFFER: u64 = 50_000;

/// Cadence of receipt polls while waiting for inclusion.
const RECEIPT_POLL_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct CallRequest {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl CallRequest {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self { to, data, value: U256::zero() }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

/// What a successful submission looked like on chain.
#[derive(Debug, Clone)]
pub struct TxSummary {
    pub tx_hash: H256,
    pub gas_used: U256,
}

pub async fn submit_call(
    chain: &dyn ChainRpc,
    wallet: &LocalWallet,
    chain_id: u64,
    request: CallRequest,
    receipt_timeout: Duration,
) -> Result<TxSummary, BotError> {
    let from = wallet.address();

    let mut tx = TransactionRequest::new()
        .from(from)
        .to(request.to)
        .data(request.data)
        .value(request.value)
        .chain_id(chain_id);
    let probe: TypedTransaction = tx.clone().into();

    // Dry run. A failure here means the call would revert; abort before
    // anything is signed or sent.
    let gas_estimate = chain
        .estimate_gas(&probe)
        .await
        .map_err(|e| BotError::SimulatedRevert(e.to_string()))?;
    debug!("gas estimate: {}", gas_estimate);

    let nonce = chain
        .get_transaction_count(from)
        .await
        .map_err(|e| BotError::Connectivity(e.to_string()))?;
    let gas_price = chain
        .get_gas_price()
        .await
        .map_err(|e| BotError::Connectivity(e.to_string()))?;

    tx = tx
        .gas(gas_estimate + U256::from(GAS_BUFFER))
        .gas_price(gas_price)
        .nonce(nonce);
    let typed: TypedTransaction = tx.into();

    let signature = wallet
        .sign_transaction(&typed)
        .await
        .map_err(|e| BotError::Connectivity(format!("signing failed: {}", e)))?;
    let raw = typed.rlp_signed(&signature);

    let tx_hash = chain
        .send_raw_transaction(raw)
        .await
        .map_err(|e| BotError::Connectivity(e.to_string()))?;
    info!("transaction sent: {:?} (nonce {})", tx_hash, nonce);

    wait_for_receipt(chain, tx_hash, receipt_timeout).await
}

/// Poll until the receipt shows up or the timeout elapses. A timeout is
/// ambiguous: the transaction may still land later and is not replaced.
async fn wait_for_receipt(
    chain: &dyn ChainRpc,
    tx_hash: H256,
    timeout: Duration,
) -> Result<TxSummary, BotError> {
    let started = tokio::time::Instant::now();
    loop {
        match chain.get_transaction_receipt(tx_hash).await {
            Ok(Some(receipt)) => {
                let gas_used = receipt.gas_used.unwrap_or_default();
                return if receipt.status == Some(U64::one()) {
                    Ok(TxSummary { tx_hash, gas_used })
                } else {
                    Err(BotError::OnChainRevert { tx_hash, gas_used })
                };
            }
            Ok(None) => {}
            // transient lookup failures just mean we ask again
            Err(e) => debug!("receipt poll failed: {}", e),
        }
        if started.elapsed() >= timeout {
            return Err(BotError::Timeout { tx_hash });
        }
        tokio::time::sleep(Duration::from_secs(RECEIPT_POLL_SECS)).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Recording fake for the RPC boundary. Counters let tests assert what
    /// was (and was not) sent.
    pub(crate) struct MockChain {
        pub estimate_fails: bool,
        pub receipt_status: Option<u64>,
        pub receipt_gas_used: u64,
        pub send_calls: AtomicUsize,
        pub estimate_calls: AtomicUsize,
        pub logs: Mutex<Vec<Log>>,
        pub block_number: AtomicUsize,
    }

    impl Default for MockChain {
        fn default() -> Self {
            Self {
                estimate_fails: false,
                receipt_status: Some(1),
                receipt_gas_used: 21_000,
                send_calls: AtomicUsize::new(0),
                estimate_calls: AtomicUsize::new(0),
                logs: Mutex::new(Vec::new()),
                block_number: AtomicUsize::new(100),
            }
        }
    }

    #[async_trait]
    impl ChainRpc for MockChain {
        async fn get_balance(&self, _address: Address) -> Result<U256> {
            Ok(U256::exp10(18))
        }

        async fn get_block_number(&self) -> Result<u64> {
            Ok(self.block_number.load(Ordering::SeqCst) as u64)
        }

        async fn get_gas_price(&self) -> Result<U256> {
            Ok(U256::from(25_000_000_000u64))
        }

        async fn get_transaction_count(&self, _address: Address) -> Result<U256> {
            Ok(U256::from(7u64))
        }

        async fn call(&self, _tx: &TypedTransaction) -> Result<Bytes> {
            Ok(Bytes::from(vec![0u8; 32]))
        }

        async fn estimate_gas(&self, _tx: &TypedTransaction) -> Result<U256> {
            self.estimate_calls.fetch_add(1, Ordering::SeqCst);
            if self.estimate_fails {
                anyhow::bail!("execution reverted: Insufficient AVAX reward pool");
            }
            Ok(U256::from(90_000u64))
        }

        async fn send_raw_transaction(&self, _raw: Bytes) -> Result<H256> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            Ok(H256::repeat_byte(0xab))
        }

        async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
            Ok(self.receipt_status.map(|status| TransactionReceipt {
                transaction_hash: hash,
                status: Some(U64::from(status)),
                gas_used: Some(U256::from(self.receipt_gas_used)),
                ..Default::default()
            }))
        }

        async fn get_logs(&self, _filter: &Filter) -> Result<Vec<Log>> {
            Ok(self.logs.lock().unwrap().clone())
        }
    }

    pub(crate) fn test_wallet() -> LocalWallet {
        crate::chain::wallet_from_key(
            "0x0000000000000000000000000000000000000000000000000000000000000001",
            43113,
        )
        .unwrap()
    }

    fn request() -> CallRequest {
        CallRequest::new(Address::repeat_byte(0x11), Bytes::from(vec![0xf0, 0x88, 0xd5, 0x47]))
    }

    #[tokio::test]
    async fn estimate_failure_sends_nothing() {
        let chain = MockChain { estimate_fails: true, ..Default::default() };
        let result =
            submit_call(&chain, &test_wallet(), 43113, request(), Duration::from_secs(1)).await;
        match result {
            Err(BotError::SimulatedRevert(_)) => {}
            other => panic!("expected SimulatedRevert, got {:?}", other),
        }
        assert_eq!(chain.send_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chain.estimate_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn success_reports_gas_used_and_sends_once() {
        let chain = MockChain::default();
        let summary = submit_call(&chain, &test_wallet(), 43113, request(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(summary.gas_used, U256::from(21_000u64));
        assert_eq!(chain.send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_receipt_classifies_as_on_chain_revert() {
        let chain = MockChain {
            receipt_status: Some(0),
            receipt_gas_used: 60_123,
            ..Default::default()
        };
        let result =
            submit_call(&chain, &test_wallet(), 43113, request(), Duration::from_secs(5)).await;
        match result {
            Err(BotError::OnChainRevert { gas_used, .. }) => {
                assert_eq!(gas_used, U256::from(60_123u64));
            }
            other => panic!("expected OnChainRevert, got {:?}", other),
        }
        // gas was spent: the broadcast happened exactly once
        assert_eq!(chain.send_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn missing_receipt_times_out() {
        let chain = MockChain { receipt_status: None, ..Default::default() };
        let result =
            submit_call(&chain, &test_wallet(), 43113, request(), Duration::from_secs(10)).await;
        match result {
            Err(BotError::Timeout { .. }) => {}
            other => panic!("expected Timeout, got {:?}", other),
        }
    }
}
