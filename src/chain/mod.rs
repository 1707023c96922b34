mod contracts;

pub use contracts::{
    decode_address_array, decode_game_started, decode_string, decode_u8, decode_uint,
    encode_balance_of, encode_buy, encode_calculate_potential_reward, encode_complete_game,
    encode_create_token, encode_deposit_avax, encode_get_all_tokens, encode_get_avax_reward_pool,
    encode_get_token_state, encode_last_price, encode_name, encode_sell, encode_symbol,
    game_started_topic, GameStartedEvent,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;

#[derive(Debug, Clone)]
pub struct ContractConfig {
    pub game: String,
    pub factory: String,
}

pub fn get_contract_config(chain_id: u64) -> ContractConfig {
    match chain_id {
        43113 => ContractConfig {
            game: "0x7D56425650a0EFf5111c79c39A27319Ca45138a1".to_string(),
            factory: "0xf6970088B8488d44d3efe52e647A9217041142F7".to_string(),
        },
        _ => panic!("Unsupported chain ID: {}. Use 43113 (Avalanche Fuji)", chain_id),
    }
}

pub fn wallet_from_key(private_key: &str, chain_id: u64) -> Result<LocalWallet> {
    let key = private_key.trim_start_matches("0x");
    let bytes = hex::decode(key).context("invalid private key hex")?;
    let wallet = LocalWallet::from_bytes(&bytes).context("wallet from bytes")?;
    Ok(wallet.with_chain_id(chain_id))
}

/// The RPC operations the loops and the submitter need. A trait so tests can
/// run against a recording mock instead of a live endpoint.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn get_balance(&self, address: Address) -> Result<U256>;
    async fn get_block_number(&self) -> Result<u64>;
    async fn get_gas_price(&self) -> Result<U256>;
    async fn get_transaction_count(&self, address: Address) -> Result<U256>;
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256>;
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256>;
    async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>>;
    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>>;
}

/// Pass-through over an HTTP JSON-RPC provider. No caching, no batching.
pub struct HttpChain {
    provider: Provider<Http>,
}

impl HttpChain {
    pub fn connect(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url).context("bad RPC url")?;
        Ok(Self { provider })
    }
}

#[async_trait]
impl ChainRpc for HttpChain {
    async fn get_balance(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_balance(address, None).await?)
    }

    async fn get_block_number(&self) -> Result<u64> {
        Ok(self.provider.get_block_number().await?.as_u64())
    }

    async fn get_gas_price(&self) -> Result<U256> {
        Ok(self.provider.get_gas_price().await?)
    }

    async fn get_transaction_count(&self, address: Address) -> Result<U256> {
        Ok(self.provider.get_transaction_count(address, None).await?)
    }

    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        Ok(self.provider.call(tx, None).await?)
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256> {
        Ok(self.provider.estimate_gas(tx, None).await?)
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> Result<H256> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        // we poll for the receipt ourselves; only the hash is needed here
        Ok(*pending)
    }

    async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        Ok(self.provider.get_transaction_receipt(hash).await?)
    }

    async fn get_logs(&self, filter: &Filter) -> Result<Vec<Log>> {
        Ok(self.provider.get_logs(filter).await?)
    }
}
