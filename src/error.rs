use ethers::types::{H256, U256};
use thiserror::Error;

/// Closed set of failure categories the bot loops know how to react to.
/// Everything here is non-fatal: the loops log by category and continue.
#[derive(Debug, Error)]
pub enum BotError {
    /// The RPC endpoint was unreachable or a transport call failed.
    #[error("rpc connectivity: {0}")]
    Connectivity(String),

    /// Gas estimation (dry run) failed, so the call would revert.
    /// Nothing was broadcast.
    #[error("simulation reverted: {0}")]
    SimulatedRevert(String),

    /// The transaction landed but its receipt reports failure.
    /// Gas was already spent.
    #[error("reverted on chain: {tx_hash:?} (gas used {gas_used})")]
    OnChainRevert { tx_hash: H256, gas_used: U256 },

    /// No receipt within the configured window. The transaction may still
    /// land later; there is no replacement or cancellation.
    #[error("timed out waiting for receipt of {tx_hash:?}")]
    Timeout { tx_hash: H256 },

    /// An event log that does not match the expected topic/data layout.
    /// Only that event is skipped.
    #[error("malformed event payload: {0}")]
    MalformedPayload(String),
}
