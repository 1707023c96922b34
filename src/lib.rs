pub mod chain;
pub mod config;
pub mod error;
pub mod feed;
pub mod game;
pub mod policy;
pub mod tx;
pub mod volume;

pub use chain::{ChainRpc, GameStartedEvent, HttpChain};
pub use config::Config;
pub use error::BotError;
pub use feed::{run_game_feed, ProcessedSet};
pub use game::GameBot;
pub use policy::{decide_outcome, GameKind, Outcome};
pub use tx::{submit_call, CallRequest, TxSummary};
pub use volume::VolumeBot;
