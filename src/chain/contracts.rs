//! Hand-rolled ABI surface for the arena game contract, the bonding-curve
//! token factory, and plain ERC-20 reads. Selectors and the event topic are
//! fixed wire format; the chain rejects or misdecodes anything else.

use crate::error::BotError;
use anyhow::{Context, Result};
use ethers::abi::{self, ParamType, Token};
use ethers::prelude::*;
use ethers::utils::keccak256;

// Game contract
const COMPLETE_GAME_SELECTOR: [u8; 4] = [0xf3, 0x47, 0x8a, 0xe0]; // completeGame(uint256,uint8,string)
const GET_AVAX_REWARD_POOL_SELECTOR: [u8; 4] = [0xf8, 0xb1, 0xe8, 0x1d]; // getAvaxRewardPool()
const DEPOSIT_AVAX_SELECTOR: [u8; 4] = [0x24, 0x05, 0x68, 0x67]; // depositAvax()
const CALCULATE_POTENTIAL_REWARD_SELECTOR: [u8; 4] = [0x58, 0xee, 0x25, 0xb5]; // calculatePotentialReward(uint256,uint8,uint8)

// Token factory
const BUY_SELECTOR: [u8; 4] = [0xf0, 0x88, 0xd5, 0x47]; // buy(address)
const SELL_SELECTOR: [u8; 4] = [0x6c, 0x19, 0x7f, 0xf5]; // sell(address,uint256)
const CREATE_TOKEN_SELECTOR: [u8; 4] = [0x7b, 0x15, 0x5a, 0xfa]; // createToken(string,string,string,address)
const GET_ALL_TOKENS_SELECTOR: [u8; 4] = [0x2a, 0x5c, 0x79, 0x2a]; // getAllTokens()
const LAST_PRICE_SELECTOR: [u8; 4] = [0xf5, 0xa6, 0xba, 0x2e]; // lastPrice(address)
const GET_TOKEN_STATE_SELECTOR: [u8; 4] = [0x0b, 0x3e, 0xb9, 0x70]; // getTokenState(address)

// ERC-20
const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31]; // balanceOf(address)
const NAME_SELECTOR: [u8; 4] = [0x06, 0xfd, 0xde, 0x03]; // name()
const SYMBOL_SELECTOR: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41]; // symbol()

const GAME_STARTED_SIGNATURE: &str =
    "GameStarted(uint256,address,address,uint256,uint8,uint256)";

pub fn game_started_topic() -> H256 {
    H256::from(keccak256(GAME_STARTED_SIGNATURE))
}

fn with_selector(selector: [u8; 4], tokens: &[Token]) -> Bytes {
    let mut data = Vec::from(selector);
    data.extend_from_slice(&abi::encode(tokens));
    Bytes::from(data)
}

pub fn encode_complete_game(game_id: U256, outcome: u8, ai_message: &str) -> Bytes {
    with_selector(
        COMPLETE_GAME_SELECTOR,
        &[
            Token::Uint(game_id),
            Token::Uint(U256::from(outcome)),
            Token::String(ai_message.to_string()),
        ],
    )
}

pub fn encode_get_avax_reward_pool() -> Bytes {
    Bytes::from(Vec::from(GET_AVAX_REWARD_POOL_SELECTOR))
}

pub fn encode_deposit_avax() -> Bytes {
    Bytes::from(Vec::from(DEPOSIT_AVAX_SELECTOR))
}

pub fn encode_calculate_potential_reward(burn_amount: U256, game_type: u8, outcome: u8) -> Bytes {
    with_selector(
        CALCULATE_POTENTIAL_REWARD_SELECTOR,
        &[
            Token::Uint(burn_amount),
            Token::Uint(U256::from(game_type)),
            Token::Uint(U256::from(outcome)),
        ],
    )
}

pub fn encode_buy(token: Address) -> Bytes {
    with_selector(BUY_SELECTOR, &[Token::Address(token)])
}

pub fn encode_sell(token: Address, amount: U256) -> Bytes {
    with_selector(SELL_SELECTOR, &[Token::Address(token), Token::Uint(amount)])
}

pub fn encode_create_token(name: &str, symbol: &str, image_url: &str, burn_manager: Address) -> Bytes {
    with_selector(
        CREATE_TOKEN_SELECTOR,
        &[
            Token::String(name.to_string()),
            Token::String(symbol.to_string()),
            Token::String(image_url.to_string()),
            Token::Address(burn_manager),
        ],
    )
}

pub fn encode_get_all_tokens() -> Bytes {
    Bytes::from(Vec::from(GET_ALL_TOKENS_SELECTOR))
}

pub fn encode_last_price(token: Address) -> Bytes {
    with_selector(LAST_PRICE_SELECTOR, &[Token::Address(token)])
}

pub fn encode_get_token_state(token: Address) -> Bytes {
    with_selector(GET_TOKEN_STATE_SELECTOR, &[Token::Address(token)])
}

pub fn encode_balance_of(account: Address) -> Bytes {
    with_selector(BALANCE_OF_SELECTOR, &[Token::Address(account)])
}

pub fn encode_name() -> Bytes {
    Bytes::from(Vec::from(NAME_SELECTOR))
}

pub fn encode_symbol() -> Bytes {
    Bytes::from(Vec::from(SYMBOL_SELECTOR))
}

pub fn decode_uint(data: &[u8]) -> Result<U256> {
    let out: [u8; 32] = data.try_into().context("expected a 32-byte uint return")?;
    Ok(U256::from_big_endian(&out))
}

pub fn decode_u8(data: &[u8]) -> Result<u8> {
    let v = decode_uint(data)?;
    if v > U256::from(u8::MAX) {
        anyhow::bail!("uint8 return out of range: {}", v);
    }
    Ok(v.as_u32() as u8)
}

pub fn decode_string(data: &[u8]) -> Result<String> {
    let tokens = abi::decode(&[ParamType::String], data).context("string return")?;
    match tokens.into_iter().next() {
        Some(Token::String(s)) => Ok(s),
        _ => anyhow::bail!("string return missing"),
    }
}

pub fn decode_address_array(data: &[u8]) -> Result<Vec<Address>> {
    let tokens = abi::decode(&[ParamType::Array(Box::new(ParamType::Address))], data)
        .context("address[] return")?;
    match tokens.into_iter().next() {
        Some(Token::Array(items)) => items
            .into_iter()
            .map(|t| match t {
                Token::Address(a) => Ok(a),
                _ => anyhow::bail!("non-address element in address[]"),
            })
            .collect(),
        _ => anyhow::bail!("address[] return missing"),
    }
}

/// GameStarted(uint256 indexed gameId, address indexed player,
/// address indexed token, uint256 burnedAmount, uint8 gameType,
/// uint256 timestamp)
#[derive(Debug, Clone)]
pub struct GameStartedEvent {
    pub game_id: U256,
    pub player: Address,
    pub token: Address,
    pub burned_amount: U256,
    pub game_type: u8,
    pub timestamp: U256,
}

pub fn decode_game_started(log: &Log) -> Result<GameStartedEvent, BotError> {
    if log.topics.len() != 4 {
        return Err(BotError::MalformedPayload(format!(
            "GameStarted log with {} topics",
            log.topics.len()
        )));
    }
    if log.topics[0] != game_started_topic() {
        return Err(BotError::MalformedPayload("wrong topic0".to_string()));
    }
    let game_id = U256::from_big_endian(log.topics[1].as_bytes());
    let player = Address::from_slice(&log.topics[2].as_bytes()[12..]);
    let token = Address::from_slice(&log.topics[3].as_bytes()[12..]);

    let tokens = abi::decode(
        &[ParamType::Uint(256), ParamType::Uint(8), ParamType::Uint(256)],
        &log.data,
    )
    .map_err(|e| BotError::MalformedPayload(format!("GameStarted data: {}", e)))?;

    let mut iter = tokens.into_iter();
    let burned_amount = match iter.next() {
        Some(Token::Uint(v)) => v,
        _ => return Err(BotError::MalformedPayload("missing burnedAmount".to_string())),
    };
    let game_type = match iter.next() {
        Some(Token::Uint(v)) if v <= U256::from(u8::MAX) => v.as_u32() as u8,
        _ => return Err(BotError::MalformedPayload("bad gameType".to_string())),
    };
    let timestamp = match iter.next() {
        Some(Token::Uint(v)) => v,
        _ => return Err(BotError::MalformedPayload("missing timestamp".to_string())),
    };

    Ok(GameStartedEvent { game_id, player, token, burned_amount, game_type, timestamp })
}
