use alloy_primitives::B256;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - out of bounds")]
    OutOfBounds,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("BitMath error - zero input value")]
    ZeroValue,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - sqrtPrice out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("State error - sqrtPrice is 0")]
    SqrtPriceIsZero,
    #[error("State error - sqrtRatio is 0")]
    SqrtRatioIsZero,

    #[error("State error - tick out of bounds")]
    TickOutOfBounds,

    #[error("State error - liquidity is 0")]
    LiquidityIsZero,

    #[error("State error - requested amount exceeds pool reserves")]
    InsufficientReserves,

    #[error("State error - invalid tick spacing {0}")]
    InvalidTickSpacing(i32),

    #[error("State error - tick {tick} is not a multiple of spacing {tick_spacing}")]
    TickNotAligned { tick: i32, tick_spacing: i32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - amount specified is 0")]
    AmountSpecifiedIsZero,
    #[error("Swap error - liquidity is 0")]
    LiquidityIsZero,
    #[error("Swap error - sqrtPrice limit out of bounds")]
    SqrtPriceOutOfBounds,
    #[error("Swap error - pool is not initialized")]
    PoolNotInitialized,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolKeyError {
    #[error("address is empty")]
    EmptyAddress,
    #[error("invalid address format: {0}")]
    InvalidAddress(String),
    #[error("invalid hooks address: {0}")]
    InvalidHooks(String),
    #[error("token0 and token1 must be different")]
    IdenticalCurrencies,
    #[error("tick spacing {0} out of range [1, 32767]")]
    TickSpacingOutOfRange(i32),
    #[error("fee {0} exceeds the maximum LP fee")]
    FeeTooLarge(u32),
    #[error("malformed pool key: {0}")]
    Malformed(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QuoteError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid price: {0}")]
    InvalidPrice(String),
    #[error("unsupported decimals: {0}")]
    UnsupportedDecimals(u8),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error(transparent)]
    Math(#[from] MathError),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("no indexer endpoint configured for chain {0}")]
    UnsupportedChain(u64),
    #[error("indexer http error: {0}")]
    Http(String),
    #[error("indexer returned errors: {0}")]
    Graphql(String),
    #[error("indexer response missing data")]
    MissingData,
    #[error("failed to decode indexer record: {0}")]
    Decode(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
    #[error("Failed to read deployment file {path}: {reason}")]
    DeploymentFile { path: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("transaction rejected by user")]
    Rejected,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("no contract deployment known for chain {0}")]
    UnsupportedChain(u64),
    #[error("pool already exists: {0}")]
    PoolAlreadyExists(B256),
    #[error("pool does not exist: {0}")]
    PoolNotFound(B256),
    #[error("another transaction flow is already in progress")]
    Busy,
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("failed to decode contract response: {0}")]
    Decode(String),
    #[error("transaction {0} reverted")]
    Reverted(B256),
    #[error("timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OnchainError {
    #[error("failed to read slot0: {0}")]
    FailedToGetSlot0(String),
    #[error("failed to read liquidity: {0}")]
    FailedToGetLiquidity(String),
    #[error("failed to read tick bitmap: {0}")]
    FailedToGetTickBitmap(String),
    #[error("failed to read tick info: {0}")]
    FailedToGetTickInfo(String),
    #[error("multicall failed: {0}")]
    FailedToCallMulticall(String),
    #[error("failed to decode multicall result: {0}")]
    FailedToDecode(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] MathError),

    #[error(transparent)]
    StateError(#[from] StateError),

    #[error(transparent)]
    SwapError(#[from] SwapError),

    #[error(transparent)]
    PoolKeyError(#[from] PoolKeyError),

    #[error(transparent)]
    QuoteError(#[from] QuoteError),

    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    IndexerError(#[from] IndexerError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error(transparent)]
    TxError(#[from] TxError),

    #[error(transparent)]
    OnchainError(#[from] OnchainError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
