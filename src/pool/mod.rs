pub mod fee;
pub mod key;
#[cfg(feature = "onchain")]
pub mod onchain;
pub mod state;
pub mod swap;

pub use fee::{DYNAMIC_FEE_FLAG, FeeTier, MAX_LP_FEE, calculate_tick_spacing_from_fee_amount};
pub use key::{PoolKey, generate_pool_id, order_pool_tokens, parse_address};
pub use state::{PoolState, Slot0, TickInfo, generate_search_range};
pub use swap::{SwapParams, SwapResult, calculate_sqrt_price_limit};
