//! Transaction orchestration behind the [`WalletClient`] seam.

pub mod actions;
pub mod flow;
pub mod permit;
pub mod wallet;

pub use actions::{Action, ActionsBuilder, Command, RouterCommands};
pub use flow::{
    AddLiquidityRequest, CreatePoolRequest, FlowKind, FlowObserver, FlowOutcome, FlowStep,
    InitialLiquidity, MintPlan, NoopObserver, SwapOutcome, SwapRequest, TxClient,
};
pub use wallet::{TxReceipt, TxRequest, WalletClient, classify_rpc_error};
