//! Calldata encoding for PositionManager actions and UniversalRouter
//! commands.

use crate::abi::{
    ExactInputSingleParams, IPositionManager, IUniversalRouter, MintPositionParams,
    Permit2PermitInput, PermitSingle, SettleAllParams, SettlePairParams, SweepParams,
    TakeAllParams, UnlockData,
};
use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};

/// v4 periphery action codes.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Action {
    MintPosition = 0x02,
    SwapExactInSingle = 0x06,
    SettleAll = 0x0c,
    SettlePair = 0x0d,
    TakeAll = 0x0f,
    Sweep = 0x14,
}

/// UniversalRouter command codes.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Permit2Permit = 0x0a,
    V4Swap = 0x10,
}

/// Accumulates actions and their parameters into
/// `abi.encode(bytes actions, bytes[] params)`.
#[derive(Clone, Debug, Default)]
pub struct ActionsBuilder {
    actions: Vec<u8>,
    params: Vec<Bytes>,
}

impl ActionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, action: Action, params: impl Into<Bytes>) -> Self {
        self.actions.push(action as u8);
        self.params.push(params.into());
        self
    }

    pub fn mint_position(self, params: &MintPositionParams) -> Self {
        self.push(Action::MintPosition, params.abi_encode_params())
    }

    pub fn settle_pair(self, params: &SettlePairParams) -> Self {
        self.push(Action::SettlePair, params.abi_encode_params())
    }

    pub fn sweep(self, params: &SweepParams) -> Self {
        self.push(Action::Sweep, params.abi_encode_params())
    }

    /// The router decodes this one as a struct, so it keeps its offset word.
    pub fn swap_exact_in_single(self, params: &ExactInputSingleParams) -> Self {
        self.push(Action::SwapExactInSingle, params.abi_encode())
    }

    pub fn settle_all(self, params: &SettleAllParams) -> Self {
        self.push(Action::SettleAll, params.abi_encode_params())
    }

    pub fn take_all(self, params: &TakeAllParams) -> Self {
        self.push(Action::TakeAll, params.abi_encode_params())
    }

    pub fn actions(&self) -> &[u8] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn build(self) -> Bytes {
        UnlockData {
            actions: self.actions.into(),
            params: self.params,
        }
        .abi_encode_params()
        .into()
    }
}

/// `PositionManager.modifyLiquidities(unlockData, deadline)` calldata.
pub fn modify_liquidities_calldata(unlock_data: Bytes, deadline: U256) -> Bytes {
    IPositionManager::modifyLiquiditiesCall {
        unlockData: unlock_data,
        deadline,
    }
    .abi_encode()
    .into()
}

/// `PositionManager.multicall(data)` calldata.
pub fn multicall_calldata(calls: Vec<Bytes>) -> Bytes {
    IPositionManager::multicallCall { data: calls }.abi_encode().into()
}

/// Builds the `(commands, inputs)` pair for `UniversalRouter.execute`.
#[derive(Clone, Debug, Default)]
pub struct RouterCommands {
    commands: Vec<u8>,
    inputs: Vec<Bytes>,
}

impl RouterCommands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit2_permit(mut self, permit_single: PermitSingle, signature: Bytes) -> Self {
        let input = Permit2PermitInput {
            permitSingle: permit_single,
            signature,
        };
        self.commands.push(Command::Permit2Permit as u8);
        self.inputs.push(input.abi_encode_params().into());
        self
    }

    pub fn v4_swap(mut self, actions: ActionsBuilder) -> Self {
        self.commands.push(Command::V4Swap as u8);
        self.inputs.push(actions.build());
        self
    }

    pub fn commands(&self) -> &[u8] {
        &self.commands
    }

    /// `UniversalRouter.execute(commands, inputs, deadline)` calldata.
    pub fn execute_calldata(self, deadline: U256) -> Bytes {
        IUniversalRouter::executeCall {
            commands: self.commands.into(),
            inputs: self.inputs,
            deadline,
        }
        .abi_encode()
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{PermitDetails, PoolKey};
    use alloy_primitives::aliases::{I24, U24, U48};
    use alloy_primitives::{Address, U160};

    fn pool_key() -> PoolKey {
        PoolKey {
            currency0: Address::ZERO,
            currency1: Address::repeat_byte(0x11),
            fee: U24::from(3000),
            tickSpacing: I24::try_from(60).unwrap(),
            hooks: Address::ZERO,
        }
    }

    fn word(bytes: &[u8], index: usize) -> U256 {
        U256::from_be_slice(&bytes[index * 32..(index + 1) * 32])
    }

    #[test]
    fn unlock_data_layout() {
        let settle = SettlePairParams {
            currency0: Address::ZERO,
            currency1: Address::repeat_byte(0x11),
        };
        let sweep = SweepParams {
            currency: Address::ZERO,
            to: Address::repeat_byte(0x22),
        };
        let builder = ActionsBuilder::new().settle_pair(&settle).sweep(&sweep);
        assert_eq!(builder.actions(), &[0x0d, 0x14]);

        let encoded = builder.build();
        let decoded = <UnlockData as SolValue>::abi_decode_params(&encoded).unwrap();
        assert_eq!(decoded.actions.as_ref(), &[0x0d, 0x14]);
        assert_eq!(decoded.params.len(), 2);
        // two static addresses, no offset word
        assert_eq!(decoded.params[0].len(), 64);
        assert_eq!(decoded.params[0].as_ref(), settle.abi_encode_params().as_slice());
        // head: offsets of the two dynamic members
        assert_eq!(word(&encoded, 0), U256::from(0x40));
    }

    #[test]
    fn mint_params_are_flattened() {
        let params = MintPositionParams {
            poolKey: pool_key(),
            tickLower: I24::try_from(-600).unwrap(),
            tickUpper: I24::try_from(600).unwrap(),
            liquidity: U256::from(1_000u64),
            amount0Max: 10,
            amount1Max: 20,
            owner: Address::repeat_byte(0x33),
            hookData: Bytes::new(),
        };
        let encoded = ActionsBuilder::new().mint_position(&params).build();
        let decoded = <UnlockData as SolValue>::abi_decode_params(&encoded).unwrap();
        let raw = &decoded.params[0];

        // 5 key words, 6 static fields, hookData offset, hookData length
        assert_eq!(raw.len(), 13 * 32);
        assert_eq!(word(raw, 1), U256::from_be_slice(Address::repeat_byte(0x11).as_slice()));
        assert_eq!(word(raw, 7), U256::from(1_000u64));
        assert_eq!(word(raw, 11), U256::from(12 * 32));
    }

    #[test]
    fn exact_input_single_keeps_offset() {
        let params = ExactInputSingleParams {
            poolKey: pool_key(),
            zeroForOne: true,
            amountIn: 1_000,
            amountOutMinimum: 990,
            hookData: Bytes::new(),
        };
        let encoded = ActionsBuilder::new().swap_exact_in_single(&params).build();
        let decoded = <UnlockData as SolValue>::abi_decode_params(&encoded).unwrap();

        assert_eq!(decoded.actions.as_ref(), &[0x06]);
        assert_eq!(word(&decoded.params[0], 0), U256::from(0x20));
        assert_eq!(
            <ExactInputSingleParams as SolValue>::abi_decode(&decoded.params[0]).unwrap(),
            params
        );
    }

    #[test]
    fn router_commands_and_execute() {
        let permit = PermitSingle {
            details: PermitDetails {
                token: Address::repeat_byte(0x11),
                amount: U160::MAX,
                expiration: U48::from(1_000u64),
                nonce: U48::ZERO,
            },
            spender: Address::repeat_byte(0x44),
            sigDeadline: U256::from(2_000u64),
        };
        let signature = Bytes::from(vec![0xab; 65]);
        let swap = ActionsBuilder::new()
            .settle_all(&SettleAllParams {
                currency: Address::ZERO,
                maxAmount: U256::from(5u64),
            })
            .take_all(&TakeAllParams {
                currency: Address::repeat_byte(0x11),
                minAmount: U256::from(4u64),
            });

        let commands = RouterCommands::new()
            .permit2_permit(permit.clone(), signature.clone())
            .v4_swap(swap);
        assert_eq!(commands.commands(), &[0x0a, 0x10]);

        let calldata = commands.execute_calldata(U256::from(99u64));
        let call = IUniversalRouter::executeCall::abi_decode(&calldata).unwrap();
        assert_eq!(call.commands.as_ref(), &[0x0a, 0x10]);
        assert_eq!(call.deadline, U256::from(99u64));

        let input = <Permit2PermitInput as SolValue>::abi_decode_params(&call.inputs[0]).unwrap();
        assert_eq!(input.permitSingle, permit);
        assert_eq!(input.signature, signature);

        let unlock = <UnlockData as SolValue>::abi_decode_params(&call.inputs[1]).unwrap();
        assert_eq!(unlock.actions.as_ref(), &[0x0c, 0x0f]);
    }

    #[test]
    fn position_manager_calldata() {
        let unlock = ActionsBuilder::new()
            .settle_pair(&SettlePairParams {
                currency0: Address::ZERO,
                currency1: Address::repeat_byte(1),
            })
            .build();
        let modify = modify_liquidities_calldata(unlock.clone(), U256::from(7u64));
        assert_eq!(&modify[..4], IPositionManager::modifyLiquiditiesCall::SELECTOR.as_slice());

        let multicall = multicall_calldata(vec![modify.clone()]);
        let decoded = IPositionManager::multicallCall::abi_decode(&multicall).unwrap();
        assert_eq!(decoded.data, vec![modify]);
    }
}
