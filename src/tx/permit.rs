//! Permit2 allowance checks and EIP-712 permit construction.

use crate::abi::{IPermit2, PermitBatch, PermitDetails, PermitSingle};
use alloy_primitives::aliases::U48;
use alloy_primitives::{Address, B256, U160, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain};

/// Permit2 signs without a domain version.
pub fn permit2_domain(chain_id: u64, permit2: Address) -> Eip712Domain {
    eip712_domain! {
        name: "Permit2",
        chain_id: chain_id,
        verifying_contract: permit2,
    }
}

/// Allowance Permit2 holds for `(owner, token, spender)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PermitAllowance {
    pub amount: U160,
    pub expiration: u64,
    pub nonce: u64,
}

impl From<IPermit2::allowanceReturn> for PermitAllowance {
    fn from(ret: IPermit2::allowanceReturn) -> Self {
        Self {
            amount: ret.amount,
            expiration: ret.expiration.to::<u64>(),
            nonce: ret.nonce.to::<u64>(),
        }
    }
}

impl PermitAllowance {
    /// A new signature is needed when the allowance is too small or has
    /// expired at `now`.
    pub fn needs_permit(&self, required: U256, now: u64) -> bool {
        U256::from(self.amount) < required || self.expiration <= now
    }
}

/// Details granting the maximum Permit2 amount for `token`.
pub fn permit_details(token: Address, expiration: u64, nonce: u64) -> PermitDetails {
    PermitDetails {
        token,
        amount: U160::MAX,
        expiration: U48::saturating_from(expiration),
        nonce: U48::saturating_from(nonce),
    }
}

pub fn build_permit_single(details: PermitDetails, spender: Address, sig_deadline: u64) -> PermitSingle {
    PermitSingle {
        details,
        spender,
        sigDeadline: U256::from(sig_deadline),
    }
}

pub fn build_permit_batch(
    details: Vec<PermitDetails>,
    spender: Address,
    sig_deadline: u64,
) -> PermitBatch {
    PermitBatch {
        details,
        spender,
        sigDeadline: U256::from(sig_deadline),
    }
}

/// EIP-712 digest the wallet signs for a single-token permit.
pub fn permit_single_signing_hash(permit: &PermitSingle, domain: &Eip712Domain) -> B256 {
    permit.eip712_signing_hash(domain)
}

/// EIP-712 digest the wallet signs for a batch permit.
pub fn permit_batch_signing_hash(permit: &PermitBatch, domain: &Eip712Domain) -> B256 {
    permit.eip712_signing_hash(domain)
}
