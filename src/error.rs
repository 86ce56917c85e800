use cosmwasm_std::{Coin, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Invalid amount")]
    InvalidAmount {},

    #[error("No funds sent")]
    NoFunds {},

    #[error("Multiple denominations not supported")]
    MultipleDenoms {},

    #[error("Invalid application fee. Expected {expected}")]
    InvalidFee { expected: Coin },

    #[error("Unsupported decimals count: {decimals}")]
    InvalidDecimals { decimals: u8 },

    #[error("Amount out of range: {amount}")]
    AmountOutOfRange { amount: Uint128 },

    #[error("Epoch duration must be greater than zero")]
    InvalidEpochDuration {},

    #[error("Token already whitelisted: {token}")]
    AlreadyWhitelisted { token: String },

    #[error("Application already submitted for {token}")]
    AlreadyApplied { token: String },

    #[error("No application found for {token}")]
    ApplicationNotFound { token: String },

    #[error("Application for {token} is not pending")]
    ApplicationNotPending { token: String },

    #[error("Candidate not whitelisted: {token}")]
    CandidateNotWhitelisted { token: String },

    #[error("Candidate disabled: {token}")]
    CandidateDisabled { token: String },

    #[error("Incentive token not registered: {token}")]
    UnregisteredToken { token: String },

    #[error("Vote contains no weight")]
    EmptyVote {},

    #[error("Epoch {epoch} already finished")]
    EpochFinished { epoch: u64 },

    #[error("Epoch {epoch} not finished yet")]
    EpochNotFinished { epoch: u64 },

    #[error("Incentives for epoch {epoch} already claimed")]
    AlreadyClaimed { epoch: u64 },

    #[error("Nothing to claim")]
    NothingToClaim {},

    #[error("Incentive deposit not found: {deposit_id}")]
    DepositNotFound { deposit_id: u64 },

    #[error("Only the original depositor can refund a deposit")]
    NotDepositor {},

    #[error("Deposit already refunded")]
    AlreadyRefunded {},

    #[error("Deposit is not refundable: candidate received votes")]
    NotRefundable {},
}
