use crate::incentives::{AprFormula, GroupedIncentive};
use crate::state::{Application, Candidate, Config, IncentiveDeposit, TokenKind};
use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Coin, Decimal, Timestamp, Uint128};
use cw20::Cw20ReceiveMsg;

#[cw_serde]
pub struct InstantiateMsg {
    pub admin: String,
    pub operator: String,
    pub epoch_duration: u64, // seconds
    pub application_fee: Coin,
    pub apr_formula: AprFormula,
}

#[cw_serde]
pub enum ExecuteMsg {
    // Whitelist operations
    ApplyForWhitelist {
        token: String,
    },
    ApproveApplication {
        token: String,
    },
    RejectApplication {
        token: String,
    },
    UpdateCandidate {
        token: String,
        enabled: bool,
    },

    // Voting
    PlaceVotes {
        votes: Vec<VoteItem>,
    },

    // Incentives
    RegisterIncentiveToken {
        token: String,
        kind: TokenKind,
        decimals: u8,
    },
    DepositIncentive {
        candidate: String,
        epoch: Option<u64>, // defaults to the current epoch
    },
    Receive(Cw20ReceiveMsg),
    ClaimIncentives {
        epoch: u64,
    },
    RefundIncentive {
        epoch: u64,
        deposit_id: u64,
    },

    // Operator functions
    SetPrices {
        prices: Vec<PriceUpdate>,
    },
    SetReference {
        total_deposited: Decimal,
        quote_price: Decimal,
    },

    // Admin functions
    UpdateAdmin {
        admin: String,
    },
    UpdateOperator {
        operator: String,
    },
    UpdateConfig {
        application_fee: Option<Coin>,
        apr_formula: Option<AprFormula>,
    },
}

/// Message embedded in a cw20 `Send` to this contract.
#[cw_serde]
pub enum ReceiveMsg {
    DepositIncentive {
        candidate: String,
        epoch: Option<u64>,
    },
}

#[cw_serde]
pub struct VoteItem {
    pub option: VoteOptionMsg,
    pub weight: u32,
}

#[cw_serde]
pub enum VoteOptionMsg {
    /// Keep current basket weights (allocation index 0).
    NoChange {},
    Candidate {
        address: String,
    },
}

#[cw_serde]
pub struct PriceUpdate {
    pub token: String,
    pub price: Decimal,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    GetConfig {},

    #[returns(EpochResponse)]
    CurrentEpoch {},

    #[returns(CandidatesResponse)]
    Candidates {},

    #[returns(ApplicationResponse)]
    Application { token: String },

    #[returns(ApplicationsResponse)]
    Applications {},

    #[returns(UserVoteResponse)]
    UserVote { epoch: u64, address: String },

    #[returns(VoteTallyResponse)]
    VoteTally { epoch: u64 },

    #[returns(EpochIncentivesResponse)]
    EpochIncentives { epoch: u64 },

    #[returns(AggregatedIncentivesResponse)]
    AggregatedIncentives { epoch: u64 },

    #[returns(AggregatedIncentivesResponse)]
    DepositorIncentives { epoch: u64, address: String },

    #[returns(ClaimableResponse)]
    Claimable { epoch: u64, address: String },

    #[returns(PricesResponse)]
    Prices {},
}

#[cw_serde]
pub struct EpochResponse {
    pub epoch: u64,
    pub started_at: Timestamp,
    pub ends_at: Timestamp,
}

#[cw_serde]
pub struct CandidatesResponse {
    pub candidates: Vec<Candidate>,
}

#[cw_serde]
pub struct ApplicationResponse {
    pub application: Application,
}

#[cw_serde]
pub struct ApplicationsResponse {
    pub applications: Vec<Application>,
}

#[cw_serde]
pub struct UserVoteResponse {
    pub allocation: Option<Vec<u32>>,
}

#[cw_serde]
pub struct VoteTallyResponse {
    pub tally: Vec<Uint128>,
}

#[cw_serde]
pub struct IncentiveDepositInfo {
    pub id: u64,
    pub deposit: IncentiveDeposit,
}

#[cw_serde]
pub struct EpochIncentivesResponse {
    pub deposits: Vec<IncentiveDepositInfo>,
}

#[cw_serde]
pub struct AggregatedGroup {
    pub address: Addr,
    pub summary: GroupedIncentive,
}

#[cw_serde]
pub struct AggregatedIncentivesResponse {
    pub groups: Vec<AggregatedGroup>,
}

#[cw_serde]
pub struct ClaimableAmount {
    pub token: String,
    pub amount: Uint128,
}

#[cw_serde]
pub struct ClaimableResponse {
    pub amounts: Vec<ClaimableAmount>,
}

#[cw_serde]
pub struct PricesResponse {
    pub prices: Vec<PriceUpdate>,
}
