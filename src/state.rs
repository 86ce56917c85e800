use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Coin, Decimal, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::incentives::{AprFormula, ReferenceValues};

#[cw_serde]
pub struct Config {
    pub admin: Addr,
    pub operator: Addr, // posts prices and the APR reference values
    pub genesis: Timestamp,
    pub epoch_duration: u64, // seconds
    pub application_fee: Coin,
    pub apr_formula: AprFormula,
}

impl Config {
    /// Epochs are 1-based and derived from the genesis timestamp, so there
    /// is no stored counter to drift.
    pub fn current_epoch(&self, now: Timestamp) -> u64 {
        now.seconds().saturating_sub(self.genesis.seconds()) / self.epoch_duration + 1
    }

    pub fn epoch_bounds(&self, epoch: u64) -> (Timestamp, Timestamp) {
        let start = self.genesis.plus_seconds((epoch - 1) * self.epoch_duration);
        (start, start.plus_seconds(self.epoch_duration))
    }
}

#[cw_serde]
pub struct Candidate {
    pub token: Addr,
    pub slot: u16, // allocation index; 0 is reserved for no-change
    pub enabled: bool,
    pub whitelisted_at_epoch: u64,
}

#[cw_serde]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

#[cw_serde]
pub struct Application {
    pub token: Addr,
    pub applicant: Addr,
    pub fee_paid: Coin,
    pub submitted_at: Timestamp,
    pub status: ApplicationStatus,
}

#[cw_serde]
pub enum TokenKind {
    Native,
    Cw20,
}

#[cw_serde]
pub struct IncentiveTokenInfo {
    pub kind: TokenKind,
    pub decimals: u8,
}

/// One posted incentive. The per-epoch list of these is the flat event
/// stream the aggregator folds over.
#[cw_serde]
pub struct IncentiveDeposit {
    pub candidate: Addr,
    pub depositor: Addr,
    pub token: String, // native denom or cw20 contract address
    pub amount: Uint128,
    pub refunded: bool,
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const CANDIDATES: Map<&Addr, Candidate> = Map::new("candidates");
pub const CANDIDATE_BY_SLOT: Map<u16, Addr> = Map::new("candidate_by_slot");
pub const CANDIDATE_COUNT: Item<u16> = Item::new("candidate_count");
pub const APPLICATIONS: Map<&Addr, Application> = Map::new("applications");
pub const TOKEN_INFOS: Map<&str, IncentiveTokenInfo> = Map::new("token_infos");
pub const PRICES: Map<&str, Decimal> = Map::new("prices");
pub const REFERENCE: Item<ReferenceValues> = Item::new("reference");
// (epoch, voter) -> basis-point allocation, index 0 = no-change
pub const VOTES: Map<(u64, &Addr), Vec<u32>> = Map::new("votes");
// epoch -> summed basis points per slot
pub const VOTE_TALLY: Map<u64, Vec<Uint128>> = Map::new("vote_tally");
pub const EPOCH_DEPOSITS: Map<u64, Vec<IncentiveDeposit>> = Map::new("epoch_deposits");
pub const CLAIMS: Map<(u64, &Addr), bool> = Map::new("claims");
