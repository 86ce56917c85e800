use cosmwasm_std::testing::{
    message_info, mock_env, MockApi, MockQuerier, MockStorage,
};
use cosmwasm_std::{coins, Addr, Coin, Decimal, DepsMut, Empty, Env, OwnedDeps, Uint128};

use crate::contract::{execute, instantiate};
use crate::incentives::AprFormula;
use crate::msg::{ExecuteMsg, InstantiateMsg, PriceUpdate, VoteItem, VoteOptionMsg};
use crate::state::TokenKind;

pub type TestDeps = OwnedDeps<MockStorage, MockApi, MockQuerier, Empty>;

// Constants for testing
pub const FEE_DENOM: &str = "uusdc";
pub const APPLICATION_FEE: u128 = 1_000_000;
pub const EPOCH_DURATION: u64 = 60 * 60 * 24 * 28; // four weeks

// Generate valid bech32 addresses for testing
pub fn addr(input: &str) -> Addr {
    MockApi::default().addr_make(input)
}

pub fn admin_address() -> Addr {
    addr("admin")
}

pub fn operator_address() -> Addr {
    addr("operator")
}

pub fn user_address() -> Addr {
    addr("user")
}

// Helper function to setup contract with valid addresses
pub fn setup_contract(deps: DepsMut) {
    let msg = InstantiateMsg {
        admin: admin_address().to_string(),
        operator: operator_address().to_string(),
        epoch_duration: EPOCH_DURATION,
        application_fee: Coin {
            denom: FEE_DENOM.to_string(),
            amount: Uint128::new(APPLICATION_FEE),
        },
        apr_formula: AprFormula::UsdDenominated,
    };

    let info = message_info(&addr("creator"), &[]);
    instantiate(deps, mock_env(), info, msg).unwrap();
}

/// A mock env whose block time falls inside the given 1-based epoch.
pub fn env_at_epoch(epoch: u64) -> Env {
    let mut env = mock_env();
    env.block.time = env.block.time.plus_seconds((epoch - 1) * EPOCH_DURATION);
    env
}

// Apply with the exact fee and approve as admin
pub fn whitelist_candidate(deps: &mut TestDeps, token: &Addr) {
    let info = message_info(&user_address(), &coins(APPLICATION_FEE, FEE_DENOM));
    execute(
        deps.as_mut(),
        mock_env(),
        info,
        ExecuteMsg::ApplyForWhitelist {
            token: token.to_string(),
        },
    )
    .unwrap();

    let info = message_info(&admin_address(), &[]);
    execute(
        deps.as_mut(),
        mock_env(),
        info,
        ExecuteMsg::ApproveApplication {
            token: token.to_string(),
        },
    )
    .unwrap();
}

pub fn register_token(deps: &mut TestDeps, token: &str, kind: TokenKind, decimals: u8) {
    let info = message_info(&admin_address(), &[]);
    execute(
        deps.as_mut(),
        mock_env(),
        info,
        ExecuteMsg::RegisterIncentiveToken {
            token: token.to_string(),
            kind,
            decimals,
        },
    )
    .unwrap();
}

pub fn set_price(deps: &mut TestDeps, token: &str, price: Decimal) {
    let info = message_info(&operator_address(), &[]);
    execute(
        deps.as_mut(),
        mock_env(),
        info,
        ExecuteMsg::SetPrices {
            prices: vec![PriceUpdate {
                token: token.to_string(),
                price,
            }],
        },
    )
    .unwrap();
}

pub fn candidate_vote(candidate: &Addr, weight: u32) -> VoteItem {
    VoteItem {
        option: VoteOptionMsg::Candidate {
            address: candidate.to_string(),
        },
        weight,
    }
}

pub fn no_change_vote(weight: u32) -> VoteItem {
    VoteItem {
        option: VoteOptionMsg::NoChange {},
        weight,
    }
}
