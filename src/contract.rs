use cosmwasm_std::entry_point;
use cosmwasm_std::{
    from_json, to_json_binary, Addr, BankMsg, Binary, Coin, CosmosMsg, Decimal, Deps, DepsMut,
    Env, MessageInfo, Order, Response, StdError, StdResult, Storage, Uint128, WasmMsg,
};
use cw2::set_contract_version;
use cw20::{Cw20ExecuteMsg, Cw20ReceiveMsg};
use std::collections::BTreeMap;

use crate::amounts::MAX_TOKEN_DECIMALS;
use crate::error::ContractError;
use crate::incentives::{aggregate, AprFormula, IncentiveRecord, ReferenceValues};
use crate::msg::{
    AggregatedGroup, AggregatedIncentivesResponse, ApplicationResponse, ApplicationsResponse,
    CandidatesResponse, ClaimableAmount, ClaimableResponse, EpochIncentivesResponse,
    EpochResponse, ExecuteMsg, IncentiveDepositInfo, InstantiateMsg, PriceUpdate, PricesResponse,
    QueryMsg, ReceiveMsg, UserVoteResponse, VoteItem, VoteOptionMsg, VoteTallyResponse,
};
use crate::state::{
    Application, ApplicationStatus, Candidate, Config, IncentiveDeposit, IncentiveTokenInfo,
    TokenKind, APPLICATIONS, CANDIDATES, CANDIDATE_BY_SLOT, CANDIDATE_COUNT, CLAIMS, CONFIG,
    EPOCH_DEPOSITS, PRICES, REFERENCE, TOKEN_INFOS, VOTES, VOTE_TALLY,
};
use crate::weights::{VoteOption, VoteSlots};

// version info for migration
const CONTRACT_NAME: &str = "crates.io:basket-governance";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    if msg.epoch_duration == 0 {
        return Err(ContractError::InvalidEpochDuration {});
    }

    let config = Config {
        admin: deps.api.addr_validate(&msg.admin)?,
        operator: deps.api.addr_validate(&msg.operator)?,
        genesis: env.block.time,
        epoch_duration: msg.epoch_duration,
        application_fee: msg.application_fee,
        apr_formula: msg.apr_formula,
    };
    CONFIG.save(deps.storage, &config)?;

    CANDIDATE_COUNT.save(deps.storage, &0u16)?;
    REFERENCE.save(deps.storage, &ReferenceValues::default())?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("admin", msg.admin)
        .add_attribute("operator", msg.operator)
        .add_attribute("epoch_duration", msg.epoch_duration.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        // Whitelist operations
        ExecuteMsg::ApplyForWhitelist { token } => {
            execute_apply_for_whitelist(deps, env, info, token)
        }
        ExecuteMsg::ApproveApplication { token } => {
            execute_approve_application(deps, env, info, token)
        }
        ExecuteMsg::RejectApplication { token } => execute_reject_application(deps, info, token),
        ExecuteMsg::UpdateCandidate { token, enabled } => {
            execute_update_candidate(deps, info, token, enabled)
        }

        // Voting
        ExecuteMsg::PlaceVotes { votes } => execute_place_votes(deps, env, info, votes),

        // Incentives
        ExecuteMsg::RegisterIncentiveToken {
            token,
            kind,
            decimals,
        } => execute_register_incentive_token(deps, info, token, kind, decimals),
        ExecuteMsg::DepositIncentive { candidate, epoch } => {
            execute_deposit_incentive(deps, env, info, candidate, epoch)
        }
        ExecuteMsg::Receive(receive) => execute_receive(deps, env, info, receive),
        ExecuteMsg::ClaimIncentives { epoch } => execute_claim_incentives(deps, env, info, epoch),
        ExecuteMsg::RefundIncentive { epoch, deposit_id } => {
            execute_refund_incentive(deps, env, info, epoch, deposit_id)
        }

        // Operator functions
        ExecuteMsg::SetPrices { prices } => execute_set_prices(deps, info, prices),
        ExecuteMsg::SetReference {
            total_deposited,
            quote_price,
        } => execute_set_reference(deps, info, total_deposited, quote_price),

        // Admin functions
        ExecuteMsg::UpdateAdmin { admin } => execute_update_admin(deps, info, admin),
        ExecuteMsg::UpdateOperator { operator } => execute_update_operator(deps, info, operator),
        ExecuteMsg::UpdateConfig {
            application_fee,
            apr_formula,
        } => execute_update_config(deps, info, application_fee, apr_formula),
    }
}

pub fn execute_apply_for_whitelist(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let token = deps.api.addr_validate(&token)?;

    if CANDIDATES.may_load(deps.storage, &token)?.is_some() {
        return Err(ContractError::AlreadyWhitelisted {
            token: token.to_string(),
        });
    }

    // A rejected applicant may re-apply; a pending or approved one may not
    if let Some(application) = APPLICATIONS.may_load(deps.storage, &token)? {
        if application.status != ApplicationStatus::Rejected {
            return Err(ContractError::AlreadyApplied {
                token: token.to_string(),
            });
        }
    }

    let fee = config.application_fee;
    let fee_paid = if fee.amount.is_zero() {
        Coin {
            denom: fee.denom.clone(),
            amount: Uint128::zero(),
        }
    } else {
        if info.funds.is_empty() {
            return Err(ContractError::NoFunds {});
        }
        if info.funds.len() > 1 {
            return Err(ContractError::MultipleDenoms {});
        }

        let paid = &info.funds[0];
        if paid.denom != fee.denom || paid.amount != fee.amount {
            return Err(ContractError::InvalidFee { expected: fee });
        }
        paid.clone()
    };

    let application = Application {
        token: token.clone(),
        applicant: info.sender.clone(),
        fee_paid,
        submitted_at: env.block.time,
        status: ApplicationStatus::Pending,
    };
    APPLICATIONS.save(deps.storage, &token, &application)?;

    Ok(Response::new()
        .add_attribute("method", "apply_for_whitelist")
        .add_attribute("token", token)
        .add_attribute("applicant", info.sender))
}

pub fn execute_approve_application(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only admin can approve applications
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    let token = deps.api.addr_validate(&token)?;
    let mut application = APPLICATIONS.may_load(deps.storage, &token)?.ok_or(
        ContractError::ApplicationNotFound {
            token: token.to_string(),
        },
    )?;

    if application.status != ApplicationStatus::Pending {
        return Err(ContractError::ApplicationNotPending {
            token: token.to_string(),
        });
    }

    application.status = ApplicationStatus::Approved;
    APPLICATIONS.save(deps.storage, &token, &application)?;

    // Slot 0 is reserved for no-change, so candidate slots are 1-based
    let slot = CANDIDATE_COUNT.load(deps.storage)? + 1;
    CANDIDATE_COUNT.save(deps.storage, &slot)?;
    CANDIDATE_BY_SLOT.save(deps.storage, slot, &token)?;

    let candidate = Candidate {
        token: token.clone(),
        slot,
        enabled: true,
        whitelisted_at_epoch: config.current_epoch(env.block.time),
    };
    CANDIDATES.save(deps.storage, &token, &candidate)?;

    Ok(Response::new()
        .add_attribute("method", "approve_application")
        .add_attribute("token", token)
        .add_attribute("slot", slot.to_string()))
}

pub fn execute_reject_application(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only admin can reject applications
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    let token = deps.api.addr_validate(&token)?;
    APPLICATIONS.update(
        deps.storage,
        &token,
        |application| -> Result<_, ContractError> {
            let mut application = application.ok_or(ContractError::ApplicationNotFound {
                token: token.to_string(),
            })?;

            if application.status != ApplicationStatus::Pending {
                return Err(ContractError::ApplicationNotPending {
                    token: token.to_string(),
                });
            }

            // The application fee is not refunded
            application.status = ApplicationStatus::Rejected;
            Ok(application)
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "reject_application")
        .add_attribute("token", token))
}

pub fn execute_update_candidate(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    enabled: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only admin can update candidates
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    let token = deps.api.addr_validate(&token)?;
    CANDIDATES.update(
        deps.storage,
        &token,
        |candidate| -> Result<_, ContractError> {
            let mut candidate = candidate.ok_or(ContractError::CandidateNotWhitelisted {
                token: token.to_string(),
            })?;

            candidate.enabled = enabled;
            Ok(candidate)
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "update_candidate")
        .add_attribute("token", token)
        .add_attribute("enabled", enabled.to_string()))
}

pub fn execute_place_votes(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    votes: Vec<VoteItem>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let epoch = config.current_epoch(env.block.time);

    let mut slots = VoteSlots::new();
    for item in votes {
        match item.option {
            VoteOptionMsg::NoChange {} => slots.add(&VoteOption::NoChange, item.weight),
            VoteOptionMsg::Candidate { address } => {
                let addr = deps.api.addr_validate(&address)?;
                let candidate = CANDIDATES.may_load(deps.storage, &addr)?.ok_or(
                    ContractError::CandidateNotWhitelisted {
                        token: address.clone(),
                    },
                )?;

                if !candidate.enabled {
                    return Err(ContractError::CandidateDisabled { token: address });
                }

                slots.add(&VoteOption::Candidate(addr), item.weight);
            }
        }
    }

    // The allocator itself is total; refusing an empty vote is on us
    if slots.total_clicks() == 0 {
        return Err(ContractError::EmptyVote {});
    }

    let ordered = ordered_candidates(deps.storage)?;
    let allocation = slots.to_allocation(&ordered);

    // Replace any previous vote by this voter in the epoch tally
    let previous = VOTES.may_load(deps.storage, (epoch, &info.sender))?;
    VOTE_TALLY.update(deps.storage, epoch, |tally| -> StdResult<_> {
        let mut tally = tally.unwrap_or_default();
        if tally.len() < allocation.len() {
            tally.resize(allocation.len(), Uint128::zero());
        }

        if let Some(previous) = &previous {
            for (slot, weight) in previous.iter().enumerate() {
                tally[slot] -= Uint128::from(*weight);
            }
        }
        for (slot, weight) in allocation.iter().enumerate() {
            tally[slot] += Uint128::from(*weight);
        }

        Ok(tally)
    })?;
    VOTES.save(deps.storage, (epoch, &info.sender), &allocation)?;

    Ok(Response::new()
        .add_attribute("method", "place_votes")
        .add_attribute("voter", info.sender)
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("total_clicks", slots.total_clicks().to_string()))
}

pub fn execute_register_incentive_token(
    deps: DepsMut,
    info: MessageInfo,
    token: String,
    kind: TokenKind,
    decimals: u8,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only admin can register incentive tokens
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    if decimals > MAX_TOKEN_DECIMALS {
        return Err(ContractError::InvalidDecimals { decimals });
    }
    if kind == TokenKind::Cw20 {
        deps.api.addr_validate(&token)?;
    }

    TOKEN_INFOS.save(deps.storage, &token, &IncentiveTokenInfo { kind, decimals })?;

    Ok(Response::new()
        .add_attribute("method", "register_incentive_token")
        .add_attribute("token", token)
        .add_attribute("decimals", decimals.to_string()))
}

pub fn execute_deposit_incentive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    candidate: String,
    epoch: Option<u64>,
) -> Result<Response, ContractError> {
    if info.funds.is_empty() {
        return Err(ContractError::NoFunds {});
    }
    if info.funds.len() > 1 {
        return Err(ContractError::MultipleDenoms {});
    }

    let coin = info.funds[0].clone();
    let token_info = TOKEN_INFOS.may_load(deps.storage, &coin.denom)?.ok_or(
        ContractError::UnregisteredToken {
            token: coin.denom.clone(),
        },
    )?;
    if token_info.kind != TokenKind::Native {
        return Err(ContractError::UnregisteredToken { token: coin.denom });
    }

    deposit_incentive(
        deps,
        env,
        info.sender,
        candidate,
        epoch,
        coin.denom,
        coin.amount,
    )
}

pub fn execute_receive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    receive: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    // The calling cw20 contract is the incentive token
    let token = info.sender.to_string();
    let token_info =
        TOKEN_INFOS
            .may_load(deps.storage, &token)?
            .ok_or(ContractError::UnregisteredToken {
                token: token.clone(),
            })?;
    if token_info.kind != TokenKind::Cw20 {
        return Err(ContractError::UnregisteredToken { token });
    }

    let depositor = deps.api.addr_validate(&receive.sender)?;
    match from_json(&receive.msg)? {
        ReceiveMsg::DepositIncentive { candidate, epoch } => {
            deposit_incentive(deps, env, depositor, candidate, epoch, token, receive.amount)
        }
    }
}

fn deposit_incentive(
    deps: DepsMut,
    env: Env,
    depositor: Addr,
    candidate: String,
    epoch: Option<u64>,
    token: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let current = config.current_epoch(env.block.time);
    let target = epoch.unwrap_or(current);

    if target < current {
        return Err(ContractError::EpochFinished { epoch: target });
    }
    if amount.is_zero() {
        return Err(ContractError::InvalidAmount {});
    }

    let candidate = deps.api.addr_validate(&candidate)?;
    let candidate_info = CANDIDATES.may_load(deps.storage, &candidate)?.ok_or(
        ContractError::CandidateNotWhitelisted {
            token: candidate.to_string(),
        },
    )?;
    if !candidate_info.enabled {
        return Err(ContractError::CandidateDisabled {
            token: candidate.to_string(),
        });
    }

    let mut deposits = EPOCH_DEPOSITS
        .may_load(deps.storage, target)?
        .unwrap_or_default();
    let deposit_id = deposits.len() as u64;
    deposits.push(IncentiveDeposit {
        candidate: candidate.clone(),
        depositor: depositor.clone(),
        token: token.clone(),
        amount,
        refunded: false,
    });
    EPOCH_DEPOSITS.save(deps.storage, target, &deposits)?;

    Ok(Response::new()
        .add_attribute("method", "deposit_incentive")
        .add_attribute("epoch", target.to_string())
        .add_attribute("candidate", candidate)
        .add_attribute("depositor", depositor)
        .add_attribute("token", token)
        .add_attribute("amount", amount)
        .add_attribute("deposit_id", deposit_id.to_string()))
}

pub fn execute_claim_incentives(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    epoch: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let current = config.current_epoch(env.block.time);

    if epoch >= current {
        return Err(ContractError::EpochNotFinished { epoch });
    }
    if CLAIMS
        .may_load(deps.storage, (epoch, &info.sender))?
        .unwrap_or(false)
    {
        return Err(ContractError::AlreadyClaimed { epoch });
    }

    let allocation = VOTES
        .may_load(deps.storage, (epoch, &info.sender))?
        .ok_or(ContractError::NothingToClaim {})?;

    let payouts = accrued_payouts(deps.storage, epoch, &allocation)?;
    if payouts.is_empty() {
        return Err(ContractError::NothingToClaim {});
    }

    let mut messages: Vec<CosmosMsg> = vec![];
    for (token, amount) in &payouts {
        messages.push(payout_msg(deps.storage, token, &info.sender, *amount)?);
    }

    CLAIMS.save(deps.storage, (epoch, &info.sender), &true)?;

    Ok(Response::new()
        .add_messages(messages)
        .add_attribute("method", "claim_incentives")
        .add_attribute("claimer", info.sender)
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("tokens", payouts.len().to_string()))
}

pub fn execute_refund_incentive(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    epoch: u64,
    deposit_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let current = config.current_epoch(env.block.time);

    if epoch >= current {
        return Err(ContractError::EpochNotFinished { epoch });
    }

    let mut deposits = EPOCH_DEPOSITS
        .may_load(deps.storage, epoch)?
        .unwrap_or_default();
    let deposit = deposits
        .get_mut(deposit_id as usize)
        .ok_or(ContractError::DepositNotFound { deposit_id })?;

    if deposit.depositor != info.sender {
        return Err(ContractError::NotDepositor {});
    }
    if deposit.refunded {
        return Err(ContractError::AlreadyRefunded {});
    }

    // Refundable only when the candidate finished the epoch without votes
    let candidate = CANDIDATES.load(deps.storage, &deposit.candidate)?;
    let tally = VOTE_TALLY.may_load(deps.storage, epoch)?.unwrap_or_default();
    let tally_bps = tally
        .get(usize::from(candidate.slot))
        .copied()
        .unwrap_or_default();
    if !tally_bps.is_zero() {
        return Err(ContractError::NotRefundable {});
    }

    deposit.refunded = true;
    let token = deposit.token.clone();
    let amount = deposit.amount;
    let candidate_token = deposit.candidate.clone();
    EPOCH_DEPOSITS.save(deps.storage, epoch, &deposits)?;

    let message = payout_msg(deps.storage, &token, &info.sender, amount)?;

    Ok(Response::new()
        .add_message(message)
        .add_attribute("method", "refund_incentive")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("deposit_id", deposit_id.to_string())
        .add_attribute("candidate", candidate_token)
        .add_attribute("amount", amount))
}

pub fn execute_set_prices(
    deps: DepsMut,
    info: MessageInfo,
    prices: Vec<PriceUpdate>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only the operator posts prices
    if info.sender != config.operator {
        return Err(ContractError::Unauthorized {});
    }

    for update in &prices {
        if !TOKEN_INFOS.has(deps.storage, &update.token) {
            return Err(ContractError::UnregisteredToken {
                token: update.token.clone(),
            });
        }
        PRICES.save(deps.storage, &update.token, &update.price)?;
    }

    Ok(Response::new()
        .add_attribute("method", "set_prices")
        .add_attribute("updated", prices.len().to_string()))
}

pub fn execute_set_reference(
    deps: DepsMut,
    info: MessageInfo,
    total_deposited: Decimal,
    quote_price: Decimal,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;

    // Only the operator posts reference values
    if info.sender != config.operator {
        return Err(ContractError::Unauthorized {});
    }

    let reference = ReferenceValues {
        total_deposited,
        quote_price,
    };
    REFERENCE.save(deps.storage, &reference)?;

    Ok(Response::new()
        .add_attribute("method", "set_reference")
        .add_attribute("total_deposited", total_deposited.to_string())
        .add_attribute("quote_price", quote_price.to_string()))
}

pub fn execute_update_admin(
    deps: DepsMut,
    info: MessageInfo,
    admin: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    // Only current admin can update admin
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    config.admin = deps.api.addr_validate(&admin)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "update_admin")
        .add_attribute("new_admin", admin))
}

pub fn execute_update_operator(
    deps: DepsMut,
    info: MessageInfo,
    operator: String,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    // Only admin can update the operator
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    config.operator = deps.api.addr_validate(&operator)?;
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "update_operator")
        .add_attribute("new_operator", operator))
}

pub fn execute_update_config(
    deps: DepsMut,
    info: MessageInfo,
    application_fee: Option<Coin>,
    apr_formula: Option<AprFormula>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;

    // Only admin can update config
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    if let Some(application_fee) = application_fee {
        config.application_fee = application_fee;
    }
    if let Some(apr_formula) = apr_formula {
        config.apr_formula = apr_formula;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("method", "update_config")
        .add_attribute("application_fee", config.application_fee.to_string()))
}

// Candidate addresses by slot order; the allocation array is this list
// shifted by one for the no-change slot.
fn ordered_candidates(storage: &dyn Storage) -> StdResult<Vec<Addr>> {
    let count = CANDIDATE_COUNT.load(storage)?;
    (1..=count)
        .map(|slot| CANDIDATE_BY_SLOT.load(storage, slot))
        .collect()
}

// Per-token amounts a voter has earned from an epoch's deposits.
fn accrued_payouts(
    storage: &dyn Storage,
    epoch: u64,
    allocation: &[u32],
) -> StdResult<BTreeMap<String, Uint128>> {
    let tally = VOTE_TALLY.may_load(storage, epoch)?.unwrap_or_default();
    let deposits = EPOCH_DEPOSITS.may_load(storage, epoch)?.unwrap_or_default();

    let mut payouts: BTreeMap<String, Uint128> = BTreeMap::new();
    for deposit in deposits.iter().filter(|deposit| !deposit.refunded) {
        let candidate = CANDIDATES.load(storage, &deposit.candidate)?;
        let slot = usize::from(candidate.slot);

        let voter_bps = allocation.get(slot).copied().unwrap_or_default();
        let tally_bps = tally.get(slot).copied().unwrap_or_default();
        if voter_bps == 0 || tally_bps.is_zero() {
            continue;
        }

        let payout = deposit
            .amount
            .multiply_ratio(Uint128::from(voter_bps), tally_bps);
        if !payout.is_zero() {
            *payouts.entry(deposit.token.clone()).or_default() += payout;
        }
    }

    Ok(payouts)
}

fn payout_msg(
    storage: &dyn Storage,
    token: &str,
    recipient: &Addr,
    amount: Uint128,
) -> StdResult<CosmosMsg> {
    let token_info = TOKEN_INFOS.load(storage, token)?;

    let message = match token_info.kind {
        TokenKind::Native => CosmosMsg::Bank(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: vec![Coin {
                denom: token.to_string(),
                amount,
            }],
        }),
        TokenKind::Cw20 => CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr: token.to_string(),
            msg: to_json_binary(&Cw20ExecuteMsg::Transfer {
                recipient: recipient.to_string(),
                amount,
            })?,
            funds: vec![],
        }),
    };

    Ok(message)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::GetConfig {} => to_json_binary(&CONFIG.load(deps.storage)?),
        QueryMsg::CurrentEpoch {} => to_json_binary(&query_current_epoch(deps, env)?),
        QueryMsg::Candidates {} => to_json_binary(&query_candidates(deps)?),
        QueryMsg::Application { token } => to_json_binary(&query_application(deps, token)?),
        QueryMsg::Applications {} => to_json_binary(&query_applications(deps)?),
        QueryMsg::UserVote { epoch, address } => {
            to_json_binary(&query_user_vote(deps, epoch, address)?)
        }
        QueryMsg::VoteTally { epoch } => to_json_binary(&query_vote_tally(deps, epoch)?),
        QueryMsg::EpochIncentives { epoch } => {
            to_json_binary(&query_epoch_incentives(deps, epoch)?)
        }
        QueryMsg::AggregatedIncentives { epoch } => {
            to_json_binary(&query_aggregated_incentives(deps, epoch, None)?)
        }
        QueryMsg::DepositorIncentives { epoch, address } => {
            let viewer = deps.api.addr_validate(&address)?;
            to_json_binary(&query_aggregated_incentives(deps, epoch, Some(viewer))?)
        }
        QueryMsg::Claimable { epoch, address } => {
            to_json_binary(&query_claimable(deps, epoch, address)?)
        }
        QueryMsg::Prices {} => to_json_binary(&query_prices(deps)?),
    }
}

fn query_current_epoch(deps: Deps, env: Env) -> StdResult<EpochResponse> {
    let config = CONFIG.load(deps.storage)?;
    let epoch = config.current_epoch(env.block.time);
    let (started_at, ends_at) = config.epoch_bounds(epoch);

    Ok(EpochResponse {
        epoch,
        started_at,
        ends_at,
    })
}

fn query_candidates(deps: Deps) -> StdResult<CandidatesResponse> {
    let mut candidates: Vec<Candidate> = CANDIDATES
        .range(deps.storage, None, None, Order::Ascending)
        .map(|entry| entry.map(|(_, candidate)| candidate))
        .collect::<StdResult<_>>()?;
    candidates.sort_by_key(|candidate| candidate.slot);

    Ok(CandidatesResponse { candidates })
}

fn query_application(deps: Deps, token: String) -> StdResult<ApplicationResponse> {
    let token = deps.api.addr_validate(&token)?;
    let application = APPLICATIONS
        .may_load(deps.storage, &token)?
        .ok_or_else(|| StdError::generic_err(format!("No application found for {}", token)))?;

    Ok(ApplicationResponse { application })
}

fn query_applications(deps: Deps) -> StdResult<ApplicationsResponse> {
    let applications: Vec<Application> = APPLICATIONS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|entry| entry.map(|(_, application)| application))
        .collect::<StdResult<_>>()?;

    Ok(ApplicationsResponse { applications })
}

fn query_user_vote(deps: Deps, epoch: u64, address: String) -> StdResult<UserVoteResponse> {
    let addr = deps.api.addr_validate(&address)?;
    let allocation = VOTES.may_load(deps.storage, (epoch, &addr))?;

    Ok(UserVoteResponse { allocation })
}

fn query_vote_tally(deps: Deps, epoch: u64) -> StdResult<VoteTallyResponse> {
    let count = CANDIDATE_COUNT.load(deps.storage)?;
    let mut tally = VOTE_TALLY.may_load(deps.storage, epoch)?.unwrap_or_default();
    tally.resize(usize::from(count) + 1, Uint128::zero());

    Ok(VoteTallyResponse { tally })
}

fn query_epoch_incentives(deps: Deps, epoch: u64) -> StdResult<EpochIncentivesResponse> {
    let deposits = EPOCH_DEPOSITS
        .may_load(deps.storage, epoch)?
        .unwrap_or_default();

    Ok(EpochIncentivesResponse {
        deposits: deposits
            .into_iter()
            .enumerate()
            .map(|(id, deposit)| IncentiveDepositInfo {
                id: id as u64,
                deposit,
            })
            .collect(),
    })
}

fn query_aggregated_incentives(
    deps: Deps,
    epoch: u64,
    viewer: Option<Addr>,
) -> StdResult<AggregatedIncentivesResponse> {
    let config = CONFIG.load(deps.storage)?;
    let reference = REFERENCE.load(deps.storage)?;
    let records = epoch_records(deps.storage, epoch)?;

    let price_of = |token: &str| PRICES.may_load(deps.storage, token).ok().flatten();
    let aggregated = aggregate(
        &records,
        price_of,
        &config.apr_formula,
        &reference,
        viewer.as_ref(),
    )
    .map_err(|err| StdError::generic_err(err.to_string()))?;

    let groups = if viewer.is_some() {
        aggregated.by_depositor
    } else {
        aggregated.by_recipient
    };

    Ok(AggregatedIncentivesResponse {
        groups: groups
            .into_iter()
            .map(|(address, summary)| AggregatedGroup { address, summary })
            .collect(),
    })
}

fn query_claimable(deps: Deps, epoch: u64, address: String) -> StdResult<ClaimableResponse> {
    let addr = deps.api.addr_validate(&address)?;

    if CLAIMS
        .may_load(deps.storage, (epoch, &addr))?
        .unwrap_or(false)
    {
        return Ok(ClaimableResponse { amounts: vec![] });
    }

    let allocation = match VOTES.may_load(deps.storage, (epoch, &addr))? {
        Some(allocation) => allocation,
        None => return Ok(ClaimableResponse { amounts: vec![] }),
    };

    let payouts = accrued_payouts(deps.storage, epoch, &allocation)?;

    Ok(ClaimableResponse {
        amounts: payouts
            .into_iter()
            .map(|(token, amount)| ClaimableAmount { token, amount })
            .collect(),
    })
}

fn query_prices(deps: Deps) -> StdResult<PricesResponse> {
    let prices: Vec<PriceUpdate> = PRICES
        .range(deps.storage, None, None, Order::Ascending)
        .map(|entry| entry.map(|(token, price)| PriceUpdate { token, price }))
        .collect::<StdResult<_>>()?;

    Ok(PricesResponse { prices })
}

// The records the aggregation queries fold over: every live deposit of the
// epoch, joined with its registered decimals.
fn epoch_records(storage: &dyn Storage, epoch: u64) -> StdResult<Vec<IncentiveRecord>> {
    let deposits = EPOCH_DEPOSITS.may_load(storage, epoch)?.unwrap_or_default();

    deposits
        .iter()
        .filter(|deposit| !deposit.refunded)
        .map(|deposit| {
            let token_info = TOKEN_INFOS.load(storage, &deposit.token)?;
            Ok(IncentiveRecord {
                recipient: deposit.candidate.clone(),
                depositor: deposit.depositor.clone(),
                token: deposit.token.clone(),
                decimals: token_info.decimals,
                amount: deposit.amount,
            })
        })
        .collect()
}
