use std::collections::BTreeMap;

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Uint128};

use crate::amounts::normalize;
use crate::error::ContractError;

/// One decoded incentive deposit: `amount` of `token` posted for the
/// `recipient` candidate by `depositor`.
#[cw_serde]
pub struct IncentiveRecord {
    pub recipient: Addr,
    pub depositor: Addr,
    pub token: String,
    pub decimals: u8,
    pub amount: Uint128,
}

/// Per-token line inside a grouped summary. Amounts are decimal-scaled.
#[cw_serde]
pub struct TokenIncentive {
    pub token: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
}

/// Incentive summary for one recipient or depositor.
#[cw_serde]
#[derive(Default)]
pub struct GroupedIncentive {
    pub total_usd_value: Decimal,
    pub estimated_apr: Option<Decimal>,
    pub incentives: Vec<TokenIncentive>,
}

/// How the APR estimate is computed; fixed per deployment.
#[cw_serde]
pub enum AprFormula {
    /// `total_usd * 12 / total_deposited / quote_price * 100`. The reference
    /// deposited value is denominated in the quote asset and the aggregation
    /// window is one of twelve periods per year.
    QuoteDenominated,
    /// `total_usd / total_deposited * 100`, for deployments where the
    /// reference value is already in USD.
    UsdDenominated,
}

/// Reference values for the APR estimate, supplied by the operator.
#[cw_serde]
#[derive(Default)]
pub struct ReferenceValues {
    pub total_deposited: Decimal,
    pub quote_price: Decimal,
}

/// Output of [`aggregate`]: the same records grouped two ways.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aggregated {
    pub by_recipient: BTreeMap<Addr, GroupedIncentive>,
    pub by_depositor: BTreeMap<Addr, GroupedIncentive>,
}

/// Folds a flat list of incentive records into per-recipient and
/// per-depositor summaries with USD valuation and an APR estimate.
///
/// `price_of` may return `None` for unpriced tokens; those records still
/// appear in the summaries with a zero USD value so the raw token amount
/// stays visible. The depositor view only covers `viewer`'s own deposits.
/// Errors are precondition violations only (a record with an invalid
/// decimals count or an amount outside the decimal range).
pub fn aggregate<F>(
    records: &[IncentiveRecord],
    price_of: F,
    formula: &AprFormula,
    reference: &ReferenceValues,
    viewer: Option<&Addr>,
) -> Result<Aggregated, ContractError>
where
    F: Fn(&str) -> Option<Decimal>,
{
    let mut aggregated = Aggregated::default();

    for record in records {
        let amount = normalize(record.amount, record.decimals)?;
        let price = price_of(&record.token).unwrap_or_default();
        let usd_value = amount * price;

        let group = aggregated
            .by_recipient
            .entry(record.recipient.clone())
            .or_default();
        fold_into(group, &record.token, amount, usd_value);

        if viewer == Some(&record.depositor) {
            let group = aggregated
                .by_depositor
                .entry(record.depositor.clone())
                .or_default();
            fold_into(group, &record.token, amount, usd_value);
        }
    }

    for group in aggregated
        .by_recipient
        .values_mut()
        .chain(aggregated.by_depositor.values_mut())
    {
        group.estimated_apr = estimated_apr(formula, reference, group.total_usd_value);
    }

    Ok(aggregated)
}

// Same-token entries merge instead of duplicating; the total is recomputed
// from the per-token lines after every insert so it can never drift.
fn fold_into(group: &mut GroupedIncentive, token: &str, amount: Decimal, usd_value: Decimal) {
    match group
        .incentives
        .iter_mut()
        .find(|entry| entry.token == token)
    {
        Some(entry) => {
            entry.amount += amount;
            entry.usd_value += usd_value;
        }
        None => group.incentives.push(TokenIncentive {
            token: token.to_string(),
            amount,
            usd_value,
        }),
    }

    group.total_usd_value = group
        .incentives
        .iter()
        .fold(Decimal::zero(), |acc, entry| acc + entry.usd_value);
}

/// APR display estimate. `None` when the reference deposited value (or the
/// quote price, where one applies) is zero: "unknown" rather than a division
/// by zero.
pub fn estimated_apr(
    formula: &AprFormula,
    reference: &ReferenceValues,
    total_usd_value: Decimal,
) -> Option<Decimal> {
    if reference.total_deposited.is_zero() {
        return None;
    }

    let share = total_usd_value.checked_div(reference.total_deposited).ok()?;
    let rate = match formula {
        AprFormula::QuoteDenominated => {
            if reference.quote_price.is_zero() {
                return None;
            }
            share
                .checked_mul(Decimal::from_ratio(12u128, 1u128))
                .ok()?
                .checked_div(reference.quote_price)
                .ok()?
        }
        AprFormula::UsdDenominated => share,
    };

    rate.checked_mul(Decimal::from_ratio(100u128, 1u128)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(recipient: &str, depositor: &str, token: &str, amount: u128) -> IncentiveRecord {
        IncentiveRecord {
            recipient: Addr::unchecked(recipient),
            depositor: Addr::unchecked(depositor),
            token: token.to_string(),
            decimals: 6,
            amount: Uint128::new(amount),
        }
    }

    fn usd_reference(total_deposited: Decimal) -> ReferenceValues {
        ReferenceValues {
            total_deposited,
            quote_price: Decimal::zero(),
        }
    }

    #[test]
    fn empty_records_give_empty_maps() {
        let aggregated = aggregate(
            &[],
            |_| Some(Decimal::one()),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::one()),
            Some(&Addr::unchecked("viewer")),
        )
        .unwrap();

        assert!(aggregated.by_recipient.is_empty());
        assert!(aggregated.by_depositor.is_empty());
    }

    #[test]
    fn values_records_at_fetched_price() {
        // 1.0 token at 2.0 USD
        let records = vec![record("lst_a", "user", "tkn", 1_000_000)];
        let aggregated = aggregate(
            &records,
            |_| Some(Decimal::percent(200)),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::zero()),
            None,
        )
        .unwrap();

        let group = &aggregated.by_recipient[&Addr::unchecked("lst_a")];
        assert_eq!(group.total_usd_value, Decimal::percent(200));
        assert_eq!(group.incentives.len(), 1);
        assert_eq!(group.incentives[0].amount, Decimal::one());
    }

    #[test]
    fn merges_same_recipient_and_token() {
        let records = vec![
            record("lst_a", "user_1", "tkn", 1_000_000),
            record("lst_a", "user_2", "tkn", 500_000),
        ];
        let aggregated = aggregate(
            &records,
            |_| Some(Decimal::one()),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::zero()),
            None,
        )
        .unwrap();

        let group = &aggregated.by_recipient[&Addr::unchecked("lst_a")];
        assert_eq!(group.incentives.len(), 1);
        assert_eq!(group.incentives[0].usd_value, Decimal::percent(150));
        assert_eq!(group.total_usd_value, Decimal::percent(150));
    }

    #[test]
    fn distinct_tokens_stay_separate() {
        let records = vec![
            record("lst_a", "user", "tkn_1", 1_000_000),
            record("lst_a", "user", "tkn_2", 1_000_000),
        ];
        let aggregated = aggregate(
            &records,
            |_| Some(Decimal::one()),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::zero()),
            None,
        )
        .unwrap();

        let group = &aggregated.by_recipient[&Addr::unchecked("lst_a")];
        assert_eq!(group.incentives.len(), 2);
        assert_eq!(group.total_usd_value, Decimal::percent(200));
    }

    #[test]
    fn unpriced_tokens_still_recorded() {
        let records = vec![record("lst_a", "user", "tkn", 3_000_000)];
        let aggregated = aggregate(
            &records,
            |_| None,
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::from_ratio(10u128, 1u128)),
            None,
        )
        .unwrap();

        let group = &aggregated.by_recipient[&Addr::unchecked("lst_a")];
        assert_eq!(group.total_usd_value, Decimal::zero());
        assert_eq!(group.incentives[0].amount, Decimal::percent(300));
    }

    #[test]
    fn depositor_view_is_filtered_to_viewer() {
        let viewer = Addr::unchecked("user_1");
        let records = vec![
            record("lst_a", "user_1", "tkn", 1_000_000),
            record("lst_a", "user_2", "tkn", 9_000_000),
            record("lst_b", "user_1", "tkn", 2_000_000),
        ];
        let aggregated = aggregate(
            &records,
            |_| Some(Decimal::one()),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::zero()),
            Some(&viewer),
        )
        .unwrap();

        assert_eq!(aggregated.by_depositor.len(), 1);
        let group = &aggregated.by_depositor[&viewer];
        assert_eq!(group.total_usd_value, Decimal::percent(300));
        assert_eq!(aggregated.by_recipient.len(), 2);
    }

    #[test]
    fn apr_is_unknown_for_zero_reference() {
        let records = vec![record("lst_a", "user", "tkn", 1_000_000)];
        let aggregated = aggregate(
            &records,
            |_| Some(Decimal::one()),
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::zero()),
            None,
        )
        .unwrap();

        let group = &aggregated.by_recipient[&Addr::unchecked("lst_a")];
        assert_eq!(group.estimated_apr, None);
    }

    #[test]
    fn usd_denominated_apr() {
        // 5 USD of incentives on 100 USD deposited => 5%
        let apr = estimated_apr(
            &AprFormula::UsdDenominated,
            &usd_reference(Decimal::from_ratio(100u128, 1u128)),
            Decimal::from_ratio(5u128, 1u128),
        );
        assert_eq!(apr, Some(Decimal::percent(500)));
    }

    #[test]
    fn quote_denominated_apr() {
        // 10 USD monthly on 6 quote-asset units deposited at 100 USD each:
        // 10 * 12 / 6 / 100 * 100 = 20
        let reference = ReferenceValues {
            total_deposited: Decimal::from_ratio(6u128, 1u128),
            quote_price: Decimal::from_ratio(100u128, 1u128),
        };
        let apr = estimated_apr(
            &AprFormula::QuoteDenominated,
            &reference,
            Decimal::from_ratio(10u128, 1u128),
        );
        assert_eq!(apr, Some(Decimal::from_ratio(20u128, 1u128)));

        let zero_quote = ReferenceValues {
            total_deposited: Decimal::one(),
            quote_price: Decimal::zero(),
        };
        let apr = estimated_apr(
            &AprFormula::QuoteDenominated,
            &zero_quote,
            Decimal::one(),
        );
        assert_eq!(apr, None);
    }
}
