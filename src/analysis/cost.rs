use itertools::Itertools;
use serde::Serialize;

use crate::{
    error::ValidationError,
    prelude::*,
    quantity::{cost::Cost, currency::Currency, energy::KilowattHours, rate::KilowattHourRate},
    tariff::RateTier,
};

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierCost {
    pub tier: String,

    #[serde(rename = "kwh")]
    pub consumption: KilowattHours,

    pub rate: KilowattHourRate,
    pub cost: Cost,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CostBreakdown {
    pub total_cost: Cost,
    pub currency: Currency,
    pub tier_breakdown: Vec<TierCost>,

    /// Total cost divided by the total consumption, rounded to 3 decimals.
    pub average_rate: KilowattHourRate,

    /// Consumption left over after all the tier thresholds got exhausted, it is not billed.
    #[serde(rename = "unallocated_kwh")]
    pub unallocated: KilowattHours,
}

/// Calculate the cost in the default currency.
pub fn calculate_cost(
    consumption: KilowattHours,
    tiers: &[RateTier],
) -> Result<CostBreakdown, ValidationError> {
    calculate_cost_in(consumption, tiers, Currency::default())
}

/// Apply the flat or progressive tiered billing to the total consumption.
///
/// With multiple tiers, the consumption fills the cheapest tier first, regardless of the tier
/// names. This is not a time-of-use allocation: callers must pick the tier per hour themselves
/// if they need one.
#[instrument(skip(tiers), fields(n_tiers = tiers.len()))]
pub fn calculate_cost_in(
    consumption: KilowattHours,
    tiers: &[RateTier],
    currency: Currency,
) -> Result<CostBreakdown, ValidationError> {
    if !consumption.is_positive() {
        return Err(ValidationError::NonPositiveConsumption(consumption));
    }
    for tier in tiers {
        tier.validate()?;
    }
    let (total_cost, tier_breakdown, unallocated) = match tiers {
        [] => return Err(ValidationError::EmptyTariff),
        [tier] => {
            let cost = consumption * tier.rate;
            (cost, vec![tier.cost(consumption, cost)], KilowattHours::ZERO)
        }
        _ => allocate_progressively(consumption, tiers),
    };
    if !total_cost.0.is_finite() {
        return Err(ValidationError::ConsumptionOverflow);
    }
    if unallocated > KilowattHours::ZERO {
        warn!(%unallocated, "consumption exceeds all the tier thresholds");
    }
    Ok(CostBreakdown {
        total_cost: total_cost.round_to(2),
        currency,
        tier_breakdown,
        average_rate: (total_cost / consumption).round_to(3),
        unallocated: unallocated.round_to(2),
    })
}

impl CostBreakdown {
    /// Unrounded average rate of the billed consumption, the unallocated one excluded.
    ///
    /// Falls back to the rounded average rate when nothing noticeable got billed.
    pub fn billed_rate(&self) -> KilowattHourRate {
        let billed: KilowattHours = self.tier_breakdown.iter().map(|tier| tier.consumption).sum();
        if billed.is_positive() { self.total_cost / billed } else { self.average_rate }
    }
}

fn allocate_progressively(
    consumption: KilowattHours,
    tiers: &[RateTier],
) -> (Cost, Vec<TierCost>, KilowattHours) {
    let mut remaining = consumption;
    let mut total_cost = Cost::ZERO;
    let mut breakdown = Vec::with_capacity(tiers.len());
    for tier in tiers.iter().sorted_by_key(|tier| tier.rate) {
        if remaining <= KilowattHours::ZERO {
            break;
        }
        let allocated = tier.threshold.map_or(remaining, |threshold| remaining.min(threshold));
        let cost = allocated * tier.rate;
        breakdown.push(tier.cost(allocated, cost));
        total_cost += cost;
        remaining -= allocated;
    }
    (total_cost, breakdown, remaining.max(KilowattHours::ZERO))
}

impl RateTier {
    fn cost(&self, consumption: KilowattHours, cost: Cost) -> TierCost {
        TierCost {
            tier: self.name.clone(),
            consumption: consumption.round_to(2),
            rate: self.rate,
            cost: cost.round_to(2),
        }
    }
}
