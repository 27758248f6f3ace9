use std::{fs, path::Path};

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{
    analysis::cost::{CostBreakdown, calculate_cost_in},
    error::ValidationError,
    prelude::*,
    quantity::{currency::Currency, energy::KilowattHours, rate::KilowattHourRate},
};

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Builder)]
pub struct RateTier {
    #[builder(into)]
    #[serde(rename = "tier_name")]
    pub name: String,

    #[serde(rename = "rate_per_kwh")]
    pub rate: KilowattHourRate,

    /// Maximum consumption billed in this tier. The tier takes all the remaining consumption
    /// when absent.
    #[serde(rename = "threshold_kwh")]
    pub threshold: Option<KilowattHours>,
}

impl RateTier {
    /// Check that the rate and the threshold, if any, are finite and positive.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.rate.is_positive() {
            return Err(ValidationError::NonPositiveRate(self.rate));
        }
        if let Some(threshold) = self.threshold
            && !threshold.is_positive()
        {
            return Err(ValidationError::NonPositiveThreshold {
                tier: self.name.clone(),
                threshold,
            });
        }
        Ok(())
    }
}

/// Rate tier as found in bills and tariff files.
///
/// Accepts either `rate` or `rate_per_kwh` and either `tier` or `tier_name`,
/// numbers may be quoted.
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct RawRateTier {
    #[serde(default, alias = "tier")]
    pub tier_name: Option<String>,

    #[serde(alias = "rate")]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub rate_per_kwh: Option<f64>,

    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub threshold_kwh: Option<f64>,
}

impl RawRateTier {
    /// Validate the tier, `position` is 0-based and is only used to name an anonymous tier.
    pub fn normalize(self, position: usize, n_tiers: usize) -> Result<RateTier, ValidationError> {
        let name = self.tier_name.unwrap_or_else(|| {
            if n_tiers == 1 { String::from("standard") } else { format!("tier_{}", position + 1) }
        });
        let rate = KilowattHourRate(
            self.rate_per_kwh.ok_or_else(|| ValidationError::MissingRate { tier: name.clone() })?,
        );
        let tier = RateTier { name, rate, threshold: self.threshold_kwh.map(KilowattHours) };
        tier.validate()?;
        Ok(tier)
    }
}

/// Tariff file contents: either a bare list of tiers, or a table with the tiers and currency.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTariff {
    Tiers(Vec<RawRateTier>),

    Schedule {
        #[serde(default)]
        currency: Option<Currency>,

        tiers: Vec<RawRateTier>,
    },
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tariff {
    pub currency: Currency,
    pub tiers: Vec<RateTier>,
}

impl Tariff {
    /// Single-tier tariff, used when the bill does not specify any tiers.
    pub fn flat(rate: KilowattHourRate, currency: Currency) -> Self {
        Self { currency, tiers: vec![RateTier::builder().name("standard").rate(rate).build()] }
    }

    pub fn try_from_raw(
        raw: RawTariff,
        default_currency: Currency,
    ) -> Result<Self, ValidationError> {
        let (currency, raw_tiers) = match raw {
            RawTariff::Tiers(tiers) => (None, tiers),
            RawTariff::Schedule { currency, tiers } => (currency, tiers),
        };
        if raw_tiers.is_empty() {
            return Err(ValidationError::EmptyTariff);
        }
        let n_tiers = raw_tiers.len();
        let tiers = raw_tiers
            .into_iter()
            .enumerate()
            .map(|(position, tier)| tier.normalize(position, n_tiers))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { currency: currency.unwrap_or(default_currency), tiers })
    }

    /// Load the tariff choosing the format by the file extension: `.json` or TOML otherwise.
    #[instrument(skip(default_currency))]
    pub fn load(path: &Path, default_currency: Currency) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        let raw: RawTariff =
            if path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("json")) {
                serde_json::from_str(&contents)?
            } else {
                toml::from_str(&contents)?
            };
        let this = Self::try_from_raw(raw, default_currency)?;
        info!(n_tiers = this.tiers.len(), currency = %this.currency, "loaded the tariff");
        Ok(this)
    }

    pub fn calculate_cost(
        &self,
        consumption: KilowattHours,
    ) -> Result<CostBreakdown, ValidationError> {
        calculate_cost_in(consumption, &self.tiers, self.currency.clone())
    }
}
