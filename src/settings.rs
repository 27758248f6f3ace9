use bon::Builder;

use crate::quantity::{currency::Currency, percentage::Percentage, rate::KilowattHourRate};

/// Analysis parameters that the bills and readings do not carry themselves.
#[must_use]
#[derive(Clone, Debug, PartialEq, Builder)]
pub struct Settings {
    /// Currency of the flat fallback tariff and of the tariffs which do not name one.
    #[builder(default)]
    pub currency: Currency,

    /// Flat rate used when the bill tiers are unknown.
    #[builder(default = Settings::DEFAULT_RATE)]
    pub default_rate: KilowattHourRate,

    /// Number of peak hours to report.
    #[builder(default = 5)]
    pub top_n: usize,

    /// Number of standard deviations from the mean beyond which a reading is anomalous.
    #[builder(default = 2.0)]
    pub anomaly_sigmas: f64,

    /// Hypothetical consumption reductions to project the savings for.
    #[builder(default = vec![Percentage(5.0), Percentage(10.0), Percentage(15.0)])]
    pub reduction_percentages: Vec<Percentage>,
}

impl Settings {
    pub const DEFAULT_RATE: KilowattHourRate = KilowattHourRate(0.15);
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}
