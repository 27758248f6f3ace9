//! Sequencing of the analyses and merging of their results.

pub mod narrator;
pub mod outcome;

use std::sync::Arc;

use bon::Builder;
use serde::Serialize;

use crate::{
    analysis::{
        anomalies::AnomalyReport,
        cost::CostBreakdown,
        peaks::PeakHours,
        savings::{Savings, estimate_savings},
        statistics::ConsumptionStatistics,
    },
    coordinator::{narrator::Narrator, outcome::Outcome},
    error::ValidationError,
    prelude::*,
    quantity::{energy::KilowattHours, rate::KilowattHourRate},
    reading::ConsumptionReading,
    settings::Settings,
    tariff::Tariff,
};

/// Monthly consumption together with the tariff it is billed by.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Bill {
    pub consumption: KilowattHours,
    pub tariff: Tariff,
}

#[must_use]
#[derive(Clone, Debug, Default, Builder)]
pub struct AnalysisRequest {
    pub bill: Option<Bill>,

    #[builder(into)]
    pub readings: Option<Arc<[ConsumptionReading]>>,
}

/// Results of the analyses that only need the meter readings.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeterAnalysis {
    pub statistics: Outcome<ConsumptionStatistics>,
    pub peak_hours: Outcome<PeakHours>,
    pub anomalies: Outcome<AnomalyReport>,
}

/// Merged results of all the steps that were requested.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill: Option<Outcome<CostBreakdown>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meter: Option<MeterAnalysis>,

    /// One entry per configured reduction percentage, empty when the consumption is unknown.
    pub savings: Vec<Outcome<Savings>>,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub context: AnalysisContext,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

#[derive(Builder)]
pub struct Coordinator {
    #[builder(default)]
    settings: Settings,

    narrator: Option<Box<dyn Narrator>>,
}

impl Coordinator {
    /// Run the meter analyses concurrently on the blocking pool.
    ///
    /// Each analysis fails independently of the others.
    #[instrument(skip_all, fields(n_readings = readings.len(), rate = %rate))]
    pub async fn analyze_meter(
        &self,
        readings: Arc<[ConsumptionReading]>,
        rate: KilowattHourRate,
    ) -> MeterAnalysis {
        let top_n = self.settings.top_n;
        let sigmas = self.settings.anomaly_sigmas;
        let (statistics, peak_hours, anomalies) = tokio::join!(
            run_blocking({
                let readings = Arc::clone(&readings);
                move || ConsumptionStatistics::try_compute(&readings)
            }),
            run_blocking({
                let readings = Arc::clone(&readings);
                move || PeakHours::try_detect(&readings, top_n)
            }),
            run_blocking(move || AnomalyReport::try_detect(&readings, sigmas, rate)),
        );
        MeterAnalysis { statistics, peak_hours, anomalies }
    }

    /// Cost the bill, analyze the readings, project the savings, and narrate, in this order.
    ///
    /// The savings are projected for the bill consumption, or for the metered total when there
    /// is no bill. The unrounded rate of the billed consumption is used for the savings and
    /// anomaly costs whenever the bill was costed, and the default rate otherwise.
    #[instrument(
        skip_all,
        fields(has_bill = request.bill.is_some(), has_readings = request.readings.is_some()),
    )]
    pub async fn analyze(&self, request: AnalysisRequest) -> Report {
        let bill = request
            .bill
            .as_ref()
            .map(|bill| Outcome::from(bill.tariff.calculate_cost(bill.consumption)));
        let rate = bill
            .as_ref()
            .and_then(Outcome::success)
            .map_or(self.settings.default_rate, CostBreakdown::billed_rate);
        debug!(%rate, "effective rate");

        let meter = match request.readings {
            Some(readings) => Some(self.analyze_meter(readings, rate).await),
            None => None,
        };

        let consumption = request.bill.as_ref().map(|bill| bill.consumption).or_else(|| {
            meter.as_ref()?.statistics.success().map(|statistics| statistics.total)
        });
        let savings = consumption.map_or_else(Vec::new, |consumption| {
            self.settings
                .reduction_percentages
                .iter()
                .map(|reduction| estimate_savings(consumption, *reduction, rate).into())
                .collect()
        });

        let context = AnalysisContext { bill, meter, savings };
        let narrative = match &self.narrator {
            Some(narrator) => narrator
                .narrate(&context)
                .await
                .inspect_err(|error| warn!("failed to narrate: {error:#}"))
                .ok(),
            None => None,
        };
        info!(has_narrative = narrative.is_some(), "done");
        Report { context, narrative }
    }
}

async fn run_blocking<T, F>(analyze: F) -> Outcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ValidationError> + Send + 'static,
{
    match tokio::task::spawn_blocking(analyze).await {
        Ok(result) => result.into(),
        Err(error) => {
            error!("the analysis task failed: {error:#}");
            Outcome::error(error)
        }
    }
}
