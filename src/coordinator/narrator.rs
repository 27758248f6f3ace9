use async_trait::async_trait;
use itertools::Itertools;

use crate::{
    coordinator::{AnalysisContext, MeterAnalysis, outcome::Outcome},
    prelude::*,
};

/// Turns the merged analysis results into a human-readable narrative.
#[async_trait]
pub trait Narrator: Send + Sync {
    async fn narrate(&self, context: &AnalysisContext) -> Result<String>;
}

/// Plain-text digest of the analysis, one line per finding.
#[derive(Copy, Clone, Debug, Default)]
pub struct Digest;

#[async_trait]
impl Narrator for Digest {
    #[instrument(skip_all)]
    async fn narrate(&self, context: &AnalysisContext) -> Result<String> {
        let mut lines = Vec::new();

        match &context.bill {
            Some(Outcome::Success(bill)) => {
                lines.push(format!(
                    "The bill costs {} {} at {} on average.",
                    bill.total_cost, bill.currency, bill.average_rate,
                ));
                if bill.unallocated.0 > 0.0 {
                    lines.push(format!("{} are not covered by any tier.", bill.unallocated));
                }
            }
            Some(Outcome::Error { error_message }) => {
                lines.push(format!("The bill could not be costed: {error_message}."));
            }
            None => {}
        }

        if let Some(meter) = &context.meter {
            narrate_meter(meter, &mut lines);
        }

        for savings in context.savings.iter().filter_map(Outcome::success) {
            lines.push(format!(
                "Cutting {} saves {} per month and {} per year.",
                savings.reduction_percentage, savings.monthly_savings, savings.annual_savings,
            ));
        }

        ensure!(!lines.is_empty(), "nothing to narrate");
        Ok(lines.join("\n"))
    }
}

fn narrate_meter(meter: &MeterAnalysis, lines: &mut Vec<String>) {
    match &meter.statistics {
        Outcome::Success(statistics) => lines.push(format!(
            "{} readings total {}, {} per reading on average.",
            statistics.count, statistics.total, statistics.mean,
        )),
        Outcome::Error { error_message } => {
            lines.push(format!("Statistics are unavailable: {error_message}."));
        }
    }
    match &meter.peak_hours {
        Outcome::Success(peaks) => lines.push(format!(
            "Consumption peaks at {} with {} on average.",
            peaks.peak_hours.iter().map(|hour| format!("{hour:02}:00")).join(", "),
            peaks.average_peak,
        )),
        Outcome::Error { error_message } => {
            lines.push(format!("Peak hours are unavailable: {error_message}."));
        }
    }
    match &meter.anomalies {
        Outcome::Success(report) if report.summary.total_anomalies == 0 => {
            lines.push(String::from("No anomalies found."));
        }
        Outcome::Success(report) => lines.push(format!(
            "{} anomalies found, {} of high severity, wasting {}.",
            report.summary.total_anomalies,
            report.summary.high_severity_count,
            report.summary.estimated_waste,
        )),
        Outcome::Error { error_message } => {
            lines.push(format!("Anomalies are unavailable: {error_message}."));
        }
    }
}
