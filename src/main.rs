mod cli;
mod tables;

use std::io;

use clap::{Parser, crate_version};
use comfy_table::Table;
use meterwise::{
    analysis::{
        anomalies::AnomalyReport,
        peaks::PeakHours,
        savings::{Savings, estimate_savings},
        statistics::ConsumptionStatistics,
    },
    coordinator::{
        AnalysisRequest,
        Bill,
        Coordinator,
        Report,
        narrator::{Digest, Narrator},
        outcome::Outcome,
    },
    prelude::*,
    reading,
};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

use crate::{
    cli::{AnalyzeArgs, Args, Command, Format},
    tables::{
        build_anomalies_table,
        build_cost_table,
        build_peaks_table,
        build_savings_table,
        build_statistics_table,
    },
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy(),
        )
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();

    match args.command {
        Command::Statistics(command_args) => {
            let readings = reading::load(&command_args.path)?;
            let statistics = ConsumptionStatistics::try_compute(&readings)?;
            print(args.format, &statistics, build_statistics_table)?;
        }
        Command::Peaks(command_args) => {
            let readings = reading::load(&command_args.readings.path)?;
            let peaks = PeakHours::try_detect(&readings, command_args.top_n)?;
            print(args.format, &peaks, build_peaks_table)?;
        }
        Command::Anomalies(command_args) => {
            let readings = reading::load(&command_args.readings.path)?;
            let report =
                AnomalyReport::try_detect(&readings, command_args.sigmas, command_args.rate.rate)?;
            print(args.format, &report, build_anomalies_table)?;
        }
        Command::Cost(command_args) => {
            let breakdown =
                command_args.tariff.load()?.calculate_cost(command_args.consumption)?;
            print(args.format, &breakdown, build_cost_table)?;
        }
        Command::Savings(command_args) => {
            let savings = estimate_savings(
                command_args.consumption,
                command_args.reduction,
                command_args.rate.rate,
            )?;
            print(args.format, &savings, |savings| {
                build_savings_table(std::slice::from_ref(savings))
            })?;
        }
        Command::Analyze(command_args) => {
            let report = analyze(&command_args).await?;
            match args.format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Table => print_report(&report),
            }
        }
    }

    info!("done!");
    Ok(())
}

async fn analyze(args: &AnalyzeArgs) -> Result<Report> {
    if args.readings.is_none() && args.bill_consumption.is_none() {
        bail!("nothing to analyze, specify `--readings` and/or `--bill-consumption-kwh`");
    }
    let bill = match args.bill_consumption {
        Some(consumption) => Some(Bill { consumption, tariff: args.tariff.load()? }),
        None => None,
    };
    let readings = args.readings.as_deref().map(reading::load).transpose()?;
    let coordinator = Coordinator::builder()
        .settings(args.settings())
        .maybe_narrator((!args.no_narrative).then(|| Box::new(Digest) as Box<dyn Narrator>))
        .build();
    let request = AnalysisRequest::builder().maybe_bill(bill).maybe_readings(readings).build();
    Ok(coordinator.analyze(request).await)
}

fn print<T: Serialize>(
    format: Format,
    value: &T,
    build_table: impl FnOnce(&T) -> Table,
) -> Result {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Table => println!("{}", build_table(value)),
    }
    Ok(())
}

fn print_report(report: &Report) {
    if let Some(bill) = &report.context.bill {
        print_outcome("Bill", bill, build_cost_table);
    }
    if let Some(meter) = &report.context.meter {
        print_outcome("Statistics", &meter.statistics, build_statistics_table);
        print_outcome("Peak hours", &meter.peak_hours, build_peaks_table);
        print_outcome("Anomalies", &meter.anomalies, build_anomalies_table);
    }
    let scenarios: Vec<Savings> =
        report.context.savings.iter().filter_map(Outcome::success).copied().collect();
    if !scenarios.is_empty() {
        println!("Savings\n{}", build_savings_table(&scenarios));
    }
    for outcome in &report.context.savings {
        if let Outcome::Error { error_message } = outcome {
            println!("Savings: {error_message}");
        }
    }
    if let Some(narrative) = &report.narrative {
        println!("\n{narrative}");
    }
}

fn print_outcome<T>(title: &str, outcome: &Outcome<T>, build_table: impl FnOnce(&T) -> Table) {
    match outcome {
        Outcome::Success(value) => println!("{title}\n{}", build_table(value)),
        Outcome::Error { error_message } => println!("{title}: {error_message}"),
    }
}
