use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use meterwise::{
    prelude::*,
    quantity::{
        currency::Currency,
        energy::KilowattHours,
        percentage::Percentage,
        rate::KilowattHourRate,
    },
    settings::Settings,
    tariff::Tariff,
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[clap(long, global = true, value_enum, default_value = "table", env = "OUTPUT_FORMAT")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, ValueEnum)]
pub enum Format {
    /// Human-readable tables.
    Table,

    /// Pretty-printed JSON.
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Descriptive statistics of the metered consumption.
    #[clap(name = "statistics")]
    Statistics(ReadingsArgs),

    /// Hours of day with the highest average consumption.
    #[clap(name = "peaks")]
    Peaks(PeaksArgs),

    /// Readings deviating too far from the mean.
    #[clap(name = "anomalies")]
    Anomalies(AnomaliesArgs),

    /// Bill the consumption according to the tariff.
    #[clap(name = "cost")]
    Cost(CostArgs),

    /// Project the savings of a consumption reduction.
    #[clap(name = "savings")]
    Savings(SavingsArgs),

    /// Run everything that the inputs allow for and summarize.
    #[clap(name = "analyze")]
    Analyze(Box<AnalyzeArgs>),
}

#[derive(Parser)]
pub struct ReadingsArgs {
    /// Meter readings: CSV, or JSON if the file extension is `.json`.
    #[clap(long = "readings", env = "READINGS_PATH")]
    pub path: PathBuf,
}

#[derive(Copy, Clone, Parser)]
pub struct RateArgs {
    /// Flat rate per kilowatt-hour, when the tariff is unknown.
    #[clap(long = "rate-per-kwh", default_value = "0.15", env = "DEFAULT_RATE_PER_KWH")]
    pub rate: KilowattHourRate,
}

#[derive(Parser)]
pub struct PeaksArgs {
    #[clap(flatten)]
    pub readings: ReadingsArgs,

    /// Number of peak hours to show.
    #[clap(long = "top", default_value = "5", env = "PEAK_HOURS_TOP_N")]
    pub top_n: usize,
}

#[derive(Parser)]
pub struct AnomaliesArgs {
    #[clap(flatten)]
    pub readings: ReadingsArgs,

    /// Number of standard deviations from the mean beyond which a reading is anomalous.
    #[clap(long = "sigmas", default_value = "2.0", env = "ANOMALY_SIGMAS")]
    pub sigmas: f64,

    #[clap(flatten)]
    pub rate: RateArgs,
}

#[derive(Parser)]
pub struct TariffArgs {
    /// Rate tiers: TOML, or JSON if the file extension is `.json`.
    ///
    /// A single flat tier at the default rate is used when omitted.
    #[clap(long = "tariff", env = "TARIFF_PATH")]
    pub path: Option<PathBuf>,

    #[clap(flatten)]
    pub default_rate: RateArgs,

    /// Currency of the flat tariff and of the tariff files which do not specify one.
    #[clap(long = "currency", default_value = "USD", env = "CURRENCY")]
    pub currency: Currency,
}

impl TariffArgs {
    pub fn load(&self) -> Result<Tariff> {
        match &self.path {
            Some(path) => Tariff::load(path, self.currency.clone()),
            None => Ok(Tariff::flat(self.default_rate.rate, self.currency.clone())),
        }
    }
}

#[derive(Parser)]
pub struct CostArgs {
    /// Billed consumption in kilowatt-hours.
    #[clap(long = "consumption-kwh")]
    pub consumption: KilowattHours,

    #[clap(flatten)]
    pub tariff: TariffArgs,
}

#[derive(Parser)]
pub struct SavingsArgs {
    /// Current monthly consumption in kilowatt-hours.
    #[clap(long = "consumption-kwh")]
    pub consumption: KilowattHours,

    /// Hypothetical consumption reduction, 0 to 100.
    #[clap(long = "reduction-percent")]
    pub reduction: Percentage,

    #[clap(flatten)]
    pub rate: RateArgs,
}

#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Meter readings: CSV, or JSON if the file extension is `.json`.
    #[clap(long = "readings", env = "READINGS_PATH")]
    pub readings: Option<PathBuf>,

    /// Monthly consumption from the bill in kilowatt-hours.
    #[clap(long = "bill-consumption-kwh", env = "BILL_CONSUMPTION_KWH")]
    pub bill_consumption: Option<KilowattHours>,

    #[clap(flatten)]
    pub tariff: TariffArgs,

    #[clap(long = "top", default_value = "5", env = "PEAK_HOURS_TOP_N")]
    pub top_n: usize,

    #[clap(long = "sigmas", default_value = "2.0", env = "ANOMALY_SIGMAS")]
    pub sigmas: f64,

    /// Reductions to project the savings for.
    #[clap(
        long = "reduction-percents",
        env = "REDUCTION_PERCENTS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "5,10,15",
    )]
    pub reduction_percentages: Vec<Percentage>,

    /// Skip the plain-text digest.
    #[clap(long)]
    pub no_narrative: bool,
}

impl AnalyzeArgs {
    pub fn settings(&self) -> Settings {
        Settings::builder()
            .currency(self.tariff.currency.clone())
            .default_rate(self.tariff.default_rate.rate)
            .top_n(self.top_n)
            .anomaly_sigmas(self.sigmas)
            .reduction_percentages(self.reduction_percentages.clone())
            .build()
    }
}
