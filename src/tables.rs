use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use meterwise::{
    analysis::{
        anomalies::{AnomalyReport, AnomalyType, Severity},
        cost::CostBreakdown,
        peaks::PeakHours,
        savings::Savings,
        statistics::ConsumptionStatistics,
    },
    quantity::{cost::Cost, energy::KilowattHours},
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_statistics_table(statistics: &ConsumptionStatistics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Readings", "Total", "Mean", "Median", "Std. dev.", "Min", "Max"]);
    table.add_row(vec![
        Cell::new(statistics.count).set_alignment(CellAlignment::Right),
        Cell::new(statistics.total).set_alignment(CellAlignment::Right),
        Cell::new(statistics.mean).set_alignment(CellAlignment::Right),
        Cell::new(statistics.median).set_alignment(CellAlignment::Right),
        Cell::new(statistics.std_dev).set_alignment(CellAlignment::Right),
        Cell::new(statistics.min).set_alignment(CellAlignment::Right).fg(Color::Green),
        Cell::new(statistics.max).set_alignment(CellAlignment::Right).fg(Color::Red),
    ]);
    table
}

pub fn build_peaks_table(peaks: &PeakHours) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Hour", "Average"]);
    for hour in &peaks.peak_hours {
        let average = peaks.hourly_consumption.get(hour).copied().unwrap_or(KilowattHours::ZERO);
        table.add_row(vec![
            Cell::new(format!("{hour:02}:00")),
            Cell::new(average).set_alignment(CellAlignment::Right).fg(
                if average >= peaks.average_peak { Color::Red } else { Color::DarkYellow },
            ),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!("{} hours", peaks.total_hours_analyzed)).add_attribute(Attribute::Dim),
        Cell::new(peaks.average_peak)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_cost_table(breakdown: &CostBreakdown) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Tier", "Consumption", "Rate", "Cost"]);
    for tier in &breakdown.tier_breakdown {
        table.add_row(vec![
            Cell::new(&tier.tier),
            Cell::new(tier.consumption).set_alignment(CellAlignment::Right),
            Cell::new(tier.rate).set_alignment(CellAlignment::Right),
            Cell::new(tier.cost).set_alignment(CellAlignment::Right),
        ]);
    }
    if breakdown.unallocated > KilowattHours::ZERO {
        table.add_row(vec![
            Cell::new("unallocated").fg(Color::Red),
            Cell::new(breakdown.unallocated).set_alignment(CellAlignment::Right).fg(Color::Red),
            Cell::new(""),
            Cell::new(""),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(breakdown.average_rate).set_alignment(CellAlignment::Right),
        Cell::new(format!("{} {}", breakdown.total_cost, breakdown.currency))
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn build_savings_table(scenarios: &[Savings]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Reduction",
        "Saved monthly",
        "Saved annually",
        "Current cost",
        "New cost",
        "Monthly savings",
        "Annual savings",
    ]);
    for savings in scenarios {
        table.add_row(vec![
            Cell::new(savings.reduction_percentage).set_alignment(CellAlignment::Right),
            Cell::new(savings.monthly_energy_saved).set_alignment(CellAlignment::Right),
            Cell::new(savings.annual_energy_saved).set_alignment(CellAlignment::Right),
            Cell::new(savings.current_monthly_cost)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(savings.new_monthly_cost).set_alignment(CellAlignment::Right),
            Cell::new(savings.monthly_savings).set_alignment(CellAlignment::Right).fg(Color::Green),
            Cell::new(savings.annual_savings).set_alignment(CellAlignment::Right).fg(Color::Green),
        ]);
    }
    table
}

pub fn build_anomalies_table(report: &AnomalyReport) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Time",
        "Consumption",
        "Expected",
        "Deviation",
        "Z-score",
        "Type",
        "Severity",
        "Cost impact",
    ]);
    for anomaly in &report.anomalies {
        table.add_row(vec![
            Cell::new(anomaly.timestamp.map_or_else(
                || String::from("?"),
                |timestamp| timestamp.format("%Y-%m-%d %H:%M").to_string(),
            )),
            Cell::new(anomaly.consumption).set_alignment(CellAlignment::Right),
            Cell::new(anomaly.expected)
                .set_alignment(CellAlignment::Right)
                .add_attribute(Attribute::Dim),
            Cell::new(
                anomaly
                    .deviation_percentage
                    .map_or_else(|| String::from("n/a"), |deviation| deviation.to_string()),
            )
            .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:+.2}", anomaly.z_score)).set_alignment(CellAlignment::Right),
            Cell::new(anomaly.anomaly_type).fg(match anomaly.anomaly_type {
                AnomalyType::Spike => Color::Red,
                AnomalyType::Drop => Color::Blue,
            }),
            Cell::new(anomaly.severity).fg(match anomaly.severity {
                Severity::High => Color::Red,
                Severity::Medium => Color::DarkYellow,
                Severity::Low => Color::Reset,
            }),
            Cell::new(anomaly.cost_impact)
                .set_alignment(CellAlignment::Right)
                .fg(if anomaly.cost_impact > Cost::ZERO { Color::Red } else { Color::Green }),
        ]);
    }
    table.add_row(vec![
        Cell::new(format!("{} anomalies", report.summary.total_anomalies))
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{}..{}", report.lower_threshold, report.upper_threshold))
            .add_attribute(Attribute::Dim),
        Cell::new(report.mean).set_alignment(CellAlignment::Right).add_attribute(Attribute::Dim),
        Cell::new(""),
        Cell::new(""),
        Cell::new(""),
        Cell::new(format!("{} high", report.summary.high_severity_count)),
        Cell::new(report.summary.estimated_waste)
            .set_alignment(CellAlignment::Right)
            .add_attribute(Attribute::Bold),
    ]);
    table
}
