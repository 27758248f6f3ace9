use std::{fs::File, io::Read, path::Path};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::{prelude::*, quantity::energy::KilowattHours};

/// Single smart-meter reading.
///
/// Both fields are parsed independently at ingestion, so that a reading with a malformed
/// timestamp still contributes to the consumption statistics.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConsumptionReading {
    pub timestamp: Option<NaiveDateTime>,

    #[serde(rename = "consumption_kwh")]
    pub consumption: Option<KilowattHours>,
}

impl ConsumptionReading {
    pub const fn new(timestamp: NaiveDateTime, consumption: KilowattHours) -> Self {
        Self { timestamp: Some(timestamp), consumption: Some(consumption) }
    }

    pub fn parse(timestamp: Option<&str>, consumption: Option<&str>) -> Self {
        Self {
            timestamp: timestamp.and_then(parse_timestamp),
            consumption: consumption.and_then(parse_consumption),
        }
    }

    /// Hour of day as written in the timestamp.
    #[must_use]
    pub fn hour(&self) -> Option<u32> {
        self.timestamp.map(|timestamp| timestamp.hour())
    }
}

/// Parse an ISO-8601 timestamp keeping its wall-clock time.
///
/// The offset, if any, is dropped without converting: `10:00+02:00` is hour 10.
/// A bare date means midnight.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    const NAIVE_FORMATS: [&str; 4] =
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];

    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Some(timestamp.naive_local());
    }
    OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(text, format).ok())
        .map(|timestamp| timestamp.naive_local())
        .or_else(|| {
            NAIVE_FORMATS.iter().find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

#[must_use]
pub fn parse_consumption(text: &str) -> Option<KilowattHours> {
    text.trim().parse::<f64>().ok().and_then(finite_kilowatt_hours)
}

fn finite_kilowatt_hours(value: f64) -> Option<KilowattHours> {
    value.is_finite().then_some(KilowattHours(value))
}

/// Read `timestamp,consumption_kwh` CSV.
///
/// Column names are matched case-insensitively and extra columns are ignored.
/// Rows that cannot be read at all are skipped.
#[instrument(skip_all)]
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ConsumptionReading>> {
    let mut reader =
        ReaderBuilder::new().has_headers(true).flexible(true).trim(Trim::All).from_reader(reader);
    let headers = reader.headers().context("failed to read the CSV header")?.clone();
    let find_column =
        |name: &str| headers.iter().position(|header| header.eq_ignore_ascii_case(name));
    let consumption_column =
        find_column("consumption_kwh").context("the CSV has no `consumption_kwh` column")?;
    let timestamp_column = find_column("timestamp");
    if timestamp_column.is_none() {
        warn!("the CSV has no `timestamp` column, hourly analysis is unavailable");
    }

    let mut readings = Vec::new();
    let mut n_skipped = 0_usize;
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(error) => {
                debug!(%error, "skipping unreadable record");
                n_skipped += 1;
                continue;
            }
        };
        readings.push(ConsumptionReading::parse(
            timestamp_column.and_then(|column| record.get(column)),
            record.get(consumption_column),
        ));
    }
    info!(n_readings = readings.len(), n_skipped, "read CSV readings");
    Ok(readings)
}

#[serde_as]
#[derive(Deserialize)]
struct RawReading {
    #[serde(default)]
    #[serde_as(as = "DefaultOnError")]
    timestamp: Option<String>,

    #[serde(default)]
    #[serde_as(as = "DefaultOnError<Option<PickFirst<(_, DisplayFromStr)>>>")]
    consumption_kwh: Option<f64>,
}

impl From<RawReading> for ConsumptionReading {
    fn from(raw: RawReading) -> Self {
        Self {
            timestamp: raw.timestamp.as_deref().and_then(parse_timestamp),
            consumption: raw.consumption_kwh.and_then(finite_kilowatt_hours),
        }
    }
}

/// Read a JSON array of `{"timestamp": …, "consumption_kwh": …}` objects.
///
/// Numbers may be given as strings. Elements which are not objects are skipped.
#[instrument(skip_all)]
pub fn read_json<R: Read>(reader: R) -> Result<Vec<ConsumptionReading>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_reader(reader).context("expected a JSON array of readings")?;
    let n_values = values.len();
    let readings: Vec<ConsumptionReading> = values
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value::<RawReading>(value)
                .inspect_err(|error| debug!(%error, "skipping malformed reading"))
                .ok()
        })
        .map(ConsumptionReading::from)
        .collect();
    info!(n_readings = readings.len(), n_skipped = n_values - readings.len(), "read JSON readings");
    Ok(readings)
}

/// Load the readings choosing the format by the file extension: `.json` or CSV otherwise.
pub fn load(path: &Path) -> Result<Vec<ConsumptionReading>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let is_json =
        path.extension().is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
    let readings = if is_json { read_json(file) } else { read_csv(file) };
    readings.with_context(|| format!("failed to read readings from `{}`", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_parse_timestamp_keeps_wall_clock_hour() {
        let expected = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-11-01T10:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-11-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-11-01T10:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-11-01 10:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-11-01T10:00+05:30"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_date_only() {
        assert_eq!(parse_timestamp("2024-11-01").map(|timestamp| timestamp.hour()), Some(0));
    }

    #[test]
    fn test_parse_timestamp_malformed() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-01T10:00:00"), None);
    }

    #[test]
    fn test_parse_consumption() {
        assert_eq!(parse_consumption(" 1.5 "), Some(KilowattHours(1.5)));
        assert_eq!(parse_consumption("n/a"), None);
        assert_eq!(parse_consumption("NaN"), None);
        assert_eq!(parse_consumption("inf"), None);
    }

    #[test]
    fn test_read_csv() {
        let csv = "Timestamp, Consumption_kWh, note\n\
                   2024-11-01T00:00:00, 0.8, night\n\
                   not-a-date, 2.5\n\
                   2024-11-01T02:00:00, oops\n\
                   2024-11-01T03:00:00\n";
        let readings = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(readings.len(), 4);
        assert_eq!(readings[0].hour(), Some(0));
        assert_eq!(readings[0].consumption, Some(KilowattHours(0.8)));
        assert_eq!(readings[1].timestamp, None);
        assert_eq!(readings[1].consumption, Some(KilowattHours(2.5)));
        assert_eq!(readings[2].hour(), Some(2));
        assert_eq!(readings[2].consumption, None);
        assert_eq!(readings[3].consumption, None);
    }

    #[test]
    fn test_read_csv_without_consumption_column() {
        assert!(read_csv("timestamp,value\n2024-11-01T00:00:00,1\n".as_bytes()).is_err());
    }

    #[test]
    fn test_read_json() {
        let json = r#"[
            {"timestamp": "2024-11-01T18:00:00", "consumption_kwh": 3.2},
            {"timestamp": "2024-11-01T19:00:00", "consumption_kwh": "3.5"},
            {"timestamp": 42, "consumption_kwh": "lots"},
            {"consumption_kwh": null},
            "garbage"
        ]"#;
        let readings = read_json(json.as_bytes()).unwrap();
        assert_eq!(readings.len(), 4);
        assert_eq!(readings[0].hour(), Some(18));
        assert_eq!(readings[1].consumption, Some(KilowattHours(3.5)));
        assert_eq!(readings[2], ConsumptionReading { timestamp: None, consumption: None });
        assert_eq!(readings[3], ConsumptionReading { timestamp: None, consumption: None });
    }
}
