//! Column layout of the weather tables and the row type they materialize into.

use chrono::{DateTime, Utc};
use polars::prelude::*;

/// Station identifier column.
pub const STATION: &str = "station";
/// Observation timestamp column (naive UTC, millisecond precision).
pub const DATE: &str = "date";
/// Name of the timestamp column in the raw observation payload.
pub(crate) const RAW_TIMESTAMP: &str = "valid";

/// The seven measurement columns coerced to `f64`.
pub const NUMERIC_COLUMNS: [&str; 7] = ["tmpf", "relh", "sped", "mslp", "p01i", "vsby", "gust_mph"];

/// Categorical sky-condition columns, kept as strings.
pub const SKY_COLUMNS: [&str; 3] = ["skyc1", "skyc2", "skyc3"];

/// Every column of a normalized weather table, in storage order.
pub fn schema_column_names() -> Vec<&'static str> {
    let mut names = vec![STATION, DATE];
    names.extend(NUMERIC_COLUMNS);
    names.extend(SKY_COLUMNS);
    names
}

/// Field names requested from the observation service.
pub(crate) fn requested_fields() -> impl Iterator<Item = &'static str> {
    NUMERIC_COLUMNS.into_iter().chain(SKY_COLUMNS)
}

/// One hourly observation from one station.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub station: String,
    pub timestamp: DateTime<Utc>,
    /// Air temperature, °F.
    pub temperature: Option<f64>,
    /// Relative humidity, %.
    pub relative_humidity: Option<f64>,
    /// Wind speed, mph.
    pub wind_speed: Option<f64>,
    /// Mean sea-level pressure, mb.
    pub sea_level_pressure: Option<f64>,
    /// One hour precipitation, inches.
    pub precipitation: Option<f64>,
    /// Visibility, miles.
    pub visibility: Option<f64>,
    /// Wind gust, mph.
    pub gust_speed: Option<f64>,
    pub sky_conditions: [Option<String>; 3],
}

/// The merged weather dataset: every station's observations, sorted by
/// `(station, date)` with no duplicate keys.
#[derive(Debug, Clone)]
pub struct WeatherTable {
    pub frame: DataFrame,
}

impl WeatherTable {
    pub fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// The `(station, timestamp)` index of every row, in table order.
    pub fn keys(&self) -> PolarsResult<Vec<(String, DateTime<Utc>)>> {
        let stations = self.frame.column(STATION)?.str()?;
        let millis = self.frame.column(DATE)?.cast(&DataType::Int64)?;
        let millis = millis.i64()?;

        Ok(stations
            .into_iter()
            .zip(millis.into_iter())
            .filter_map(|(station, ms)| {
                Some((station?.to_string(), DateTime::from_timestamp_millis(ms?)?))
            })
            .collect())
    }

    /// Materializes every row into a [`WeatherRecord`].
    pub fn records(&self) -> PolarsResult<Vec<WeatherRecord>> {
        let df = &self.frame;
        let stations = df.column(STATION)?.str()?;
        let millis = df.column(DATE)?.cast(&DataType::Int64)?;
        let millis = millis.i64()?;

        let numeric = NUMERIC_COLUMNS
            .iter()
            .map(|name| df.column(name).and_then(|c| c.f64().cloned()))
            .collect::<PolarsResult<Vec<_>>>()?;
        let sky = SKY_COLUMNS
            .iter()
            .map(|name| df.column(name).and_then(|c| c.str().cloned()))
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(df.height());
        for idx in 0..df.height() {
            let (Some(station), Some(timestamp)) = (
                stations.get(idx),
                millis.get(idx).and_then(DateTime::from_timestamp_millis),
            ) else {
                continue;
            };
            let value = |col: usize| numeric[col].get(idx);
            let sky_code = |col: usize| sky[col].get(idx).map(str::to_string);

            records.push(WeatherRecord {
                station: station.to_string(),
                timestamp,
                temperature: value(0),
                relative_humidity: value(1),
                wind_speed: value(2),
                sea_level_pressure: value(3),
                precipitation: value(4),
                visibility: value(5),
                gust_speed: value(6),
                sky_conditions: [sky_code(0), sky_code(1), sky_code(2)],
            });
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_starts_with_index_columns() {
        let names = schema_column_names();
        assert_eq!(names.len(), 12);
        assert_eq!(&names[..2], &["station", "date"]);
        assert_eq!(names[2], "tmpf");
        assert_eq!(names[11], "skyc3");
    }

    #[test]
    fn requested_fields_skip_index_columns() {
        let fields: Vec<_> = requested_fields().collect();
        assert_eq!(fields.len(), 10);
        assert!(!fields.contains(&"station"));
        assert!(fields.contains(&"gust_mph"));
    }
}
