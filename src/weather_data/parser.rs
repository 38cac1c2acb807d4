//! Normalizes a raw observation payload into a weather table.

use crate::types::weather::{schema_column_names, DATE, NUMERIC_COLUMNS, RAW_TIMESTAMP, STATION};
use crate::weather_data::error::WeatherDataError;
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::io::Cursor;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parses one group's payload.
///
/// Lines starting with `#` are dropped, the `valid` column becomes `date`,
/// column names are trimmed, and the measurement columns are coerced to
/// `f64` with unparseable tokens (such as `M`) turned into nulls. The result
/// holds exactly the weather schema columns, sorted by `(station, date)`.
///
/// This is CPU-bound; async callers run it on the blocking pool.
pub fn parse_observations(payload: &str, group: &str) -> Result<DataFrame, WeatherDataError> {
    let body = strip_comments(payload);
    if body.is_empty() {
        return Err(WeatherDataError::EmptyPayload {
            group: group.to_string(),
        });
    }

    let polars_err = |source: PolarsError| WeatherDataError::PolarsError {
        group: group.to_string(),
        source,
    };

    // Every column starts out as a string; typing happens below.
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(Cursor::new(body.into_bytes()))
        .finish()
        .map_err(|e| WeatherDataError::CsvReadPolars {
            group: group.to_string(),
            source: e,
        })?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| match name.trim() {
            RAW_TIMESTAMP => DATE.to_string(),
            trimmed => trimmed.to_string(),
        })
        .collect();
    df.set_column_names(names.iter().map(String::as_str))
        .map_err(polars_err)?;

    for column in schema_column_names() {
        if df.get_column_index(column).is_none() {
            return Err(WeatherDataError::MissingColumnError {
                group: group.to_string(),
                column: column.to_string(),
            });
        }
    }

    let millis = df
        .column(DATE)
        .and_then(|c| c.str())
        .map_err(polars_err)?
        .into_iter()
        .map(|raw| {
            let raw = raw.unwrap_or_default();
            parse_timestamp(raw)
                .map(|ts| ts.and_utc().timestamp_millis())
                .ok_or_else(|| WeatherDataError::TimestampParse {
                    group: group.to_string(),
                    value: raw.to_string(),
                })
        })
        .collect::<Result<Vec<i64>, _>>()?;
    let dates = Series::new(DATE.into(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
        .map_err(polars_err)?;
    df.with_column(dates).map_err(polars_err)?;

    for name in NUMERIC_COLUMNS {
        let coerced = df
            .column(name)
            .and_then(|c| c.cast(&DataType::Float64))
            .map_err(polars_err)?;
        df.with_column(coerced).map_err(polars_err)?;
    }

    let df = df.select(schema_column_names()).map_err(polars_err)?;
    sort_unique_by_key(df).map_err(polars_err)
}

/// Sorts by `(station, date)` and keeps the first row of every key.
pub(crate) fn sort_unique_by_key(df: DataFrame) -> PolarsResult<DataFrame> {
    let sorted = df.sort(
        [STATION, DATE],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;

    let stations = sorted.column(STATION)?.str()?;
    let millis = sorted.column(DATE)?.cast(&DataType::Int64)?;
    let millis = millis.i64()?;

    let mut keep = Vec::with_capacity(sorted.height());
    let mut previous = None;
    for key in stations.into_iter().zip(millis.into_iter()) {
        keep.push(previous != Some(key));
        previous = Some(key);
    }

    let mask = BooleanChunked::from_slice("keep".into(), &keep);
    sorted.filter(&mask)
}

fn strip_comments(payload: &str) -> String {
    payload
        .lines()
        .filter(|line| !line.trim_start().starts_with('#') && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::weather::WeatherTable;
    use chrono::{TimeZone, Utc};

    const PAYLOAD: &str = "\
#DEBUG: Format Typ    -> comma
#DEBUG: Time Period   -> 2017-01-01 00:00:00+00:00 2017-01-31 00:00:00+00:00
station,valid,tmpf,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2,skyc3
DSM,2017-01-01 00:54,21.90,73.59,11.5,1026.30,0.00,10.00,M,CLR,M,M
AMW,2017-01-01 01:15,19.40,79.11,M,M,0.00,10.00,M,OVC,M,M
AMW,2017-01-01 00:15,21.20,75.34,13.8,M,M,10.00,24.2,FEW,BKN,M
";

    #[test]
    fn parses_and_sorts_by_station_then_date() {
        let df = parse_observations(PAYLOAD, "IA_ASOS").unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            df.get_column_names()
                .iter()
                .map(|n| n.as_str())
                .collect::<Vec<_>>(),
            schema_column_names()
        );

        let keys = WeatherTable::new(df).keys().unwrap();
        assert_eq!(
            keys,
            vec![
                ("AMW".to_string(), Utc.with_ymd_and_hms(2017, 1, 1, 0, 15, 0).unwrap()),
                ("AMW".to_string(), Utc.with_ymd_and_hms(2017, 1, 1, 1, 15, 0).unwrap()),
                ("DSM".to_string(), Utc.with_ymd_and_hms(2017, 1, 1, 0, 54, 0).unwrap()),
            ]
        );
    }

    #[test]
    fn missing_markers_become_nulls() {
        let df = parse_observations(PAYLOAD, "IA_ASOS").unwrap();
        let records = WeatherTable::new(df).records().unwrap();

        let first = &records[0];
        assert_eq!(first.station, "AMW");
        assert_eq!(first.temperature, Some(21.2));
        assert_eq!(first.sea_level_pressure, None);
        assert_eq!(first.precipitation, None);
        assert_eq!(first.gust_speed, Some(24.2));
        assert_eq!(
            first.sky_conditions,
            [Some("FEW".to_string()), Some("BKN".to_string()), Some("M".to_string())]
        );

        assert_eq!(records[1].wind_speed, None);
    }

    #[test]
    fn garbage_numeric_tokens_become_nulls() {
        let payload = "\
station,valid,tmpf,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2,skyc3
AAA,2017-01-02 03:00,abc,T,1.5,,0.01,10,M,CLR,M,M
";
        let df = parse_observations(payload, "AWOS").unwrap();
        let record = &WeatherTable::new(df).records().unwrap()[0];
        assert_eq!(record.temperature, None);
        assert_eq!(record.relative_humidity, None);
        assert_eq!(record.wind_speed, Some(1.5));
        assert_eq!(record.sea_level_pressure, None);
        assert_eq!(record.precipitation, Some(0.01));
    }

    #[test]
    fn trims_whitespace_around_column_names() {
        let payload = "\
station, valid ,tmpf ,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2, skyc3
AAA,2017-01-02 03:00,50,60,5,1000,0,10,M,CLR,M,M
";
        let df = parse_observations(payload, "AWOS").unwrap();
        assert_eq!(df.height(), 1);
        assert!(df.column("tmpf").is_ok());
        assert!(df.column("skyc3").is_ok());
    }

    #[test]
    fn drops_repeated_keys_keeping_first() {
        let payload = "\
station,valid,tmpf,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2,skyc3
AAA,2017-01-02 03:00,50,60,5,1000,0,10,M,CLR,M,M
AAA,2017-01-02 03:00,99,60,5,1000,0,10,M,CLR,M,M
";
        let df = parse_observations(payload, "AWOS").unwrap();
        let records = WeatherTable::new(df).records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temperature, Some(50.0));
    }

    #[test]
    fn missing_column_is_reported() {
        let payload = "\
station,valid,tmpf
AAA,2017-01-02 03:00,50
";
        let err = parse_observations(payload, "AWOS").unwrap_err();
        assert!(matches!(
            err,
            WeatherDataError::MissingColumnError { ref column, .. } if column == "relh"
        ));
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let payload = "\
station,valid,tmpf,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2,skyc3
AAA,yesterday,50,60,5,1000,0,10,M,CLR,M,M
";
        let err = parse_observations(payload, "AWOS").unwrap_err();
        assert!(matches!(
            err,
            WeatherDataError::TimestampParse { ref value, .. } if value == "yesterday"
        ));
    }

    #[test]
    fn comment_only_payload_is_empty() {
        let err = parse_observations("#DEBUG: nothing here\n#\n", "AWOS").unwrap_err();
        assert!(matches!(err, WeatherDataError::EmptyPayload { .. }));
    }

    #[test]
    fn header_only_payload_yields_no_rows() {
        let payload = "station,valid,tmpf,relh,sped,mslp,p01i,vsby,gust_mph,skyc1,skyc2,skyc3\n";
        let df = parse_observations(payload, "AWOS").unwrap();
        assert_eq!(df.height(), 0);
    }
}
