//! Archive extraction and normalization of the on-time performance CSV.

use crate::flights::error::FlightsError;
use chrono::{Datelike, NaiveDate, NaiveTime};
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use ::zip::ZipArchive;

pub const FLIGHT_DATE: &str = "fl_date";
pub const CITY_COLUMNS: [&str; 2] = ["origin_city_name", "dest_city_name"];
pub const TIME_COLUMNS: [&str; 4] = ["dep_time", "arr_time", "crs_arr_time", "crs_dep_time"];
pub const CATEGORICAL_COLUMNS: [&str; 5] =
    ["dest", "origin", "tail_num", "unique_carrier", "cancellation_code"];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y %I:%M:%S %p", "%m/%d/%Y"];
const DAYS_FROM_CE_TO_UNIX_EPOCH: i32 = 719_163;

/// Name of the first member of the archive at `zip_path`.
pub fn first_member_name(zip_path: &Path) -> Result<String, FlightsError> {
    let file = File::open(zip_path).map_err(|e| FlightsError::DownloadIo(zip_path.into(), e))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| FlightsError::Archive(zip_path.into(), e))?;
    if archive.len() == 0 {
        return Err(FlightsError::EmptyArchive(zip_path.into()));
    }
    let member = archive
        .by_index(0)
        .map_err(|e| FlightsError::Archive(zip_path.into(), e))?;
    Ok(member.name().to_string())
}

/// Copies the first archive member to `dest`. The member is written to a
/// temporary file next to `dest` and renamed once complete.
pub fn extract_first_member(zip_path: &Path, dest: &Path) -> Result<PathBuf, FlightsError> {
    let file = File::open(zip_path).map_err(|e| FlightsError::DownloadIo(zip_path.into(), e))?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| FlightsError::Archive(zip_path.into(), e))?;
    if archive.len() == 0 {
        return Err(FlightsError::EmptyArchive(zip_path.into()));
    }
    let mut member = archive
        .by_index(0)
        .map_err(|e| FlightsError::Archive(zip_path.into(), e))?;
    let member_name = member.name().to_string();

    let extract_err = |source| FlightsError::Extract {
        member: member_name.clone(),
        path: dest.to_path_buf(),
        source,
    };
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temp_file = NamedTempFile::new_in(parent).map_err(extract_err)?;
    let mut writer = BufWriter::new(temp_file);
    let bytes = std::io::copy(&mut member, &mut writer).map_err(extract_err)?;
    let temp_file = writer
        .into_inner()
        .map_err(|e| extract_err(e.into_error()))?;
    temp_file.persist(dest).map_err(|e| extract_err(e.error))?;

    info!("Extracted {} ({} bytes) to {:?}", member_name, bytes, dest);
    Ok(dest.to_path_buf())
}

/// Reads the extracted CSV and normalizes it with [`normalize_flights`].
pub fn read_flights(csv_path: &Path) -> Result<DataFrame, FlightsError> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(csv_path.to_path_buf()))
        .map_err(|e| FlightsError::CsvRead(csv_path.into(), e))?
        .finish()
        .map_err(|e| FlightsError::CsvRead(csv_path.into(), e))?;
    normalize_flights(df)
}

/// Lowercases column names, drops unnamed trailing columns, reduces the city
/// columns to the bare city, turns the `HHMM` time columns into date-times on
/// the flight date and marks the code columns categorical.
pub fn normalize_flights(df: DataFrame) -> Result<DataFrame, FlightsError> {
    let mut df = df;
    let lowered: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_lowercase())
        .collect();
    df.set_column_names(lowered.iter().map(String::as_str))?;

    let kept: Vec<&str> = df
        .get_columns()
        .iter()
        .filter(|column| !is_unnamed(column))
        .map(|column| column.name().as_str())
        .collect();
    let mut df = df.select(kept)?;

    if df.get_column_index(FLIGHT_DATE).is_none() {
        return Err(FlightsError::MissingColumn(FLIGHT_DATE.to_string()));
    }

    for name in CITY_COLUMNS {
        if df.get_column_index(name).is_none() {
            continue;
        }
        let raw = df.column(name)?.cast(&DataType::String)?;
        let cities: StringChunked = raw.str()?.into_iter().map(|v| v.and_then(city_name)).collect();
        df.with_column(cities.with_name(name.into()).into_series())?;
    }

    let dates: Vec<Option<NaiveDate>> = df
        .column(FLIGHT_DATE)?
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_flight_date))
        .collect();

    for name in TIME_COLUMNS {
        if df.get_column_index(name).is_none() {
            continue;
        }
        let raw = df.column(name)?.cast(&DataType::String)?;
        let millis: Int64Chunked = raw
            .str()?
            .into_iter()
            .zip(dates.iter())
            .map(|(time, date)| combine_date_time((*date)?, time?))
            .collect();
        let times = millis
            .with_name(name.into())
            .into_series()
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
        df.with_column(times)?;
    }

    let days: Int32Chunked = dates
        .iter()
        .map(|date| date.map(|d| d.num_days_from_ce() - DAYS_FROM_CE_TO_UNIX_EPOCH))
        .collect();
    df.with_column(
        days.with_name(FLIGHT_DATE.into())
            .into_series()
            .cast(&DataType::Date)?,
    )?;

    for name in CATEGORICAL_COLUMNS {
        if df.get_column_index(name).is_none() {
            continue;
        }
        let categorical = df
            .column(name)?
            .cast(&DataType::String)?
            .cast(&DataType::Categorical(None, CategoricalOrdering::Physical))?;
        df.with_column(categorical)?;
    }

    Ok(df)
}

/// Header-less columns: an empty or `unnamed…` name, or a reader-assigned
/// `column_<n>` that holds no values.
fn is_unnamed(column: &Column) -> bool {
    let name = column.name().as_str();
    name.is_empty()
        || name.starts_with("unnamed")
        || (name.starts_with("column_") && column.null_count() == column.len())
}

/// `"Chicago, IL"` -> `"Chicago"`. Everything before the last `", "` that is
/// followed by a two-character code; `None` when there is no such suffix.
pub fn city_name(value: &str) -> Option<&str> {
    value.rmatch_indices(", ").find_map(|(idx, _)| {
        let mut code = value[idx + 2..].chars();
        let is_word = |c: Option<char>| c.is_some_and(|c| c.is_alphanumeric() || c == '_');
        (is_word(code.next()) && is_word(code.next())).then(|| &value[..idx])
    })
}

fn parse_flight_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Combines a flight date with an `HHMM` clock reading such as `914`, `0914`
/// or `914.0`. Readings that are not a valid time of day (including `2400`)
/// give `None`.
pub fn combine_date_time(date: NaiveDate, raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    if digits.is_empty() {
        return None;
    }
    let padded = format!("{:0>4}", digits);
    let hour: u32 = padded.get(0..2)?.parse().ok()?;
    let minute: u32 = padded.get(2..4)?.parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time).and_utc().timestamp_millis())
}
