// Temporal range construction and period truncation.
//
// One temporal column is parsed directly as an instant per record, falling
// back to range strings like "2023-01-01/2023-01-31". Two columns are parsed
// independently as start and end. All instants normalize to UTC.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::dataset::{columns, Dataset};
use crate::error::Error;
use crate::options::{TemporalFormat, TemporalGranularity};
use crate::value::{Column, Value};

/// Parse one or two temporal columns into canonical `time_start` /
/// `time_end` columns. The original temporal columns are removed unless they
/// are already named `time_start` / `time_end`.
pub fn create_temporal_range(
    data: &Dataset,
    temporal_columns: &[String],
    format: TemporalFormat,
) -> Result<Dataset, Error> {
    let missing: Vec<&str> = temporal_columns
        .iter()
        .filter(|c| !data.has_column(c))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "missing temporal columns: {}",
            missing.join(", ")
        )));
    }

    let (start, end) = match temporal_columns {
        [col] => parse_single_column(data, col, format)?,
        [start_col, end_col] => {
            let start = parse_whole_column(data, start_col, format).map_err(|e| {
                Error::TemporalParse(format!(
                    "could not parse temporal columns '{}', '{}': {}",
                    start_col, end_col, e
                ))
            })?;
            let end = parse_whole_column(data, end_col, format).map_err(|e| {
                Error::TemporalParse(format!(
                    "could not parse temporal columns '{}', '{}': {}",
                    start_col, end_col, e
                ))
            })?;
            (start, end)
        }
        _ => {
            return Err(Error::Validation(
                "temporal information must be in one or two columns".to_string(),
            ))
        }
    };

    let keep: Vec<&str> = temporal_columns
        .iter()
        .map(String::as_str)
        .filter(|c| *c != columns::TIME_START && *c != columns::TIME_END)
        .collect();
    let mut out = data.without_columns(&keep);
    out.insert_column(columns::TIME_START, Column::Time(start))?;
    out.insert_column(columns::TIME_END, Column::Time(end))?;
    Ok(out)
}

type Instants = Vec<Option<DateTime<Utc>>>;

/// Single-column strategy: every value as one instant (start == end), then
/// the delimiter fallback, then a hard error naming both failures.
fn parse_single_column(
    data: &Dataset,
    col: &str,
    format: TemporalFormat,
) -> Result<(Instants, Instants), Error> {
    match parse_whole_column(data, col, format) {
        Ok(instants) => Ok((instants.clone(), instants)),
        Err(first_err) => match parse_range_column(data, col, format) {
            Ok(pair) => Ok(pair),
            Err(second_err) => Err(Error::TemporalParse(format!(
                "could not parse temporal column '{}': {}. {}",
                col, first_err, second_err
            ))),
        },
    }
}

fn parse_whole_column(data: &Dataset, col: &str, format: TemporalFormat) -> Result<Instants, String> {
    let column = data
        .column(col)
        .ok_or_else(|| format!("column '{}' not found", col))?;
    let mut out = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let parsed = instant_from_value(&column.get(row), format)
            .ok_or_else(|| describe_failure(&column.get(row), row))?;
        out.push(Some(parsed));
    }
    Ok(out)
}

/// Delimiter fallback: split each value on `/`, `,`, or `-` (tried in that
/// order) into exactly two instants. A delimiter only matches if both halves
/// parse, so dashed dates are not torn apart by the `-` case.
fn parse_range_column(
    data: &Dataset,
    col: &str,
    format: TemporalFormat,
) -> Result<(Instants, Instants), String> {
    let column = data
        .column(col)
        .ok_or_else(|| format!("column '{}' not found", col))?;
    let mut starts = Vec::with_capacity(data.len());
    let mut ends = Vec::with_capacity(data.len());
    for row in 0..data.len() {
        let raw = column
            .str_at(row)
            .ok_or_else(|| format!("value at row {} is not a range string", row))?;
        let (start, end) = split_range(raw, format)
            .ok_or_else(|| format!("value '{}' at row {} is not a recognized range", raw, row))?;
        starts.push(Some(start));
        ends.push(Some(end));
    }
    Ok((starts, ends))
}

fn split_range(raw: &str, format: TemporalFormat) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    for delim in ['/', ',', '-'] {
        if let Some((a, b)) = raw.split_once(delim) {
            if let (Some(start), Some(end)) = (
                parse_instant(a.trim(), format),
                parse_instant(b.trim(), format),
            ) {
                return Some((start, end));
            }
        }
    }
    None
}

fn describe_failure(value: &Value, row: usize) -> String {
    match value {
        Value::Null => format!("null value at row {}", row),
        other => format!(
            "value '{}' at row {} is not a recognized instant",
            other.render(),
            row
        ),
    }
}

/// Interpret one cell as an instant under the requested format. Typed time
/// cells pass through; integers are epochs; strings go through
/// [`parse_instant`].
fn instant_from_value(value: &Value, format: TemporalFormat) -> Option<DateTime<Utc>> {
    match value {
        Value::Time(t) => Some(*t),
        Value::Int(i) => match format {
            TemporalFormat::Iso => None,
            _ => epoch_to_instant(*i as i128),
        },
        Value::Float(f) => match format {
            TemporalFormat::Iso => None,
            _ => epoch_to_instant(f.floor() as i128),
        },
        Value::Str(s) => parse_instant(s, format),
        _ => None,
    }
}

/// Parse a string as a single instant.
///
/// `auto`/`custom` try RFC 3339, then common date/datetime layouts, then a
/// bare 4-digit year, then an integer epoch. `iso` restricts to ISO-8601
/// layouts; `timestamp` restricts to integer epochs (seconds through
/// nanoseconds, by magnitude).
pub fn parse_instant(input: &str, format: TemporalFormat) -> Option<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }
    match format {
        TemporalFormat::Timestamp => s.parse::<i128>().ok().and_then(epoch_to_instant),
        TemporalFormat::Iso => parse_iso(s),
        TemporalFormat::Auto | TemporalFormat::Custom => {
            if let Some(t) = parse_iso(s) {
                return Some(t);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&dt));
            }
            if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
                let year: i32 = s.parse().ok()?;
                let date = NaiveDate::from_ymd_opt(year, 1, 1)?;
                return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
            }
            s.parse::<i128>().ok().and_then(epoch_to_instant)
        }
    }
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Integer epochs arrive in mixed magnitudes; normalize by digit count:
/// up to 11 digits are seconds, then milliseconds, microseconds, nanoseconds.
fn epoch_to_instant(n: i128) -> Option<DateTime<Utc>> {
    let digits = {
        let mut x = n.unsigned_abs();
        let mut c = 1u32;
        while x >= 10 {
            x /= 10;
            c += 1;
        }
        c
    };
    let secs = match digits {
        0..=11 => n,
        12..=14 => n / 1_000,
        15..=16 => n / 1_000_000,
        17..=19 => n / 1_000_000_000,
        _ => return None,
    };
    DateTime::from_timestamp(i64::try_from(secs).ok()?, 0)
}

/// Canonical textual label of the calendar period containing `t`, so two
/// instants in the same period compare equal as group keys. `None` for the
/// custom granularity, whose labels come from the caller's column.
pub fn period_label(t: DateTime<Utc>, granularity: TemporalGranularity) -> Option<String> {
    let label = match granularity {
        TemporalGranularity::Year => format!("{}", t.year()),
        TemporalGranularity::Quarter => format!("{}Q{}", t.year(), t.month0() / 3 + 1),
        TemporalGranularity::Month => format!("{:04}-{:02}", t.year(), t.month()),
        TemporalGranularity::Week => {
            let week = t.iso_week();
            format!("{:04}-W{:02}", week.year(), week.week())
        }
        TemporalGranularity::Day => format!("{:04}-{:02}-{:02}", t.year(), t.month(), t.day()),
        TemporalGranularity::Hour => format!(
            "{:04}-{:02}-{:02} {:02}:00",
            t.year(),
            t.month(),
            t.day(),
            t.hour()
        ),
        TemporalGranularity::Custom => return None,
    };
    Some(label)
}
