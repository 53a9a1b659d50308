use csv::StringRecord;

use crate::config::{PayrollConfig, ProfileConfig};
use crate::error::{Dataset, LinkError, ParseError};
use crate::model::{Payroll, Profile};
use crate::normalize::{parse_mdy, parse_pay, payroll_name};

/// Records parsed from one CSV input, plus what had to be skipped.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    pub headers: Vec<String>,
    pub records: Vec<T>,
    pub skipped: Vec<ParseError>,
}

/// Load the profile roster. The first row is always a header row.
pub fn load_profiles(csv_data: &str, config: &ProfileConfig) -> Result<Loaded<Profile>, LinkError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_err(Dataset::Profile, e))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let col = &config.columns;
    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| csv_err(Dataset::Profile, e))?;
        let line = line_of(&record);
        let get = |name: &'static str, column: usize| {
            field(&record, Dataset::Profile, line, name, column)
        };

        let parsed = (|| -> Result<Profile, ParseError> {
            let tax_id = get("tax_id", col.tax_id)?;
            let last_name = get("last_name", col.last_name)?;
            let first_name = get("first_name", col.first_name)?;
            let middle_initial = get("middle_initial", col.middle_initial)?;
            let appt = get("appointment_date", col.appointment_date)?;
            let appointment_date = parse_mdy(appt).ok_or_else(|| ParseError::DateParse {
                dataset: Dataset::Profile,
                line,
                field: "appointment",
                value: appt.into(),
            })?;

            Ok(Profile {
                tax_id: tax_id.trim().into(),
                first_name: first_name.into(),
                last_name: last_name.into(),
                middle_initial: middle_initial.into(),
                appointment_date,
                raw: record.iter().map(|f| f.to_string()).collect(),
            })
        })();

        match parsed {
            Ok(profile) => records.push(profile),
            Err(e) => {
                tracing::warn!("skipping row: {e}");
                skipped.push(e);
            }
        }
    }

    report_skipped(Dataset::Profile, &skipped);
    Ok(Loaded {
        headers,
        records,
        skipped,
    })
}

/// Load payroll rows, normalizing names.
///
/// Without an explicit `has_headers`, the first row is taken as a header
/// row when its fiscal-year field is not a number.
pub fn load_payrolls(csv_data: &str, config: &PayrollConfig) -> Result<Loaded<Payroll>, LinkError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let col = &config.columns;
    let mut rows = reader.records().peekable();

    let first_is_header = match config.has_headers {
        Some(explicit) => explicit,
        None => match rows.peek() {
            Some(Ok(first)) => !looks_like_year(first.get(col.year).unwrap_or("")),
            _ => false,
        },
    };

    let headers = if first_is_header {
        match rows.next() {
            Some(first) => first
                .map_err(|e| csv_err(Dataset::Payroll, e))?
                .iter()
                .map(|h| h.to_string())
                .collect(),
            None => config.headers.clone(),
        }
    } else {
        config.headers.clone()
    };

    let mut records = Vec::new();
    let mut skipped = Vec::new();

    for record in rows {
        let record = record.map_err(|e| csv_err(Dataset::Payroll, e))?;
        let line = line_of(&record);
        let get = |name: &'static str, column: usize| {
            field(&record, Dataset::Payroll, line, name, column)
        };

        let parsed = (|| -> Result<Payroll, ParseError> {
            let year = get("year", col.year)?;
            let last_name = get("last_name", col.last_name)?;
            let first_name = get("first_name", col.first_name)?;
            let middle_initial = get("middle_initial", col.middle_initial)?;
            let appt = get("appointment_date", col.appointment_date)?;
            let borough = get("borough", col.borough)?;
            let title = get("title", col.title)?;
            let pay = get("regular_pay", col.regular_pay)?;

            let appointment_date = parse_mdy(appt).ok_or_else(|| ParseError::DateParse {
                dataset: Dataset::Payroll,
                line,
                field: "appointment",
                value: appt.into(),
            })?;
            let regular_pay = parse_pay(pay).ok_or_else(|| ParseError::PayParse {
                line,
                value: pay.into(),
            })?;

            Ok(Payroll {
                row: records.len(),
                year: year.trim().into(),
                first_name: payroll_name(first_name),
                last_name: payroll_name(last_name),
                middle_initial: middle_initial.trim().into(),
                title: title.trim().into(),
                borough: borough.trim().into(),
                appointment_date,
                regular_pay,
                raw: record.iter().map(|f| f.to_string()).collect(),
            })
        })();

        match parsed {
            Ok(payroll) => records.push(payroll),
            Err(e) => {
                tracing::warn!("skipping row: {e}");
                skipped.push(e);
            }
        }
    }

    report_skipped(Dataset::Payroll, &skipped);
    Ok(Loaded {
        headers,
        records,
        skipped,
    })
}

fn field<'r>(
    record: &'r StringRecord,
    dataset: Dataset,
    line: u64,
    name: &'static str,
    column: usize,
) -> Result<&'r str, ParseError> {
    record.get(column).ok_or(ParseError::MissingField {
        dataset,
        line,
        field: name,
        column,
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

fn looks_like_year(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

fn csv_err(dataset: Dataset, e: csv::Error) -> LinkError {
    LinkError::Csv {
        dataset,
        message: e.to_string(),
    }
}

fn report_skipped(dataset: Dataset, skipped: &[ParseError]) {
    if !skipped.is_empty() {
        tracing::warn!(%dataset, skipped = skipped.len(), "malformed rows skipped");
    }
}
