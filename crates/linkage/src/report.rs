//! Merged CSV emission.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::LinkError;
use crate::model::YearLinkage;

/// Write one year's linkage: matched pairs, then unmatched profiles, then
/// unmatched payrolls. Missing sides are written as blank columns.
///
/// Each side is padded or truncated to its header width so payroll columns
/// always line up under the payroll headers.
pub fn write_year<W: Write>(
    writer: W,
    profile_headers: &[String],
    payroll_headers: &[String],
    linkage: &YearLinkage<'_>,
) -> Result<(), LinkError> {
    let mut out = csv::WriterBuilder::new().from_writer(writer);
    let (profile_width, payroll_width) = (profile_headers.len(), payroll_headers.len());

    out.write_record(profile_headers.iter().chain(payroll_headers.iter()))
        .map_err(write_err)?;

    for m in &linkage.merged {
        out.write_record(
            fit(&m.profile.raw, profile_width).chain(fit(&m.payroll.raw, payroll_width)),
        )
        .map_err(write_err)?;
    }

    for profile in &linkage.unmatched_profiles {
        out.write_record(fit(&profile.raw, profile_width).chain(fit(&[], payroll_width)))
            .map_err(write_err)?;
    }

    for payroll in &linkage.unmatched_payrolls {
        out.write_record(fit(&[], profile_width).chain(fit(&payroll.raw, payroll_width)))
            .map_err(write_err)?;
    }

    out.flush().map_err(|e| LinkError::Io(e.to_string()))?;
    Ok(())
}

/// Exactly `width` fields: `raw` cut short or padded with blanks.
fn fit(raw: &[String], width: usize) -> impl Iterator<Item = &str> {
    raw.iter()
        .map(String::as_str)
        .chain(std::iter::repeat(""))
        .take(width)
}

/// Output path for `year`. With several years the year is spliced in before
/// the extension (`merged.csv` → `merged-2020.csv`).
pub fn output_path(base: &Path, year: &str, multi_year: bool) -> PathBuf {
    if !multi_year {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "merged".into());
    let name = match base.extension() {
        Some(ext) => format!("{stem}-{year}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{year}"),
    };
    base.with_file_name(name)
}

fn write_err(e: csv::Error) -> LinkError {
    LinkError::Io(e.to_string())
}
