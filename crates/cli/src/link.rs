//! `rlink run` / `rlink validate`: config-driven profile/payroll linkage.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use rosterlink_linkage::config::LinkConfig;
use rosterlink_linkage::loader::{load_payrolls, load_profiles};
use rosterlink_linkage::report::{output_path, write_year};
use rosterlink_linkage::summary::{compute_summary, InputSummary, LinkSummary};
use rosterlink_linkage::LinkError;

use crate::exit_codes::{link_exit_code, EXIT_ERROR, EXIT_RUNTIME, EXIT_USAGE};
use crate::CliError;

#[derive(Subcommand)]
pub enum LinkCommands {
    /// Link profiles to payroll from a TOML config file
    #[command(after_help = "\
Examples:
  rlink run nypd.link.toml
  rlink run nypd.link.toml --json
  rlink run nypd.link.toml --summary summary.json --output-dir out/
  RUST_LOG=rosterlink_linkage=debug rlink run nypd.link.toml")]
    Run {
        /// Path to the .link.toml config file
        config: PathBuf,

        /// Print the JSON summary to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON summary to a file (overrides output.json)
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,

        /// Directory for merged CSVs (default: the config file's directory)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Validate a link config without running
    #[command(after_help = "\
Examples:
  rlink validate nypd.link.toml")]
    Validate {
        /// Path to the .link.toml config file
        config: PathBuf,
    },
}

pub fn cmd_link(cmd: LinkCommands) -> Result<(), CliError> {
    match cmd {
        LinkCommands::Run {
            config,
            json,
            summary,
            output_dir,
        } => cmd_run(config, json, summary, output_dir),
        LinkCommands::Validate { config } => cmd_validate(config),
    }
}

fn link_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError {
        code,
        message: msg.into(),
        hint: None,
    }
}

impl From<LinkError> for CliError {
    fn from(e: LinkError) -> Self {
        let hint = match &e {
            LinkError::AmbiguousMatch { tax_id, .. } => Some(format!(
                "add a manual_matches entry for \"{tax_id}\" or use tie_break = \"highest_pay\""
            )),
            LinkError::ConfigParse(_) | LinkError::ConfigValidation(_) => {
                Some("run `rlink validate <CONFIG>` after editing the config".into())
            }
            _ => None,
        };
        CliError {
            code: link_exit_code(&e),
            message: e.to_string(),
            hint,
        }
    }
}

fn read_config(config_path: &Path) -> Result<LinkConfig, CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| {
        link_err(
            EXIT_RUNTIME,
            format!("cannot read config {}: {e}", config_path.display()),
        )
    })?;
    Ok(LinkConfig::from_toml(&config_str)?)
}

fn read_input(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| link_err(EXIT_RUNTIME, format!("cannot read {}: {e}", path.display())))
}

fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = read_config(&config_path)?;
    eprintln!(
        "{}: ok ({} manual matches, {} civilian titles, tie_break = {})",
        config.name,
        config.manual_matches.len(),
        config.civilian_titles.len(),
        config.tie_break,
    );
    Ok(())
}

fn cmd_run(
    config_path: PathBuf,
    json_output: bool,
    summary_file: Option<PathBuf>,
    output_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let config = read_config(&config_path)?;

    // Resolve file paths relative to config file's directory
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let profile_path = base_dir.join(&config.profile.file);
    let profiles = load_profiles(&read_input(&profile_path)?, &config.profile)?;
    let payroll_path = base_dir.join(&config.payroll.file);
    let payrolls = load_payrolls(&read_input(&payroll_path)?, &config.payroll)?;
    tracing::info!(
        profiles = profiles.records.len(),
        payrolls = payrolls.records.len(),
        "inputs loaded"
    );

    let inputs = InputSummary {
        profiles: profiles.records.len(),
        payrolls: payrolls.records.len(),
        skipped_profile_rows: profiles.skipped.len(),
        skipped_payroll_rows: payrolls.skipped.len(),
    };

    let result = rosterlink_linkage::run(&config, &profiles.records, payrolls.records)?;

    // Merged CSVs
    let out_dir = match output_dir {
        Some(dir) => {
            if dir.is_file() {
                return Err(link_err(
                    EXIT_USAGE,
                    format!("--output-dir {} is a file", dir.display()),
                ));
            }
            dir
        }
        None => base_dir.to_path_buf(),
    };
    std::fs::create_dir_all(&out_dir).map_err(|e| {
        link_err(
            EXIT_RUNTIME,
            format!("cannot create {}: {e}", out_dir.display()),
        )
    })?;

    let base_output = out_dir.join(&config.output.file);
    let multi_year = result.years.len() > 1;
    for year in &result.years {
        let path = output_path(&base_output, &year.year, multi_year);
        let file = File::create(&path).map_err(|e| {
            link_err(
                EXIT_RUNTIME,
                format!("cannot write {}: {e}", path.display()),
            )
        })?;
        write_year(
            BufWriter::new(file),
            &profiles.headers,
            &payrolls.headers,
            year,
        )?;
        eprintln!("wrote {}", path.display());
    }

    // Summary
    let summary = compute_summary(&result, inputs);
    let summary_path = summary_file.or_else(|| config.output.json.as_ref().map(|j| out_dir.join(j)));

    if json_output || summary_path.is_some() {
        let json_str = serde_json::to_string_pretty(&summary)
            .map_err(|e| link_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = summary_path {
            std::fs::write(path, &json_str).map_err(|e| {
                link_err(
                    EXIT_RUNTIME,
                    format!("cannot write summary {}: {e}", path.display()),
                )
            })?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    print_human_summary(&summary);
    Ok(())
}

/// Human summary to stderr.
fn print_human_summary(summary: &LinkSummary) {
    let inputs = &summary.inputs;
    eprintln!(
        "{}: {} profiles, {} payroll rows ({} + {} malformed rows skipped)",
        summary.meta.config_name,
        inputs.profiles,
        inputs.payrolls,
        inputs.skipped_profile_rows,
        inputs.skipped_payroll_rows,
    );

    for year in &summary.years {
        let per_round: Vec<String> = year
            .rounds
            .iter()
            .map(|r| format!("{} {}", r.round, r.matched))
            .collect();
        let label = if year.year.is_empty() {
            "no payroll".to_string()
        } else {
            format!("FY{}", year.year)
        };
        eprintln!(
            "{}: {} matched ({}), {} unmatched profiles, {} unmatched payrolls, {} excluded",
            label,
            year.matched,
            per_round.join(", "),
            year.unmatched_profiles,
            year.unmatched_payrolls,
            year.excluded.civilian_title + year.excluded.nameless,
        );
    }
}
