// End-to-end tests for the `rlink` binary.
//
// Each test copies the linkage fixtures into a temp dir so merged CSVs land
// next to the config without touching the source tree.
//
// Run with: cargo test -p rosterlink-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const FIXTURES: [&str; 7] = [
    "profiles.csv",
    "payroll-2020.csv",
    "payroll-multi.csv",
    "payroll-ties.csv",
    "link.toml",
    "multi-year.toml",
    "strict.toml",
];

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../linkage/tests/fixtures")
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in FIXTURES {
        std::fs::copy(fixtures_dir().join(name), dir.path().join(name))
            .unwrap_or_else(|e| panic!("cannot copy fixture {name}: {e}"));
    }
    dir
}

fn rlink(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rlink"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run rlink")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn read_csv(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    reader.records().map(|r| r.unwrap()).collect()
}

// ===========================================================================
// rlink run
// ===========================================================================

#[test]
fn run_writes_merged_csv_next_to_config() {
    let dir = workspace();
    let out = rlink(dir.path(), &["run", "link.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let rows = read_csv(&dir.path().join("merged.csv"));
    assert_eq!(rows.len(), 1 + 5 + 1 + 2);
    assert_eq!(&rows[0][0], "taxid");
    assert_eq!(&rows[0][6], "Fiscal Year");
    assert_eq!(&rows[1][0], "939647");

    let err = stderr(&out);
    assert!(err.contains("FY2020: 5 matched"), "stderr: {err}");
    assert!(err.contains("round complete"), "stderr: {err}");
}

#[test]
fn run_json_prints_one_summary_document() {
    let dir = workspace();
    let out = rlink(dir.path(), &["run", "link.toml", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be valid JSON: {e}\n{stdout}"));

    assert_eq!(val["meta"]["config_name"], "NYPD roster to payroll FY2020");
    assert_eq!(val["inputs"]["profiles"], 6);
    let year = &val["years"][0];
    assert_eq!(year["year"], "2020");
    assert_eq!(year["matched"], 5);
    assert_eq!(year["unmatched_profiles"], 1);
    assert_eq!(year["unmatched_payrolls"], 2);
    assert_eq!(year["stage_counts"]["manual_override"], 1);
    assert_eq!(year["rounds"][1]["round"], "exact_last_name_repeat");
    assert_eq!(year["rounds"][1]["matched"], 1);
}

#[test]
fn run_splits_output_per_fiscal_year() {
    let dir = workspace();
    let out = rlink(dir.path(), &["run", "multi-year.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    assert!(!dir.path().join("merged.csv").exists());
    let y2019 = read_csv(&dir.path().join("merged-2019.csv"));
    let y2020 = read_csv(&dir.path().join("merged-2020.csv"));

    // No header row in the payroll file: the fallback list is used.
    assert_eq!(&y2019[0][6], "Fiscal Year");
    assert_eq!(y2019.len(), 1 + 2 + 4);
    assert_eq!(y2020.len(), 1 + 1 + 5);
}

#[test]
fn run_honors_output_dir_and_summary_path() {
    let dir = workspace();
    let out = rlink(
        dir.path(),
        &["run", "link.toml", "--output-dir", "out", "--summary", "summary.json"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    assert!(dir.path().join("out/merged.csv").exists());
    assert!(!dir.path().join("merged.csv").exists());

    let summary = std::fs::read_to_string(dir.path().join("summary.json")).unwrap();
    let val: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(val["years"][0]["excluded"]["civilian_title"], 1);
}

#[test]
fn run_without_usable_payroll_still_writes_unmatched_profiles() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("payroll-bad.csv"),
        "Fiscal Year,Agency Name,Last Name,First Name,Mid Init,Agency Start Date,Work Location Borough,Title Description,Leave Status as of June 30,Base Salary,Pay Basis,Regular Hours,Regular Gross Paid,OT Hours,Total OT Paid,Total Other Pay\n\
         2020,POLICE DEPARTMENT,SMITH,JOHN,A,not-a-date,BROOKLYN,POLICE OFFICER,ACTIVE,85292.00,per Annum,2080.00,84120.50,0,0,0\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("bad-payroll.toml"),
        "name = \"bad payroll\"\n[profile]\nfile = \"profiles.csv\"\n[payroll]\nfile = \"payroll-bad.csv\"\n[output]\nfile = \"merged.csv\"\n",
    )
    .unwrap();

    let out = rlink(dir.path(), &["run", "bad-payroll.toml", "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let rows = read_csv(&dir.path().join("merged.csv"));
    assert_eq!(rows.len(), 1 + 6);
    assert_eq!(&rows[0][6], "Fiscal Year");
    assert_eq!(&rows[1][0], "939647");
    assert!(rows[1].iter().skip(6).all(|f| f.is_empty()));

    let stdout = String::from_utf8_lossy(&out.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(val["inputs"]["skipped_payroll_rows"], 1);
    assert_eq!(val["years"][0]["matched"], 0);
    assert_eq!(val["years"][0]["unmatched_profiles"], 6);

    let err = stderr(&out);
    assert!(err.contains("no payroll: 0 matched"), "stderr: {err}");
}

#[test]
fn quiet_suppresses_progress_logs() {
    let dir = workspace();
    let out = rlink(dir.path(), &["-q", "run", "link.toml"]);
    assert!(out.status.success());
    assert!(!stderr(&out).contains("round complete"));
}

// ===========================================================================
// Failures and exit codes
// ===========================================================================

#[test]
fn strict_tie_exits_with_ambiguity_code() {
    let dir = workspace();
    let out = rlink(dir.path(), &["run", "strict.toml"]);
    assert_eq!(out.status.code(), Some(6));

    let err = stderr(&out);
    assert!(err.contains("ambiguous match for tax id 100400"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
    assert!(!dir.path().join("merged.csv").exists());
}

#[test]
fn invalid_config_exits_3() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("bad.toml"),
        "name = \"bad\"\n[profile]\nfile = \"profiles.csv\"\n[profile.columns]\ntax_id = 0\nlast_name = 0\nfirst_name = 2\nmiddle_initial = 3\nappointment_date = 4\n[payroll]\nfile = \"payroll-2020.csv\"\n",
    )
    .unwrap();

    let out = rlink(dir.path(), &["validate", "bad.toml"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("reuses column 0"), "stderr: {}", stderr(&out));

    let out = rlink(dir.path(), &["run", "bad.toml"]);
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn missing_input_file_exits_4() {
    let dir = workspace();
    std::fs::remove_file(dir.path().join("payroll-2020.csv")).unwrap();

    let out = rlink(dir.path(), &["run", "link.toml"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("payroll-2020.csv"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let dir = workspace();
    let out = rlink(dir.path(), &["run", "link.toml", "--bogus"]);
    assert_eq!(out.status.code(), Some(2));
}

// ===========================================================================
// rlink validate
// ===========================================================================

#[test]
fn validate_reports_config_shape() {
    let dir = workspace();
    let out = rlink(dir.path(), &["validate", "link.toml"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let err = stderr(&out);
    assert!(err.contains("1 manual matches"), "stderr: {err}");
    assert!(err.contains("tie_break = highest_pay"), "stderr: {err}");
    assert!(!dir.path().join("merged.csv").exists());
}
