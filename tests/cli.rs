mod common;

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;

use common::TestWorkspace;

const ROWS: &[&str] = &[
    "Springfield Elementary,Y,Springfield,A,*,10,1.01,16",
    "SHELBYVILLE high,,Shelbyville,,,30,N/A,90",
    "Capital City College,,Capital City,,,30,^,90",
];

fn ranker() -> Command {
    let mut command = Command::cargo_bin("school-ranker").expect("binary present");
    command.env_remove("RUST_LOG");
    command
}

fn load(workspace: &TestWorkspace, input: &std::path::Path, period: &str) -> assert_cmd::assert::Assert {
    ranker()
        .args([
            "load",
            "-i",
            input.to_str().unwrap(),
            "--period",
            period,
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .assert()
}

fn stored_document(workspace: &TestWorkspace) -> Value {
    let path = workspace.store_dir().join("schools.json");
    let contents = fs::read_to_string(&path).expect("read store document");
    serde_json::from_str(&contents).expect("parse store document")
}

fn stored_results(workspace: &TestWorkspace) -> Vec<Value> {
    stored_document(workspace)
        .get("results")
        .and_then(Value::as_array)
        .cloned()
        .expect("results array")
}

#[test]
fn load_then_report_shows_competition_ranks() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results-2015.csv", ROWS);
    load(&workspace, &input, "2015").success();

    let output = ranker()
        .args([
            "report",
            "--period",
            "2015",
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .output()
        .expect("run report");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 5, "unexpected report:\n{stdout}");

    let rank_of = |school: &str| {
        lines
            .iter()
            .find(|line| line.contains(school))
            .and_then(|line| line.split_whitespace().next())
            .map(str::to_string)
            .unwrap_or_else(|| panic!("{school} missing from report:\n{stdout}"))
    };
    assert_eq!(rank_of("Shelbyville High"), "1");
    assert_eq!(rank_of("Capital City College"), "1");
    assert_eq!(rank_of("Springfield Elementary"), "3");
    assert!(stdout.contains("375.87"));
    assert!(stdout.contains("2821.00"));
}

#[test]
fn load_stores_schools_and_derived_result_fields() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results.csv", ROWS);
    load(&workspace, &input, "2015").success();

    let document = stored_document(&workspace);
    let schools = document
        .get("schools")
        .and_then(Value::as_array)
        .expect("schools array");
    assert_eq!(schools.len(), 3);
    let springfield = schools
        .iter()
        .find(|s| s.get("name").and_then(Value::as_str) == Some("Springfield Elementary"))
        .expect("springfield stored");
    assert_eq!(springfield.get("small").and_then(Value::as_bool), Some(true));
    assert!(springfield.get("id").and_then(Value::as_str).is_some());

    let results = stored_results(&workspace);
    assert_eq!(results.len(), 3);
    for result in &results {
        assert_eq!(result.get("period").and_then(Value::as_i64), Some(2015));
        assert!(result.get("school_id").and_then(Value::as_str).is_some());
        assert!(result.get("rank").and_then(Value::as_i64).unwrap_or(0) >= 1);
    }
}

#[test]
fn invalid_number_stops_the_load_and_keeps_earlier_rows() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results(
        "bad.csv",
        &[
            ROWS[0],
            "Broken School,,Springfield,,,thirty,1,90",
            ROWS[2],
        ],
    );
    load(&workspace, &input, "2015")
        .failure()
        .stderr(contains("row 3"))
        .stderr(contains("median_vce_score"));

    assert_eq!(stored_results(&workspace).len(), 1);
}

#[test]
fn keep_going_loads_valid_rows_and_still_fails() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results(
        "bad.csv",
        &[
            ROWS[0],
            "Broken School,,Springfield,,,thirty,1,90",
            ROWS[2],
        ],
    );
    ranker()
        .args([
            "load",
            "-i",
            input.to_str().unwrap(),
            "--period",
            "2015",
            "--keep-going",
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("1 of 3 row(s) failed to load"));

    let results = stored_results(&workspace);
    assert_eq!(results.len(), 2);
    let mut ranks = results
        .iter()
        .filter_map(|r| r.get("rank").and_then(Value::as_i64))
        .collect::<Vec<_>>();
    ranks.sort();
    assert_eq!(ranks, vec![1, 2]);
}

#[test]
fn second_period_is_smoothed_against_the_first() {
    let workspace = TestWorkspace::new();
    let first = workspace.write_results("2014.csv", &["Springfield Elementary,,Springfield,,,0,0,9"]);
    let second = workspace.write_results("2015.csv", &["Springfield Elementary,,Springfield,,,0,0,39"]);
    load(&workspace, &first, "2014").success();
    load(&workspace, &second, "2015").success();

    let results = stored_results(&workspace);
    let latest = results
        .iter()
        .find(|r| r.get("period").and_then(Value::as_i64) == Some(2015))
        .expect("2015 result");
    // (1 * 10 + 2 * 40) / 3
    assert_eq!(
        latest.get("ranking_score_wma").and_then(Value::as_f64),
        Some(30.0)
    );
}

#[test]
fn rank_command_recomputes_a_loaded_period() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results.csv", ROWS);
    load(&workspace, &input, "2015").success();
    ranker()
        .args([
            "rank",
            "--period",
            "2015",
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("Ranked 3 result(s)"));
}

#[test]
fn report_can_write_csv() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results.csv", ROWS);
    load(&workspace, &input, "2015").success();
    let output = workspace.path().join("report.csv");
    ranker()
        .args([
            "report",
            "--period",
            "2015",
            "--format",
            "csv",
            "-o",
            output.to_str().unwrap(),
            "--limit",
            "2",
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .assert()
        .success();
    let contents = fs::read_to_string(&output).expect("read report");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("rank,school,locality"));
    assert!(lines[1].starts_with("1,"));
}

#[test]
fn columns_lists_mapped_and_missing_fields() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results.csv", ROWS);
    ranker()
        .args(["columns", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("inter_bcl"))
        .stdout(contains("percent_score_40_and_over"))
        .stdout(contains("(derived)"));
}

#[test]
fn load_rejects_zero_window() {
    let workspace = TestWorkspace::new();
    let input = workspace.write_results("results.csv", ROWS);
    ranker()
        .args([
            "load",
            "-i",
            input.to_str().unwrap(),
            "--period",
            "2015",
            "--window",
            "0",
            "--store",
            workspace.store_dir().to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("--window must be at least 1"));
}
