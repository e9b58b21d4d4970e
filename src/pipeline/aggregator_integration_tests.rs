//! End-to-end tests for the pipeline at interface boundaries.
//!
//! Covers the scenarios the engine must hold under any partitioning:
//! small fixed fixtures, a generated 1000-row file across worker counts,
//! corrupted rows, and the fail-before-work error paths.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::classify::Tally;
use crate::config::Config;
use crate::error::Error;
use crate::{run, run_pipeline};

fn fixture(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn quiet_config(path: &Path, min_age: f64, max_age: f64, workers: usize) -> Config {
    let mut config = Config::for_input(path.to_path_buf(), min_age, max_age, workers);
    config.processing.enable_metrics = false;
    config
}

const SMALL: &str = "id,age,gender\n1,30,F\n2,70,M\n3,10,X\n";

#[tokio::test]
async fn test_scenario_filtered_range() {
    let file = fixture(SMALL);
    let report = run_pipeline(quiet_config(file.path(), 18.0, 65.0, 1))
        .await
        .unwrap();

    // Row 2 and row 3 are excluded by age, not counted as anything else.
    assert_eq!(report.tally, Tally { female: 1, male: 0, other: 0 });
    assert_eq!(report.records_scanned, 3);
    assert_eq!(report.records_out_of_range, 2);
    assert_eq!(report.records_skipped, 0);
}

#[tokio::test]
async fn test_scenario_wide_range() {
    let file = fixture(SMALL);
    let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, 1))
        .await
        .unwrap();

    assert_eq!(report.tally, Tally { female: 1, male: 1, other: 1 });
}

#[tokio::test]
async fn test_zero_workers_rejected_before_any_work() {
    let report = run("/definitely/not/a/file.csv", 18.0, 65.0, 0).await;
    // InvalidConfig wins over FileNotFound: validation runs first.
    assert!(matches!(report, Err(Error::InvalidConfig(_))));
}

#[tokio::test]
async fn test_missing_file_rejected_before_partitioning() {
    let report = run("/definitely/not/a/file.csv", 18.0, 65.0, 4).await;
    assert!(matches!(report, Err(Error::FileNotFound(_))));
}

#[tokio::test]
async fn test_directory_is_not_a_regular_file() {
    let dir = tempfile::tempdir().unwrap();
    let report = run(dir.path(), 18.0, 65.0, 4).await;
    assert!(matches!(report, Err(Error::FileNotFound(_))));
}

#[tokio::test]
async fn test_empty_file() {
    let file = fixture("");
    let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, 4))
        .await
        .unwrap();
    assert_eq!(report.tally, Tally::default());
    assert_eq!(report.records_scanned, 0);
}

#[tokio::test]
async fn test_header_only_file() {
    let file = fixture("id,age,gender\n");
    let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, 4))
        .await
        .unwrap();
    assert_eq!(report.tally, Tally::default());
    assert_eq!(report.records_scanned, 0);
}

#[tokio::test]
async fn test_more_workers_than_bytes() {
    let file = fixture("id,age,gender\n1,30,f\n");
    let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, 64))
        .await
        .unwrap();
    assert_eq!(report.tally, Tally { female: 1, male: 0, other: 0 });
}

#[tokio::test]
async fn test_corrupted_line_does_not_lose_partition_data() {
    let content = "id,age,gender\n1,30,F\n<<corrupt>>\n2,40,m\n3,50,f\n4,60,z\n";
    let file = fixture(content);

    for workers in [1, 2, 4] {
        let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, workers))
            .await
            .unwrap();
        assert_eq!(
            report.tally,
            Tally { female: 2, male: 1, other: 1 },
            "{workers} workers"
        );
        assert_eq!(report.records_skipped, 1, "{workers} workers");
    }
}

/// Deterministic row generator; ages and genders cycle so the expected
/// tally can be computed independently of the engine.
fn generate_rows(count: usize) -> (String, Tally, u64) {
    let genders = ["F", "m", "x", "M", "f", ""];
    let mut content = String::from("id,age,gender\n");
    let mut expected = Tally::default();
    let mut out_of_range = 0u64;

    for i in 0..count {
        let age = (i * 7) % 120;
        let gender = genders[i % genders.len()];
        content.push_str(&format!("{i},{age},{gender}\n"));

        if (18..=65).contains(&age) {
            match gender.to_lowercase().as_str() {
                "f" => expected.female += 1,
                "m" => expected.male += 1,
                _ => expected.other += 1,
            }
        } else {
            out_of_range += 1;
        }
    }

    (content, expected, out_of_range)
}

#[tokio::test]
async fn test_worker_count_does_not_change_result() {
    let (content, expected, out_of_range) = generate_rows(1000);
    let file = fixture(&content);
    let file_size = content.len() as u64;

    for workers in [1, 2, 4, 8] {
        let report = run_pipeline(quiet_config(file.path(), 18.0, 65.0, workers))
            .await
            .unwrap();

        assert_eq!(report.tally, expected, "{workers} workers");
        assert_eq!(report.records_scanned, 1000, "{workers} workers");
        assert_eq!(report.records_out_of_range, out_of_range, "{workers} workers");
        assert_eq!(report.records_skipped, 0, "{workers} workers");
        assert_eq!(report.partitions, workers);
        // Every partition accounts for at least its own bytes; realignment
        // overshoot may count boundary bytes in two partitions.
        assert!(report.bytes_scanned >= file_size, "{workers} workers");
    }
}

#[tokio::test]
async fn test_run_contract_returns_final_tally() {
    let (content, expected, _) = generate_rows(200);
    let file = fixture(&content);

    let tally = run(file.path(), 18.0, 65.0, 4).await.unwrap();
    assert_eq!(tally, expected);
}

#[tokio::test]
async fn test_alternate_delimiter_end_to_end() {
    let file = fixture("id;age;gender\n1;30;F\n2;40;M\n");
    let mut config = quiet_config(file.path(), 0.0, 100.0, 2);
    config.input.delimiter = ';';

    let report = run_pipeline(config).await.unwrap();
    assert_eq!(report.tally, Tally { female: 1, male: 1, other: 0 });
}

#[tokio::test]
async fn test_crlf_line_endings() {
    let file = fixture("id,age,gender\r\n1,30,F\r\n2,40,M\r\n");
    let report = run_pipeline(quiet_config(file.path(), 0.0, 100.0, 2))
        .await
        .unwrap();
    assert_eq!(report.tally, Tally { female: 1, male: 1, other: 0 });
}

#[tokio::test]
async fn test_metrics_output_path_written() {
    let (content, _, _) = generate_rows(50);
    let file = fixture(&content);
    let dir = tempfile::tempdir().unwrap();
    let metrics_path = dir.path().join("metrics.json");

    let mut config = quiet_config(file.path(), 18.0, 65.0, 2);
    config.processing.enable_metrics = true;
    config.processing.metrics_output_path = Some(metrics_path.to_string_lossy().into_owned());

    run_pipeline(config).await.unwrap();

    let json = std::fs::read_to_string(&metrics_path).unwrap();
    assert!(json.contains("\"records_scanned\": 50"));
}
