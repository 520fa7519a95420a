use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const LINE_LEN: usize = 128;
const MAGIC: &[u8] = b"000AM00000001000000TABGHSCT00000001000000GHX000NXGHS";

fn pad(mut line: Vec<u8>) -> Vec<u8> {
    line.resize(LINE_LEN, b' ');
    line
}

fn record(ghs: &str, sector: u8, price: &str, exh: &str, date: &str, exb: &str) -> Vec<u8> {
    let mut line = b"110".to_vec();
    line.extend_from_slice(b"    ");
    line.extend_from_slice(ghs.as_bytes());
    line.push(b'0' + sector);
    line.extend_from_slice(&[b' '; 9]);
    line.extend_from_slice(price.as_bytes());
    line.push(b' ');
    line.extend_from_slice(exh.as_bytes());
    line.extend_from_slice(&[b' '; 50]);
    line.extend_from_slice(date.as_bytes());
    line.push(b' ');
    line.extend_from_slice(exb.as_bytes());
    pad(line)
}

fn pricing_file(records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = pad(MAGIC.to_vec());
    for r in records {
        out.push(b'\n');
        out.extend_from_slice(r);
    }
    out
}

#[test]
fn pricing_command_resolves_a_flat_price() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&pricing_file(&[record("0123", 1, "00000450", "00000000", "20240101", "00000000")]))
        .unwrap();

    Command::cargo_bin("drg")
        .unwrap()
        .args([
            "pricing",
            "--file",
            tmp.path().to_str().unwrap(),
            "123",
            "--date",
            "2024-06-15",
            "--sector",
            "public",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"price_cents\": 450"));
}

#[test]
fn pricing_command_fails_for_unknown_ghs() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&pricing_file(&[record("0123", 1, "00000450", "00000000", "20240101", "00000000")]))
        .unwrap();

    Command::cargo_bin("drg")
        .unwrap()
        .args([
            "pricing",
            "--file",
            tmp.path().to_str().unwrap(),
            "999",
            "--date",
            "2024-06-15",
            "--sector",
            "public",
        ])
        .assert()
        .failure();
}

const STAY_JSON: &str = r#"[{
  "stay_id": 1, "bill_id": 1,
  "birthdate": "2000-01-01", "sex": 1,
  "entry_date": "2024-01-01", "exit_date": "2024-01-05",
  "entry": {"mode": 8, "origin": 0}, "exit": {"mode": 8, "destination": 0},
  "unit": null, "session_count": 0, "igs2": null, "gestational_age": null,
  "newborn_weight": null, "last_menstrual_period": null,
  "main_diagnosis": "I10", "linked_diagnosis": null,
  "associated_diagnoses": [], "procedures": [], "errors": []
}]"#;

#[test]
fn summarize_command_reports_missing_table_error_on_empty_table_directory() {
    let dir = tempfile::tempdir().unwrap();
    let stays_file = dir.path().join("stays.json");
    std::fs::write(&stays_file, STAY_JSON).unwrap();

    Command::cargo_bin("drg")
        .unwrap()
        .args([
            "summarize",
            "--tables",
            dir.path().to_str().unwrap(),
            "--stays",
            stays_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("502"));
}
