//! Integration tests for the boleto engine CLI.
//!
//! These tests run the actual binary against the CSV files in `tests/data`.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Binary with a complete set of batch settings in its environment
fn engine_cmd() -> Command {
    let mut cmd = Command::cargo_bin("boleto-engine").unwrap();
    cmd.env("BOLETO_BENEFICIARY_NAME", "Acme Comércio Ltda")
        .env("BOLETO_BENEFICIARY_DOCUMENT", "12.345.678/0001-95")
        .env("BOLETO_AGENCY", "1234")
        .env("BOLETO_ACCOUNT", "1234567")
        .env("BOLETO_ACCOUNT_DV", "8")
        .env("BOLETO_WALLET", "9")
        .env("BOLETO_REMESSA_ID", "7")
        .env("BOLETO_REMESSA_DATE", "2026-10-19")
        .env_remove("BOLETO_CLIENT_CODE");
    cmd
}

/// Run the binary with the given command and input file and return stdout
fn run_engine(command: &str, input_file: &str) -> String {
    let assert = engine_cmd().arg(command).arg(input_file).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn test_slips_match_expected() {
    let output = run_engine("slips", &test_data_path("payments.csv"));
    let expected = fs::read_to_string(test_data_path("expected_slips.csv")).unwrap();

    let output_lines: Vec<&str> = output.lines().collect();
    let expected_lines: Vec<&str> = expected.lines().collect();
    assert_eq!(output_lines, expected_lines);
}

#[test]
fn test_remessa_structure() {
    let output = run_engine("remessa", &test_data_path("payments.csv"));

    assert!(output.ends_with("\r\n"));
    let lines: Vec<&str> = output.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 5, "header, three details, trailer");
    for line in &lines {
        assert_eq!(line.len(), 400);
    }

    let header = lines[0];
    assert_eq!(&header[0..26], "01REMESSA01COBRANCA       ");
    assert_eq!(&header[26..46], "00000090123412345678");
    assert!(header[46..76].starts_with("ACME COMERCIO LTDA"));
    assert_eq!(&header[94..100], "191026");
    assert_eq!(&header[110..117], "0000007");

    let sequences: Vec<&str> = lines.iter().map(|l| &l[394..400]).collect();
    assert_eq!(sequences, ["000001", "000001", "000002", "000003", "000003"]);

    assert!(lines[4].starts_with('9'));
    assert!(lines[4][1..394].chars().all(|c| c == ' '));
}

#[test]
fn test_remessa_detail_columns() {
    let output = run_engine("remessa", &test_data_path("payments.csv"));
    let lines: Vec<&str> = output.split_terminator("\r\n").collect();

    let first = lines[1];
    assert_eq!(&first[70..82], "000000000018");
    assert_eq!(&first[108..110], "01");
    assert_eq!(&first[37..45], "INV-0001");
    assert_eq!(&first[218..234], "0100012345678909");
    assert!(first[234..274].starts_with("JOSE DA SILVA"));

    let company = lines[2];
    assert_eq!(&company[147..149], "02");
    assert_eq!(&company[218..234], "0212345678000195");

    let write_off = lines[3];
    assert_eq!(&write_off[65..70], "20200");
    assert_eq!(&write_off[70..82], "00000000014P");
    assert_eq!(&write_off[108..110], "02");
    assert_eq!(&write_off[160..173], "0000000000015");
    assert_eq!(&write_off[173..179], "201126");
    assert_eq!(&write_off[179..192], "0000000000500");
}

#[test]
fn test_remessa_missing_setting_fails() {
    let mut cmd = engine_cmd();
    cmd.env_remove("BOLETO_REMESSA_ID")
        .arg("remessa")
        .arg(test_data_path("payments.csv"))
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("remessa_sequence"));
}

#[test]
fn test_empty_input_gives_header_and_trailer() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "document_number,due_date,amount").unwrap();

    let output = run_engine("remessa", input.path().to_str().unwrap());
    let lines: Vec<&str> = output.split_terminator("\r\n").collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(&lines[1][394..400], "000000");
}

#[test]
fn test_missing_file_error() {
    let mut cmd = engine_cmd();
    cmd.arg("slips")
        .arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = engine_cmd();
    cmd.arg("slips")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing arguments"));
}

#[test]
fn test_unknown_command_error() {
    let mut cmd = engine_cmd();
    cmd.arg("print")
        .arg(test_data_path("payments.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command"));
}

#[test]
fn test_output_has_correct_header() {
    let output = run_engine("slips", &test_data_path("payments.csv"));
    assert!(output.starts_with("document_number,our_number,due_date,amount,barcode,typeable_line"));
}
