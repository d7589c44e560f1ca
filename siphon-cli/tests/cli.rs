use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct SampleFile {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn sample(contents: &str, input_name: &str, output_name: &str) -> Result<SampleFile, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join(input_name);
    let output = dir.path().join(output_name);
    fs::write(&input, contents)?;
    Ok(SampleFile {
        _dir: dir,
        input,
        output,
    })
}

#[test]
fn convert_ion_to_jsonl() -> Result<(), Box<dyn Error>> {
    let sample = sample("{a: 1}\n{a: 2}\n", "records.ion", "out.jsonl")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 records"));

    assert_eq!(
        fs::read_to_string(&sample.output)?,
        "{\"a\":1}\n{\"a\":2}\n"
    );
    Ok(())
}

#[test]
fn convert_strips_annotations_by_default() -> Result<(), Box<dyn Error>> {
    let sample = sample("{tag: base64::\"TGlzdGU=\"}\n", "records.ion", "out.jsonl")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&sample.output)?, "{\"tag\":\"TGlzdGU=\"}\n");
    Ok(())
}

#[test]
fn convert_keeps_annotations_on_request() -> Result<(), Box<dyn Error>> {
    let sample = sample("{tag: base64::\"TGlzdGU=\"}\n", "records.ion", "out.jsonl")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
            "--keep-annotations",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&sample.output)?,
        "{\"tag\":{\"ion_annotations\":[\"base64\"],\"value\":\"TGlzdGU=\"}}\n"
    );
    Ok(())
}

#[test]
fn convert_to_csv_with_custom_separator() -> Result<(), Box<dyn Error>> {
    let sample = sample(
        "{k: \"x\", v: 1}\n{k: \"y\", v: 2}\n",
        "records.ion",
        "out.csv",
    )?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
            "--field-separator",
            ";",
        ])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&sample.output)?, "k;v\nx;1\ny;2\n");
    Ok(())
}

#[test]
fn count_prints_record_count() -> Result<(), Box<dyn Error>> {
    let sample = sample("{a: 1}\n{a: 2}\n{a: 3}\n", "records.ion", "unused")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args(["count", sample.input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::diff("3\n"));
    Ok(())
}

#[test]
fn missing_input_fails_with_source_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("out.jsonl");

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            dir.path().join("absent.ion").to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
    Ok(())
}

#[test]
fn malformed_input_fails_without_output() -> Result<(), Box<dyn Error>> {
    let sample = sample("{a: 1} {broken", "records.ion", "out.jsonl")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("decode error"));

    assert!(!sample.output.exists());
    Ok(())
}

#[test]
fn unknown_format_extension_requires_flag() -> Result<(), Box<dyn Error>> {
    let sample = sample("{a: 1}\n", "records.dat", "out.jsonl")?;

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source-format"));

    assert_cmd::Command::cargo_bin("siphon")?
        .args([
            "convert",
            sample.input.to_str().unwrap(),
            "-o",
            sample.output.to_str().unwrap(),
            "--source-format",
            "ion",
        ])
        .assert()
        .success();
    Ok(())
}
