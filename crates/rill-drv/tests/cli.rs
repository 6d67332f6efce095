//! CLI end-to-end tests: drive the `rill` binary as a subprocess and check
//! its exit code and output, same shape as the teacher's own driver tests.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn rill_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rill"))
}

fn script(contents: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".rl")
        .tempfile()
        .expect("failed to create temp script");
    std::fs::write(file.path(), contents).expect("failed to write temp script");
    file
}

// `std::process::exit` truncates to an unsigned byte on Unix, so the
// negative codes in §6.4 (`-1`, `-2`, `-3`) show up to a waiting shell as
// 255, 254, and 253 respectively.
const BAD_ARGUMENTS: i32 = 255;
const NO_INPUTS: i32 = 254;
const COMPILE_OR_RUN_ERROR: i32 = 253;

#[test]
fn missing_input_exits_with_no_inputs_code() {
    rill_bin().assert().failure().code(NO_INPUTS);
}

#[test]
fn bad_flag_value_exits_with_bad_arguments_code() {
    let file = script("var x = 1;");
    rill_bin()
        .arg("-d9")
        .arg(file.path())
        .assert()
        .failure()
        .code(BAD_ARGUMENTS);
}

#[test]
fn well_formed_script_runs_to_completion() {
    let file = script("var x = 1 + 2;");
    rill_bin().arg(file.path()).assert().success();
}

#[test]
fn lex_only_mode_skips_parsing_and_running() {
    let file = script("var x = ;;;");
    rill_bin()
        .arg("-r2")
        .arg(file.path())
        .assert()
        .success();
}

#[test]
fn token_dump_is_printed_when_requested() {
    let file = script("var x = 1;");
    rill_bin()
        .arg("-l1")
        .arg("-r2")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("KwVar").or(predicate::str::contains("Identifier")));
}

#[test]
fn runtime_error_exits_with_compile_or_run_error_code() {
    let file = script("var x = 1; var y = x / 0;");
    rill_bin().arg(file.path()).assert().failure().code(COMPILE_OR_RUN_ERROR);
}

#[test]
fn malformed_source_exits_with_compile_or_run_error_code() {
    let file = script("var x = ");
    rill_bin().arg(file.path()).assert().failure().code(COMPILE_OR_RUN_ERROR);
}
