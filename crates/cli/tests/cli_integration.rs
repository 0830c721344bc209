use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn make_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before UNIX_EPOCH")
        .as_nanos();
    let pid = std::process::id();
    let dir = std::env::temp_dir().join(format!("argtext-integ-{prefix}-{pid}-{nanos}"));
    fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

fn write_template(dir: &PathBuf, contents: &str) -> PathBuf {
    let path = dir.join("usage.txt");
    fs::write(&path, contents).expect("failed to write template fixture");
    path
}

fn argtext() -> Command {
    Command::new(env!("CARGO_BIN_EXE_argtext"))
}

const SYNC_TEMPLATE: &str = "\
Usage: {{COMMAND}} {{OPTION}} <SRC> [DEST]...

Copy files between hosts.

+ -m, --mode  ## transfer mode
? -q, --quiet ## suppress progress output
";

#[test]
fn help_works() {
    let out = argtext()
        .arg("--help")
        .output()
        .expect("failed to run argtext --help");
    assert!(
        out.status.success(),
        "argtext --help failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("Usage: argtext [OPTION]... TEMPLATE") && stdout.contains("--json"),
        "unexpected help output:\n{stdout}"
    );
}

#[test]
fn version_works() {
    let out = argtext()
        .arg("--version")
        .output()
        .expect("failed to run argtext --version");
    assert!(out.status.success(), "argtext --version failed: {}", out.status);
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.starts_with("argtext "),
        "unexpected version output:\n{stdout}"
    );
}

#[test]
fn summary_reports_compiled_grammar() {
    let dir = make_temp_dir("summary");
    let template = write_template(&dir, SYNC_TEMPLATE);

    let out = argtext()
        .arg(&template)
        .output()
        .expect("failed to run argtext");
    assert!(
        out.status.success(),
        "argtext failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("<SRC>"), "missing operand row:\n{stdout}");
    assert!(stdout.contains("operand, required"), "missing operand note:\n{stdout}");
    assert!(
        stdout.contains("operand, optional, list"),
        "missing list operand note:\n{stdout}"
    );
    assert!(stdout.contains("-m, --mode"), "missing option row:\n{stdout}");
    assert!(stdout.contains("switch"), "missing switch note:\n{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn json_reports_compiled_grammar() {
    let dir = make_temp_dir("json");
    let template = write_template(&dir, SYNC_TEMPLATE);

    let out = argtext()
        .arg("--json")
        .arg(&template)
        .output()
        .expect("failed to run argtext --json");
    assert!(
        out.status.success(),
        "argtext --json failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("stdout must be valid JSON");
    assert_eq!(json["operand-names"][0], "SRC", "unexpected JSON:\n{stdout}");
    assert_eq!(json["array-operand"], "DEST", "unexpected JSON:\n{stdout}");
    assert_eq!(json["aliases"]["-m"], "--mode", "unexpected JSON:\n{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parses_argv_against_the_template() {
    let dir = make_temp_dir("parse");
    let template = write_template(&dir, SYNC_TEMPLATE);

    let out = argtext()
        .arg("-a")
        .arg("sync -m fast one two three")
        .arg(&template)
        .output()
        .expect("failed to run argtext -a");
    assert!(
        out.status.success(),
        "argtext -a failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("command: sync"), "missing command:\n{stdout}");
    assert!(stdout.contains("operand[0]: one"), "missing operand:\n{stdout}");
    assert!(stdout.contains("operand[2]: three"), "missing operand:\n{stdout}");
    assert!(stdout.contains("option -m = fast"), "missing option:\n{stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn parse_failure_prints_error_and_target_usage() {
    let dir = make_temp_dir("parse-failure");
    let template = write_template(&dir, SYNC_TEMPLATE);

    let out = argtext()
        .arg("-a")
        .arg("sync --nope one")
        .arg(&template)
        .output()
        .expect("failed to run argtext -a");
    assert_eq!(out.status.code(), Some(2), "expected exit code 2");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("unrecognized option '--nope'"),
        "missing parse error:\n{stderr}"
    );
    assert!(
        stderr.contains("Usage: sync [OPTION]... SRC [DEST]..."),
        "missing rendered usage:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn tolerant_flag_routes_unknown_options_to_operands() {
    let dir = make_temp_dir("tolerant");
    let template = write_template(&dir, SYNC_TEMPLATE);

    let out = argtext()
        .arg("--tolerant")
        .arg("-a")
        .arg("sync --nope one")
        .arg(&template)
        .output()
        .expect("failed to run argtext --tolerant");
    assert!(
        out.status.success(),
        "argtext --tolerant failed:\nstatus: {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr),
    );
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(
        stdout.contains("operand[0]: --nope"),
        "unknown option not routed to operands:\n{stdout}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn bad_template_fails_with_line_number() {
    let dir = make_temp_dir("bad-template");
    let template = write_template(&dir, "Usage: x <A>\nUsage: y <9lives>\n");

    let out = argtext()
        .arg(&template)
        .output()
        .expect("failed to run argtext");
    assert!(!out.status.success(), "bad template must fail");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("failed to compile template"),
        "missing context:\n{stderr}"
    );
    assert!(
        stderr.contains("invalid operand name '9lives' in line 2"),
        "missing compile error detail:\n{stderr}"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_template_operand_exits_with_usage() {
    let out = argtext().output().expect("failed to run argtext");
    assert_eq!(out.status.code(), Some(2), "expected exit code 2");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("missing operand 'TEMPLATE'"),
        "missing operand error:\n{stderr}"
    );
    assert!(stderr.contains("Usage:"), "missing rendered usage:\n{stderr}");
}
