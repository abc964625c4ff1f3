use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_project_dir(name: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("unifmt_project_cli_{name}_{nanos}"));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

const MAIN_SRC: &str = "square:Nat->Nat\nsquare n=n*n\n> square 4\n";
const UTIL_SRC: &str = "  go x =\n      y = x+1\n      y\n";

#[test]
fn fmt_manifest_path_formats_included_files() {
    let dir = temp_project_dir("fmt");
    fs::create_dir_all(dir.join("src/vendor")).expect("create src");
    fs::write(
        dir.join("unifmt.toml"),
        "[format]\nindent_unit = 4\n\n[files]\ninclude = [\"src\"]\nexclude = [\"vendor\"]\n",
    )
    .expect("write unifmt.toml");
    fs::write(dir.join("src/main.u"), MAIN_SRC).expect("write main.u");
    fs::write(dir.join("src/util.u"), UTIL_SRC).expect("write util.u");
    fs::write(dir.join("src/vendor/lib.u"), "x=1\n").expect("write lib.u");

    let exe = env!("CARGO_BIN_EXE_unifmt");
    let output = Command::new(exe)
        .arg("fmt")
        .arg("--manifest-path")
        .arg(&dir)
        .output()
        .expect("run unifmt fmt");
    if !output.status.success() {
        panic!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    let opts = unifmtc::FormatOptions::new(4, true);
    let got_main = fs::read_to_string(dir.join("src/main.u")).expect("read main.u");
    let got_util = fs::read_to_string(dir.join("src/util.u")).expect("read util.u");
    assert_eq!(got_main, unifmtc::format(MAIN_SRC, &opts));
    assert_eq!(got_util, unifmtc::format(UTIL_SRC, &opts));
    assert_eq!(got_util, "go x =\n    y = x + 1\n    y\n");
    let vendored = fs::read_to_string(dir.join("src/vendor/lib.u")).expect("read lib.u");
    assert_eq!(vendored, "x=1\n");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn check_lists_unformatted_files_and_exits_one() {
    let dir = temp_project_dir("check");
    fs::write(dir.join("unifmt.toml"), "").expect("write unifmt.toml");
    fs::write(dir.join("main.u"), MAIN_SRC).expect("write main.u");
    fs::write(dir.join("clean.u"), "x = 1\n").expect("write clean.u");

    let exe = env!("CARGO_BIN_EXE_unifmt");
    let output = Command::new(exe)
        .arg("check")
        .arg("--diff")
        .arg("--manifest-path")
        .arg(dir.join("unifmt.toml"))
        .output()
        .expect("run unifmt check");

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("main.u (original)"), "stdout: {stdout}");
    assert!(stdout.contains("+square : Nat -> Nat"), "stdout: {stdout}");
    assert!(!stdout.contains("clean.u"), "stdout: {stdout}");
    assert_eq!(
        fs::read_to_string(dir.join("main.u")).expect("read main.u"),
        MAIN_SRC
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn environment_overrides_manifest_indent() {
    let dir = temp_project_dir("env");
    fs::write(dir.join("unifmt.toml"), "[format]\nindent_unit = 4\n").expect("write manifest");
    fs::write(dir.join("chain.u"), "r = a|>b|>c\n").expect("write chain.u");

    let exe = env!("CARGO_BIN_EXE_unifmt");
    let output = Command::new(exe)
        .arg("fmt")
        .arg("--manifest-path")
        .arg(&dir)
        .env("UNIFMT_FORMAT_INDENT_UNIT", "2")
        .output()
        .expect("run unifmt fmt");
    if !output.status.success() {
        panic!("stderr: {}", String::from_utf8_lossy(&output.stderr));
    }
    assert_eq!(
        fs::read_to_string(dir.join("chain.u")).expect("read chain.u"),
        "r =\n  a\n    |> b\n    |> c\n"
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_manifest_is_reported() {
    let dir = temp_project_dir("invalid");
    fs::write(dir.join("unifmt.toml"), "[format]\nwidth = 80\n").expect("write manifest");

    let exe = env!("CARGO_BIN_EXE_unifmt");
    let output = Command::new(exe)
        .arg("check")
        .arg("--color")
        .arg("never")
        .arg("--manifest-path")
        .arg(&dir)
        .output()
        .expect("run unifmt check");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: invalid manifest"), "stderr: {stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn version_and_unknown_command() {
    let exe = env!("CARGO_BIN_EXE_unifmt");
    let output = Command::new(exe)
        .arg("--version")
        .output()
        .expect("run unifmt --version");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("unifmt "), "stdout: {stdout}");

    let output = Command::new(exe)
        .arg("lint")
        .output()
        .expect("run unifmt lint");
    assert_eq!(output.status.code(), Some(2));
}
