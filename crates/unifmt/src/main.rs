use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Deserialize;
use unifmt_rt::config::{env_key, lookup_bool, lookup_usize};
use unifmt_rt::error::RtError;
use unifmtc::FormatOptions;
use unifmtc::batch::{FileOutcome, format_files};
use unifmtc::edits::unified_diff;
use unifmtc::options::{MAX_INDENT_UNIT, MIN_INDENT_UNIT};

const USAGE: &str = r#"usage: unifmt <command> [options] [paths...]

commands:
  fmt       Rewrite files whose formatting changes
  check     List files that would be reformatted

options:
  --manifest-path <path>  Path to unifmt.toml (defaults to nearest parent)
  --indent <n>            Columns per indentation level (1-8)
  --tabs                  Indent with tabs instead of spaces
  --diff                  Print a unified diff for every file that would change (check only)
  --color <auto|always|never>  Colorized CLI output policy
  --version               Print the version and exit
"#;

const MANIFEST_NAME: &str = "unifmt.toml";
const BUILD_TARGET: &str = env!("UNIFMT_BUILD_TARGET");
const DEFAULT_EXTENSIONS: &[&str] = &["u"];
const SKIPPED_DIRS: &[&str] = &[".git", "target", ".unison"];

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    format: FormatConfig,
    #[serde(default)]
    files: FilesConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FormatConfig {
    indent_unit: Option<usize>,
    use_spaces: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilesConfig {
    #[serde(default)]
    include: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    extensions: Vec<String>,
}

#[derive(Default)]
struct CommonArgs {
    manifest_path: Option<PathBuf>,
    indent: Option<usize>,
    tabs: bool,
    diff: bool,
    color: Option<ColorChoice>,
    paths: Vec<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Command {
    Fmt,
    Check,
}

impl Command {
    fn tag(self) -> &'static str {
        match self {
            Command::Fmt => "fmt",
            Command::Check => "check",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "auto" => Some(Self::Auto),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }
}

static COLOR_MODE: AtomicU8 = AtomicU8::new(0);

fn apply_color_choice(choice: ColorChoice) {
    let mode = match choice {
        ColorChoice::Always => 2,
        ColorChoice::Never => 0,
        ColorChoice::Auto => {
            if env::var_os("NO_COLOR").is_some() {
                0
            } else if color_auto_is_tty() {
                1
            } else {
                0
            }
        }
    };
    COLOR_MODE.store(mode, Ordering::Relaxed);
}

fn color_auto_is_tty() -> bool {
    if let Some(force) = env::var_os("UNIFMT_COLOR_FORCE_TTY") {
        return force == "1";
    }
    io::stderr().is_terminal()
}

fn color_enabled() -> bool {
    COLOR_MODE.load(Ordering::Relaxed) != 0
}

fn ansi_paint(text: &str, code: &str) -> String {
    if color_enabled() {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn style_error(text: &str) -> String {
    ansi_paint(text, "31;1")
}

fn style_warning(text: &str) -> String {
    ansi_paint(text, "33;1")
}

fn style_header(text: &str) -> String {
    ansi_paint(text, "36;1")
}

fn emit_cli_error(message: &str) {
    eprintln!("{}", style_error(&format!("error: {message}")));
}

fn emit_cli_warning(message: &str) {
    eprintln!("{}", style_warning(&format!("warning: {message}")));
}

fn emit_command_step(command: Command, message: &str) {
    let prefix = style_header(&format!("[{}]", command.tag()));
    eprintln!("{prefix} {message}");
}

fn finalize_command(command: Command, code: i32) -> i32 {
    match code {
        0 => emit_command_step(command, "ok"),
        _ => emit_command_step(command, "failed"),
    }
    code
}

fn main() {
    unifmt_rt::log::init();
    let args: Vec<String> = env::args().skip(1).collect();
    let code = run(args);
    std::process::exit(code);
}

fn run(args: Vec<String>) -> i32 {
    apply_color_choice(ColorChoice::Auto);
    let Some((cmd, rest)) = args.split_first() else {
        eprintln!("{}", style_header(USAGE));
        return 2;
    };
    let command = match cmd.as_str() {
        "fmt" => Command::Fmt,
        "check" => Command::Check,
        "--version" | "-V" => {
            println!("unifmt {} ({BUILD_TARGET})", env!("CARGO_PKG_VERSION"));
            return 0;
        }
        "--help" | "-h" => {
            println!("{USAGE}");
            return 0;
        }
        _ => {
            emit_cli_error(&format!("unknown command: {cmd}"));
            eprintln!("{}", style_header(USAGE));
            return 2;
        }
    };
    if let Some(choice) = discover_color_choice(rest) {
        apply_color_choice(choice);
    }
    let common = match parse_common_args(rest, command) {
        Ok(args) => args,
        Err(err) => {
            emit_cli_error(&err.to_string());
            eprintln!("{}", style_header(USAGE));
            return err.exit_code();
        }
    };
    apply_color_choice(common.color.unwrap_or(ColorChoice::Auto));

    match run_command(command, &common) {
        Ok(code) => finalize_command(command, code),
        Err(err) => {
            emit_cli_error(&err.to_string());
            finalize_command(command, err.exit_code())
        }
    }
}

fn run_command(command: Command, common: &CommonArgs) -> Result<i32, RtError> {
    let (manifest, manifest_dir) = load_manifest(common.manifest_path.as_deref())?;
    let manifest = manifest.unwrap_or_default();
    let options = resolve_options(common, &manifest.format, |key| env::var(key).ok())?;
    let base = match manifest_dir {
        Some(dir) => dir,
        None => env::current_dir().map_err(|err| RtError::io(".", err))?,
    };
    let targets = resolve_targets(&common.paths, &manifest.files, &base);
    let files = collect_target_files(&targets, &manifest.files);
    if files.is_empty() {
        emit_cli_warning("no files matched");
        return Ok(0);
    }
    emit_command_step(
        command,
        &format!("{} file{}", files.len(), plural(files.len())),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;
    let mut changed = 0usize;
    for result in format_files(&files, &options) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                emit_cli_error(&err.to_string());
                failed = true;
                continue;
            }
        };
        if !outcome.changed() {
            continue;
        }
        match command {
            Command::Fmt => {
                if !write_formatted(&outcome) {
                    failed = true;
                    continue;
                }
            }
            Command::Check => {
                report_unformatted(&outcome, common.diff, &mut out)?;
                failed = true;
            }
        }
        changed += 1;
    }
    let verb = match command {
        Command::Fmt => "reformatted",
        Command::Check => "would reformat",
    };
    emit_command_step(
        command,
        &format!("{verb} {changed} file{}", plural(changed)),
    );
    Ok(if failed { 1 } else { 0 })
}

/// Writes one reformatted file. A failed write is reported and the run goes on.
fn write_formatted(outcome: &FileOutcome) -> bool {
    match outcome.write_back() {
        Ok(_) => {
            unifmt_rt::log::info(&format!("formatted {}", outcome.path.display()));
            true
        }
        Err(err) => {
            emit_cli_error(&err.to_string());
            false
        }
    }
}

fn report_unformatted<W: Write>(
    outcome: &FileOutcome,
    diff: bool,
    out: &mut W,
) -> Result<(), RtError> {
    let label = outcome.path.display().to_string();
    let text = if diff {
        unified_diff(&label, &outcome.original, &outcome.formatted)
    } else {
        format!("{label}\n")
    };
    out.write_all(text.as_bytes())
        .map_err(|err| RtError::io("<stdout>", err))
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn discover_color_choice(args: &[String]) -> Option<ColorChoice> {
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = &args[idx];
        if arg == "--color" {
            idx += 1;
            let value = args.get(idx)?;
            return ColorChoice::parse(value);
        }
        if let Some(value) = arg.strip_prefix("--color=") {
            return ColorChoice::parse(value);
        }
        idx += 1;
    }
    None
}

fn parse_common_args(args: &[String], command: Command) -> Result<CommonArgs, RtError> {
    let mut out = CommonArgs::default();
    let mut idx = 0;
    while idx < args.len() {
        let arg = &args[idx];
        if arg == "--manifest-path" {
            idx += 1;
            let Some(path) = args.get(idx) else {
                return Err(RtError::usage("--manifest-path expects a path"));
            };
            out.manifest_path = Some(PathBuf::from(path));
            idx += 1;
            continue;
        }
        if arg == "--indent" {
            idx += 1;
            let Some(raw) = args.get(idx) else {
                return Err(RtError::usage("--indent expects a number"));
            };
            let value = unifmt_rt::config::parse_usize("--indent", raw)
                .map_err(|err| RtError::usage(err.to_string()))?;
            out.indent = Some(value);
            idx += 1;
            continue;
        }
        if arg == "--tabs" {
            out.tabs = true;
            idx += 1;
            continue;
        }
        if arg == "--diff" {
            if command != Command::Check {
                return Err(RtError::usage("--diff is only supported for unifmt check"));
            }
            out.diff = true;
            idx += 1;
            continue;
        }
        if arg == "--color" {
            idx += 1;
            let Some(choice) = args.get(idx) else {
                return Err(RtError::usage("--color expects auto, always, or never"));
            };
            out.color = Some(parse_color(choice)?);
            idx += 1;
            continue;
        }
        if let Some(choice) = arg.strip_prefix("--color=") {
            out.color = Some(parse_color(choice)?);
            idx += 1;
            continue;
        }
        if arg.starts_with("--") {
            return Err(RtError::usage(format!("unknown option: {arg}")));
        }
        out.paths.push(PathBuf::from(arg));
        idx += 1;
    }
    Ok(out)
}

fn parse_color(choice: &str) -> Result<ColorChoice, RtError> {
    ColorChoice::parse(choice).ok_or_else(|| {
        RtError::usage(format!(
            "invalid --color value: {choice} (expected auto|always|never)"
        ))
    })
}

fn load_manifest(
    manifest_override: Option<&Path>,
) -> Result<(Option<Manifest>, Option<PathBuf>), RtError> {
    let (manifest_path, manifest_dir) = if let Some(path) = manifest_override {
        if path.is_dir() {
            (Some(path.join(MANIFEST_NAME)), Some(path.to_path_buf()))
        } else {
            (
                Some(path.to_path_buf()),
                path.parent().map(|p| p.to_path_buf()),
            )
        }
    } else {
        let cwd = env::current_dir().map_err(|err| RtError::io(".", err))?;
        let path = find_manifest(&cwd);
        let dir = path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()));
        (path, dir)
    };

    let Some(path) = manifest_path else {
        return Ok((None, None));
    };
    let content = fs::read_to_string(&path).map_err(|err| RtError::io(&path, err))?;
    let manifest = parse_manifest(&path, &content)?;
    log::debug!("loaded manifest {}", path.display());
    Ok((Some(manifest), manifest_dir))
}

fn parse_manifest(path: &Path, content: &str) -> Result<Manifest, RtError> {
    toml::from_str(content).map_err(|err| RtError::Manifest {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })
}

fn find_manifest(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        let candidate = dir.join(MANIFEST_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// CLI flags win over environment overrides, which win over the manifest.
fn resolve_options<F>(
    common: &CommonArgs,
    config: &FormatConfig,
    lookup: F,
) -> Result<FormatOptions, RtError>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = FormatOptions::default();
    let indent_key = env_key("format", "indentUnit");
    let spaces_key = env_key("format", "useSpaces");

    let (indent_source, indent_unit) = match common.indent {
        Some(value) => ("--indent".to_string(), value),
        None => match lookup_usize(&lookup, &indent_key)? {
            Some(value) => (indent_key, value),
            None => (
                "format.indent_unit".to_string(),
                config.indent_unit.unwrap_or(defaults.indent_unit),
            ),
        },
    };
    if !(MIN_INDENT_UNIT..=MAX_INDENT_UNIT).contains(&indent_unit) {
        return Err(RtError::Config {
            key: indent_source,
            message: format!(
                "indent unit must be between {MIN_INDENT_UNIT} and {MAX_INDENT_UNIT}, got {indent_unit}"
            ),
        });
    }

    let use_spaces = if common.tabs {
        false
    } else {
        match lookup_bool(&lookup, &spaces_key)? {
            Some(value) => value,
            None => config.use_spaces.unwrap_or(defaults.use_spaces),
        }
    };
    Ok(FormatOptions::new(indent_unit, use_spaces))
}

fn resolve_targets(paths: &[PathBuf], files: &FilesConfig, base: &Path) -> Vec<PathBuf> {
    if !paths.is_empty() {
        return paths.to_vec();
    }
    if files.include.is_empty() {
        return vec![base.to_path_buf()];
    }
    files
        .include
        .iter()
        .map(|path| resolve_manifest_relative_path(base, path))
        .collect()
}

fn resolve_manifest_relative_path(base: &Path, path: &str) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Explicit file targets are always kept; directories are walked for files
/// with a configured extension.
fn collect_target_files(targets: &[PathBuf], files: &FilesConfig) -> Vec<PathBuf> {
    let exts: Vec<&str> = if files.extensions.is_empty() {
        DEFAULT_EXTENSIONS.to_vec()
    } else {
        files
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.'))
            .collect()
    };
    let exclude: Vec<&str> = files.exclude.iter().map(String::as_str).collect();
    let mut out = BTreeSet::new();
    for target in targets {
        if target.is_dir() {
            collect_files_by_extension(target, &exts, &exclude, &mut out);
        } else {
            out.insert(target.clone());
        }
    }
    log::debug!("collected {} files from {} targets", out.len(), targets.len());
    out.into_iter().collect()
}

fn collect_files_by_extension(
    root: &Path,
    exts: &[&str],
    exclude: &[&str],
    out: &mut BTreeSet<PathBuf>,
) {
    let mut dirs = VecDeque::new();
    dirs.push_back(root.to_path_buf());
    while let Some(dir) = dirs.pop_front() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) => {
                unifmt_rt::log::warn(&format!("skipping {}: {err}", dir.display()));
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("");
            if exclude.contains(&name) {
                continue;
            }
            if path.is_dir() {
                if !SKIPPED_DIRS.contains(&name) {
                    dirs.push_back(path);
                }
                continue;
            }
            let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
            if exts
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
            {
                out.insert(path);
            }
        }
    }
}
