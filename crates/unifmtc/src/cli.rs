use std::io::{self, Read, Write};
use std::path::PathBuf;

use unifmt_rt::error::RtError;

use crate::batch::{FileOutcome, format_files};
use crate::edits::unified_diff;
use crate::format::format;
use crate::options::FormatOptions;

const USAGE: &str = "usage: unifmtc [--check] [--diff] [--stdin] [--indent N] [--tabs] <file>...";

#[derive(Debug, Default)]
struct Args {
    check: bool,
    diff: bool,
    stdin: bool,
    indent: Option<usize>,
    tabs: bool,
    help: bool,
    paths: Vec<PathBuf>,
}

pub fn run<I>(args: I) -> i32
where
    I: IntoIterator<Item = String>,
{
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_with_io(args, &mut stdin.lock(), &mut stdout.lock())
}

/// Runs the driver against explicit streams; `input` is only read with
/// `--stdin`.
pub fn run_with_io<I, R, W>(args: I, input: &mut R, output: &mut W) -> i32
where
    I: IntoIterator<Item = String>,
    R: Read,
    W: Write,
{
    let args = match parse_args(args) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            eprintln!("{USAGE}");
            return err.exit_code();
        }
    };
    if args.help {
        let _ = writeln!(output, "{USAGE}");
        return 0;
    }
    let defaults = FormatOptions::default();
    let opts = FormatOptions::new(
        args.indent.unwrap_or(defaults.indent_unit),
        !args.tabs && defaults.use_spaces,
    );

    let result = if args.stdin {
        run_stdin(&args, &opts, input, output)
    } else {
        run_files(&args, &opts, output)
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            err.exit_code()
        }
    }
}

fn parse_args<I>(args: I) -> Result<Args, RtError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--check" => parsed.check = true,
            "--diff" => parsed.diff = true,
            "--stdin" => parsed.stdin = true,
            "--tabs" => parsed.tabs = true,
            "--indent" => {
                let Some(raw) = args.next() else {
                    return Err(RtError::usage("--indent expects a number"));
                };
                let value = unifmt_rt::config::parse_usize("--indent", &raw)
                    .map_err(|err| RtError::usage(err.to_string()))?;
                parsed.indent = Some(value);
            }
            "-h" | "--help" => {
                parsed.help = true;
                return Ok(parsed);
            }
            flag if flag.starts_with("--") => {
                return Err(RtError::usage(format!("unknown option: {flag}")));
            }
            _ => parsed.paths.push(PathBuf::from(&arg)),
        }
    }
    if parsed.stdin && !parsed.paths.is_empty() {
        return Err(RtError::usage("--stdin does not take file arguments"));
    }
    if !parsed.stdin && parsed.paths.is_empty() {
        return Err(RtError::usage("no input files"));
    }
    Ok(parsed)
}

fn run_stdin<R: Read, W: Write>(
    args: &Args,
    opts: &FormatOptions,
    input: &mut R,
    output: &mut W,
) -> Result<i32, RtError> {
    let mut src = String::new();
    input
        .read_to_string(&mut src)
        .map_err(|err| RtError::io("<stdin>", err))?;
    let formatted = format(&src, opts);
    let changed = formatted != src;
    let text = if args.diff {
        unified_diff("<stdin>", &src, &formatted)
    } else if args.check {
        String::new()
    } else {
        formatted
    };
    output
        .write_all(text.as_bytes())
        .map_err(|err| RtError::io("<stdout>", err))?;
    Ok(if args.check && changed { 1 } else { 0 })
}

fn run_files<W: Write>(args: &Args, opts: &FormatOptions, output: &mut W) -> Result<i32, RtError> {
    let mut failed = false;
    for result in format_files(&args.paths, opts) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("error: {err}");
                failed = true;
                continue;
            }
        };
        if args.diff && outcome.changed() {
            write_diff(&outcome, output)?;
        }
        if args.check {
            if outcome.changed() {
                if !args.diff {
                    eprintln!("would reformat {}", outcome.path.display());
                }
                failed = true;
            }
        } else if outcome.write_back()? {
            log::info!("formatted {}", outcome.path.display());
        }
    }
    Ok(if failed { 1 } else { 0 })
}

fn write_diff<W: Write>(outcome: &FileOutcome, output: &mut W) -> Result<(), RtError> {
    let label = outcome.path.display().to_string();
    let diff = unified_diff(&label, &outcome.original, &outcome.formatted);
    output
        .write_all(diff.as_bytes())
        .map_err(|err| RtError::io("<stdout>", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    fn run_stdin_with(list: &[&str], src: &str) -> (i32, String) {
        let mut input = src.as_bytes();
        let mut output = Vec::new();
        let code = run_with_io(args(list), &mut input, &mut output);
        (code, String::from_utf8(output).expect("utf8 output"))
    }

    #[test]
    fn formats_stdin_to_stdout() {
        let (code, out) = run_stdin_with(&["--stdin"], "a+b");
        assert_eq!(code, 0);
        assert_eq!(out, "a + b\n");
    }

    #[test]
    fn check_reports_unformatted_stdin() {
        assert_eq!(run_stdin_with(&["--stdin", "--check"], "a+b").0, 1);
        assert_eq!(run_stdin_with(&["--stdin", "--check"], "a + b\n").0, 0);
    }

    #[test]
    fn indent_and_tabs_flags() {
        let (_, out) = run_stdin_with(&["--stdin", "--indent", "4"], "r = a|>b|>c");
        assert_eq!(out, "r =\n    a\n        |> b\n        |> c\n");
        let (_, out) = run_stdin_with(&["--stdin", "--tabs"], "f =\n  x");
        assert_eq!(out, "f =\n\tx\n");
    }

    #[test]
    fn diff_output_for_stdin() {
        let (code, out) = run_stdin_with(&["--stdin", "--diff"], "a+b\n");
        assert_eq!(code, 0);
        assert!(out.contains("-a+b"));
        assert!(out.contains("+a + b"));
    }

    #[test]
    fn help_prints_usage() {
        let (code, out) = run_stdin_with(&["--help"], "");
        assert_eq!(code, 0);
        assert!(out.starts_with("usage: unifmtc"));
    }

    #[test]
    fn usage_errors_exit_with_two() {
        assert_eq!(run_stdin_with(&[], "").0, 2);
        assert_eq!(run_stdin_with(&["--indent"], "").0, 2);
        assert_eq!(run_stdin_with(&["--indent", "wide", "x.u"], "").0, 2);
        assert_eq!(run_stdin_with(&["--bogus", "x.u"], "").0, 2);
        assert_eq!(run_stdin_with(&["--stdin", "x.u"], "").0, 2);
    }
}
