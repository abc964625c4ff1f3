//! Breaks long pipe chains into one stage per line and realigns chains that
//! are already broken.

use crate::classify::{self, Role};
use crate::lexical::{ScannedLine, SegmentKind, scan_lines};
use crate::options::FormatOptions;

/// One stage of a chain: the expression text and the pipe that introduced it
/// (`None` for the value the chain starts from).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PipeSegment<'a> {
    pub op: Option<&'static str>,
    pub text: &'a str,
}

impl PipeSegment<'_> {
    fn render(&self) -> String {
        match (self.op, self.text.is_empty()) {
            (Some(op), true) => op.to_string(),
            (Some(op), false) => format!("{op} {}", self.text),
            (None, _) => self.text.to_string(),
        }
    }
}

pub fn break_pipes(text: &str, opts: &FormatOptions) -> String {
    let unit = opts.cols_of(1);
    let mut out: Vec<String> = Vec::new();
    // column of the stage lines of the current chain
    let mut chain_base: Option<usize> = None;
    // indent of the previous code line
    let mut prev_cols: Option<usize> = None;

    for (raw, line) in text.split('\n').zip(scan_lines(text)) {
        if !line.is_code_start() || line.is_blank() || line.is_comment_only() {
            out.push(raw.to_string());
            continue;
        }
        let (cols, rest) = opts.measure(raw);
        let pipes = line.pipe_count();

        if line.starts_with_pipe() {
            let base = chain_base.unwrap_or_else(|| prev_cols.map_or(cols, |prev| prev + unit));
            if pipes > 1 {
                let (stages, comment) = split_chain(raw, &line, cols_to_bytes(raw));
                emit_stages(&mut out, opts, base, &stages, comment);
            } else {
                out.push(opts.place(base, rest));
            }
            chain_base = Some(base);
            prev_cols = Some(base);
            continue;
        }

        if pipes < 2 {
            // deeper lines continue the current stage
            if chain_base.is_some_and(|base| cols <= base) {
                chain_base = None;
            }
            prev_cols = Some(cols);
            out.push(raw.to_string());
            continue;
        }

        let indent_len = cols_to_bytes(raw);
        let head_eq = definition_split(raw, &line).filter(|eq| *eq >= indent_len);
        let body_start = head_eq.map_or(indent_len, |eq| eq + 1);
        let (stages, comment) = split_chain(raw, &line, body_start);
        let stage_cols = match head_eq {
            Some(eq) => {
                out.push(opts.place(cols, &format!("{} =", raw[indent_len..eq].trim())));
                cols + unit
            }
            None => cols,
        };
        log::debug!("breaking pipe chain of {} stages", stages.len());
        let (first, tail) = match stages.split_first() {
            Some((first, tail)) if first.op.is_none() => (Some(first), tail),
            _ => (None, stages.as_slice()),
        };
        if let Some(first) = first {
            out.push(opts.place(stage_cols, first.text));
        }
        let base = stage_cols + unit;
        emit_stages(&mut out, opts, base, tail, comment);
        chain_base = Some(base);
        prev_cols = Some(base);
    }
    out.join("\n")
}

fn emit_stages(
    out: &mut Vec<String>,
    opts: &FormatOptions,
    cols: usize,
    stages: &[PipeSegment<'_>],
    comment: Option<&str>,
) {
    let last = stages.len().saturating_sub(1);
    for (idx, stage) in stages.iter().enumerate() {
        let mut text = stage.render();
        if idx == last {
            if let Some(comment) = comment {
                text.push(' ');
                text.push_str(comment);
            }
        }
        out.push(opts.place(cols, &text));
    }
}

fn cols_to_bytes(raw: &str) -> usize {
    raw.len() - raw.trim_start_matches([' ', '\t']).len()
}

/// Offset of the definition `=` when the line is a definition whose body
/// holds the chain.
fn definition_split(raw: &str, line: &ScannedLine<'_>) -> Option<usize> {
    if !matches!(classify::classify(&line.code_text()), Role::Definition { .. }) {
        return None;
    }
    let first = line.segments.first()?;
    if first.kind != SegmentKind::Code {
        return None;
    }
    let eq = classify::definition_equals(first.text)?;
    let first_pipe = line.pipe_offsets().first().map_or(raw.len(), |(at, _)| *at);
    (eq < first_pipe).then_some(eq)
}

/// Splits `raw[start..]` at every depth-zero pipe. A trailing comment is
/// returned separately so it can stay on the last stage.
pub fn split_chain<'a>(
    raw: &'a str,
    line: &ScannedLine<'a>,
    start: usize,
) -> (Vec<PipeSegment<'a>>, Option<&'a str>) {
    let comment = line.trailing_comment();
    let end = comment.map_or(raw.len(), |text| raw.len() - text.len());
    let mut stages = Vec::new();
    let mut cursor = start;
    let mut op = None;
    for (at, pipe) in line.pipe_offsets() {
        if at < start {
            continue;
        }
        let text = raw[cursor..at].trim();
        if op.is_some() || !text.is_empty() {
            stages.push(PipeSegment { op, text });
        }
        op = Some(pipe);
        cursor = at + pipe.len();
    }
    stages.push(PipeSegment {
        op,
        text: raw[cursor..end].trim(),
    });
    (stages, comment)
}
