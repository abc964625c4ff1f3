//! Quote- and comment-aware line scanning.
//!
//! Every formatting stage works on physical lines but must never touch the
//! inside of a literal or a comment. `LineScanner` splits each line into code,
//! literal and comment segments while carrying multi-line constructs
//! (`"""` strings, `{- -}` comments and `{{ }}` doc blocks) from one line to the
//! next.

use crate::operators;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ScanState {
    #[default]
    Code,
    InSingleQuote,
    InDoubleQuote,
    InMultiLineString,
    InLineComment,
    InBlockComment {
        depth: u32,
    },
    InDocBlock {
        depth: u32,
    },
}

impl ScanState {
    /// States that survive the end of a physical line.
    pub fn carries(self) -> bool {
        matches!(
            self,
            Self::InMultiLineString | Self::InBlockComment { .. } | Self::InDocBlock { .. }
        )
    }

    fn segment_kind(self) -> SegmentKind {
        match self {
            Self::Code => SegmentKind::Code,
            Self::InSingleQuote | Self::InDoubleQuote | Self::InMultiLineString => {
                SegmentKind::Literal
            }
            Self::InLineComment | Self::InBlockComment { .. } | Self::InDocBlock { .. } => {
                SegmentKind::Comment
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SegmentKind {
    Code,
    Literal,
    Comment,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Segment<'a> {
    pub kind: SegmentKind,
    pub text: &'a str,
}

#[derive(Clone, Debug)]
pub struct ScannedLine<'a> {
    pub starts_in: ScanState,
    pub ends_in: ScanState,
    pub segments: Vec<Segment<'a>>,
}

impl<'a> ScannedLine<'a> {
    pub fn is_code_start(&self) -> bool {
        self.starts_in == ScanState::Code
    }

    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|seg| seg.text.trim().is_empty())
    }

    /// True when everything that is not whitespace sits in comment segments.
    pub fn is_comment_only(&self) -> bool {
        !self.is_blank()
            && self
                .segments
                .iter()
                .all(|seg| seg.kind == SegmentKind::Comment || seg.text.trim().is_empty())
    }

    /// Code with every literal collapsed to `""` and comments dropped. Used by
    /// the line classifier, which must not see literal contents.
    pub fn code_text(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg.kind {
                SegmentKind::Code => out.push_str(seg.text),
                SegmentKind::Literal => out.push_str("\"\""),
                SegmentKind::Comment => {
                    if !out.is_empty() && !out.ends_with(' ') {
                        out.push(' ');
                    }
                }
            }
        }
        out
    }

    /// Trailing comment text, if the line ends in one after some code.
    pub fn trailing_comment(&self) -> Option<&'a str> {
        match self.segments.last() {
            Some(seg) if seg.kind == SegmentKind::Comment && self.segments.len() > 1 => {
                Some(seg.text)
            }
            _ => None,
        }
    }

    /// Pipe operators at bracket depth zero outside literals and comments.
    pub fn pipe_count(&self) -> usize {
        self.pipe_offsets().len()
    }

    /// Byte offsets (within the whole line) of depth-zero pipe operators.
    pub fn pipe_offsets(&self) -> Vec<(usize, &'static str)> {
        let mut found = Vec::new();
        let mut depth = 0usize;
        let mut offset = 0;
        for seg in &self.segments {
            if seg.kind == SegmentKind::Code {
                let mut idx = 0;
                while idx < seg.text.len() {
                    let rest = &seg.text[idx..];
                    if depth == 0 {
                        if let Some(op) = operators::pipe_prefix(rest) {
                            let before = seg.text[..idx].chars().next_back();
                            let after = rest[op.len()..].chars().next();
                            // part of a longer operator run such as `<||>`
                            if !before.is_some_and(operators::is_operator_char)
                                && !after.is_some_and(operators::is_operator_char)
                            {
                                found.push((offset + idx, op));
                                idx += op.len();
                                continue;
                            }
                        }
                    }
                    let Some(ch) = rest.chars().next() else {
                        break;
                    };
                    match ch {
                        '(' | '[' | '{' => depth += 1,
                        ')' | ']' | '}' => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    idx += ch.len_utf8();
                }
            }
            offset += seg.text.len();
        }
        found
    }

    /// Whether the first non-whitespace code starts with a pipe operator.
    pub fn starts_with_pipe(&self) -> bool {
        let Some(first) = self.segments.first() else {
            return false;
        };
        if first.kind != SegmentKind::Code {
            return false;
        }
        let start = first.text.len() - first.text.trim_start().len();
        self.pipe_offsets()
            .first()
            .is_some_and(|(at, _)| *at == start)
    }
}

#[derive(Debug, Default)]
pub struct LineScanner {
    state: ScanState,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn scan<'a>(&mut self, line: &'a str) -> ScannedLine<'a> {
        let starts_in = self.state;
        let bytes = line.as_bytes();
        let mut segments: Vec<Segment<'a>> = Vec::new();
        let mut state = starts_in;
        let mut seg_start = 0usize;
        let mut i = 0usize;

        while i < bytes.len() {
            match state {
                ScanState::Code => {
                    let rest = &bytes[i..];
                    if rest.starts_with(b"\"\"\"") {
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::InMultiLineString;
                        i += 3;
                    } else if bytes[i] == b'"' {
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::InDoubleQuote;
                        i += 1;
                    } else if bytes[i] == b'\'' {
                        if (i > 0 && is_ident_byte(bytes[i - 1]))
                            || quoted_char_end(line, i).is_none()
                        {
                            // prime in a name such as `go'`, or the delay tick
                            i += 1;
                        } else {
                            push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                            seg_start = i;
                            state = ScanState::InSingleQuote;
                            i += 1;
                        }
                    } else if bytes[i] == b'?' && (i == 0 || !is_ident_byte(bytes[i - 1])) {
                        let Some(end) = char_literal_end(line, i) else {
                            i += 1;
                            continue;
                        };
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        push(&mut segments, SegmentKind::Literal, &line[i..end]);
                        seg_start = end;
                        i = end;
                    } else if rest.starts_with(b"--") {
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::InLineComment;
                        i = bytes.len();
                    } else if rest.starts_with(b"{-") {
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::InBlockComment { depth: 1 };
                        i += 2;
                    } else if rest.starts_with(b"{{") {
                        push(&mut segments, SegmentKind::Code, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::InDocBlock { depth: 1 };
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                ScanState::InDoubleQuote | ScanState::InSingleQuote => {
                    let quote = if state == ScanState::InDoubleQuote {
                        b'"'
                    } else {
                        b'\''
                    };
                    if bytes[i] == b'\\' {
                        i += 2;
                    } else if bytes[i] == quote {
                        i += 1;
                        push(&mut segments, SegmentKind::Literal, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::Code;
                    } else {
                        i += 1;
                    }
                }
                ScanState::InMultiLineString => {
                    if bytes[i..].starts_with(b"\"\"\"") {
                        i += 3;
                        push(&mut segments, SegmentKind::Literal, &line[seg_start..i]);
                        seg_start = i;
                        state = ScanState::Code;
                    } else {
                        i += 1;
                    }
                }
                ScanState::InBlockComment { depth } | ScanState::InDocBlock { depth } => {
                    let (open, close) = if matches!(state, ScanState::InBlockComment { .. }) {
                        (b"{-", b"-}")
                    } else {
                        (b"{{", b"}}")
                    };
                    let rest = &bytes[i..];
                    if rest.starts_with(open) {
                        state = with_depth(state, depth + 1);
                        i += 2;
                    } else if rest.starts_with(close) {
                        i += 2;
                        if depth <= 1 {
                            push(&mut segments, SegmentKind::Comment, &line[seg_start..i]);
                            seg_start = i;
                            state = ScanState::Code;
                        } else {
                            state = with_depth(state, depth - 1);
                        }
                    } else {
                        i += 1;
                    }
                }
                ScanState::InLineComment => {
                    i = bytes.len();
                }
            }
        }

        // an escape at the very end can step past the line
        let tail = &line[seg_start.min(line.len())..];
        push(&mut segments, state.segment_kind(), tail);

        self.state = if state.carries() {
            state
        } else {
            ScanState::Code
        };
        ScannedLine {
            starts_in,
            ends_in: state,
            segments,
        }
    }
}

/// Scans every line of `text`, carrying state across line breaks.
pub fn scan_lines(text: &str) -> Vec<ScannedLine<'_>> {
    let mut scanner = LineScanner::new();
    text.split('\n').map(|line| scanner.scan(line)).collect()
}

fn push<'a>(segments: &mut Vec<Segment<'a>>, kind: SegmentKind, text: &'a str) {
    if text.is_empty() {
        return;
    }
    segments.push(Segment { kind, text });
}

fn with_depth(state: ScanState, depth: u32) -> ScanState {
    match state {
        ScanState::InBlockComment { .. } => ScanState::InBlockComment { depth },
        ScanState::InDocBlock { .. } => ScanState::InDocBlock { depth },
        other => other,
    }
}

fn is_ident_byte(byte: u8) -> bool {
    byte == b'_' || byte == b'\'' || byte == b'!' || byte.is_ascii_alphanumeric()
}

/// End offset of a `?c` / `?\c` character literal starting at `start`.
fn char_literal_end(line: &str, start: usize) -> Option<usize> {
    let mut chars = line[start + 1..].char_indices();
    let (_, first) = chars.next()?;
    if first == '\\' {
        let (offset, escaped) = chars.next()?;
        return Some(start + 1 + offset + escaped.len_utf8());
    }
    if first.is_whitespace() {
        return None;
    }
    Some(start + 1 + first.len_utf8())
}

/// End offset of a `'c'` / `'\\c'` quoted character starting at `start`.
fn quoted_char_end(line: &str, start: usize) -> Option<usize> {
    let mut chars = line[start + 1..].char_indices();
    let (_, first) = chars.next()?;
    let (offset, last) = match first {
        '\\' => chars.next()?,
        '\'' => return None,
        other => (0, other),
    };
    let close = start + 1 + offset + last.len_utf8();
    (line.as_bytes().get(close) == Some(&b'\'')).then_some(close + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(line: &ScannedLine<'_>) -> Vec<(SegmentKind, String)> {
        line.segments
            .iter()
            .map(|seg| (seg.kind, seg.text.to_string()))
            .collect()
    }

    #[test]
    fn splits_code_and_string_literals() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("x = \"a+b\" ++ y");
        assert_eq!(
            kinds(&line),
            vec![
                (SegmentKind::Code, "x = ".to_string()),
                (SegmentKind::Literal, "\"a+b\"".to_string()),
                (SegmentKind::Code, " ++ y".to_string()),
            ]
        );
        assert_eq!(line.code_text(), "x = \"\" ++ y");
    }

    #[test]
    fn honors_escaped_quotes() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan(r#"s = "say \"hi\"" ++ t"#);
        assert_eq!(line.segments[1].text, r#""say \"hi\"""#);
        assert_eq!(line.segments[2].text, " ++ t");
    }

    #[test]
    fn unterminated_literal_swallows_rest_of_line() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("x = \"open+ended");
        assert_eq!(line.segments.last().map(|s| s.kind), Some(SegmentKind::Literal));
        assert_eq!(line.ends_in, ScanState::InDoubleQuote);
        assert_eq!(scanner.state(), ScanState::Code);
    }

    #[test]
    fn prime_is_part_of_a_name() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("go' acc = acc+1");
        assert_eq!(line.segments.len(), 1);
        assert_eq!(line.segments[0].kind, SegmentKind::Code);
    }

    #[test]
    fn delay_tick_does_not_open_a_literal() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("main = '(run a) -- don't touch x+y");
        assert_eq!(
            kinds(&line),
            vec![
                (SegmentKind::Code, "main = '(run a) ".to_string()),
                (SegmentKind::Comment, "-- don't touch x+y".to_string()),
            ]
        );
        let line = scanner.scan("t = 'x' ++ '\\'' ++ 'go");
        assert_eq!(line.segments[1].text, "'x'");
        assert_eq!(line.segments[3].text, "'\\''");
        assert_eq!(line.segments[4], Segment {
            kind: SegmentKind::Code,
            text: " ++ 'go",
        });
    }

    #[test]
    fn char_literals_are_literal_segments() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("c = ?\" ++ d");
        assert_eq!(line.segments[1], Segment {
            kind: SegmentKind::Literal,
            text: "?\"",
        });
        assert_eq!(line.segments[2].text, " ++ d");
    }

    #[test]
    fn line_comment_runs_to_end() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("x = 1 -- a+b");
        assert_eq!(line.trailing_comment(), Some("-- a+b"));
        assert!(scanner.scan("-- only").is_comment_only());
    }

    #[test]
    fn multi_line_string_carries_between_lines() {
        let lines = scan_lines("t = \"\"\"\n  a+b\n  \"\"\" ++ x");
        assert_eq!(lines[0].ends_in, ScanState::InMultiLineString);
        assert_eq!(lines[1].starts_in, ScanState::InMultiLineString);
        assert_eq!(lines[1].segments[0].kind, SegmentKind::Literal);
        assert_eq!(lines[2].segments[0].text, "  \"\"\"");
        assert_eq!(lines[2].segments[1].text, " ++ x");
        assert_eq!(lines[2].ends_in, ScanState::Code);
    }

    #[test]
    fn doc_blocks_nest() {
        let lines = scan_lines("{{ outer {{ inner }}\nstill doc }}\nx = 1");
        assert!(lines[0].is_comment_only());
        assert_eq!(lines[1].starts_in, ScanState::InDocBlock { depth: 1 });
        assert!(lines[1].is_comment_only());
        assert!(lines[2].is_code_start());
    }

    #[test]
    fn block_comment_inside_code() {
        let mut scanner = LineScanner::new();
        let line = scanner.scan("f {- a+b -} x");
        assert_eq!(line.code_text(), "f  x");
    }

    #[test]
    fn counts_pipes_outside_literals_and_brackets() {
        let mut scanner = LineScanner::new();
        assert_eq!(scanner.scan("a |> b |> c").pipe_count(), 2);
        assert_eq!(scanner.scan("a <|> b").pipe_count(), 1);
        assert_eq!(scanner.scan("\"|>|>\" |> f").pipe_count(), 1);
        assert_eq!(scanner.scan("f (a |> b |> c)").pipe_count(), 0);
        assert_eq!(scanner.scan("a <||> b |>> c").pipe_count(), 0);
        assert!(scanner.scan("  |> f").starts_with_pipe());
    }
}
