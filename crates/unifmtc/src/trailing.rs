use crate::lexical::{ScanState, scan_lines};

/// Strips trailing whitespace and ends the text with exactly one newline.
/// Lines that end inside a multi-line string keep their trailing whitespace.
pub fn normalize_trailing(text: &str) -> String {
    let mut lines: Vec<&str> = text
        .split('\n')
        .zip(scan_lines(text))
        .map(|(raw, line)| {
            if line.ends_in == ScanState::InMultiLineString {
                raw
            } else {
                raw.trim_end_matches([' ', '\t'])
            }
        })
        .collect();
    while matches!(lines.last(), Some(line) if line.is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
