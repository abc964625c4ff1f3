//! Line-level edits between an original buffer and its formatted form, so a
//! caller can patch a buffer in place and keep the cursor where it was.

use similar::{Algorithm, DiffTag, TextDiff};

/// Replace `original[start..end]` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub new_text: String,
}

/// Minimal set of non-overlapping edits, in ascending order, that turn
/// `original` into `formatted`.
pub fn compute_edits(original: &str, formatted: &str) -> Vec<TextEdit> {
    if original == formatted {
        return Vec::new();
    }
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(original, formatted);
    let old_lines = diff.old_slices();
    let new_lines = diff.new_slices();
    let offsets = line_offsets(original);

    let mut edits: Vec<TextEdit> = Vec::new();
    for op in diff.ops() {
        let (tag, old, new) = op.as_tag_tuple();
        if tag == DiffTag::Equal {
            continue;
        }
        let start = offset_for_line(old.start, &offsets, original.len());
        let end = start + old_lines[old].iter().map(|line| line.len()).sum::<usize>();
        let new_text: String = new_lines[new].concat();
        match edits.last_mut() {
            Some(last) if last.end == start => {
                last.end = end;
                last.new_text.push_str(&new_text);
            }
            _ => edits.push(TextEdit {
                start,
                end,
                new_text,
            }),
        }
    }
    edits
}

/// Applies edits produced by [`compute_edits`] to `original`.
pub fn apply_edits(original: &str, edits: &[TextEdit]) -> String {
    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    for edit in edits {
        out.push_str(&original[cursor..edit.start]);
        out.push_str(&edit.new_text);
        cursor = edit.end;
    }
    out.push_str(&original[cursor..]);
    out
}

/// Where a byte offset in the original text lands after the edits. Offsets
/// inside a replaced region move to the same distance into the replacement,
/// clamped to its length.
pub fn map_offset(edits: &[TextEdit], offset: usize) -> usize {
    let mut shift: isize = 0;
    for edit in edits {
        if offset < edit.start {
            break;
        }
        if offset < edit.end {
            let into = (offset - edit.start).min(edit.new_text.len());
            return shifted(edit.start, shift) + into;
        }
        shift += edit.new_text.len() as isize - (edit.end - edit.start) as isize;
    }
    shifted(offset, shift)
}

/// Unified diff with three lines of context, labelled with `path`.
pub fn unified_diff(path: &str, original: &str, formatted: &str) -> String {
    TextDiff::from_lines(original, formatted)
        .unified_diff()
        .context_radius(3)
        .header(&format!("{path} (original)"), &format!("{path} (formatted)"))
        .to_string()
}

fn shifted(offset: usize, shift: isize) -> usize {
    offset.saturating_add_signed(shift)
}

fn line_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0];
    for (idx, ch) in text.char_indices() {
        if ch == '\n' {
            offsets.push(idx + 1);
        }
    }
    offsets
}

fn offset_for_line(line: usize, offsets: &[usize], text_len: usize) -> usize {
    offsets.get(line).copied().unwrap_or(text_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_no_edits() {
        assert!(compute_edits("x = 1\n", "x = 1\n").is_empty());
    }

    #[test]
    fn edits_cover_only_changed_lines() {
        let original = "a = 1\nb=2\nc = 3\n";
        let formatted = "a = 1\nb = 2\nc = 3\n";
        let edits = compute_edits(original, formatted);
        assert_eq!(
            edits,
            vec![TextEdit {
                start: 6,
                end: 10,
                new_text: "b = 2\n".to_string(),
            }]
        );
        assert_eq!(apply_edits(original, &edits), formatted);
    }

    #[test]
    fn insertions_and_deletions_apply_cleanly() {
        let original = "foo = 1\nbar = 2\n\n\n\nbaz = 3";
        let formatted = "foo = 1\n\nbar = 2\n\nbaz = 3\n";
        let edits = compute_edits(original, formatted);
        assert_eq!(apply_edits(original, &edits), formatted);
    }

    #[test]
    fn offsets_follow_the_edits() {
        let original = "a=1\nkeep\n";
        let formatted = "a = 1\nkeep\n";
        let edits = compute_edits(original, formatted);
        // start of `keep` moves right by two
        assert_eq!(map_offset(&edits, 4), 6);
        assert_eq!(map_offset(&edits, 0), 0);
        // inside the rewritten line
        assert_eq!(map_offset(&edits, 2), 2);
    }

    #[test]
    fn unified_diff_names_the_file() {
        let diff = unified_diff("main.u", "a=1\n", "a = 1\n");
        assert!(diff.contains("--- main.u (original)"));
        assert!(diff.contains("+++ main.u (formatted)"));
        assert!(diff.contains("-a=1"));
        assert!(diff.contains("+a = 1"));
    }
}
