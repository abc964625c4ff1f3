pub const MIN_INDENT_UNIT: usize = 1;
pub const MAX_INDENT_UNIT: usize = 8;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormatOptions {
    /// Columns per indentation level.
    pub indent_unit: usize,
    /// Emit indentation as spaces; otherwise one tab per level.
    pub use_spaces: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_unit: 2,
            use_spaces: true,
        }
    }
}

impl FormatOptions {
    pub fn new(indent_unit: usize, use_spaces: bool) -> Self {
        Self {
            indent_unit: indent_unit.clamp(MIN_INDENT_UNIT, MAX_INDENT_UNIT),
            use_spaces,
        }
    }

    fn unit(&self) -> usize {
        self.indent_unit.max(MIN_INDENT_UNIT)
    }

    /// Splits a line into its indentation width in columns and the rest of the
    /// line. A tab counts as one full indent unit.
    pub fn measure<'a>(&self, line: &'a str) -> (usize, &'a str) {
        let mut cols = 0;
        for (idx, ch) in line.char_indices() {
            match ch {
                ' ' => cols += 1,
                '\t' => cols += self.unit(),
                _ => return (cols, &line[idx..]),
            }
        }
        (cols, "")
    }

    /// Nearest indentation level for a column count.
    pub fn level_of(&self, cols: usize) -> usize {
        let unit = self.unit();
        (cols + unit / 2) / unit
    }

    pub fn cols_of(&self, level: usize) -> usize {
        level * self.unit()
    }

    pub fn render(&self, cols: usize) -> String {
        if self.use_spaces {
            return " ".repeat(cols);
        }
        let unit = self.unit();
        let mut out = "\t".repeat(cols / unit);
        out.push_str(&" ".repeat(cols % unit));
        out
    }

    /// Re-emits `rest` at `cols` columns.
    pub fn place(&self, cols: usize, rest: &str) -> String {
        let mut out = self.render(cols);
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::FormatOptions;

    #[test]
    fn new_clamps_indent_unit() {
        assert_eq!(FormatOptions::new(0, true).indent_unit, 1);
        assert_eq!(FormatOptions::new(40, true).indent_unit, 8);
        assert_eq!(FormatOptions::new(4, false).indent_unit, 4);
    }

    #[test]
    fn measure_counts_tabs_as_units() {
        let opts = FormatOptions::new(4, true);
        assert_eq!(opts.measure("\t  x = 1"), (6, "x = 1"));
        assert_eq!(opts.measure("   "), (3, ""));
    }

    #[test]
    fn level_rounds_to_nearest_unit() {
        let opts = FormatOptions::default();
        assert_eq!(opts.level_of(0), 0);
        assert_eq!(opts.level_of(1), 1);
        assert_eq!(opts.level_of(3), 2);
        assert_eq!(FormatOptions::new(4, true).level_of(1), 0);
        assert_eq!(FormatOptions::new(4, true).level_of(6), 2);
    }

    #[test]
    fn render_uses_tabs_when_requested() {
        let opts = FormatOptions::new(2, false);
        assert_eq!(opts.render(4), "\t\t");
        assert_eq!(opts.render(5), "\t\t ");
        assert_eq!(FormatOptions::default().render(3), "   ");
    }
}
