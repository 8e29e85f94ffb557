use thiserror::Error;

use crate::constant::{DEFAULT_WRAP_INDENT, TABLE_WIDTH};

/// What happens when a value is wider than its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// Refuse the row; an over-wide value is a declaration mistake.
    Truncate,
    /// Keep writing into the following columns, then onto fresh lines.
    Span,
    /// Break at word boundaries onto successive lines of the same column.
    Wrap,
}

/// One column of a [`TextTable`].
#[derive(Debug, Clone, Copy)]
pub struct Column {
    /// The number of character cells the column occupies.
    pub width: usize,
    /// Where writing starts within the column.
    pub indent: usize,
    /// The over-wide value policy.
    pub overflow: Overflow,
}

impl Column {
    /// A column of `width` cells, writing from `indent`, with the given
    /// overflow policy.
    pub fn new(width: usize, indent: usize, overflow: Overflow) -> Self {
        Self {
            width,
            indent,
            overflow,
        }
    }
}

/// A row that does not fit the table's columns.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// `add_row` received the wrong number of values.
    #[error("Expected {expected} values per row, but {provided} were specified.")]
    ColumnMismatch {
        /// The number of columns in the table.
        expected: usize,
        /// The number of values supplied.
        provided: usize,
    },

    /// A value exceeds a `Truncate` column's width.
    #[error("Value '{value}' does not fit in column {column} (width {width}).")]
    ValueTooWide {
        /// The over-wide value.
        value: String,
        /// The zero-based column index.
        column: usize,
        /// The column's width.
        width: usize,
    },
}

/// A fixed-column text layout. Rows are added cell by cell; every rendered
/// line is right-padded to the table width so output columns align when
/// piped.
#[derive(Debug)]
pub struct TextTable {
    columns: Vec<Column>,
    wrap_indent: usize,
    lines: Vec<String>,
}

impl TextTable {
    /// A table over the given columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            wrap_indent: DEFAULT_WRAP_INDENT,
            lines: Vec::default(),
        }
    }

    /// The four-column layout of the option-details section:
    /// `"  -c, --create                Creates a new archive"`.
    pub fn option_details() -> Self {
        Self::option_details_sized(TABLE_WIDTH)
    }

    // The same geometry stretched (or shrunk) to a terminal width; only the
    // description column gives or takes.
    pub(crate) fn option_details_sized(total: usize) -> Self {
        let description = total.saturating_sub(30).max(20);
        Self::new(vec![
            Column::new(4, 2, Overflow::Truncate),
            Column::new(1, 0, Overflow::Truncate),
            Column::new(25, 1, Overflow::Span),
            Column::new(description, 0, Overflow::Wrap),
        ])
    }

    /// The two-column layout used with [`RowStyle::Minimal`](crate::RowStyle):
    /// a name column and a wrapped description column.
    pub fn minimal_details() -> Self {
        Self::new(vec![
            Column::new(15, 2, Overflow::Truncate),
            Column::new(65, 1, Overflow::Wrap),
        ])
    }

    /// Indentation of continuation lines, relative to the column's own write
    /// position.
    pub fn wrap_indent(mut self, indent: usize) -> Self {
        self.wrap_indent = indent;
        self
    }

    /// The overall width, the sum of the column widths.
    pub fn width(&self) -> usize {
        self.columns.iter().map(|column| column.width).sum()
    }

    fn band_start(&self, column: usize) -> usize {
        self.columns[..column].iter().map(|c| c.width).sum()
    }

    /// Add one row; `values` must hold exactly one value per column.
    pub fn add_row(&mut self, values: &[&str]) -> Result<(), LayoutError> {
        if values.len() != self.columns.len() {
            return Err(LayoutError::ColumnMismatch {
                expected: self.columns.len(),
                provided: values.len(),
            });
        }

        self.lines.push(String::default());
        let mut cell_line = self.lines.len() - 1;

        for (index, value) in values.iter().enumerate() {
            let column = self.columns[index];
            let start = self.band_start(index) + column.indent;

            match column.overflow {
                Overflow::Truncate => {
                    if column.indent + value.chars().count() > column.width {
                        return Err(LayoutError::ValueTooWide {
                            value: value.to_string(),
                            column: index,
                            width: column.width,
                        });
                    }

                    if !value.is_empty() {
                        cell_line = self.put(cell_line, start, value);
                    }
                }
                Overflow::Span => {
                    let band_end = self.band_start(index) + column.width;
                    let total = self.width();
                    let (first_end, appended) = self.flow(cell_line, start, total, value);

                    // A cell that spanned past its own column pushes the rest
                    // of the row onto a fresh line.
                    if (first_end > band_end || appended > 0) && index + 1 < self.columns.len() {
                        self.lines.push(String::default());
                        cell_line = self.lines.len() - 1;
                    }
                }
                Overflow::Wrap => {
                    let band_end = self.band_start(index) + column.width;
                    self.flow(cell_line, start, band_end, value);
                }
            }
        }

        Ok(())
    }

    // Write `text` at (line, start), padding with spaces as needed. A line
    // already occupied past `start` forces a fresh one.
    fn put(&mut self, line: usize, start: usize, text: &str) -> usize {
        let occupied = self.lines[line].chars().count();

        let line = if occupied > start {
            self.lines.push(String::default());
            self.lines.len() - 1
        } else {
            line
        };

        let occupied = self.lines[line].chars().count();
        self.lines[line].extend(std::iter::repeat(' ').take(start - occupied));
        self.lines[line].push_str(text);
        line
    }

    // Lay `text` out from (line, start) up to `limit`, breaking between
    // chunks; continuation lines are appended and indented by `wrap_indent`.
    // Returns the end position on the first line and the lines appended.
    fn flow(&mut self, first_line: usize, start: usize, limit: usize, text: &str) -> (usize, usize) {
        let continuation = start + self.wrap_indent;
        let mut line = first_line;
        let mut position = start;
        let mut first_end = start;
        let mut appended = 0;
        let mut pending_put = true;

        for chunk in chunks(text) {
            let mut chunk = chunk.as_str();

            loop {
                let length = chunk.chars().count();

                if position + length <= limit {
                    if pending_put {
                        line = self.put(line, position, chunk);
                        pending_put = false;
                    } else {
                        self.lines[line].push_str(chunk);
                    }
                    position += length;
                    break;
                }

                let line_start = if line == first_line { start } else { continuation };

                if position == line_start && length > limit.saturating_sub(position) {
                    // A chunk wider than a whole line gets hard-split.
                    let take = limit.saturating_sub(position).max(1);
                    let split = chunk
                        .char_indices()
                        .nth(take)
                        .map(|(byte, _)| byte)
                        .unwrap_or(chunk.len());
                    let (head, tail) = chunk.split_at(split);

                    if pending_put {
                        line = self.put(line, position, head);
                    } else {
                        self.lines[line].push_str(head);
                    }
                    chunk = tail;
                }

                if line == first_line {
                    first_end = position.min(limit);
                }

                self.lines.push(String::default());
                line = self.lines.len() - 1;
                appended += 1;
                position = continuation;
                pending_put = true;
            }

            if line == first_line {
                first_end = position;
            }
        }

        (first_end, appended)
    }

    /// The laid-out text: every line right-padded to the table width and
    /// newline-terminated.
    pub fn render(&self) -> String {
        let width = self.width();
        let mut out = String::default();

        for line in &self.lines {
            let occupied = line.chars().count();
            out.push_str(line);
            out.extend(std::iter::repeat(' ').take(width.saturating_sub(occupied)));
            out.push('\n');
        }

        out
    }
}

// Line-break opportunities come after a whitespace run and after a hyphen
// run, so `--create7` may break into `--` and `create7`.
fn chunks(text: &str) -> Vec<String> {
    let mut parts = Vec::default();
    let mut current = String::default();
    let characters: Vec<char> = text.chars().collect();

    for (index, &character) in characters.iter().enumerate() {
        current.push(character);

        let run_ends = match characters.get(index + 1) {
            None => false,
            Some(&next) => {
                (character.is_whitespace() && !next.is_whitespace())
                    || (character == '-' && next != '-')
            }
        };

        if run_ends {
            parts.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lines(table: &TextTable) -> Vec<String> {
        table.render().lines().map(|line| line.to_string()).collect()
    }

    #[test]
    fn row_arity() {
        // Setup
        let mut table = TextTable::option_details();

        // Execute
        let result = table.add_row(&["-c", ",", "--create", "description", "INVALID", "Row 3"]);

        // Verify
        assert_eq!(
            result,
            Err(LayoutError::ColumnMismatch {
                expected: 4,
                provided: 6,
            })
        );
    }

    #[test]
    fn truncate_rejects_wide_values() {
        let mut table = TextTable::minimal_details();

        let result = table.add_row(&["a-very-long-option-name", "description"]);

        assert_matches!(result, Err(LayoutError::ValueTooWide { column: 0, width: 15, .. }));
    }

    #[test]
    fn simple_rows() {
        // Setup
        let mut table = TextTable::option_details();

        // Execute
        table
            .add_row(&[
                "-v",
                ",",
                "--verbose",
                "show what you're doing while you are doing it",
            ])
            .unwrap();
        table
            .add_row(&[
                "-p",
                "",
                "",
                "the quick brown fox jumped over the lazy dog. The quick brown fox jumped over the lazy dog.",
            ])
            .unwrap();

        // Verify
        let rendered = lines(&table);
        assert_eq!(
            rendered,
            vec![
                "  -v, --verbose               show what you're doing while you are doing it     ",
                "  -p                          the quick brown fox jumped over the lazy dog. The ",
                "                                quick brown fox jumped over the lazy dog.       ",
            ]
        );

        for line in rendered {
            assert_eq!(line.chars().count(), 80);
        }
    }

    #[rstest]
    #[case("--create, --create2, --create3, --create4, --create5, --create6, --create7, --create8",
           "        create7, --create8")]
    #[case("--create, --create2, --create3, --create4, --create5, --create6, --createAA7, --create8",
           "        createAA7, --create8")]
    fn long_names_span_and_break(#[case] names: &str, #[case] expected_overflow: &str) {
        // Setup
        let mut table = TextTable::option_details();

        // Execute
        table.add_row(&["-c", ",", names, "description"]).unwrap();

        // Verify: the name list spans across the columns and wraps; the
        // description lands on the third line, aligned to its column.
        let rendered = lines(&table);
        assert_eq!(rendered.len(), 3);
        assert_eq!(
            rendered[0],
            "  -c, --create, --create2, --create3, --create4, --create5, --create6, --       "
        );
        assert_eq!(rendered[1].trim_end(), expected_overflow);
        assert_eq!(
            rendered[2],
            "                              description                                       "
        );
    }

    #[test]
    fn minimal_wrap_geometry() {
        // Setup
        let mut table = TextTable::minimal_details().wrap_indent(0);

        // Execute
        table
            .add_row(&[
                "-e",
                "Displays Ethernet statistics. This may be combined with the -s option.",
            ])
            .unwrap();

        // Verify
        assert_eq!(
            lines(&table),
            vec![
                "  -e            Displays Ethernet statistics. This may be combined with the -s  ",
                "                option.                                                         ",
            ]
        );
    }

    #[test]
    fn wrap_indent_applies() {
        let mut table = TextTable::new(vec![
            Column::new(5, 0, Overflow::Truncate),
            Column::new(20, 1, Overflow::Wrap),
        ]);

        table
            .add_row(&["abc", "something pieces fullest more stuff extra"])
            .unwrap();

        assert_eq!(
            lines(&table),
            vec![
                "abc   something pieces   ",
                "        fullest more     ",
                "        stuff extra      ",
            ]
        );
    }

    #[test]
    fn hard_split_of_unbreakable_words() {
        let mut table = TextTable::new(vec![
            Column::new(5, 0, Overflow::Truncate),
            Column::new(12, 1, Overflow::Wrap),
        ]);

        table
            .add_row(&["abc", "somethingxpiecesxfuller"])
            .unwrap();

        assert_eq!(
            lines(&table),
            vec![
                "abc   somethingxp",
                "        iecesxful",
                "        ler      ",
            ]
        );
    }

    #[test]
    fn render_pads_every_line() {
        let mut table = TextTable::minimal_details();
        table.add_row(&["-a", "short"]).unwrap();

        for line in lines(&table) {
            assert_eq!(line.chars().count(), 80);
        }
    }

    #[rstest]
    #[case("", Vec::<&str>::default())]
    #[case("one", vec!["one"])]
    #[case("one two", vec!["one ", "two"])]
    #[case("--create7, --create8", vec!["--", "create7, ", "--", "create8"])]
    #[case("you're fine", vec!["you're ", "fine"])]
    #[case("a  b", vec!["a  ", "b"])]
    fn chunking(#[case] text: &str, #[case] expected: Vec<&str>) {
        assert_eq!(chunks(text), expected);
    }
}
