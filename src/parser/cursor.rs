use crate::error::{ParseError, Result};

/// Forward-only cursor over the non-blank lines of a document.
#[derive(Debug)]
pub struct LineCursor<'a> {
    lines: &'a [String],
    idx: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        LineCursor { lines, idx: 0 }
    }

    pub fn current(&self) -> Result<&'a str> {
        self.lines
            .get(self.idx)
            .map(String::as_str)
            .ok_or(ParseError::OutOfBounds {
                index: self.idx,
                len: self.lines.len(),
            })
    }

    pub fn at_end(&self) -> bool {
        self.idx >= self.lines.len()
    }

    /// Move to the next line. A no-op once the cursor is at the end.
    pub fn advance(&mut self) {
        if !self.at_end() {
            self.idx += 1;
        }
    }

    pub fn position(&self) -> usize {
        self.idx
    }
}

/// Alignment rows like `|:--|---|` carry no data.
pub fn is_separator_row(line: &str) -> bool {
    line.chars().all(|c| matches!(c, '|' | ':' | '-'))
}

/// Consume a contiguous run of pipe rows, dropping separator rows.
/// Leaves the cursor on the first line without a `|` (or at the end).
pub fn read_table(cursor: &mut LineCursor<'_>) -> Result<Vec<String>> {
    let mut table = Vec::new();
    while !cursor.at_end() {
        let line = cursor.current()?;
        if !line.contains('|') {
            break;
        }
        if !is_separator_row(line) {
            table.push(line.to_string());
        }
        cursor.advance();
    }
    Ok(table)
}
