use serde::Serialize;
use tracing::{debug, warn};

use super::classify::TableResolver;
use super::cursor::{read_table, LineCursor};
use super::tables::DecodedRows;
use super::text::{join_handles, remove_formatting, PERMALINK_RE};
use super::{RecordEmitter, ScanSummary};
use crate::error::{ParseError, Result};

const HOST_COLUMN: &str = "**Host**";

/// One flushed unit handed to the emitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub alt_name: Option<String>,
    pub table_name: Option<String>,
    pub year: Option<i32>,
    pub hosts: Option<String>,
    pub rows: DecodedRows,
}

/// Mutable accumulator for the entry under the cursor.
#[derive(Debug, Clone, Default)]
pub struct Entry {
    pub name: String,
    pub alt_name: Option<String>,
    pub table_name: Option<String>,
    pub hosts: Option<String>,
    pub year: Option<i32>,
    pub table: Vec<String>,
}

impl Entry {
    pub fn new(name: String, year: Option<i32>) -> Self {
        Entry {
            name,
            year,
            ..Default::default()
        }
    }

    /// Drop the per-table state so a later table of the same entry starts clean.
    pub fn reset_table(&mut self) {
        self.table_name = None;
        self.table.clear();
    }

    pub fn record(&self, rows: DecodedRows) -> Record {
        Record {
            name: self.name.clone(),
            alt_name: self.alt_name.clone(),
            table_name: self.table_name.clone(),
            year: self.year,
            hosts: self.hosts.clone(),
            rows,
        }
    }

    /// A table whose second `|`-segment in the first row is `**Host**` lists the
    /// hosts per row; that column replaces whatever a host line said.
    pub fn apply_host_column(&mut self) {
        let is_host_table = self
            .table
            .first()
            .and_then(|row| row.split('|').nth(1))
            .is_some_and(|cell| cell.trim() == HOST_COLUMN);
        if !is_host_table {
            return;
        }
        let hosts: Vec<&str> = self.table[1..]
            .iter()
            .filter_map(|row| row.split('|').nth(1))
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .collect();
        self.hosts = (!hosts.is_empty()).then(|| hosts.join(", "));
    }
}

/// How entry-start lines are recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryMarker {
    /// `## Name`, but not `###`.
    Heading,
    /// A literal line prefix such as `* `.
    Prefix(String),
}

impl EntryMarker {
    pub fn matches(&self, line: &str) -> bool {
        match self {
            EntryMarker::Heading => line
                .strip_prefix("##")
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c != '#'),
            EntryMarker::Prefix(prefix) => line.starts_with(prefix.as_str()),
        }
    }

    /// The entry name part of a matching line, before cleaning.
    pub fn strip<'l>(&self, line: &'l str) -> &'l str {
        match self {
            EntryMarker::Heading => line.strip_prefix("##").unwrap_or(line),
            EntryMarker::Prefix(prefix) => line.strip_prefix(prefix.as_str()).unwrap_or(line),
        }
    }
}

/// Walks the body of one entry, flushing a record per decoded table.
pub struct EntryScanner<'a> {
    marker: &'a EntryMarker,
    resolver: &'a dyn TableResolver,
    emitter: &'a mut dyn RecordEmitter,
    summary: &'a mut ScanSummary,
}

impl<'a> EntryScanner<'a> {
    pub fn new(
        marker: &'a EntryMarker,
        resolver: &'a dyn TableResolver,
        emitter: &'a mut dyn RecordEmitter,
        summary: &'a mut ScanSummary,
    ) -> Self {
        EntryScanner {
            marker,
            resolver,
            emitter,
            summary,
        }
    }

    /// Table-based entries: host lines, sub-headings and any number of tables.
    /// Returns with the cursor on the next entry start, or at the end.
    pub fn scan_tables(&mut self, cursor: &mut LineCursor<'_>, mut entry: Entry) -> Result<()> {
        while !cursor.at_end() {
            let line = cursor.current()?;
            if self.marker.matches(line) {
                break;
            }
            if line.starts_with("Host") {
                entry.hosts = join_handles(line);
                cursor.advance();
            } else if line.contains('|') {
                entry.table = read_table(cursor)?;
            } else if line.starts_with('*') || line.starts_with("###") {
                let text = remove_formatting(line);
                if !text.is_empty() {
                    if entry.hosts.is_some() {
                        entry.table_name = Some(text);
                    } else {
                        entry.alt_name = Some(text);
                    }
                }
                cursor.advance();
            } else {
                cursor.advance();
            }

            if !entry.table.is_empty() {
                entry.apply_host_column();
                match self.flush(&entry) {
                    Ok(()) => entry.reset_table(),
                    Err(e @ (ParseError::UnrecognizedTableFormat { .. } | ParseError::EmptyTable)) => {
                        warn!(
                            entry = %entry.name,
                            year = ?entry.year,
                            first_row = entry.table.first().map(String::as_str).unwrap_or(""),
                            "skipping entry: {e}"
                        );
                        self.summary.skipped += 1;
                        return Ok(());
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    /// Permalink-list entries: every `[title](…/comments/id/…)` until the next
    /// entry start, flushed once.
    pub fn scan_permalinks(&mut self, cursor: &mut LineCursor<'_>, entry: Entry) -> Result<()> {
        let mut rows = DecodedRows::new();
        while !cursor.at_end() {
            let line = cursor.current()?;
            if self.marker.matches(line) {
                break;
            }
            for caps in PERMALINK_RE.captures_iter(line) {
                rows.insert_by_target(caps[1].trim().to_string(), caps[2].to_string());
            }
            cursor.advance();
        }
        if !rows.is_empty() {
            self.emit(entry.record(rows));
        }
        Ok(())
    }

    fn flush(&mut self, entry: &Entry) -> Result<()> {
        let decoder = self.resolver.resolve(&entry.table, &entry.name, entry.year)?;
        let rows = decoder.decode(&entry.table);
        debug!(entry = %entry.name, %decoder, rows = rows.len(), "decoded table");
        self.emit(entry.record(rows));
        Ok(())
    }

    fn emit(&mut self, record: Record) {
        match self.emitter.emit_record(&record) {
            Ok(()) => self.summary.records += 1,
            Err(e) => {
                warn!(entry = %record.name, year = ?record.year, "failed to store record: {e:#}");
                self.summary.failed += 1;
            }
        }
    }
}
