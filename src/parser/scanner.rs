use tracing::{info, warn};

use super::classify::TableResolver;
use super::cursor::LineCursor;
use super::entry::{Entry, EntryMarker, EntryScanner};
use super::text::{remove_formatting, split_self_dated};
use super::{writing, Dialect, Document, RecordEmitter, ScanSummary};
use crate::error::Result;

/// Finds entry starts in a document and hands each entry to an [`EntryScanner`].
pub struct DocumentScanner<'a> {
    doc: &'a Document,
    dialect: &'a Dialect,
    resolver: &'a dyn TableResolver,
}

impl<'a> DocumentScanner<'a> {
    pub fn new(doc: &'a Document, dialect: &'a Dialect, resolver: &'a dyn TableResolver) -> Self {
        DocumentScanner {
            doc,
            dialect,
            resolver,
        }
    }

    pub fn scan(&self, emitter: &mut dyn RecordEmitter) -> Result<ScanSummary> {
        let summary = match self.dialect {
            Dialect::Writing { fallback_author } => writing::scan(self.doc, fallback_author, emitter),
            Dialect::Rewatch { self_dated_year } => {
                self.scan_entries(&EntryMarker::Heading, *self_dated_year, emitter)?
            }
            Dialect::Discussion { prefix: Some(prefix) } => {
                self.scan_entries(&EntryMarker::Prefix(prefix.clone()), None, emitter)?
            }
            Dialect::Discussion { prefix: None } => {
                warn!(year = ?self.doc.year(), "no entry delimiter known for this discussion year");
                ScanSummary::default()
            }
        };
        info!(
            family = %self.dialect.family(),
            year = ?self.doc.year(),
            entries = summary.entries,
            records = summary.records,
            posts = summary.posts,
            skipped = summary.skipped,
            failed = summary.failed,
            "document scanned"
        );
        Ok(summary)
    }

    fn scan_entries(
        &self,
        marker: &EntryMarker,
        self_dated_year: Option<i32>,
        emitter: &mut dyn RecordEmitter,
    ) -> Result<ScanSummary> {
        let mut summary = ScanSummary::default();
        let mut cursor = LineCursor::new(self.doc.lines());
        while !cursor.at_end() {
            let line = cursor.current()?;
            if !marker.matches(line) {
                cursor.advance();
                continue;
            }
            cursor.advance();
            let Some(entry) = self.open_entry(marker.strip(line), self_dated_year) else {
                warn!(line, "entry start without a name");
                summary.skipped += 1;
                continue;
            };
            summary.entries += 1;
            let mut scanner = EntryScanner::new(marker, self.resolver, emitter, &mut summary);
            match self.dialect {
                Dialect::Discussion { .. } => scanner.scan_permalinks(&mut cursor, entry)?,
                _ => scanner.scan_tables(&mut cursor, entry)?,
            }
        }
        Ok(summary)
    }

    /// Clean the entry name. In the self-dated year the name carries its own
    /// `(YYYY)` suffix, which overrides the document year.
    fn open_entry(&self, raw_name: &str, self_dated_year: Option<i32>) -> Option<Entry> {
        let name = remove_formatting(raw_name);
        let mut year = self.doc.year();
        let name = match self_dated_year {
            Some(dated) if year == Some(dated) => match split_self_dated(&name) {
                Some((bare, own_year)) => {
                    year = Some(own_year);
                    bare
                }
                None => {
                    warn!(entry = %name, "expected a (YYYY) suffix on the entry name");
                    name
                }
            },
            _ => name,
        };
        (!name.is_empty()).then(|| Entry::new(name, year))
    }
}
