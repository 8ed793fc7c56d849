pub mod classify;
pub mod cursor;
pub mod entry;
pub mod rules;
pub mod scanner;
pub mod tables;
pub mod text;
pub mod writing;

use std::fmt;
use std::path::Path;

use serde::Serialize;

pub use classify::{Classifier, TableResolver};
pub use entry::{Entry, Record};
pub use rules::{OverrideTable, Rules};
pub use scanner::DocumentScanner;
pub use tables::{DecodedRow, DecodedRows, Decoder};
pub use writing::WritingPost;

use crate::error::Result;

/// Wiki page families, each with its own layout conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Rewatch,
    Discussion,
    Writing,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Family::Rewatch => "rewatch",
            Family::Discussion => "discussion",
            Family::Writing => "writing",
        })
    }
}

/// The first year whose rewatch entries were written as `Name (YYYY)`.
pub const SELF_DATED_REWATCH_YEAR: i32 = 2014;

/// Per-family scanning conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialect {
    Rewatch { self_dated_year: Option<i32> },
    /// `prefix` is `None` for years without a known delimiter.
    Discussion { prefix: Option<String> },
    Writing { fallback_author: String },
}

impl Dialect {
    pub fn rewatch() -> Self {
        Dialect::Rewatch {
            self_dated_year: Some(SELF_DATED_REWATCH_YEAR),
        }
    }

    pub fn discussion(rules: &Rules, year: Option<i32>) -> Self {
        Dialect::Discussion {
            prefix: rules.discussion_prefix(year).map(String::from),
        }
    }

    pub fn writing(fallback_author: &str) -> Self {
        Dialect::Writing {
            fallback_author: fallback_author.to_string(),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            Dialect::Rewatch { .. } => Family::Rewatch,
            Dialect::Discussion { .. } => Family::Discussion,
            Dialect::Writing { .. } => Family::Writing,
        }
    }
}

/// Non-blank, right-trimmed lines of one wiki page plus the year it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    year: Option<i32>,
}

impl Document {
    pub fn from_text(text: &str, year: Option<i32>) -> Self {
        let lines = text
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        Document { lines, year }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }
}

/// Year from a file stem such as `2022.md`. Anything but four digits is `None`.
pub fn year_from_path(path: &Path) -> Option<i32> {
    let stem = path.file_stem()?.to_str()?;
    if stem.len() == 4 && stem.chars().all(|c| c.is_ascii_digit()) {
        stem.parse().ok()
    } else {
        None
    }
}

/// Receives finished records. Implementations own persistence and its
/// transactions; a failure is reported per record and never stops the scan.
pub trait RecordEmitter {
    fn emit_record(&mut self, record: &Record) -> anyhow::Result<()>;
    fn emit_post(&mut self, post: &WritingPost) -> anyhow::Result<()>;
}

/// Keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectEmitter {
    pub records: Vec<Record>,
    pub posts: Vec<WritingPost>,
}

impl RecordEmitter for CollectEmitter {
    fn emit_record(&mut self, record: &Record) -> anyhow::Result<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn emit_post(&mut self, post: &WritingPost) -> anyhow::Result<()> {
        self.posts.push(post.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub entries: usize,
    pub records: usize,
    pub posts: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl std::ops::AddAssign for ScanSummary {
    fn add_assign(&mut self, other: Self) {
        self.entries += other.entries;
        self.records += other.records;
        self.posts += other.posts;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Scan one document and hand every record to `emitter`.
pub fn parse_document(
    doc: &Document,
    dialect: &Dialect,
    resolver: &dyn TableResolver,
    emitter: &mut dyn RecordEmitter,
) -> Result<ScanSummary> {
    DocumentScanner::new(doc, dialect, resolver).scan(emitter)
}
