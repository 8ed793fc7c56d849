use super::rules::OverrideTable;
use super::tables::Decoder;
use super::text::{ANY_LINK_RE, TABLE_LINK_RE};
use crate::error::{ParseError, Result};

/// Picks the decoder for a table owned by entry `name` in `year`.
pub trait TableResolver: Send + Sync {
    fn resolve(&self, table: &[String], name: &str, year: Option<i32>) -> Result<Decoder>;
}

impl<F> TableResolver for F
where
    F: Fn(&[String], &str, Option<i32>) -> Result<Decoder> + Send + Sync,
{
    fn resolve(&self, table: &[String], name: &str, year: Option<i32>) -> Result<Decoder> {
        self(table, name, year)
    }
}

/// Two tiers: exact override rows first, then the shape of the first row.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    overrides: OverrideTable,
}

impl Classifier {
    pub fn new(overrides: OverrideTable) -> Self {
        Classifier { overrides }
    }

    /// Shape heuristics only.
    pub fn shape_only() -> Self {
        Self::default()
    }
}

impl TableResolver for Classifier {
    fn resolve(&self, table: &[String], name: &str, year: Option<i32>) -> Result<Decoder> {
        if let Some(decoder) = self.overrides.get(name, year) {
            return Ok(decoder);
        }
        let first = table.first().ok_or(ParseError::EmptyTable)?;
        classify_shape(first).ok_or_else(|| ParseError::UnrecognizedTableFormat {
            name: name.to_string(),
            year,
            first_row: first.clone(),
        })
    }
}

/// Links in the first row mean a headerless table; no links at all mean
/// alternating header/content rows. Anything else is ambiguous.
pub fn classify_shape(first_row: &str) -> Option<Decoder> {
    if TABLE_LINK_RE.is_match(first_row) {
        Some(Decoder::Headerless)
    } else if !ANY_LINK_RE.is_match(first_row) {
        Some(Decoder::AlternatingHeaders)
    } else {
        None
    }
}
