//! Archive rules kept as data: the `(name, year) → decoder` override table and
//! the per-year entry delimiters of the discussion archive.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::tables::Decoder;
use crate::error::{ParseError, Result};

const BUNDLED: &str = include_str!("../../data/overrides.json");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRow {
    pub name: String,
    pub year: i32,
    pub decoder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelimiterRow {
    pub from: i32,
    pub to: i32,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default)]
    pub overrides: Vec<OverrideRow>,
    #[serde(default)]
    pub discussion_delimiters: Vec<DelimiterRow>,
}

impl Rules {
    /// The table shipped in `data/overrides.json`.
    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn override_table(&self) -> Result<OverrideTable> {
        let mut table = OverrideTable::default();
        for row in &self.overrides {
            table.insert(&row.name, row.year, row.decoder.parse()?);
        }
        Ok(table)
    }

    /// Entry prefix for a discussion archive year. The first matching row wins.
    pub fn discussion_prefix(&self, year: Option<i32>) -> Option<&str> {
        let year = year?;
        self.discussion_delimiters
            .iter()
            .find(|row| (row.from..=row.to).contains(&year))
            .map(|row| row.prefix.as_str())
    }
}

impl FromStr for Decoder {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        Decoder::ALL
            .into_iter()
            .find(|d| d.id() == s)
            .ok_or_else(|| ParseError::UnknownDecoder(s.to_string()))
    }
}

/// Exact `(entry name, year)` lookups for tables whose shape is ambiguous.
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    rows: HashMap<(String, i32), Decoder>,
}

impl OverrideTable {
    pub fn insert(&mut self, name: &str, year: i32, decoder: Decoder) {
        self.rows.insert((name.to_string(), year), decoder);
    }

    pub fn get(&self, name: &str, year: Option<i32>) -> Option<Decoder> {
        self.rows.get(&(name.to_string(), year?)).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by year, then name.
    pub fn sorted(&self) -> Vec<(&str, i32, Decoder)> {
        let mut rows: Vec<_> = self
            .rows
            .iter()
            .map(|((name, year), d)| (name.as_str(), *year, *d))
            .collect();
        rows.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(b.0)));
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_rules_load() {
        let rules = Rules::bundled().unwrap();
        let table = rules.override_table().unwrap();
        assert_eq!(table.len(), 11);
        assert_eq!(
            table.get("Mod Movie Series", Some(2022)),
            Some(Decoder::OneHeaderLinkLeft)
        );
        assert_eq!(
            table.get("Aria", Some(2015)),
            Some(Decoder::OneHeaderAlternatingContents)
        );
        assert_eq!(
            table.get("Halloween Horror Week", Some(2015)),
            Some(Decoder::OneHeaderLinkRight)
        );
    }

    #[test]
    fn lookups_are_exact() {
        let table = Rules::bundled().unwrap().override_table().unwrap();
        assert_eq!(table.get("Aria", Some(2016)), None);
        assert_eq!(table.get("aria", Some(2015)), None);
        assert_eq!(table.get("Aria", None), None);
    }

    #[test]
    fn unknown_decoder_rejected() {
        let rules = Rules::from_json(
            r#"{ "overrides": [ { "name": "X", "year": 2020, "decoder": "sideways" } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            rules.override_table(),
            Err(ParseError::UnknownDecoder(id)) if id == "sideways"
        ));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            Rules::from_json("{ not json"),
            Err(ParseError::Overrides(_))
        ));
    }

    #[test]
    fn decoder_ids_round_trip() {
        for d in Decoder::ALL {
            assert_eq!(d.id().parse::<Decoder>().unwrap(), d);
        }
    }

    #[test]
    fn discussion_prefix_by_year() {
        let rules = Rules::bundled().unwrap();
        assert_eq!(rules.discussion_prefix(Some(2012)), Some("* "));
        assert_eq!(rules.discussion_prefix(Some(2014)), None);
        assert_eq!(rules.discussion_prefix(None), None);
    }
}
