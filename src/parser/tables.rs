//! Decoders for the table shapes found in the archive. Each one is a pure
//! function from table rows to an ordered title → target mapping.

use serde::Serialize;

use super::text::{link_pairs, link_target, remove_formatting, split_cells};

/// One decoded `(title, target)` pair. `target_id` is `None` when the cell had no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedRow {
    pub title: String,
    pub target_id: Option<String>,
}

/// Insertion-ordered mapping with last-wins updates and no empty titles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DecodedRows(Vec<DecodedRow>);

impl DecodedRows {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by title. Empty titles are ignored.
    pub fn insert(&mut self, title: String, target_id: Option<String>) {
        if title.is_empty() {
            return;
        }
        match self.0.iter_mut().find(|r| r.title == title) {
            Some(row) => row.target_id = target_id,
            None => self.0.push(DecodedRow { title, target_id }),
        }
    }

    /// Insert or overwrite by target id, for sources keyed by post.
    pub fn insert_by_target(&mut self, title: String, target_id: String) {
        if title.is_empty() {
            return;
        }
        match self
            .0
            .iter_mut()
            .find(|r| r.target_id.as_deref() == Some(target_id.as_str()))
        {
            Some(row) => row.title = title,
            None => self.0.push(DecodedRow {
                title,
                target_id: Some(target_id),
            }),
        }
    }

    pub fn get(&self, title: &str) -> Option<Option<&str>> {
        self.0
            .iter()
            .find(|r| r.title == title)
            .map(|r| r.target_id.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecodedRow> {
        self.0.iter()
    }

    /// Rows that actually carry a target id.
    pub fn linked(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter_map(|r| r.target_id.as_deref().map(|id| (r.title.as_str(), id)))
    }
}

/// Table shapes. The ids are what the override table refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoder {
    /// Every row holds `[title](link)` pairs, no header row.
    Headerless,
    /// Header rows and content rows alternate.
    AlternatingHeaders,
    /// One header, then rows of `title | link | title | link …`.
    OneHeaderAlternatingContents,
    /// One header, link in the rightmost column, title from the rest.
    OneHeaderLinkRight,
    /// One header, link in the leftmost column.
    OneHeaderLinkLeft,
}

impl Decoder {
    pub const ALL: [Decoder; 5] = [
        Decoder::Headerless,
        Decoder::AlternatingHeaders,
        Decoder::OneHeaderAlternatingContents,
        Decoder::OneHeaderLinkRight,
        Decoder::OneHeaderLinkLeft,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Decoder::Headerless => "headerless",
            Decoder::AlternatingHeaders => "alternating_headers",
            Decoder::OneHeaderAlternatingContents => "one_header_alternating_contents",
            Decoder::OneHeaderLinkRight => "one_header_link_right",
            Decoder::OneHeaderLinkLeft => "one_header_link_left",
        }
    }

    pub fn decode(self, table: &[String]) -> DecodedRows {
        match self {
            Decoder::Headerless => headerless(table.iter().map(String::as_str)),
            Decoder::AlternatingHeaders => alternating_headers(table),
            Decoder::OneHeaderAlternatingContents => one_header_alternating_contents(table),
            Decoder::OneHeaderLinkRight => one_header_link_right(table),
            Decoder::OneHeaderLinkLeft => one_header_link_left(table),
        }
    }
}

impl std::fmt::Display for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

fn headerless<'a>(rows: impl Iterator<Item = &'a str>) -> DecodedRows {
    let mut data = DecodedRows::new();
    for row in rows {
        for (title, target) in link_pairs(row) {
            data.insert(title, Some(target));
        }
    }
    data
}

fn alternating_headers(table: &[String]) -> DecodedRows {
    let mut data = DecodedRows::new();
    for pair in table.chunks_exact(2) {
        let titles = split_cells(&pair[0]);
        let links = split_cells(&pair[1]).into_iter().map(link_target);
        for (title, link) in titles.into_iter().zip(links) {
            data.insert(remove_formatting(title), link);
        }
    }
    data
}

fn one_header_alternating_contents(table: &[String]) -> DecodedRows {
    let mut data = DecodedRows::new();
    for row in table.iter().skip(1) {
        let cells = split_cells(row);
        for pair in cells.chunks_exact(2) {
            data.insert(remove_formatting(pair[0]), link_target(pair[1]));
        }
    }
    data
}

fn one_header_link_right(table: &[String]) -> DecodedRows {
    let mut data = DecodedRows::new();
    for row in table.iter().skip(1) {
        let cells = split_cells(row);
        let Some((link, titles)) = cells.split_last() else {
            continue;
        };
        let title = titles
            .iter()
            .map(|t| remove_formatting(t))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" - ");
        data.insert(title, link_target(link));
    }
    data
}

fn one_header_link_left(table: &[String]) -> DecodedRows {
    let left = table
        .iter()
        .skip(1)
        .filter_map(|row| split_cells(row).first().copied());
    headerless(left)
}
