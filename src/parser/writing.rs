//! The writing archive is one long table of numbered posts rather than a list
//! of entries, so it bypasses the entry scanner.

use serde::Serialize;
use tracing::warn;

use super::text::{join_handle_names, remove_formatting, TABLE_LINK_RE};
use super::{Document, RecordEmitter, ScanSummary};

const OPEN_DISCUSSION: &str = "Open Discussion";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WritingPost {
    pub post_id: String,
    pub title: String,
    pub post_date: String,
    pub author: String,
}

/// Cells of every numbered row (`| 12 | date | [title](/id) | author |`),
/// number dropped, sorted by the remaining cells.
pub fn numbered_rows(doc: &Document) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = doc
        .lines()
        .iter()
        .filter(|line| line.contains('|'))
        .filter_map(|line| {
            let inner = line.trim();
            let inner = inner.strip_prefix('|').unwrap_or(inner);
            let inner = inner.strip_suffix('|').unwrap_or(inner);
            let mut cells = inner.split('|').map(|c| c.trim().to_string());
            let number = cells.next()?;
            if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
                return None;
            }
            Some(cells.collect())
        })
        .collect();
    rows.sort();
    rows
}

/// Build a post from `[date, link, author?]` cells. Rows without an author cell
/// get `fallback_author`.
pub fn parse_post(cells: &[String], fallback_author: &str) -> Option<WritingPost> {
    let (post_date, link) = match cells {
        [date, link, ..] => (date, link),
        _ => return None,
    };
    let caps = TABLE_LINK_RE.captures(link)?;
    let author = match cells.get(2..).and_then(<[String]>::last) {
        Some(cell) if cell == OPEN_DISCUSSION => cell.clone(),
        Some(cell) => {
            let names = join_handle_names(cell);
            if names.is_empty() {
                cell.clone()
            } else {
                names
            }
        }
        None => fallback_author.to_string(),
    };
    Some(WritingPost {
        post_id: caps[2].to_string(),
        title: remove_formatting(&caps[1]),
        post_date: post_date.clone(),
        author,
    })
}

pub fn scan(
    doc: &Document,
    fallback_author: &str,
    emitter: &mut dyn RecordEmitter,
) -> ScanSummary {
    let mut summary = ScanSummary::default();
    for cells in numbered_rows(doc) {
        summary.entries += 1;
        let Some(post) = parse_post(&cells, fallback_author) else {
            warn!(row = %cells.join(" | "), "writing row without a post link");
            summary.skipped += 1;
            continue;
        };
        match emitter.emit_post(&post) {
            Ok(()) => summary.posts += 1,
            Err(e) => {
                warn!(post_id = %post.post_id, "failed to store post: {e:#}");
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CollectEmitter;

    const FALLBACK: &str = "ABoredCompSciStudent, walking_the_way";

    fn cells(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn only_numbered_rows_sorted() {
        let doc = Document::from_text(
            "\
# Writing Club
|#|Date|Post|Author|
|-|-|-|-|
|2|2021-03-01|[Second](/bbb)|/u/two|
|1|2021-01-01|[First](/aaa)|/u/one|
|x|not a post|",
            None,
        );
        let rows = numbered_rows(&doc);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "2021-01-01");
        assert_eq!(rows[1][1], "[Second](/bbb)");
    }

    #[test]
    fn author_forms() {
        let post = parse_post(&cells(&["d", "[T](/p1)", "/u/a_b and u/c"]), FALLBACK).unwrap();
        assert_eq!(post.author, "a_b, c");
        assert_eq!(post.post_id, "p1");
        assert_eq!(post.title, "T");

        let post = parse_post(&cells(&["d", "[T](/p2)", "Open Discussion"]), FALLBACK).unwrap();
        assert_eq!(post.author, "Open Discussion");

        let post = parse_post(&cells(&["d", "[Chihayafuru analysis](/p3)"]), FALLBACK).unwrap();
        assert_eq!(post.author, FALLBACK);
    }

    #[test]
    fn rows_without_links_are_skipped() {
        assert_eq!(parse_post(&cells(&["d", "no link", "/u/a"]), FALLBACK), None);
        assert_eq!(parse_post(&cells(&["d"]), FALLBACK), None);
    }

    #[test]
    fn scan_emits_posts() {
        let doc = Document::from_text(
            "1|2020-05-01|[**Essay**](/e1)|/u/writer\n2|2020-05-08|TBD|/u/writer",
            None,
        );
        let mut emitter = CollectEmitter::default();
        let summary = scan(&doc, FALLBACK, &mut emitter);
        assert_eq!(summary.posts, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(emitter.posts[0].title, "Essay");
        assert_eq!(emitter.posts[0].author, "writer");
    }
}
