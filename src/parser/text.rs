//! Cleaning helpers and the link/handle patterns shared by the decoders and scanners.

use std::sync::LazyLock;

use regex::Regex;

/// `[title](/id)` or `[title](…comments/id)` inside a single table cell.
/// The id may carry one level of balanced parentheses, e.g. `slug_(2015)`.
pub static TABLE_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]|]*)\]\((?:[^()|\s]*?comments/|/)((?:[^()|\s]|\([^()|\s]*\))+)\)")
        .unwrap()
});

/// Any markdown link at all, used to tell a header row from a mixed row.
pub static ANY_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]|]+\]\([^)|]+\)").unwrap());

/// Full reddit permalink: `[title](https://…/comments/<post_id>/slug/)`.
pub static PERMALINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[([^\]]*)\]\([^)\s]*/comments/(\w+)(?:/[^)\s]*)?\)").unwrap()
});

/// User handle, `u/name` or `/u/name`. Group 1 is the bare name.
pub static HANDLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/?u/([\w-]+)").unwrap());

/// Entry name carrying its own year: `Name (2014)`.
pub static SELF_DATED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) \((\d{4})\)$").unwrap());

/// Strip bold/italic asterisks (in pairs) and leading heading hashes.
pub fn remove_formatting(text: &str) -> String {
    let mut ans = text.trim().to_string();
    while ans.matches('*').count() > 1 {
        ans = ans.replacen('*', "", 2);
    }
    ans.trim_start_matches('#').trim().to_string()
}

/// Split a pipe row into trimmed cells. Only truly empty segments (row edges,
/// `||`) are dropped; a whitespace cell stays as `""` to hold its column.
pub fn split_cells(row: &str) -> Vec<&str> {
    row.split('|').filter(|c| !c.is_empty()).map(str::trim).collect()
}

/// Target id of the first table link in `cell`, if any.
pub fn link_target(cell: &str) -> Option<String> {
    TABLE_LINK_RE.captures(cell).map(|caps| caps[2].to_string())
}

/// All `(title, target)` pairs in a row, titles cleaned.
pub fn link_pairs(row: &str) -> Vec<(String, String)> {
    TABLE_LINK_RE
        .captures_iter(row)
        .map(|caps| (remove_formatting(&caps[1]), caps[2].to_string()))
        .collect()
}

/// Handles as written (`/u/name`), joined the way the archive lists hosts.
pub fn join_handles(line: &str) -> Option<String> {
    let handles: Vec<&str> = HANDLE_RE.find_iter(line).map(|m| m.as_str()).collect();
    (!handles.is_empty()).then(|| handles.join(", "))
}

/// Bare handle names without the `u/` prefix.
pub fn join_handle_names(line: &str) -> String {
    HANDLE_RE
        .captures_iter(line)
        .map(|caps| caps[1].to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Split `Name (YYYY)` into its parts.
pub fn split_self_dated(name: &str) -> Option<(String, i32)> {
    let caps = SELF_DATED_RE.captures(name)?;
    let year = caps[2].parse().ok()?;
    Some((caps[1].trim().to_string(), year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatting_removed() {
        assert_eq!(remove_formatting("**Season 2**"), "Season 2");
        assert_eq!(remove_formatting("### Movies"), "Movies");
        assert_eq!(remove_formatting("*Alt name*"), "Alt name");
        assert_eq!(remove_formatting("  #Clannad  "), "Clannad");
        // A lone asterisk is content, not markup.
        assert_eq!(remove_formatting("Re:Zero*"), "Re:Zero*");
    }

    #[test]
    fn cells_are_trimmed_and_filtered() {
        assert_eq!(split_cells("| A | B |"), vec!["A", "B"]);
        assert_eq!(split_cells("A||B"), vec!["A", "B"]);
        assert_eq!(split_cells("|[x](/1)| |[z](/3)|"), vec!["[x](/1)", "", "[z](/3)"]);
        assert_eq!(split_cells("| |"), vec![""]);
        assert!(split_cells("||").is_empty());
    }

    #[test]
    fn table_link_forms() {
        assert_eq!(link_target("[Ep 1](/abc)").as_deref(), Some("abc"));
        assert_eq!(link_target("[Ep 1](/comments/xyz/)").as_deref(), Some("xyz/"));
        assert_eq!(
            link_target("[Ep 1](https://redd.it/r/anime/comments/q1w2e3)").as_deref(),
            Some("q1w2e3")
        );
        assert_eq!(
            link_target("[Ep 1](/comments/abc/slug_(2015)/)").as_deref(),
            Some("abc/slug_(2015)/")
        );
        assert_eq!(link_target("[site](https://example.com)"), None);
        assert_eq!(link_target("no link here"), None);
    }

    #[test]
    fn pairs_in_row() {
        let pairs = link_pairs("[**Ep1**](/abc) | [Ep2](/def)");
        assert_eq!(
            pairs,
            vec![
                ("Ep1".to_string(), "abc".to_string()),
                ("Ep2".to_string(), "def".to_string())
            ]
        );
    }

    #[test]
    fn handles() {
        assert_eq!(
            join_handles("Hosts: /u/first_host and u/Second-Host").as_deref(),
            Some("/u/first_host, u/Second-Host")
        );
        assert_eq!(join_handles("Hosted by nobody"), None);
        assert_eq!(join_handle_names("/u/a_b & u/c"), "a_b, c");
    }

    #[test]
    fn self_dated_names() {
        assert_eq!(
            split_self_dated("Toradora (2014)"),
            Some(("Toradora".to_string(), 2014))
        );
        assert_eq!(split_self_dated("Toradora"), None);
        assert_eq!(split_self_dated("Toradora (14)"), None);
    }

    #[test]
    fn permalinks() {
        let line = "[Episode 1](http://www.reddit.com/r/anime/comments/1abcd/spoilers_ep_1/) [Episode 2](http://redd.it/r/anime/comments/2efgh/)";
        let found: Vec<_> = PERMALINK_RE
            .captures_iter(line)
            .map(|c| (c[1].to_string(), c[2].to_string()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("Episode 1".to_string(), "1abcd".to_string()),
                ("Episode 2".to_string(), "2efgh".to_string())
            ]
        );
    }
}
