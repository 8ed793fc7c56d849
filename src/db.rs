use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::parser::{Family, Record, RecordEmitter, WritingPost};

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS entries (
            id         INTEGER PRIMARY KEY,
            family     TEXT NOT NULL CHECK(family IN ('rewatch','discussion')),
            name       TEXT NOT NULL CHECK(name != ''),
            alt_name   TEXT,
            table_name TEXT,
            year       INTEGER,
            hosts      TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_entries_name ON entries(name, year);

        CREATE TABLE IF NOT EXISTS episodes (
            id       INTEGER PRIMARY KEY,
            entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
            post_id  TEXT NOT NULL,
            title    TEXT NOT NULL,
            UNIQUE(entry_id, post_id)
        );
        CREATE INDEX IF NOT EXISTS idx_episodes_entry ON episodes(entry_id);
        CREATE INDEX IF NOT EXISTS idx_episodes_post ON episodes(post_id);

        CREATE TABLE IF NOT EXISTS writing_posts (
            post_id   TEXT PRIMARY KEY,
            title     TEXT NOT NULL,
            post_date TEXT,
            author    TEXT
        );
        ",
    )?;
    Ok(())
}

/// Writes each record in its own transaction: the entry row first, then its
/// episodes under the generated entry id. Rows without a target id are dropped.
pub struct SqliteEmitter<'c> {
    conn: &'c Connection,
    family: Family,
}

impl<'c> SqliteEmitter<'c> {
    pub fn new(conn: &'c Connection, family: Family) -> Self {
        SqliteEmitter { conn, family }
    }
}

impl RecordEmitter for SqliteEmitter<'_> {
    fn emit_record(&mut self, record: &Record) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO entries (family, name, alt_name, table_name, year, hosts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.family.to_string(),
                record.name,
                record.alt_name,
                record.table_name,
                record.year,
                record.hosts,
            ],
        )?;
        let entry_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO episodes (entry_id, post_id, title) VALUES (?1, ?2, ?3)",
            )?;
            for (title, post_id) in record.rows.linked() {
                stmt.execute(params![entry_id, post_id, title])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn emit_post(&mut self, post: &WritingPost) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO writing_posts (post_id, title, post_date, author)
             VALUES (?1, ?2, ?3, ?4)",
            params![post.post_id, post.title, post.post_date, post.author],
        )?;
        Ok(())
    }
}

// ── Stats ──

pub struct Stats {
    pub entries: usize,
    pub episodes: usize,
    pub writing_posts: usize,
    pub by_family: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let entries: usize = conn.query_row("SELECT COUNT(*) FROM entries", [], |r| r.get(0))?;
    let episodes: usize = conn.query_row("SELECT COUNT(*) FROM episodes", [], |r| r.get(0))?;
    let writing_posts: usize =
        conn.query_row("SELECT COUNT(*) FROM writing_posts", [], |r| r.get(0))?;
    let mut stmt =
        conn.prepare("SELECT family, COUNT(*) FROM entries GROUP BY family ORDER BY family")?;
    let by_family = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stats {
        entries,
        episodes,
        writing_posts,
        by_family,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DecodedRows;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    fn record(name: &str, rows: &[(&str, Option<&str>)]) -> Record {
        let mut decoded = DecodedRows::new();
        for (title, id) in rows {
            decoded.insert(title.to_string(), id.map(String::from));
        }
        Record {
            name: name.to_string(),
            alt_name: None,
            table_name: Some("Season 1".into()),
            year: Some(2016),
            hosts: Some("/u/host".into()),
            rows: decoded,
        }
    }

    #[test]
    fn entry_then_episodes() {
        let conn = memory_db();
        let mut emitter = SqliteEmitter::new(&conn, Family::Rewatch);
        emitter
            .emit_record(&record("Barakamon", &[("Ep 1", Some("b1")), ("Ep 2", None)]))
            .unwrap();

        let (id, family, table_name): (i64, String, String) = conn
            .query_row("SELECT id, family, table_name FROM entries", [], |r| {
                Ok((r.get(0)?, r.get(1)?, r.get(2)?))
            })
            .unwrap();
        assert_eq!(family, "rewatch");
        assert_eq!(table_name, "Season 1");

        let episodes: Vec<(i64, String, String)> = conn
            .prepare("SELECT entry_id, post_id, title FROM episodes")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        // The unlinked row is not stored.
        assert_eq!(episodes, vec![(id, "b1".to_string(), "Ep 1".to_string())]);
    }

    #[test]
    fn failed_record_rolls_back_only_itself() {
        let conn = memory_db();
        conn.execute_batch(
            "CREATE TRIGGER reject_boom BEFORE INSERT ON episodes
             WHEN NEW.title = 'boom'
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .unwrap();
        let mut emitter = SqliteEmitter::new(&conn, Family::Rewatch);
        emitter.emit_record(&record("Good", &[("Ep 1", Some("g1"))])).unwrap();
        assert!(emitter
            .emit_record(&record("Bad", &[("Ep 1", Some("x1")), ("boom", Some("x2"))]))
            .is_err());

        let stats = get_stats(&conn).unwrap();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.episodes, 1);
    }

    #[test]
    fn writing_posts_upsert() {
        let conn = memory_db();
        let mut emitter = SqliteEmitter::new(&conn, Family::Writing);
        let mut post = WritingPost {
            post_id: "w1".into(),
            title: "Draft".into(),
            post_date: "2019-01-01".into(),
            author: "essayist".into(),
        };
        emitter.emit_post(&post).unwrap();
        post.title = "Final".into();
        emitter.emit_post(&post).unwrap();

        let title: String = conn
            .query_row("SELECT title FROM writing_posts WHERE post_id = 'w1'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(title, "Final");
        assert_eq!(get_stats(&conn).unwrap().writing_posts, 1);
    }

    #[test]
    fn stats_by_family() {
        let conn = memory_db();
        SqliteEmitter::new(&conn, Family::Rewatch)
            .emit_record(&record("A", &[("Ep 1", Some("a1"))]))
            .unwrap();
        SqliteEmitter::new(&conn, Family::Discussion)
            .emit_record(&record("B", &[("Ep 1", Some("b1"))]))
            .unwrap();
        SqliteEmitter::new(&conn, Family::Discussion)
            .emit_record(&record("C", &[("Ep 1", Some("c1"))]))
            .unwrap();
        let stats = get_stats(&conn).unwrap();
        assert_eq!(
            stats.by_family,
            vec![("discussion".to_string(), 2), ("rewatch".to_string(), 1)]
        );
    }
}
