use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use wiki_archiver::config::Settings;
use wiki_archiver::db;
use wiki_archiver::parser::{
    parse_document, year_from_path, Classifier, CollectEmitter, Dialect, Document, Family,
    RecordEmitter, Rules, ScanSummary,
};

#[derive(Parser)]
#[command(name = "wiki_archiver", about = "Subreddit wiki archive parser")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse archive pages (year taken from the file name, e.g. 2016.md)
    Parse {
        /// Page family
        #[arg(value_enum)]
        family: Family,
        /// Markdown files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print records as JSON lines instead of storing them
        #[arg(long)]
        dry_run: bool,
    },
    /// Show stored row counts
    Stats,
    /// Print the active (name, year) → decoder override table
    Overrides,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    let result = match cli.command {
        Commands::Parse {
            family,
            files,
            dry_run,
        } => {
            let rules = settings.rules()?;
            let parsed = parse_files(&settings, &rules, family, &files)?;

            let mut totals = ScanSummary::default();
            for (_, summary) in &parsed {
                totals += *summary;
            }

            if dry_run {
                for (collected, _) in &parsed {
                    for record in &collected.records {
                        println!("{}", serde_json::to_string(record)?);
                    }
                    for post in &collected.posts {
                        println!("{}", serde_json::to_string(post)?);
                    }
                }
            } else {
                let conn = db::connect(&settings.db_path)?;
                db::init_schema(&conn)?;
                let mut emitter = db::SqliteEmitter::new(&conn, family);
                let (bad_records, bad_posts) = store(&mut emitter, &parsed);
                totals.records -= bad_records;
                totals.posts -= bad_posts;
                totals.failed += bad_records + bad_posts;
                println!("Stored in {:?}", settings.db_path);
            }

            println!(
                "{} files: {} entries, {} records, {} posts, {} skipped, {} failed.",
                files.len(),
                totals.entries,
                totals.records,
                totals.posts,
                totals.skipped,
                totals.failed,
            );
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Entries:       {}", s.entries);
            for (family, count) in &s.by_family {
                println!("  {:<12} {}", family, count);
            }
            println!("Episodes:      {}", s.episodes);
            println!("Writing posts: {}", s.writing_posts);
            Ok(())
        }
        Commands::Overrides => {
            let table = settings.rules()?.override_table()?;
            println!("{:>4} | {:<40} | {}", "Year", "Name", "Decoder");
            println!("{}", "-".repeat(80));
            for (name, year, decoder) in table.sorted() {
                println!("{:>4} | {:<40} | {}", year, clip_name(name, 40), decoder);
            }
            println!("\n{} overrides", table.len());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", elapsed_label(elapsed));
    }

    result
}

/// Parse every file in parallel. Each document gets its own dialect, since the
/// discussion delimiter depends on the year.
fn parse_files(
    settings: &Settings,
    rules: &Rules,
    family: Family,
    files: &[PathBuf],
) -> Result<Vec<(CollectEmitter, ScanSummary)>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let classifier = match family {
        Family::Rewatch => Classifier::new(rules.override_table()?),
        Family::Discussion | Family::Writing => Classifier::shape_only(),
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let parsed = files
        .par_iter()
        .map(|path| {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            let doc = Document::from_text(&text, year_from_path(path));
            let dialect = match family {
                Family::Rewatch => Dialect::rewatch(),
                Family::Discussion => Dialect::discussion(rules, doc.year()),
                Family::Writing => Dialect::writing(&settings.writing_fallback_author),
            };
            let mut collected = CollectEmitter::default();
            let summary = parse_document(&doc, &dialect, &classifier, &mut collected)
                .with_context(|| format!("Failed to parse {:?}", path))?;
            pb.inc(1);
            Ok((collected, summary))
        })
        .collect::<Result<Vec<_>>>();

    pb.finish_and_clear();
    parsed
}

/// Replay collected records into `emitter`. Returns how many records and posts
/// were rejected.
fn store(
    emitter: &mut dyn RecordEmitter,
    parsed: &[(CollectEmitter, ScanSummary)],
) -> (usize, usize) {
    let (mut bad_records, mut bad_posts) = (0, 0);
    for (collected, _) in parsed {
        for record in &collected.records {
            if let Err(e) = emitter.emit_record(record) {
                warn!(entry = %record.name, year = ?record.year, "failed to store record: {e:#}");
                bad_records += 1;
            }
        }
        for post in &collected.posts {
            if let Err(e) = emitter.emit_post(post) {
                warn!(post_id = %post.post_id, "failed to store post: {e:#}");
                bad_posts += 1;
            }
        }
    }
    (bad_records, bad_posts)
}

/// Cut an entry name to `width` characters for the override listing.
fn clip_name(name: &str, width: usize) -> String {
    match name.char_indices().nth(width) {
        Some((cut, _)) => format!("{}…", &name[..cut]),
        None => name.to_string(),
    }
}

fn elapsed_label(d: std::time::Duration) -> String {
    match d.as_secs() {
        s if s < 60 => format!("{:.2}s", d.as_secs_f64()),
        s => format!("{}m {:02}s", s / 60, s % 60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn names_clipped_on_char_boundary() {
        assert_eq!(clip_name("Aria", 40), "Aria");
        assert_eq!(clip_name("Kara no Kyōkai", 10), "Kara no Ky…");
    }

    #[test]
    fn elapsed_labels() {
        assert_eq!(elapsed_label(Duration::from_millis(1500)), "1.50s");
        assert_eq!(elapsed_label(Duration::from_secs(3725)), "62m 05s");
    }
}
