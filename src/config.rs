use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::parser::Rules;

const DEFAULT_DB_PATH: &str = "data/wiki.sqlite";
const DEFAULT_FALLBACK_AUTHOR: &str = "ABoredCompSciStudent, walking_the_way";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: PathBuf,
    /// JSON rules file; the bundled table is used when unset.
    pub overrides_path: Option<PathBuf>,
    /// Author for writing posts whose row has no author cell.
    pub writing_fallback_author: String,
}

impl Settings {
    /// Defaults, then `wiki_archiver.toml` if present, then `WIKI_*` variables.
    pub fn load() -> Result<Self> {
        defaults()?
            .add_source(File::with_name("wiki_archiver").required(false))
            .add_source(Environment::with_prefix("WIKI"))
            .build()?
            .try_deserialize()
            .context("invalid settings")
    }

    pub fn rules(&self) -> Result<Rules> {
        match &self.overrides_path {
            Some(path) => load_rules(path),
            None => Ok(Rules::bundled()?),
        }
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("db_path", DEFAULT_DB_PATH)?
        .set_default("writing_fallback_author", DEFAULT_FALLBACK_AUTHOR)?)
}

pub fn load_rules(path: &Path) -> Result<Rules> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read rules from {:?}", path))?;
    Rules::from_json(&json).with_context(|| format!("Invalid rules in {:?}", path))
}
