//! Process-level settings resolved from flags, environment and defaults.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Database file created under the data directory.
const DATABASE_FILE: &str = "executions.db";

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Config {
  pub data_dir: PathBuf,
  pub database_url: String,
  /// Skip writing execution records.
  pub no_record: bool,
}

impl Config {
  /// Fill in anything not given explicitly. The data directory defaults to
  /// `~/.dealflow` and the database to a sqlite file inside it.
  pub fn resolve(data_dir: Option<PathBuf>, database_url: Option<String>, no_record: bool) -> Result<Self> {
    let data_dir = match data_dir {
      Some(dir) => dir,
      None => dirs::home_dir()
        .context("could not determine home directory")?
        .join(".dealflow"),
    };
    let database_url = database_url
      .unwrap_or_else(|| format!("sqlite://{}", data_dir.join(DATABASE_FILE).display()));

    Ok(Self {
      data_dir,
      database_url,
      no_record,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_database_defaults_into_data_dir() {
    let config = Config::resolve(Some(PathBuf::from("/tmp/df")), None, false).unwrap();
    assert_eq!(config.database_url, "sqlite:///tmp/df/executions.db");
  }

  #[test]
  fn test_explicit_database_url_wins() {
    let config = Config::resolve(
      Some(PathBuf::from("/tmp/df")),
      Some("sqlite::memory:".to_string()),
      true,
    )
    .unwrap();
    assert_eq!(config.database_url, "sqlite::memory:");
    assert!(config.no_record);
  }
}
