use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Knobs for a feed-processing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Log a milestone every this many rows while loading or writing a table. 0 disables.
    pub milestone_rows: u64,
    /// Load independent tables on the rayon pool.
    pub parallel: bool,
    /// Leave tables with no records out of written archives.
    pub skip_empty_tables: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            milestone_rows: 500_000,
            parallel: true,
            skip_empty_tables: true,
        }
    }
}

impl SessionConfig {
    pub fn from_yaml_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn is_milestone(&self, row: u64) -> bool {
        self.milestone_rows > 0 && row % self.milestone_rows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_yaml_keeps_defaults() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "parallel: false")?;
        let cfg = SessionConfig::from_yaml_path(tmp.path())?;
        assert!(!cfg.parallel);
        assert_eq!(cfg.milestone_rows, 500_000);
        assert!(cfg.skip_empty_tables);
        Ok(())
    }

    #[test]
    fn zero_interval_disables_milestones() {
        let cfg = SessionConfig {
            milestone_rows: 0,
            ..SessionConfig::default()
        };
        assert!(!cfg.is_milestone(500_000));
        assert!(SessionConfig::default().is_milestone(1_000_000));
        assert!(!SessionConfig::default().is_milestone(999_999));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(SessionConfig::from_yaml_path("/nonexistent/feedtables.yaml").is_err());
    }
}
