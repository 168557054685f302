use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::sql::Dialect;

/// Connection settings, usually loaded from a JSON file.
///
/// `path` names the database file of file-based dialects. Unknown keys are
/// rejected so settings for drivers this build lacks fail loudly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub dialect: Dialect,
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl DbConfig {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            path: None,
        }
    }

    /// Settings for a SQLite database file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(Dialect::Sqlite)
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
