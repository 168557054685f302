use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AssistError;

/// Database dialect tag.
///
/// Only Oracle deviates from the generic shape: numbered `:N` placeholders
/// and `rownum` instead of `LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Oracle,
    MariaDb,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Placeholder for the parameter at zero-based `index`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Oracle => format!(":{index}"),
            Dialect::MariaDb | Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// `SELECT *` over `table` restricted by `filter` and capped at `limit`
    /// rows.
    pub fn limit_query(self, table: &str, limit: usize, filter: Option<&str>) -> String {
        let filter = filter.unwrap_or("1=1");
        match self {
            Dialect::Oracle => {
                format!("SELECT * FROM {table} WHERE {filter} AND rownum <= {limit}")
            }
            Dialect::MariaDb | Dialect::MySql | Dialect::Sqlite => {
                format!("SELECT * FROM {table} WHERE {filter} LIMIT {limit}")
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Oracle => write!(f, "oracle"),
            Dialect::MariaDb => write!(f, "mariadb"),
            Dialect::MySql => write!(f, "mysql"),
            Dialect::Sqlite => write!(f, "sqlite"),
        }
    }
}

impl FromStr for Dialect {
    type Err = AssistError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "oracle" => Ok(Dialect::Oracle),
            "mariadb" => Ok(Dialect::MariaDb),
            "mysql" => Ok(Dialect::MySql),
            "sqlite" => Ok(Dialect::Sqlite),
            _ => Err(AssistError::UnsupportedDatabase(tag.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_numbers_placeholders() {
        assert_eq!(Dialect::Oracle.placeholder(0), ":0");
        assert_eq!(Dialect::Oracle.placeholder(3), ":3");
        assert_eq!(Dialect::MariaDb.placeholder(3), "?");
    }

    #[test]
    fn limit_query_shapes() {
        assert_eq!(
            Dialect::Sqlite.limit_query("users", 100, None),
            "SELECT * FROM users WHERE 1=1 LIMIT 100"
        );
        assert_eq!(
            Dialect::Oracle.limit_query("USERS", 5, Some("ID > 3")),
            "SELECT * FROM USERS WHERE ID > 3 AND rownum <= 5"
        );
    }

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!("Oracle".parse::<Dialect>().ok(), Some(Dialect::Oracle));
        assert!(matches!(
            "postgres".parse::<Dialect>(),
            Err(AssistError::UnsupportedDatabase(tag)) if tag == "postgres"
        ));
    }
}
