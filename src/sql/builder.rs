use crate::model::{Column, FieldValue, Record, Value};
use crate::sql::Dialect;

/// Parameterised SQL text with its positional arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Builds the existence check, insert and update statements used to upsert
/// one record.
///
/// All operations are pure functions of the table name, its columns and the
/// record. Raw fragments ([`FieldValue::Raw`]) are written into the SQL text
/// as-is and never become predicates.
#[derive(Debug, Clone, Copy)]
pub struct SqlBuilder {
    dialect: Dialect,
}

struct Keys<'a> {
    primary: Vec<&'a str>,
    unique: Vec<&'a str>,
}

impl<'a> Keys<'a> {
    fn of(columns: &'a [Column]) -> Self {
        Self {
            primary: columns
                .iter()
                .filter(|column| column.primary)
                .map(|column| column.name.as_str())
                .collect(),
            unique: columns
                .iter()
                .filter(|column| column.unique)
                .map(|column| column.name.as_str())
                .collect(),
        }
    }

    fn composite(&self) -> bool {
        self.primary.len() >= 2
    }

    fn is_primary(&self, field: &str) -> bool {
        self.primary.contains(&field)
    }

    fn is_unique(&self, field: &str) -> bool {
        self.unique.contains(&field)
    }
}

/// Accumulates placeholders and the matching argument list.
struct Params {
    dialect: Dialect,
    args: Vec<Value>,
}

impl Params {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            args: Vec::new(),
        }
    }

    fn bind(&mut self, value: &Value) -> String {
        let placeholder = self.dialect.placeholder(self.args.len());
        self.args.push(value.clone());
        placeholder
    }
}

impl SqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// `SELECT count(*)` over the rows matching the record's key fields.
    ///
    /// Returns `None` when existence cannot be decided: no unique field is
    /// present and the primary-key fields do not cover the whole key. Raw
    /// fields never become predicates, not even on unique columns.
    pub fn exists(&self, table: &str, columns: &[Column], record: &Record) -> Option<Statement> {
        let keys = Keys::of(columns);
        let mut params = Params::new(self.dialect);
        let mut predicates = Vec::new();
        let mut primary_count = 0;
        let mut unique_count = 0;

        for (field, value) in record.iter() {
            let FieldValue::Param(value) = value else {
                continue;
            };
            if keys.is_primary(field) && (keys.composite() || !value.is_null()) {
                predicates.push(format!("{field}={}", params.bind(value)));
                primary_count += 1;
            } else if keys.is_unique(field) {
                predicates.push(format!("{field}={}", params.bind(value)));
                unique_count += 1;
            }
        }

        let covers_primary = primary_count > 0 && primary_count == keys.primary.len();
        if unique_count == 0 && !covers_primary {
            return None;
        }

        Some(Statement {
            sql: format!(
                "SELECT count(*) FROM {table} WHERE {}",
                predicates.join(" AND ")
            ),
            args: params.args,
        })
    }

    /// `INSERT` listing columns in declared order.
    ///
    /// A null value for a single-column primary key is left out so the
    /// database can generate the key.
    pub fn insert(&self, table: &str, columns: &[Column], record: &Record) -> Statement {
        let keys = Keys::of(columns);
        let mut params = Params::new(self.dialect);
        let mut fields = Vec::new();
        let mut places = Vec::new();

        for column in columns {
            let Some(value) = record.get(&column.name) else {
                continue;
            };
            let generated_key = column.primary && value.is_null();
            if !keys.composite() && generated_key {
                continue;
            }
            fields.push(column.name.as_str());
            match value {
                FieldValue::Raw(fragment) => places.push(fragment.clone()),
                FieldValue::Param(value) => places.push(params.bind(value)),
            }
        }

        Statement {
            sql: format!(
                "INSERT INTO {table} ({}) VALUES ({})",
                fields.join(","),
                places.join(",")
            ),
            args: params.args,
        }
    }

    /// `UPDATE` keyed on the record's primary-key and unique fields.
    ///
    /// Under a composite key a null key component is assigned rather than
    /// matched. Returns `None` when the statement would have nothing to set or
    /// no predicate to restrict it.
    pub fn update(&self, table: &str, columns: &[Column], record: &Record) -> Option<Statement> {
        let keys = Keys::of(columns);
        let mut params = Params::new(self.dialect);
        let mut sets = Vec::new();
        let mut predicates = Vec::new();

        for (field, value) in record.iter() {
            let value = match value {
                FieldValue::Raw(fragment) => {
                    sets.push(format!("{field}={fragment}"));
                    continue;
                }
                FieldValue::Param(value) => value,
            };
            if keys.is_primary(field) {
                if !value.is_null() {
                    predicates.push(format!("{field}={}", params.bind(value)));
                } else if keys.composite() {
                    sets.push(format!("{field}={}", params.bind(value)));
                }
            } else if keys.is_unique(field) {
                predicates.push(format!("{field}={}", params.bind(value)));
            } else {
                sets.push(format!("{field}={}", params.bind(value)));
            }
        }

        if sets.is_empty() || predicates.is_empty() {
            return None;
        }

        Some(Statement {
            sql: format!(
                "UPDATE {table} SET {} WHERE {}",
                sets.join(","),
                predicates.join(" AND ")
            ),
            args: params.args,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<Column> {
        vec![
            Column::new("id", "INTEGER").primary().auto_increment(),
            Column::new("email", "TEXT").unique(),
            Column::new("name", "TEXT"),
        ]
    }

    fn memberships() -> Vec<Column> {
        vec![
            Column::new("user_id", "INTEGER").primary(),
            Column::new("group_id", "INTEGER").primary(),
            Column::new("role", "TEXT"),
        ]
    }

    fn param(value: impl Into<Value>) -> FieldValue {
        FieldValue::Param(value.into())
    }

    #[test]
    fn insert_omits_null_single_primary_key() {
        let record = Record::new()
            .with("name", param("Ann"))
            .with("id", FieldValue::Param(Value::Null))
            .with("email", param("a@x.com"));

        let statement = SqlBuilder::new(Dialect::MariaDb).insert("users", &users(), &record);

        assert_eq!(statement.sql, "INSERT INTO users (email,name) VALUES (?,?)");
        assert_eq!(statement.args, vec![Value::from("a@x.com"), Value::from("Ann")]);
    }

    #[test]
    fn insert_keeps_null_components_of_composite_key() {
        let record = Record::new()
            .with("group_id", FieldValue::Param(Value::Null))
            .with("user_id", param(4))
            .with("role", param("admin"));

        let statement = SqlBuilder::new(Dialect::Oracle).insert("memberships", &memberships(), &record);

        assert_eq!(
            statement.sql,
            "INSERT INTO memberships (user_id,group_id,role) VALUES (:0,:1,:2)"
        );
        assert_eq!(statement.args, vec![Value::Int(4), Value::Null, Value::from("admin")]);
    }

    #[test]
    fn insert_splices_raw_fragments() {
        let record = Record::new()
            .with("id", FieldValue::Raw("seq_users.nextval".into()))
            .with("name", param("Ann"));

        let statement = SqlBuilder::new(Dialect::Oracle).insert("users", &users(), &record);

        assert_eq!(
            statement.sql,
            "INSERT INTO users (id,name) VALUES (seq_users.nextval,:0)"
        );
        assert_eq!(statement.args, vec![Value::from("Ann")]);
    }

    #[test]
    fn exists_by_unique_column() {
        let record = Record::new()
            .with("email", param("a@x.com"))
            .with("name", param("Ann"));

        let statement = SqlBuilder::new(Dialect::MariaDb)
            .exists("users", &users(), &record)
            .expect("unique predicate available");

        assert_eq!(statement.sql, "SELECT count(*) FROM users WHERE email=?");
        assert_eq!(statement.args, vec![Value::from("a@x.com")]);
    }

    #[test]
    fn exists_without_unique_value_is_not_applicable() {
        let columns = vec![Column::new("code", "TEXT").unique(), Column::new("label", "TEXT")];
        let record = Record::new().with("label", param("x"));

        assert!(SqlBuilder::new(Dialect::Sqlite).exists("codes", &columns, &record).is_none());
    }

    #[test]
    fn exists_requires_full_composite_key() {
        let builder = SqlBuilder::new(Dialect::Oracle);
        let partial = Record::new().with("user_id", param(1)).with("role", param("x"));
        assert!(builder.exists("memberships", &memberships(), &partial).is_none());

        let full = partial.with("group_id", FieldValue::Param(Value::Null));
        let statement = builder
            .exists("memberships", &memberships(), &full)
            .expect("whole key present");
        assert_eq!(
            statement.sql,
            "SELECT count(*) FROM memberships WHERE user_id=:0 AND group_id=:1"
        );
        assert_eq!(statement.args, vec![Value::Int(1), Value::Null]);
    }

    #[test]
    fn exists_skips_null_single_key_and_raw_fields() {
        let record = Record::new()
            .with("id", FieldValue::Param(Value::Null))
            .with("email", FieldValue::Raw("lower('A@X.COM')".into()));

        assert!(SqlBuilder::new(Dialect::MariaDb).exists("users", &users(), &record).is_none());
    }

    #[test]
    fn update_keys_on_unique_column() {
        let record = Record::new()
            .with("email", param("a@x.com"))
            .with("name", param("Ann"));

        let statement = SqlBuilder::new(Dialect::MariaDb)
            .update("users", &users(), &record)
            .expect("update applicable");

        assert_eq!(statement.sql, "UPDATE users SET name=? WHERE email=?");
        assert_eq!(statement.args, vec![Value::from("Ann"), Value::from("a@x.com")]);
    }

    #[test]
    fn update_sets_null_composite_component_and_raw_fragments() {
        let record = Record::new()
            .with("user_id", param(4))
            .with("group_id", FieldValue::Param(Value::Null))
            .with("role", FieldValue::Raw("upper(role)".into()));

        let statement = SqlBuilder::new(Dialect::Oracle)
            .update("memberships", &memberships(), &record)
            .expect("update applicable");

        assert_eq!(
            statement.sql,
            "UPDATE memberships SET group_id=:1,role=upper(role) WHERE user_id=:0"
        );
        assert_eq!(statement.args, vec![Value::Int(4), Value::Null]);
    }

    #[test]
    fn update_without_set_or_where_is_not_applicable() {
        let builder = SqlBuilder::new(Dialect::Sqlite);
        let keys_only = Record::new().with("id", param(1));
        assert!(builder.update("users", &users(), &keys_only).is_none());

        let no_keys = Record::new().with("name", param("Ann"));
        assert!(builder.update("users", &users(), &no_keys).is_none());
    }
}
