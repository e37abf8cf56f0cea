//! The MySQL-family dialect.

use ormlambda_core::{Caster, Error, Result, SqlType, ValueError, ValueErrorKind, quote_ident_mysql};
use ormlambda_query::Dialect;

use crate::types::{mysql_caster, mysql_type_name};

/// Alias given to the inserted row in `INSERT ... AS _val ON DUPLICATE KEY UPDATE`.
pub const UPSERT_ROW_ALIAS: &str = "_val";

/// MySQL and MariaDB: backtick identifiers, `%s` markers.
#[derive(Debug, Clone)]
pub struct MySqlDialect {
    caster: Caster,
}

impl MySqlDialect {
    pub fn new() -> Self {
        Self {
            caster: mysql_caster(),
        }
    }

    /// Mutable access to the caster, to register extra value casts.
    pub fn caster_mut(&mut self) -> &mut Caster {
        &mut self.caster
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ident_mysql(name)
    }

    fn placeholder(&self) -> &'static str {
        "%s"
    }

    fn caster(&self) -> &Caster {
        &self.caster
    }

    fn upsert_clause(&self, table: &str, columns: &[&str]) -> Result<String> {
        if columns.is_empty() {
            return Err(Error::Value(
                ValueError {
                    kind: ValueErrorKind::NothingToAssign,
                    table: None,
                    column: None,
                    message: "an upsert needs at least one column to update on conflict"
                        .to_string(),
                }
                .with_table(table),
            ));
        }
        let assignments: Vec<String> = columns
            .iter()
            .map(|c| format!("{} = {}.{}", c, UPSERT_ROW_ALIAS, c))
            .collect();
        Ok(format!(
            " AS {} ON DUPLICATE KEY UPDATE {}",
            UPSERT_ROW_ALIAS,
            assignments.join(", ")
        ))
    }

    /// Geometry cells come back as internal WKB unless asked for as text.
    fn select_column(&self, sql: String, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Point => format!("ST_AsText({})", sql),
            _ => sql,
        }
    }

    fn column_type(&self, sql_type: &SqlType) -> String {
        mysql_type_name(sql_type)
    }

    fn auto_increment_keyword(&self) -> &'static str {
        "AUTO_INCREMENT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormlambda_query::JoinType;

    #[test]
    fn test_quoting_and_markers() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.quote_identifier("d_c_b"), "`d_c_b`");
        assert_eq!(dialect.placeholder(), "%s");
        assert_eq!(dialect.join_keyword(JoinType::LeftExclusive), "LEFT JOIN");
    }

    #[test]
    fn test_upsert_clause() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.upsert_clause("d", &["data_d", "fk_d"]).unwrap(),
            " AS _val ON DUPLICATE KEY UPDATE data_d = _val.data_d, fk_d = _val.fk_d"
        );
        let err = dialect.upsert_clause("d", &[]).unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::NothingToAssign));
        assert!(err.to_string().starts_with("Value error: d: "));
    }

    #[test]
    fn test_points_are_selected_as_text() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.select_column("a.location".to_string(), &SqlType::Point),
            "ST_AsText(a.location)"
        );
        assert_eq!(
            dialect.select_column("a.city_id".to_string(), &SqlType::BigInt),
            "a.city_id"
        );
    }
}
