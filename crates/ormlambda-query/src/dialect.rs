//! The dialect seam.
//!
//! A dialect bundles the rendering rules for one database family: how
//! identifiers are quoted, what a bound-parameter marker looks like, how
//! values are cast, which keyword a join type uses, how upserts and DDL are
//! spelled. The query compiler only ever talks to `dyn Dialect`.

use std::fmt;

use ormlambda_core::{Caster, Error, Result, SqlType, ValueError, ValueErrorKind, quote_ident};

use crate::join::JoinType;

/// Rendering rules for one database family.
pub trait Dialect: fmt::Debug + Send + Sync {
    /// Short name used in logs (`mysql`, `ansi`).
    fn name(&self) -> &'static str;

    /// Quote an identifier, escaping embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Marker for one bound parameter.
    fn placeholder(&self) -> &'static str;

    /// Value caster used for literals, placeholders and reading rows back.
    fn caster(&self) -> &Caster;

    /// SQL keyword introducing a join of `join_type`.
    fn join_keyword(&self, join_type: JoinType) -> &'static str {
        join_type.keyword()
    }

    /// Regular-expression match of `column` against an already rendered
    /// pattern literal, with optional rendered flags.
    fn regex_sql(&self, column: &str, pattern: &str, flags: Option<&str>) -> String {
        match flags {
            Some(flags) => format!("REGEXP_LIKE({}, {}, {})", column, pattern, flags),
            None => format!("{} REGEXP {}", column, pattern),
        }
    }

    /// Text appended to an INSERT into `table` to turn it into an upsert
    /// that assigns `columns` from the inserted row.
    fn upsert_clause(&self, table: &str, columns: &[&str]) -> Result<String> {
        let _ = columns;
        Err(Error::Value(
            ValueError {
                kind: ValueErrorKind::UnsupportedStatement,
                table: None,
                column: None,
                message: format!("the {} dialect does not support upserts", self.name()),
            }
            .with_table(table),
        ))
    }

    /// Expression that reads the already rendered column `sql` in a SELECT
    /// list, so the cell comes back in a form the caster can read.
    fn select_column(&self, sql: String, sql_type: &SqlType) -> String {
        let _ = sql_type;
        sql
    }

    /// Column type used in CREATE TABLE.
    fn column_type(&self, sql_type: &SqlType) -> String {
        sql_type.sql_name()
    }

    /// Keyword marking an auto-increment column in CREATE TABLE.
    fn auto_increment_keyword(&self) -> &'static str {
        "GENERATED BY DEFAULT AS IDENTITY"
    }
}

/// Plain standard SQL: double-quoted identifiers, `?` markers, the ANSI
/// caster. Useful as a reference dialect and in tests.
#[derive(Debug, Clone)]
pub struct AnsiDialect {
    caster: Caster,
}

impl AnsiDialect {
    pub fn new() -> Self {
        Self {
            caster: Caster::ansi(),
        }
    }
}

impl Default for AnsiDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for AnsiDialect {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn quote_identifier(&self, name: &str) -> String {
        quote_ident(name)
    }

    fn placeholder(&self) -> &'static str {
        "?"
    }

    fn caster(&self) -> &Caster {
        &self.caster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ansi_defaults() {
        let dialect = AnsiDialect::new();
        assert_eq!(dialect.quote_identifier("d_c"), "\"d_c\"");
        assert_eq!(dialect.placeholder(), "?");
        assert_eq!(dialect.join_keyword(JoinType::FullOuterInclusive), "RIGHT JOIN");
        assert_eq!(dialect.regex_sql("d.data_d", "'^a'", None), "d.data_d REGEXP '^a'");
        assert_eq!(
            dialect.regex_sql("d.data_d", "'^a'", Some("'i'")),
            "REGEXP_LIKE(d.data_d, '^a', 'i')"
        );
        let err = dialect.upsert_clause("d", &["data_d"]).unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::UnsupportedStatement));
    }
}
