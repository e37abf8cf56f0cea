//! Query builders for INSERT, UPSERT, DELETE and CREATE TABLE.
//!
//! These statements do not go through [`QueryBuilder`](crate::QueryBuilder):
//! each is built from scratch from the rows or metadata it acts on.

use ormlambda_core::{
    ColumnInfo, Error, Result, SchemaRegistry, Table, TableRef, Value, ValueErrorKind,
};

use crate::builder::CompiledQuery;
use crate::dialect::Dialect;

/// One statement executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    pub sql: String,
    pub rows: Vec<Vec<Value>>,
}

/// INSERT (or upsert) of a batch of instances.
#[derive(Debug)]
pub struct InsertBuilder<'a, T: Table> {
    rows: &'a [T],
    upsert: bool,
}

impl<'a, T: Table> InsertBuilder<'a, T> {
    pub fn new(rows: &'a [T]) -> Self {
        Self {
            rows,
            upsert: false,
        }
    }

    /// Update the existing row instead of failing on a duplicate key.
    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }

    /// Build the statement; `None` when there is nothing to insert.
    ///
    /// Auto-generated columns are never written. An auto-increment column
    /// is left out when it is NULL in every row, so the database assigns it.
    pub fn build(&self, dialect: &dyn Dialect, registry: &SchemaRegistry) -> Result<Option<BatchStatement>> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        let rows: Vec<Vec<(&'static str, Value)>> = self.rows.iter().map(Table::to_row).collect();
        let columns: Vec<(usize, &'static ColumnInfo)> = T::columns()
            .iter()
            .enumerate()
            .filter(|(i, info)| {
                let all_null = rows.iter().all(|row| row.get(*i).is_none_or(|(_, v)| v.is_null()));
                !info.skipped_on_insert(all_null)
            })
            .collect();

        let caster = dialect.caster();
        let mut names = Vec::with_capacity(columns.len());
        let mut placeholders = Vec::with_capacity(columns.len());
        for (i, info) in &columns {
            let sample = rows
                .iter()
                .filter_map(|row| row.get(*i).map(|(_, v)| v))
                .find(|v| !v.is_null())
                .unwrap_or(&Value::Null);
            names.push(info.name);
            placeholders.push(caster.placeholder(sample, dialect.placeholder())?);
        }

        let mut params = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut values = Vec::with_capacity(columns.len());
            for (i, _) in &columns {
                let value = row.get(*i).map_or(Value::Null, |(_, v)| v.clone());
                values.push(caster.parameter(&value)?);
            }
            params.push(values);
        }

        let table = registry.table_name(TableRef::of::<T>());
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            names.join(", "),
            placeholders.join(", ")
        );
        if self.upsert {
            let assignable: Vec<&str> = columns
                .iter()
                .filter(|(_, info)| info.is_upsert_assignable())
                .map(|(_, info)| info.name)
                .collect();
            sql.push_str(&dialect.upsert_clause(&table, &assignable)?);
        }
        tracing::debug!(sql = %sql, rows = params.len(), "compiled insert");
        Ok(Some(BatchStatement { sql, rows: params }))
    }
}

/// `DELETE FROM t WHERE pk = ?`, or `pk IN (?, ...)` for several keys.
pub fn delete_by_primary_key(
    table: TableRef,
    keys: &[Value],
    dialect: &dyn Dialect,
    registry: &SchemaRegistry,
) -> Result<CompiledQuery> {
    let Some(pk) = table.meta().primary_key() else {
        return Err(missing_primary_key(table, "the table declares no primary key"));
    };
    if keys.is_empty() || keys.iter().any(Value::is_null) {
        return Err(missing_primary_key(
            table,
            "every deleted instance needs a primary key value",
        ));
    }

    let caster = dialect.caster();
    let mut placeholders = Vec::with_capacity(keys.len());
    let mut params = Vec::with_capacity(keys.len());
    for key in keys {
        placeholders.push(caster.placeholder(key, dialect.placeholder())?);
        params.push(caster.parameter(key)?);
    }
    let predicate = if placeholders.len() == 1 {
        format!("{} = {}", pk.name, placeholders[0])
    } else {
        format!("{} IN ({})", pk.name, placeholders.join(", "))
    };
    let sql = format!(
        "DELETE FROM {} WHERE {}",
        registry.table_name(table),
        predicate
    );
    tracing::debug!(sql = %sql, params = params.len(), "compiled delete");
    Ok(CompiledQuery {
        sql,
        params,
        groups: Vec::new(),
    })
}

fn missing_primary_key(table: TableRef, message: &str) -> Error {
    let mut err = Error::value(ValueErrorKind::MissingPrimaryKey, message);
    if let Error::Value(ref mut value) = err {
        value.table = Some(table.name().to_string());
    }
    err
}

fn column_definition(info: &ColumnInfo, dialect: &dyn Dialect) -> String {
    let mut sql = format!("{} {}", info.name, dialect.column_type(&info.sql_type));
    if info.not_null {
        sql.push_str(" NOT NULL");
    }
    if info.auto_increment {
        sql.push(' ');
        sql.push_str(dialect.auto_increment_keyword());
    }
    if info.unique && !info.primary_key {
        sql.push_str(" UNIQUE");
    }
    if let Some(default) = info.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }
    sql
}

/// `CREATE TABLE` for `table` under the physical name `name`.
pub fn create_table_sql(
    table: TableRef,
    name: &str,
    dialect: &dyn Dialect,
    registry: &SchemaRegistry,
) -> String {
    let meta = table.meta();
    let mut parts: Vec<String> = meta
        .columns
        .iter()
        .map(|c| column_definition(c, dialect))
        .collect();

    let pks: Vec<&str> = meta
        .columns
        .iter()
        .filter(|c| c.primary_key)
        .map(|c| c.name)
        .collect();
    if !pks.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", pks.join(", ")));
    }

    for fk in meta.foreign_keys {
        parts.push(format!(
            "CONSTRAINT fk_{}_{} FOREIGN KEY ({}) REFERENCES {}({})",
            name,
            fk.name,
            fk.left_column,
            registry.table_name((fk.right)()),
            fk.right_column
        ));
    }

    format!("CREATE TABLE {} ({})", name, parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::testing::{D, registry};
    use pretty_assertions::assert_eq;

    fn d(pk: Option<i64>, data: &str) -> D {
        D {
            pk,
            data: Some(data.to_string()),
            fk: Some(1),
        }
    }

    #[test]
    fn test_insert_skips_unset_auto_increment() {
        let rows = [d(None, "x"), d(None, "y")];
        let stmt = InsertBuilder::new(&rows)
            .build(&AnsiDialect::new(), &registry())
            .unwrap()
            .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO d (data_d, fk_d) VALUES (?, ?)");
        assert_eq!(
            stmt.rows,
            vec![
                vec![Value::from("x"), Value::BigInt(1)],
                vec![Value::from("y"), Value::BigInt(1)],
            ]
        );
    }

    #[test]
    fn test_insert_keeps_set_auto_increment() {
        let rows = [d(Some(9), "x")];
        let stmt = InsertBuilder::new(&rows)
            .build(&AnsiDialect::new(), &registry())
            .unwrap()
            .unwrap();
        assert_eq!(stmt.sql, "INSERT INTO d (pk_d, data_d, fk_d) VALUES (?, ?, ?)");
    }

    #[test]
    fn test_empty_insert_is_nothing() {
        let rows: [D; 0] = [];
        let stmt = InsertBuilder::new(&rows)
            .build(&AnsiDialect::new(), &registry())
            .unwrap();
        assert!(stmt.is_none());
    }

    #[test]
    fn test_delete_by_key() {
        let registry = registry();
        let dialect = AnsiDialect::new();
        let one = delete_by_primary_key(TableRef::of::<D>(), &[Value::BigInt(1)], &dialect, &registry)
            .unwrap();
        assert_eq!(one.sql, "DELETE FROM d WHERE pk_d = ?");

        let many = delete_by_primary_key(
            TableRef::of::<D>(),
            &[Value::BigInt(1), Value::BigInt(2)],
            &dialect,
            &registry,
        )
        .unwrap();
        assert_eq!(many.sql, "DELETE FROM d WHERE pk_d IN (?, ?)");

        let err = delete_by_primary_key(TableRef::of::<D>(), &[Value::Null], &dialect, &registry)
            .unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::MissingPrimaryKey));
    }

    #[test]
    fn test_create_table() {
        let sql = create_table_sql(TableRef::of::<D>(), "d", &AnsiDialect::new(), &registry());
        assert_eq!(
            sql,
            "CREATE TABLE d (pk_d BIGINT NOT NULL GENERATED BY DEFAULT AS IDENTITY, \
             data_d VARCHAR(255), fk_d BIGINT, PRIMARY KEY (pk_d), \
             CONSTRAINT fk_d_c FOREIGN KEY (fk_d) REFERENCES c(pk_c))"
        );
    }
}
