//! Column metadata.

use crate::types::SqlType;

/// Declared metadata of one table column.
///
/// Instances are built once per table (normally by `#[derive(Table)]`) and
/// live in a `'static` slice, so a column's owning table never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    /// Name of the owning table
    pub table: &'static str,
    /// Database column name
    pub name: &'static str,
    /// Declared SQL type
    pub sql_type: SqlType,
    /// Whether NULL is rejected
    pub not_null: bool,
    /// Whether this is the primary key
    pub primary_key: bool,
    /// Whether the database assigns the value on insert when left unset
    pub auto_increment: bool,
    /// Whether the database always computes the value (never written by us)
    pub auto_generated: bool,
    /// Whether this column has a unique constraint
    pub unique: bool,
    /// Default value expression (SQL)
    pub default: Option<&'static str>,
}

impl ColumnInfo {
    /// Create column info with all flags cleared.
    pub const fn new(table: &'static str, name: &'static str, sql_type: SqlType) -> Self {
        Self {
            table,
            name,
            sql_type,
            not_null: false,
            primary_key: false,
            auto_increment: false,
            auto_generated: false,
            unique: false,
            default: None,
        }
    }

    /// Set not-null flag.
    pub const fn not_null(mut self, value: bool) -> Self {
        self.not_null = value;
        self
    }

    /// Set primary key flag.
    ///
    /// Primary keys are implicitly not null.
    pub const fn primary_key(mut self, value: bool) -> Self {
        self.primary_key = value;
        if value {
            self.not_null = true;
        }
        self
    }

    /// Set auto-increment flag.
    pub const fn auto_increment(mut self, value: bool) -> Self {
        self.auto_increment = value;
        self
    }

    /// Set auto-generated flag.
    pub const fn auto_generated(mut self, value: bool) -> Self {
        self.auto_generated = value;
        self
    }

    /// Set unique flag.
    pub const fn unique(mut self, value: bool) -> Self {
        self.unique = value;
        self
    }

    /// Set default value.
    pub const fn default(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    /// Set default value from optional.
    pub const fn default_opt(mut self, expr: Option<&'static str>) -> Self {
        self.default = expr;
        self
    }

    /// Whether an insert must leave this column out when `value` is NULL.
    pub fn skipped_on_insert(&self, value_is_null: bool) -> bool {
        self.auto_generated || (self.auto_increment && value_is_null)
    }

    /// Whether an upsert may overwrite this column on conflict.
    pub fn is_upsert_assignable(&self) -> bool {
        !(self.primary_key || self.auto_generated || self.auto_increment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PK: ColumnInfo = ColumnInfo::new("d", "pk_d", SqlType::BigInt)
        .primary_key(true)
        .auto_increment(true);

    #[test]
    fn test_primary_key_implies_not_null() {
        assert!(PK.not_null);
        assert!(PK.primary_key);
    }

    #[test]
    fn test_insert_skip_rules() {
        assert!(PK.skipped_on_insert(true));
        assert!(!PK.skipped_on_insert(false));

        let generated = ColumnInfo::new("d", "created", SqlType::DateTime).auto_generated(true);
        assert!(generated.skipped_on_insert(false));
    }

    #[test]
    fn test_upsert_assignable() {
        assert!(!PK.is_upsert_assignable());
        assert!(ColumnInfo::new("d", "data_d", SqlType::Text).is_upsert_assignable());
    }
}
