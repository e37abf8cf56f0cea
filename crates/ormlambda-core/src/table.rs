//! Table trait for struct-to-table mapping.
//!
//! The `Table` trait defines the contract for structs that map to database
//! tables. It is normally derived with `#[derive(Table)]` from
//! `ormlambda-macros`; hand-written impls are validated the same way when the
//! table is registered.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::Result;
use crate::column::ColumnInfo;
use crate::error::{DeclarationErrorKind, Error};
use crate::foreign_key::ForeignKeyInfo;
use crate::identifiers::is_valid_identifier;
use crate::path::TablePath;
use crate::row::Row;
use crate::value::Value;

/// Static schema description of one table.
#[derive(Debug)]
pub struct TableMeta {
    /// Table name, never empty
    pub name: &'static str,
    /// Declared columns in declaration order
    pub columns: &'static [ColumnInfo],
    /// Declared relationships to other tables
    pub foreign_keys: &'static [ForeignKeyInfo],
}

impl TableMeta {
    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&'static ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The declared primary-key column, if any.
    pub fn primary_key(&self) -> Option<&'static ColumnInfo> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// Look up a relationship by name.
    pub fn foreign_key(&self, name: &str) -> Option<&'static ForeignKeyInfo> {
        self.foreign_keys.iter().find(|fk| fk.name == name)
    }

    /// Check the declaration for structural mistakes.
    ///
    /// Relationship targets are resolved here, so a relationship pointing at a
    /// column its target does not declare is caught before any query runs.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::declaration(
                DeclarationErrorKind::TableName,
                "",
                "table name must not be empty",
            ));
        }
        if !is_valid_identifier(self.name) {
            return Err(Error::declaration(
                DeclarationErrorKind::TableName,
                self.name,
                "table name is not a valid identifier",
            ));
        }

        let mut seen = HashSet::new();
        for column in self.columns {
            if !seen.insert(column.name) {
                return Err(Error::declaration(
                    DeclarationErrorKind::DuplicateColumn,
                    self.name,
                    format!("column '{}' is declared twice", column.name),
                ));
            }
        }

        if self.columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(Error::declaration(
                DeclarationErrorKind::MultiplePrimaryKeys,
                self.name,
                "more than one column is marked as primary key",
            ));
        }

        for fk in self.foreign_keys {
            if !is_valid_identifier(fk.name) {
                return Err(Error::declaration(
                    DeclarationErrorKind::ForeignKey,
                    self.name,
                    format!("relationship name '{}' is not a valid identifier", fk.name),
                ));
            }
            if self.column(fk.left_column).is_none() {
                return Err(Error::declaration(
                    DeclarationErrorKind::ForeignKey,
                    self.name,
                    format!(
                        "relationship '{}' uses unknown local column '{}'",
                        fk.name, fk.left_column
                    ),
                ));
            }
            if !fk.op.is_join_operator() {
                return Err(Error::declaration(
                    DeclarationErrorKind::ForeignKey,
                    self.name,
                    format!(
                        "relationship '{}' uses '{}', which cannot join tables",
                        fk.name, fk.op
                    ),
                ));
            }
            let right = (fk.right)();
            if right.meta().column(fk.right_column).is_none() {
                return Err(Error::declaration(
                    DeclarationErrorKind::ForeignKey,
                    self.name,
                    format!(
                        "relationship '{}' references unknown column '{}.{}'",
                        fk.name,
                        right.name(),
                        fk.right_column
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// Typed identifier of a table, keyed by the Rust type that maps it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(TypeId);

impl TableId {
    pub fn of<T: Table>() -> Self {
        TableId(TypeId::of::<T>())
    }
}

impl fmt::Debug for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({:?})", self.0)
    }
}

/// Type-erased handle to a table: its identity plus its static metadata.
#[derive(Clone, Copy)]
pub struct TableRef {
    id: TableId,
    meta: &'static TableMeta,
}

impl TableRef {
    pub fn of<T: Table>() -> Self {
        Self {
            id: TableId::of::<T>(),
            meta: T::meta(),
        }
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn meta(&self) -> &'static TableMeta {
        self.meta
    }

    /// Declared table name.
    pub fn name(&self) -> &'static str {
        self.meta.name
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TableRef {}

impl Hash for TableRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableRef({})", self.meta.name)
    }
}

/// A typed view of a table reached through a [`TablePath`].
///
/// Generated proxies expose one method per column (returning a typed column
/// handle) and one per relationship (returning the target table's proxy with
/// the path extended by that step).
pub trait TableProxy: Clone {
    fn from_path(path: TablePath) -> Self;

    fn path(&self) -> &TablePath;
}

/// Trait for structs that map to a database table.
pub trait Table: Sized + Send + Sync + 'static {
    /// The name of the database table.
    const TABLE_NAME: &'static str;

    /// Typed proxy used to build expressions over this table.
    type Proxy: TableProxy;

    /// Static schema metadata.
    fn meta() -> &'static TableMeta;

    /// Convert this instance to (column, value) pairs in declaration order.
    fn to_row(&self) -> Vec<(&'static str, Value)>;

    /// Construct an instance from a row keyed by column name.
    #[allow(clippy::result_large_err)]
    fn from_row(row: &Row) -> Result<Self>;

    /// Proxy rooted at this table.
    fn proxy() -> Self::Proxy {
        <Self::Proxy as TableProxy>::from_path(TablePath::root(TableRef::of::<Self>()))
    }

    /// Declared columns in order.
    fn columns() -> &'static [ColumnInfo] {
        Self::meta().columns
    }

    /// The declared primary-key column, if any.
    fn primary_key() -> Option<&'static ColumnInfo> {
        Self::meta().primary_key()
    }

    /// Value of one column of this instance.
    fn value_of(&self, column: &str) -> Option<Value> {
        self.to_row()
            .into_iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    /// Primary-key value, or `None` when no key is declared or it is NULL.
    fn primary_key_value(&self) -> Option<Value> {
        let pk = Self::primary_key()?;
        self.value_of(pk.name).filter(|v| !v.is_null())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;

    struct Parent;
    struct Child;

    #[derive(Clone)]
    struct NoProxy(TablePath);

    impl TableProxy for NoProxy {
        fn from_path(path: TablePath) -> Self {
            NoProxy(path)
        }

        fn path(&self) -> &TablePath {
            &self.0
        }
    }

    static PARENT_COLUMNS: [ColumnInfo; 2] = [
        ColumnInfo::new("parent", "id", SqlType::BigInt).primary_key(true),
        ColumnInfo::new("parent", "name", SqlType::Text),
    ];
    static PARENT_META: TableMeta = TableMeta {
        name: "parent",
        columns: &PARENT_COLUMNS,
        foreign_keys: &[],
    };

    static CHILD_COLUMNS: [ColumnInfo; 2] = [
        ColumnInfo::new("child", "id", SqlType::BigInt).primary_key(true),
        ColumnInfo::new("child", "parent_id", SqlType::BigInt),
    ];
    static CHILD_FKS: [ForeignKeyInfo; 1] =
        [ForeignKeyInfo::new("parent", "parent_id", TableRef::of::<Parent>, "id")];
    static CHILD_META: TableMeta = TableMeta {
        name: "child",
        columns: &CHILD_COLUMNS,
        foreign_keys: &CHILD_FKS,
    };

    impl Table for Parent {
        const TABLE_NAME: &'static str = "parent";
        type Proxy = NoProxy;

        fn meta() -> &'static TableMeta {
            &PARENT_META
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("id", Value::BigInt(1)), ("name", Value::Null)]
        }

        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Parent)
        }
    }

    impl Table for Child {
        const TABLE_NAME: &'static str = "child";
        type Proxy = NoProxy;

        fn meta() -> &'static TableMeta {
            &CHILD_META
        }

        fn to_row(&self) -> Vec<(&'static str, Value)> {
            vec![("id", Value::Null), ("parent_id", Value::BigInt(1))]
        }

        fn from_row(_row: &Row) -> Result<Self> {
            Ok(Child)
        }
    }

    #[test]
    fn test_validate_accepts_well_formed_tables() {
        assert!(Parent::meta().validate().is_ok());
        assert!(Child::meta().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_name() {
        static BAD: TableMeta = TableMeta {
            name: "",
            columns: &[],
            foreign_keys: &[],
        };
        let err = BAD.validate().unwrap_err();
        assert!(err.is_declaration());
    }

    #[test]
    fn test_validate_rejects_unknown_remote_column() {
        static FKS: [ForeignKeyInfo; 1] =
            [ForeignKeyInfo::new("parent", "parent_id", TableRef::of::<Parent>, "missing")];
        static BAD: TableMeta = TableMeta {
            name: "child",
            columns: &CHILD_COLUMNS,
            foreign_keys: &FKS,
        };
        let err = BAD.validate().unwrap_err();
        assert!(err.to_string().contains("parent.missing"));
    }

    #[test]
    fn test_primary_key_value_skips_null() {
        assert_eq!(Parent.primary_key_value(), Some(Value::BigInt(1)));
        assert_eq!(Child.primary_key_value(), None);
        assert_eq!(Child::primary_key().map(|c| c.name), Some("id"));
    }

    #[test]
    fn test_table_ref_identity() {
        assert_eq!(TableRef::of::<Parent>(), TableRef::of::<Parent>());
        assert_ne!(TableRef::of::<Parent>(), TableRef::of::<Child>());
        assert_eq!(TableRef::of::<Child>().name(), "child");
    }
}
