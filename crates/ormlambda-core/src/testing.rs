//! Hand-written D → C → B → A chain used by unit tests in this crate.

use crate::Result;
use crate::column::ColumnInfo;
use crate::foreign_key::ForeignKeyInfo;
use crate::path::TablePath;
use crate::row::Row;
use crate::table::{Table, TableMeta, TableProxy, TableRef};
use crate::types::SqlType;
use crate::value::Value;

#[derive(Clone)]
pub struct PathProxy(TablePath);

impl TableProxy for PathProxy {
    fn from_path(path: TablePath) -> Self {
        PathProxy(path)
    }

    fn path(&self) -> &TablePath {
        &self.0
    }
}

macro_rules! chain_table {
    ($ty:ident, $name:literal, $pk:literal, $data:literal, [$($fk:expr),*]) => {
        #[derive(Debug, Clone, PartialEq)]
        pub struct $ty {
            pub pk: Option<i64>,
            pub data: Option<String>,
            pub fk: Option<i64>,
        }

        impl Table for $ty {
            const TABLE_NAME: &'static str = $name;
            type Proxy = PathProxy;

            fn meta() -> &'static TableMeta {
                static COLUMNS: [ColumnInfo; 3] = [
                    ColumnInfo::new($name, $pk, SqlType::BigInt)
                        .primary_key(true)
                        .auto_increment(true),
                    ColumnInfo::new($name, $data, SqlType::VarChar(255)),
                    ColumnInfo::new($name, concat!("fk_", $name), SqlType::BigInt),
                ];
                static FOREIGN_KEYS: &[ForeignKeyInfo] = &[$($fk),*];
                static META: TableMeta = TableMeta {
                    name: $name,
                    columns: &COLUMNS,
                    foreign_keys: FOREIGN_KEYS,
                };
                &META
            }

            fn to_row(&self) -> Vec<(&'static str, Value)> {
                vec![
                    ($pk, self.pk.into()),
                    ($data, self.data.clone().into()),
                    (concat!("fk_", $name), self.fk.into()),
                ]
            }

            fn from_row(row: &Row) -> Result<Self> {
                Ok(Self {
                    pk: row.get_named($pk)?,
                    data: row.get_named($data)?,
                    fk: row.get_named(concat!("fk_", $name))?,
                })
            }
        }
    };
}

chain_table!(A, "a", "pk_a", "data_a", []);
chain_table!(
    B,
    "b",
    "pk_b",
    "data_b",
    [ForeignKeyInfo::new("a", "fk_b", TableRef::of::<A>, "pk_a")]
);
chain_table!(
    C,
    "c",
    "pk_c",
    "data_c",
    [ForeignKeyInfo::new("b", "fk_c", TableRef::of::<B>, "pk_b")]
);
chain_table!(
    D,
    "d",
    "pk_d",
    "data_d",
    [ForeignKeyInfo::new("c", "fk_d", TableRef::of::<C>, "pk_c")]
);
