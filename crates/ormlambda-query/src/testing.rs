//! Hand-written tables for unit tests in this crate.
//!
//! `D → C → B → A` is a chain of single-column foreign keys; `E` reaches
//! `A` twice, through `left` (via B) and `right` (via C then B).

use ormlambda_core::{
    ColumnInfo, ForeignKeyInfo, Result, Row, SchemaRegistry, SqlType, Table, TableMeta,
    TablePath, TableProxy, TableRef, Value,
};

use crate::expr::Column;
use crate::selection::{IntoSelectItem, SelectItem};

macro_rules! test_table {
    (
        $ty:ident, $proxy:ident, $name:literal,
        pk: $pk:ident, data: $data:ident, fk: $fk:ident,
        [$($rel:ident => $target:ident : $left:literal -> $right:literal),*]
    ) => {
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $ty {
            pub pk: Option<i64>,
            pub data: Option<String>,
            pub fk: Option<i64>,
        }

        #[derive(Debug, Clone)]
        pub struct $proxy {
            path: TablePath,
        }

        impl TableProxy for $proxy {
            fn from_path(path: TablePath) -> Self {
                Self { path }
            }

            fn path(&self) -> &TablePath {
                &self.path
            }
        }

        impl IntoSelectItem for $proxy {
            fn into_select_item(self) -> SelectItem {
                SelectItem::Table(self.path)
            }
        }

        #[allow(dead_code)]
        impl $proxy {
            pub fn $pk(&self) -> Column<Option<i64>> {
                Column::new(self.path.clone(), &$ty::meta().columns[0])
            }

            pub fn $data(&self) -> Column<Option<String>> {
                Column::new(self.path.clone(), &$ty::meta().columns[1])
            }

            pub fn $fk(&self) -> Column<Option<i64>> {
                Column::new(self.path.clone(), &$ty::meta().columns[2])
            }

            $(
                pub fn $rel(&self) -> <$target as Table>::Proxy {
                    let info = $ty::meta()
                        .foreign_key(stringify!($rel))
                        .expect("declared relationship");
                    TableProxy::from_path(self.path.traverse(info))
                }
            )*
        }

        impl Table for $ty {
            const TABLE_NAME: &'static str = $name;
            type Proxy = $proxy;

            fn meta() -> &'static TableMeta {
                static COLUMNS: [ColumnInfo; 3] = [
                    ColumnInfo::new($name, stringify!($pk), SqlType::BigInt)
                        .primary_key(true)
                        .auto_increment(true),
                    ColumnInfo::new($name, stringify!($data), SqlType::VarChar(255)),
                    ColumnInfo::new($name, stringify!($fk), SqlType::BigInt),
                ];
                static FOREIGN_KEYS: &[ForeignKeyInfo] = &[
                    $(ForeignKeyInfo::new(stringify!($rel), $left, TableRef::of::<$target>, $right)),*
                ];
                static META: TableMeta = TableMeta {
                    name: $name,
                    columns: &COLUMNS,
                    foreign_keys: FOREIGN_KEYS,
                };
                &META
            }

            fn to_row(&self) -> Vec<(&'static str, Value)> {
                vec![
                    (stringify!($pk), self.pk.into()),
                    (stringify!($data), self.data.clone().into()),
                    (stringify!($fk), self.fk.into()),
                ]
            }

            fn from_row(row: &Row) -> Result<Self> {
                Ok(Self {
                    pk: row.get_named(stringify!($pk))?,
                    data: row.get_named(stringify!($data))?,
                    fk: row.get_named(stringify!($fk))?,
                })
            }
        }
    };
}

test_table!(A, AProxy, "a", pk: pk_a, data: data_a, fk: fk_a, []);
test_table!(
    B, BProxy, "b", pk: pk_b, data: data_b, fk: fk_b,
    [a => A: "fk_b" -> "pk_a"]
);
test_table!(
    C, CProxy, "c", pk: pk_c, data: data_c, fk: fk_c,
    [b => B: "fk_c" -> "pk_b"]
);
test_table!(
    D, DProxy, "d", pk: pk_d, data: data_d, fk: fk_d,
    [c => C: "fk_d" -> "pk_c"]
);
test_table!(
    E, EProxy, "e", pk: pk_e, data: data_e, fk: fk_e,
    [left => B: "fk_e" -> "pk_b", right => C: "data_e" -> "pk_c"]
);

/// Registry holding the `D → C → B → A` chain.
pub fn registry() -> SchemaRegistry {
    let registry = SchemaRegistry::new();
    registry.register::<D>().expect("fixture tables are valid");
    registry
}
