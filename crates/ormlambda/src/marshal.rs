//! Turning result rows back into host values.
//!
//! A compiled SELECT knows how its result columns are grouped (see
//! [`OutputGroup`]). Table groups become model instances through
//! [`FromGroups`]; any selection can also be read as a row "flavour"
//! (tuples, maps, raw rows) through [`Flavour`]. Every cell is passed through
//! the dialect's read caster for its declared column type first.

use std::collections::HashMap;

use indexmap::IndexMap;
use ormlambda_core::{
    Caster, Error, ExpressionErrorKind, FromValue, Result, Row, Table, TableRef, Value,
};
use ormlambda_query::{OutputColumn, OutputGroup};

fn read_column(raw: &Row, column: &OutputColumn, caster: &Caster) -> Result<Value> {
    let value = raw.get_by_name(&column.alias).cloned().unwrap_or(Value::Null);
    caster.read(column.info.sql_type.value_kind(), value)
}

fn mismatch<T: Table>(index: usize, group: &OutputGroup) -> Error {
    let found = match group {
        OutputGroup::Table { table, .. } => format!("table '{}'", table.name()),
        OutputGroup::Column(column) => format!("column '{}'", column.alias),
        OutputGroup::Function { alias } => format!("function '{}'", alias),
    };
    Error::expression(
        ExpressionErrorKind::Arity,
        format!(
            "selection element {} is {}, expected every column of '{}'",
            index,
            found,
            T::TABLE_NAME
        ),
    )
}

fn expect_groups(groups: &[OutputGroup], expected: usize) -> Result<()> {
    if groups.len() == expected {
        Ok(())
    } else {
        Err(Error::expression(
            ExpressionErrorKind::Arity,
            format!(
                "selection produced {} groups but the output type expects {}",
                groups.len(),
                expected
            ),
        ))
    }
}

/// Fail unless the group at `index` holds every column of `T`.
fn expect_table<T: Table>(groups: &[OutputGroup], index: usize) -> Result<()> {
    match &groups[index] {
        OutputGroup::Table { table, .. } if *table == TableRef::of::<T>() => Ok(()),
        other => Err(mismatch::<T>(index, other)),
    }
}

/// Build one `T` from the table group at `index`.
fn instance<T: Table>(raw: &Row, groups: &[OutputGroup], index: usize, caster: &Caster) -> Result<T> {
    match &groups[index] {
        OutputGroup::Table { table, columns, .. } if *table == TableRef::of::<T>() => {
            let mut names = Vec::with_capacity(columns.len());
            let mut values = Vec::with_capacity(columns.len());
            for column in columns {
                names.push(column.info.name.to_string());
                values.push(read_column(raw, column, caster)?);
            }
            T::from_row(&Row::new(names, values))
        }
        other => Err(mismatch::<T>(index, other)),
    }
}

/// Read-cast a raw row, keeping output aliases as column names.
pub(crate) fn cast_row(raw: &Row, groups: &[OutputGroup], caster: &Caster) -> Result<Row> {
    if groups.is_empty() {
        return Ok(raw.clone());
    }
    let mut names = Vec::new();
    let mut values = Vec::new();
    for group in groups {
        match group {
            OutputGroup::Table { columns, .. } => {
                for column in columns {
                    names.push(column.alias.clone());
                    values.push(read_column(raw, column, caster)?);
                }
            }
            OutputGroup::Column(column) => {
                names.push(column.alias.clone());
                values.push(read_column(raw, column, caster)?);
            }
            OutputGroup::Function { alias } => {
                names.push(alias.clone());
                values.push(raw.get_by_name(alias).cloned().unwrap_or(Value::Null));
            }
        }
    }
    Ok(Row::new(names, values))
}

/// Output shapes built from table groups: one `Vec` of instances per
/// selected table.
///
/// `Vec<T>` reads a selection of `T`'s columns; `(Vec<A>, Vec<B>)` reads a
/// selection of two tables side by side, and so on up to six.
pub trait FromGroups: Sized {
    /// What a single row becomes (`T` for `Vec<T>`, `(A, B)` for
    /// `(Vec<A>, Vec<B>)`).
    type First;

    fn from_groups(rows: &[Row], groups: &[OutputGroup], caster: &Caster) -> Result<Self>;

    fn first(row: &Row, groups: &[OutputGroup], caster: &Caster) -> Result<Self::First>;
}

impl<T: Table> FromGroups for Vec<T> {
    type First = T;

    fn from_groups(rows: &[Row], groups: &[OutputGroup], caster: &Caster) -> Result<Self> {
        expect_groups(groups, 1)?;
        expect_table::<T>(groups, 0)?;
        rows.iter().map(|row| instance::<T>(row, groups, 0, caster)).collect()
    }

    fn first(row: &Row, groups: &[OutputGroup], caster: &Caster) -> Result<T> {
        expect_groups(groups, 1)?;
        instance::<T>(row, groups, 0, caster)
    }
}

macro_rules! impl_from_groups_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Table),+> FromGroups for ($(Vec<$name>,)+) {
            type First = ($($name,)+);

            fn from_groups(rows: &[Row], groups: &[OutputGroup], caster: &Caster) -> Result<Self> {
                expect_groups(groups, [$($idx),+].len())?;
                $( expect_table::<$name>(groups, $idx)?; )+
                let mut out = ($(Vec::<$name>::with_capacity(rows.len()),)+);
                for row in rows {
                    $( out.$idx.push(instance::<$name>(row, groups, $idx, caster)?); )+
                }
                Ok(out)
            }

            fn first(row: &Row, groups: &[OutputGroup], caster: &Caster) -> Result<Self::First> {
                expect_groups(groups, [$($idx),+].len())?;
                Ok(($(instance::<$name>(row, groups, $idx, caster)?,)+))
            }
        }
    };
}

impl_from_groups_tuple!(A 0);
impl_from_groups_tuple!(A 0, B 1);
impl_from_groups_tuple!(A 0, B 1, C 2);
impl_from_groups_tuple!(A 0, B 1, C 2, D 3);
impl_from_groups_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_from_groups_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// A per-row output shape that ignores table grouping.
pub trait Flavour: Sized {
    fn from_row(row: &Row) -> Result<Self>;
}

impl Flavour for Row {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.clone())
    }
}

impl Flavour for Vec<Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row.values().cloned().collect())
    }
}

impl Flavour for HashMap<String, Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect())
    }
}

impl Flavour for IndexMap<String, Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect())
    }
}

impl Flavour for serde_json::Map<String, serde_json::Value> {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(row
            .iter()
            .map(|(name, value)| (name.to_string(), json_value(value)))
            .collect())
    }
}

fn json_value(value: &Value) -> serde_json::Value {
    use serde_json::Value as Json;
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::TinyInt(v) => Json::from(*v),
        Value::SmallInt(v) => Json::from(*v),
        Value::Int(v) => Json::from(*v),
        Value::BigInt(v) => Json::from(*v),
        Value::Float(v) => serde_json::Number::from_f64(f64::from(*v)).map_or(Json::Null, Json::Number),
        Value::Double(v) => serde_json::Number::from_f64(*v).map_or(Json::Null, Json::Number),
        Value::Bytes(bytes) => Json::Array(bytes.iter().map(|b| Json::from(*b)).collect()),
        Value::Point(p) => Json::String(p.to_wkt()),
        Value::Json(json) => json.clone(),
        Value::Array(items) => Json::Array(items.iter().map(json_value).collect()),
        Value::Decimal(_) | Value::Text(_) | Value::Date(_) | Value::Time(_) | Value::Timestamp(_) => {
            Json::String(value.to_string())
        }
    }
}

macro_rules! impl_flavour_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: FromValue),+> Flavour for ($($name,)+) {
            fn from_row(row: &Row) -> Result<Self> {
                let expected = [$($idx),+].len();
                if row.len() != expected {
                    return Err(Error::expression(
                        ExpressionErrorKind::Arity,
                        format!("row has {} columns but the tuple expects {}", row.len(), expected),
                    ));
                }
                Ok(($(row.get_as::<$name>($idx)?,)+))
            }
        }
    };
}

impl_flavour_tuple!(A 0);
impl_flavour_tuple!(A 0, B 1);
impl_flavour_tuple!(A 0, B 1, C 2);
impl_flavour_tuple!(A 0, B 1, C 2, D 3);
impl_flavour_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_flavour_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
