//! Result rows returned by a repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::Result;
use crate::error::{Error, TypeError};
use crate::spatial::Point;
use crate::temporal::{Date, Time, Timestamp};
use crate::value::{Decimal, Value};

/// Column names shared by all rows of one result set.
#[derive(Debug, Clone, Default)]
pub struct RowColumns {
    names: Vec<String>,
    name_to_index: HashMap<String, usize>,
}

impl RowColumns {
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single row: values in select order plus shared column names.
#[derive(Debug, Clone)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<RowColumns>,
}

impl Row {
    /// Create a row with its own column metadata.
    ///
    /// For many rows of one result set prefer [`Row::with_columns`].
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        Self {
            values,
            columns: Arc::new(RowColumns::new(column_names)),
        }
    }

    pub fn with_columns(columns: Arc<RowColumns>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    pub fn columns(&self) -> Arc<RowColumns> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.columns.index_of(name).is_some()
    }

    /// Get a typed value by column index.
    #[allow(clippy::result_large_err)]
    pub fn get_as<T: FromValue>(&self, index: usize) -> Result<T> {
        let value = self.get(index).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!(
                    "index {} out of bounds (row has {} columns)",
                    index,
                    self.len()
                ),
                column: None,
                rust_type: None,
            })
        })?;
        T::from_value(value)
    }

    /// Get a typed value by column name.
    #[allow(clippy::result_large_err)]
    pub fn get_named<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self.get_by_name(name).ok_or_else(|| {
            Error::Type(TypeError {
                expected: std::any::type_name::<T>(),
                actual: format!("column '{}' not found", name),
                column: Some(name.to_string()),
                rust_type: None,
            })
        })?;
        T::from_value(value).map_err(|e| match e {
            Error::Type(mut te) => {
                te.column = Some(name.to_string());
                Error::Type(te)
            }
            e => e,
        })
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterate over (column_name, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.column_names().zip(self.values.iter())
    }
}

/// Conversion from a [`Value`] cell into a host type.
pub trait FromValue: Sized {
    #[allow(clippy::result_large_err)]
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(expected: &'static str, value: &Value) -> Error {
    Error::Type(TypeError {
        expected,
        actual: value.type_name().to_string(),
        column: None,
        rust_type: Some(expected),
    })
}

fn out_of_range(expected: &'static str, v: i64) -> Error {
    Error::Type(TypeError {
        expected,
        actual: format!("value {} out of range", v),
        column: None,
        rust_type: Some(expected),
    })
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("i64", value))
    }
}

macro_rules! narrow_int {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(value: &Value) -> Result<Self> {
                    let v = value
                        .as_i64()
                        .ok_or_else(|| mismatch(stringify!($t), value))?;
                    <$t>::try_from(v).map_err(|_| out_of_range(stringify!($t), v))
                }
            }
        )*
    };
}

narrow_int!(i8, i16, i32, u8, u16, u32, u64);

#[allow(clippy::cast_possible_truncation)]
impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(*v),
            other => other
                .as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| mismatch("f32", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("f64", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Text(s) | Value::Decimal(s) => Ok(s.clone()),
            _ => Err(mismatch("String", value)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Bytes(b) => Ok(b.clone()),
            Value::Text(s) => Ok(s.as_bytes().to_vec()),
            _ => Err(mismatch("Vec<u8>", value)),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Decimal(s) | Value::Text(s) => Ok(Decimal(s.clone())),
            other if other.as_i64().is_some() || other.as_f64().is_some() => {
                Ok(Decimal(other.to_string()))
            }
            _ => Err(mismatch("Decimal", value)),
        }
    }
}

impl FromValue for Date {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Date(d) => Ok(*d),
            Value::Timestamp(ts) => Ok(ts.date()),
            Value::Text(s) => s.parse(),
            _ => Err(mismatch("Date", value)),
        }
    }
}

impl FromValue for Time {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Time(t) => Ok(*t),
            Value::Text(s) => s.parse(),
            _ => Err(mismatch("Time", value)),
        }
    }
}

impl FromValue for Timestamp {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Date(d) => Ok(Timestamp::from_parts(*d, Time(0))),
            Value::Text(s) => s.parse(),
            _ => Err(mismatch("Timestamp", value)),
        }
    }
}

impl FromValue for Point {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Point(p) => Ok(*p),
            Value::Text(s) => s.parse(),
            _ => Err(mismatch("Point", value)),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v.clone()),
            Value::Text(s) => serde_json::from_str(s).map_err(|e| {
                Error::Type(TypeError {
                    expected: "valid JSON",
                    actual: format!("invalid JSON: {}", e),
                    column: None,
                    rust_type: None,
                })
            }),
            _ => Err(mismatch("JSON", value)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_basic_access() {
        let row = Row::new(
            vec!["d_pk_d".to_string(), "d_data_d".to_string()],
            vec![Value::BigInt(1), Value::Text("x".to_string())],
        );

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::BigInt(1)));
        assert_eq!(row.get_by_name("d_data_d"), Some(&Value::Text("x".into())));
        assert_eq!(row.get_by_name("missing"), None);
    }

    #[test]
    fn test_row_typed_access_and_errors() {
        let row = Row::new(
            vec!["id".to_string(), "name".to_string()],
            vec![Value::Int(42), Value::Text("Bob".to_string())],
        );

        assert_eq!(row.get_as::<i64>(0).unwrap(), 42);
        assert_eq!(row.get_named::<String>("name").unwrap(), "Bob");

        let err = row.get_named::<i32>("name").unwrap_err();
        assert!(err.to_string().contains("'name'"));
        assert!(row.get_named::<i32>("missing").is_err());
        assert!(row.get_as::<i32>(9).is_err());
    }

    #[test]
    fn test_row_null_handling() {
        let row = Row::new(vec!["nullable".to_string()], vec![Value::Null]);
        assert_eq!(row.get_named::<Option<i32>>("nullable").unwrap(), None);
        assert!(row.get_named::<i32>("nullable").is_err());
    }

    #[test]
    fn test_narrowing_checks_range() {
        assert_eq!(u8::from_value(&Value::BigInt(255)).unwrap(), 255);
        assert!(u8::from_value(&Value::BigInt(256)).is_err());
        assert!(u64::from_value(&Value::BigInt(-1)).is_err());
    }

    #[test]
    fn test_host_types_from_text() {
        let p = Point::from_value(&Value::Text("POINT(1 2)".into())).unwrap();
        assert_eq!(p, Point::new(1.0, 2.0));

        let ts = Timestamp::from_value(&Value::Text("2020-01-02 03:04:05".into())).unwrap();
        assert_eq!(ts.to_string(), "2020-01-02 03:04:05");

        let dec = Decimal::from_value(&Value::Int(12)).unwrap();
        assert_eq!(dec.as_str(), "12");
    }

    #[test]
    fn test_row_iter_pairs() {
        let row = Row::new(
            vec!["a".to_string(), "b".to_string()],
            vec![Value::Int(1), Value::Int(2)],
        );
        let pairs: Vec<_> = row.iter().map(|(n, v)| (n.to_string(), v.clone())).collect();
        assert_eq!(
            pairs,
            vec![
                ("a".to_string(), Value::Int(1)),
                ("b".to_string(), Value::Int(2))
            ]
        );
    }
}
