//! SQL type definitions and mapping.

use crate::spatial::Point;
use crate::temporal::{Date, Time, Timestamp};
use crate::value::{Decimal, ValueKind};

/// Declared SQL types of columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlType {
    // Integer types
    TinyInt,
    SmallInt,
    Integer,
    BigInt,

    // Floating point
    Real,
    Double,

    // Fixed precision
    Decimal { precision: u8, scale: u8 },

    // Boolean
    Boolean,

    // String types
    Char(u32),
    VarChar(u32),
    Text,

    // Binary types
    Blob,

    // Date/time types
    Date,
    Time,
    DateTime,
    Timestamp,

    // Spatial
    Point,

    // JSON
    Json,

    // Custom type name, rendered verbatim in DDL
    Custom(&'static str),
}

impl SqlType {
    /// Generic SQL type name for this type.
    ///
    /// Dialects may override individual names in their type compiler.
    pub fn sql_name(&self) -> String {
        match self {
            SqlType::TinyInt => "TINYINT".to_string(),
            SqlType::SmallInt => "SMALLINT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::Double => "DOUBLE PRECISION".to_string(),
            SqlType::Decimal { precision, scale } => format!("DECIMAL({}, {})", precision, scale),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Char(len) => format!("CHAR({})", len),
            SqlType::VarChar(len) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Blob => "BLOB".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Time => "TIME".to_string(),
            SqlType::DateTime => "DATETIME".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Point => "POINT".to_string(),
            SqlType::Json => "JSON".to_string(),
            SqlType::Custom(name) => (*name).to_string(),
        }
    }

    /// The host value kind a raw cell of this type is read back into.
    ///
    /// The caster's READ direction is keyed by this kind.
    pub const fn value_kind(&self) -> ValueKind {
        match self {
            SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt => {
                ValueKind::Integer
            }
            SqlType::Real | SqlType::Double => ValueKind::Float,
            SqlType::Decimal { .. } => ValueKind::Decimal,
            SqlType::Boolean => ValueKind::Bool,
            SqlType::Char(_) | SqlType::VarChar(_) | SqlType::Text | SqlType::Custom(_) => {
                ValueKind::Text
            }
            SqlType::Blob => ValueKind::Bytes,
            SqlType::Date => ValueKind::Date,
            SqlType::Time => ValueKind::Time,
            SqlType::DateTime | SqlType::Timestamp => ValueKind::Timestamp,
            SqlType::Point => ValueKind::Point,
            SqlType::Json => ValueKind::Json,
        }
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::Integer
                | SqlType::BigInt
                | SqlType::Real
                | SqlType::Double
                | SqlType::Decimal { .. }
        )
    }

    /// Check if this type is a date/time type.
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            SqlType::Date | SqlType::Time | SqlType::DateTime | SqlType::Timestamp
        )
    }
}

/// Trait for types that have a corresponding SQL type.
///
/// The derive macro uses this to declare a column's type from its field type.
pub trait TypeInfo {
    /// The SQL type for this Rust type.
    const SQL_TYPE: SqlType;

    /// Whether this type is nullable by default.
    const NULLABLE: bool = false;
}

impl TypeInfo for i8 {
    const SQL_TYPE: SqlType = SqlType::TinyInt;
}

impl TypeInfo for i16 {
    const SQL_TYPE: SqlType = SqlType::SmallInt;
}

impl TypeInfo for i32 {
    const SQL_TYPE: SqlType = SqlType::Integer;
}

impl TypeInfo for i64 {
    const SQL_TYPE: SqlType = SqlType::BigInt;
}

impl TypeInfo for f32 {
    const SQL_TYPE: SqlType = SqlType::Real;
}

impl TypeInfo for f64 {
    const SQL_TYPE: SqlType = SqlType::Double;
}

impl TypeInfo for bool {
    const SQL_TYPE: SqlType = SqlType::Boolean;
}

impl TypeInfo for String {
    const SQL_TYPE: SqlType = SqlType::VarChar(255);
}

impl TypeInfo for Vec<u8> {
    const SQL_TYPE: SqlType = SqlType::Blob;
}

impl TypeInfo for Decimal {
    const SQL_TYPE: SqlType = SqlType::Decimal {
        precision: 10,
        scale: 2,
    };
}

impl TypeInfo for Date {
    const SQL_TYPE: SqlType = SqlType::Date;
}

impl TypeInfo for Time {
    const SQL_TYPE: SqlType = SqlType::Time;
}

impl TypeInfo for Timestamp {
    const SQL_TYPE: SqlType = SqlType::DateTime;
}

impl TypeInfo for Point {
    const SQL_TYPE: SqlType = SqlType::Point;
}

impl TypeInfo for serde_json::Value {
    const SQL_TYPE: SqlType = SqlType::Json;
}

impl<T: TypeInfo> TypeInfo for Option<T> {
    const SQL_TYPE: SqlType = T::SQL_TYPE;
    const NULLABLE: bool = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_is_nullable() {
        assert!(<Option<i64> as TypeInfo>::NULLABLE);
        assert!(!<i64 as TypeInfo>::NULLABLE);
        assert_eq!(<Option<Point> as TypeInfo>::SQL_TYPE, SqlType::Point);
    }

    #[test]
    fn test_value_kind_for_read_dispatch() {
        assert_eq!(SqlType::DateTime.value_kind(), ValueKind::Timestamp);
        assert_eq!(SqlType::Boolean.value_kind(), ValueKind::Bool);
        assert_eq!(SqlType::VarChar(10).value_kind(), ValueKind::Text);
    }
}
