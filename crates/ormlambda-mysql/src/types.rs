//! Type conversion between host values and MySQL SQL text.
//!
//! The caster starts from the standard one and overrides what MySQL spells
//! differently: strings use backslash escapes, spatial points travel as WKT
//! through `ST_GeomFromText`, and point cells come back as WKT text.

use ormlambda_core::{
    Caster, Error, Point, Result, SqlType, Value, ValueErrorKind, ValueKind, WriteCast,
};

/// Escape a string for use in MySQL text protocol.
///
/// This escapes special characters to prevent SQL injection.
pub fn escape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' => result.push_str("''"),
            '\\' => result.push_str("\\\\"),
            '\0' => result.push_str("\\0"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\x1a' => result.push_str("\\Z"), // Ctrl+Z
            _ => result.push(ch),
        }
    }
    result.push('\'');
    result
}

/// Points are written as WKT wrapped in `ST_GeomFromText`, both inline and
/// as a bound parameter.
struct PointWriter;

impl PointWriter {
    fn wkt(value: &Value) -> Result<String> {
        match value {
            Value::Point(p) => Ok(p.to_wkt()),
            other => Err(Error::value(
                ValueErrorKind::Conversion,
                format!("expected a point, got {}", other.type_name()),
            )),
        }
    }
}

impl WriteCast for PointWriter {
    fn literal(&self, value: &Value) -> Result<String> {
        Ok(format!("ST_GeomFromText({})", escape_string(&Self::wkt(value)?)))
    }

    fn placeholder(&self, _value: &Value, marker: &str) -> String {
        format!("ST_GeomFromText({})", marker)
    }

    fn parameter(&self, value: &Value) -> Result<Value> {
        Ok(Value::Text(Self::wkt(value)?))
    }
}

fn read_point(raw: Value) -> Result<Value> {
    match raw {
        Value::Point(_) => Ok(raw),
        Value::Text(text) => text.parse::<Point>().map(Value::Point),
        Value::Bytes(bytes) => {
            tracing::trace!(len = bytes.len(), "reading point from a binary cell as WKT");
            String::from_utf8_lossy(&bytes)
                .parse::<Point>()
                .map(Value::Point)
        }
        other => Err(Error::value(
            ValueErrorKind::Conversion,
            format!("cannot read a point from {}", other.type_name()),
        )),
    }
}

/// The caster used by [`MySqlDialect`](crate::MySqlDialect).
pub fn mysql_caster() -> Caster {
    let mut caster = Caster::ansi();
    caster
        .register_write_fn(ValueKind::Text, |v| Ok(escape_string(&v.to_string())))
        .register_write_fn(ValueKind::Json, |v| Ok(escape_string(&v.to_string())))
        .register_writer(ValueKind::Point, PointWriter);
    caster.register_read_fn(ValueKind::Point, read_point);
    caster
}

/// MySQL column type for a declared SQL type.
pub fn mysql_type_name(sql_type: &SqlType) -> String {
    match sql_type {
        SqlType::Double => "DOUBLE".to_string(),
        SqlType::Real => "FLOAT".to_string(),
        SqlType::Boolean => "TINYINT(1)".to_string(),
        SqlType::Blob => "LONGBLOB".to_string(),
        other => other.sql_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ormlambda_core::Timestamp;

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello"), "'hello'");
        assert_eq!(escape_string("it's"), "'it''s'");
        assert_eq!(escape_string("a\\b"), "'a\\\\b'");
        assert_eq!(escape_string("line\nbreak"), "'line\\nbreak'");
    }

    #[test]
    fn test_literals() {
        let caster = mysql_caster();
        assert_eq!(caster.literal(&Value::Null).unwrap(), "NULL");
        assert_eq!(caster.literal(&Value::Int(42)).unwrap(), "42");
        assert_eq!(caster.literal(&Value::Bool(true)).unwrap(), "TRUE");
        assert_eq!(caster.literal(&Value::from("a\\b")).unwrap(), "'a\\\\b'");

        let ts = Timestamp::from_ymd_hms(2024, 5, 17, 8, 4, 59).unwrap();
        assert_eq!(
            caster.literal(&Value::Timestamp(ts)).unwrap(),
            "'2024-05-17 08:04:59'"
        );
    }

    #[test]
    fn test_point_round_trip_through_wkt() {
        let caster = mysql_caster();
        let point = Value::Point(Point::new(1.5, -2.0));
        assert_eq!(
            caster.literal(&point).unwrap(),
            "ST_GeomFromText('POINT(1.5 -2)')"
        );
        assert_eq!(
            caster.placeholder(&point, "%s").unwrap(),
            "ST_GeomFromText(%s)"
        );
        let bound = caster.parameter(&point).unwrap();
        assert_eq!(bound, Value::from("POINT(1.5 -2)"));
        assert_eq!(caster.read(ValueKind::Point, bound).unwrap(), point);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(mysql_type_name(&SqlType::Double), "DOUBLE");
        assert_eq!(mysql_type_name(&SqlType::VarChar(40)), "VARCHAR(40)");
        assert_eq!(mysql_type_name(&SqlType::Boolean), "TINYINT(1)");
    }
}
