//! Bidirectional value transcoding.
//!
//! The WRITE direction turns a [`Value`] into either an inline SQL literal or
//! a bound parameter (with the placeholder text that receives it). The READ
//! direction turns a raw cell handed back by a repository into the host value
//! a column's declared type expects.
//!
//! Both directions dispatch on [`ValueKind`]. A dialect builds its caster by
//! starting from [`Caster::ansi`] and registering overrides; nothing already
//! registered needs to change for a new kind to be supported.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::Result;
use crate::error::{Error, ValueErrorKind};
use crate::value::{Value, ValueKind};

static DECIMAL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal pattern compiles"));

/// WRITE direction for one value kind.
pub trait WriteCast: Send + Sync {
    /// Inline SQL literal for `value`.
    #[allow(clippy::result_large_err)]
    fn literal(&self, value: &Value) -> Result<String>;

    /// Placeholder text that receives the bound form of `value`.
    fn placeholder(&self, _value: &Value, marker: &str) -> String {
        marker.to_string()
    }

    /// The value actually bound for a placeholder.
    #[allow(clippy::result_large_err)]
    fn parameter(&self, value: &Value) -> Result<Value> {
        Ok(value.clone())
    }
}

/// READ direction for one value kind.
pub trait ReadCast: Send + Sync {
    #[allow(clippy::result_large_err)]
    fn read(&self, raw: Value) -> Result<Value>;
}

struct LiteralFn<F>(F);

impl<F> WriteCast for LiteralFn<F>
where
    F: Fn(&Value) -> Result<String> + Send + Sync,
{
    fn literal(&self, value: &Value) -> Result<String> {
        (self.0)(value)
    }
}

struct ReadFn<F>(F);

impl<F> ReadCast for ReadFn<F>
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn read(&self, raw: Value) -> Result<Value> {
        (self.0)(raw)
    }
}

/// Per-kind registry of writers and readers.
#[derive(Clone, Default)]
pub struct Caster {
    writers: HashMap<ValueKind, Arc<dyn WriteCast>>,
    readers: HashMap<ValueKind, Arc<dyn ReadCast>>,
    default_writer: Option<Arc<dyn WriteCast>>,
    default_reader: Option<Arc<dyn ReadCast>>,
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writers: Vec<_> = self.writers.keys().collect();
        writers.sort();
        let mut readers: Vec<_> = self.readers.keys().collect();
        readers.sort();
        f.debug_struct("Caster")
            .field("writers", &writers)
            .field("readers", &readers)
            .field("default_writer", &self.default_writer.is_some())
            .field("default_reader", &self.default_reader.is_some())
            .finish()
    }
}

impl Caster {
    /// A caster with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard SQL casting for every kind except spatial points.
    ///
    /// Strings are single-quoted with quotes doubled, booleans render as
    /// `TRUE`/`FALSE`, temporal values as quoted ISO text. Raw cells read
    /// back pass through unless their textual form needs parsing.
    pub fn ansi() -> Self {
        let mut caster = Self::empty();
        caster
            .register_write_fn(ValueKind::Null, |_| Ok("NULL".to_string()))
            .register_write_fn(ValueKind::Bool, |v| {
                Ok(if v.as_bool() == Some(true) { "TRUE" } else { "FALSE" }.to_string())
            })
            .register_write_fn(ValueKind::Integer, |v| Ok(v.to_string()))
            .register_write_fn(ValueKind::Float, write_float)
            .register_write_fn(ValueKind::Decimal, write_decimal)
            .register_write_fn(ValueKind::Text, |v| Ok(quote_string(&v.to_string())))
            .register_write_fn(ValueKind::Bytes, write_bytes)
            .register_write_fn(ValueKind::Date, |v| Ok(quote_string(&v.to_string())))
            .register_write_fn(ValueKind::Time, |v| Ok(quote_string(&v.to_string())))
            .register_write_fn(ValueKind::Timestamp, |v| Ok(quote_string(&v.to_string())))
            .register_write_fn(ValueKind::Json, |v| Ok(quote_string(&v.to_string())));

        caster
            .register_read_fn(ValueKind::Bool, read_bool)
            .register_read_fn(ValueKind::Integer, read_integer)
            .register_read_fn(ValueKind::Float, read_float)
            .register_read_fn(ValueKind::Decimal, read_decimal)
            .register_read_fn(ValueKind::Date, |raw| parse_text(raw, |s| s.parse().map(Value::Date)))
            .register_read_fn(ValueKind::Time, |raw| parse_text(raw, |s| s.parse().map(Value::Time)))
            .register_read_fn(ValueKind::Timestamp, read_timestamp)
            .register_read_fn(ValueKind::Json, read_json);
        caster
    }

    pub fn register_writer(
        &mut self,
        kind: ValueKind,
        writer: impl WriteCast + 'static,
    ) -> &mut Self {
        self.writers.insert(kind, Arc::new(writer));
        self
    }

    /// Register a writer that only knows how to render inline literals.
    pub fn register_write_fn<F>(&mut self, kind: ValueKind, f: F) -> &mut Self
    where
        F: Fn(&Value) -> Result<String> + Send + Sync + 'static,
    {
        self.register_writer(kind, LiteralFn(f))
    }

    pub fn register_reader(&mut self, kind: ValueKind, reader: impl ReadCast + 'static) -> &mut Self {
        self.readers.insert(kind, Arc::new(reader));
        self
    }

    pub fn register_read_fn<F>(&mut self, kind: ValueKind, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_reader(kind, ReadFn(f))
    }

    /// Writer used for kinds without a registered writer.
    pub fn set_default_writer(&mut self, writer: impl WriteCast + 'static) -> &mut Self {
        self.default_writer = Some(Arc::new(writer));
        self
    }

    /// Reader used for kinds without a registered reader.
    ///
    /// Without one, unregistered kinds are passed through unchanged.
    pub fn set_default_reader(&mut self, reader: impl ReadCast + 'static) -> &mut Self {
        self.default_reader = Some(Arc::new(reader));
        self
    }

    pub fn has_writer(&self, kind: ValueKind) -> bool {
        self.writers.contains_key(&kind)
    }

    fn writer(&self, value: &Value) -> Result<&Arc<dyn WriteCast>> {
        self.writers
            .get(&value.kind())
            .or(self.default_writer.as_ref())
            .ok_or_else(|| {
                Error::value(
                    ValueErrorKind::UnsupportedType,
                    format!("no caster registered for {} values", value.type_name()),
                )
            })
    }

    /// Inline SQL literal for `value`.
    ///
    /// Arrays render as a parenthesized, comma-joined list of their items'
    /// literals unless a writer for arrays is registered.
    pub fn literal(&self, value: &Value) -> Result<String> {
        if let Value::Array(items) = value {
            if self.has_writer(ValueKind::Array) {
                return self.writer(value)?.literal(value);
            }
            let parts = items
                .iter()
                .map(|item| self.literal(item))
                .collect::<Result<Vec<_>>>()?;
            return Ok(format!("({})", parts.join(", ")));
        }
        self.writer(value)?.literal(value)
    }

    /// Placeholder text for one bound `value`, given the dialect's marker.
    pub fn placeholder(&self, value: &Value, marker: &str) -> Result<String> {
        Ok(self.writer(value)?.placeholder(value, marker))
    }

    /// The value bound for `value`'s placeholder.
    pub fn parameter(&self, value: &Value) -> Result<Value> {
        self.writer(value)?.parameter(value)
    }

    /// Convert a raw cell into the host value for `kind`.
    ///
    /// NULL stays NULL whatever the kind.
    pub fn read(&self, kind: ValueKind, raw: Value) -> Result<Value> {
        if raw.is_null() {
            return Ok(Value::Null);
        }
        match self.readers.get(&kind).or(self.default_reader.as_ref()) {
            Some(reader) => reader.read(raw),
            None => Ok(raw),
        }
    }
}

/// Single-quote a string, doubling embedded quotes.
pub fn quote_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn conversion(message: String) -> Error {
    Error::value(ValueErrorKind::Conversion, message)
}

fn write_float(value: &Value) -> Result<String> {
    match value.as_f64() {
        Some(v) if v.is_finite() => Ok(value.to_string()),
        _ => Err(conversion(format!("{} cannot be written as a SQL number", value))),
    }
}

fn write_decimal(value: &Value) -> Result<String> {
    let text = value.to_string();
    if DECIMAL_PATTERN.is_match(&text) {
        Ok(text)
    } else {
        Err(conversion(format!("'{}' is not a decimal number", text)))
    }
}

fn write_bytes(value: &Value) -> Result<String> {
    match value {
        Value::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            Ok(format!("X'{}'", hex))
        }
        other => Err(conversion(format!("{} is not binary data", other.type_name()))),
    }
}

fn parse_text(raw: Value, parse: impl Fn(&str) -> Result<Value>) -> Result<Value> {
    match &raw {
        Value::Text(s) => parse(s.trim()),
        Value::Bytes(b) => match std::str::from_utf8(b) {
            Ok(s) => parse(s.trim()),
            Err(_) => Err(conversion("raw bytes are not valid UTF-8".to_string())),
        },
        _ => Ok(raw),
    }
}

fn read_bool(raw: Value) -> Result<Value> {
    if let Some(b) = raw.as_bool() {
        return Ok(Value::Bool(b));
    }
    parse_text(raw, |s| match s.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(Value::Bool(true)),
        "0" | "false" => Ok(Value::Bool(false)),
        _ => Err(conversion(format!("'{}' is not a boolean", s))),
    })
}

fn read_integer(raw: Value) -> Result<Value> {
    parse_text(raw, |s| {
        s.parse::<i64>()
            .map(Value::BigInt)
            .map_err(|e| conversion(format!("'{}' is not an integer: {}", s, e)))
    })
}

fn read_float(raw: Value) -> Result<Value> {
    parse_text(raw, |s| {
        s.parse::<f64>()
            .map(Value::Double)
            .map_err(|e| conversion(format!("'{}' is not a number: {}", s, e)))
    })
}

fn read_decimal(raw: Value) -> Result<Value> {
    match raw {
        Value::Decimal(_) => Ok(raw),
        Value::Text(s) if DECIMAL_PATTERN.is_match(s.trim()) => Ok(Value::Decimal(s.trim().to_string())),
        Value::Text(s) => Err(conversion(format!("'{}' is not a decimal number", s))),
        other if other.as_f64().is_some() => Ok(Value::Decimal(other.to_string())),
        other => Ok(other),
    }
}

fn read_timestamp(raw: Value) -> Result<Value> {
    match raw {
        Value::Date(d) => Ok(Value::Timestamp(crate::temporal::Timestamp::from_parts(
            d,
            crate::temporal::Time(0),
        ))),
        other => parse_text(other, |s| s.parse().map(Value::Timestamp)),
    }
}

fn read_json(raw: Value) -> Result<Value> {
    parse_text(raw, |s| {
        serde_json::from_str(s)
            .map(Value::Json)
            .map_err(|e| conversion(format!("invalid JSON: {}", e)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::Point;
    use crate::temporal::Timestamp;

    #[test]
    fn test_ansi_literals() {
        let caster = Caster::ansi();
        assert_eq!(caster.literal(&Value::from("it's")).unwrap(), "'it''s'");
        assert_eq!(caster.literal(&Value::Int(5)).unwrap(), "5");
        assert_eq!(caster.literal(&Value::Null).unwrap(), "NULL");
        assert_eq!(caster.literal(&Value::Bool(true)).unwrap(), "TRUE");
        assert_eq!(caster.literal(&Value::Bytes(vec![0xAB, 1])).unwrap(), "X'AB01'");

        let ts = Timestamp::from_ymd_hms(2024, 2, 29, 13, 5, 9).unwrap();
        assert_eq!(caster.literal(&ts.into()).unwrap(), "'2024-02-29 13:05:09'");
    }

    #[test]
    fn test_array_renders_parenthesized_list() {
        let caster = Caster::ansi();
        let list = Value::from(vec!["a", "b"]);
        assert_eq!(caster.literal(&list).unwrap(), "('a', 'b')");
    }

    #[test]
    fn test_decimal_is_validated() {
        let caster = Caster::ansi();
        assert_eq!(caster.literal(&Value::Decimal("-12.50".into())).unwrap(), "-12.50");
        let err = caster.literal(&Value::Decimal("12; DROP".into())).unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::Conversion));
    }

    #[test]
    fn test_unregistered_kind_without_default_fails() {
        let caster = Caster::ansi();
        let err = caster.literal(&Point::new(1.0, 2.0).into()).unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::UnsupportedType));
    }

    #[test]
    fn test_registration_extends_without_touching_others() {
        let mut caster = Caster::ansi();
        caster.register_write_fn(ValueKind::Point, |v| Ok(format!("'{}'", v)));
        assert_eq!(
            caster.literal(&Point::new(1.0, 2.0).into()).unwrap(),
            "'POINT(1 2)'"
        );
        assert_eq!(caster.literal(&Value::Int(1)).unwrap(), "1");
    }

    #[test]
    fn test_default_writer_catches_everything() {
        let mut caster = Caster::empty();
        caster.set_default_writer(LiteralFn(|_: &Value| Ok::<_, Error>("?".to_string())));
        assert_eq!(caster.literal(&Value::Int(1)).unwrap(), "?");
        assert_eq!(caster.placeholder(&Value::Int(1), "%s").unwrap(), "%s");
    }

    #[test]
    fn test_read_direction() {
        let caster = Caster::ansi();
        assert_eq!(
            caster.read(ValueKind::Bool, Value::TinyInt(1)).unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            caster
                .read(ValueKind::Timestamp, Value::Text("2020-01-02T03:04:05".into()))
                .unwrap()
                .to_string(),
            "2020-01-02 03:04:05"
        );
        assert_eq!(caster.read(ValueKind::Date, Value::Null).unwrap(), Value::Null);
        // No point reader: passthrough.
        assert_eq!(
            caster.read(ValueKind::Point, Value::Text("POINT(1 2)".into())).unwrap(),
            Value::Text("POINT(1 2)".into())
        );
        assert!(caster.read(ValueKind::Integer, Value::Text("x".into())).is_err());
    }
}
