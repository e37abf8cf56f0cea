//! Spatial point host type.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ValueErrorKind};

/// A two-dimensional point, written to SQL as WKT (`POINT(x y)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Well-known-text form.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POINT({} {})", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::value(
                ValueErrorKind::Conversion,
                format!("'{}' is not a WKT point", s),
            )
        };
        let trimmed = s.trim();
        let body = trimmed
            .get(..5)
            .filter(|head| head.eq_ignore_ascii_case("POINT"))
            .and_then(|_| trimmed[5..].trim_start().strip_prefix('('))
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(invalid)?;

        let mut coords = body.split_whitespace();
        let x = coords.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
        let y = coords.next().and_then(|v| v.parse().ok()).ok_or_else(invalid)?;
        if coords.next().is_some() {
            return Err(invalid());
        }
        Ok(Point { x, y })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wkt_round_trip() {
        let p = Point::new(-3.5, 40.25);
        assert_eq!(p.to_wkt(), "POINT(-3.5 40.25)");
        assert_eq!(p.to_wkt().parse::<Point>().unwrap(), p);
    }

    #[test]
    fn test_wkt_parse_is_lenient_on_case_and_spacing() {
        let p: Point = "point ( 1 2 )".parse().unwrap();
        assert_eq!(p, Point::new(1.0, 2.0));
    }

    #[test]
    fn test_wkt_rejects_extra_coordinates() {
        assert!("POINT(1 2 3)".parse::<Point>().is_err());
        assert!("LINESTRING(1 2, 3 4)".parse::<Point>().is_err());
    }
}
