//! SQL identifier quoting and validation utilities.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("identifier pattern compiles")
});

/// Quote a SQL identifier using ANSI double-quoting.
///
/// Embedded double-quotes are escaped by doubling them (`"` → `""`).
///
/// ```
/// use ormlambda_core::quote_ident;
///
/// assert_eq!(quote_ident("users"), "\"users\"");
/// assert_eq!(quote_ident("user\"name"), "\"user\"\"name\"");
/// ```
#[inline]
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL identifier using MySQL backtick quoting.
///
/// ```
/// use ormlambda_core::quote_ident_mysql;
///
/// assert_eq!(quote_ident_mysql("d_c"), "`d_c`");
/// assert_eq!(quote_ident_mysql("user`name"), "`user``name`");
/// ```
#[inline]
pub fn quote_ident_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Whether `name` can be used unquoted as a table, column or relationship name.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_sql_keyword() {
        assert_eq!(quote_ident("select"), "\"select\"");
    }

    #[test]
    fn test_quote_ident_mysql_escapes_backtick() {
        assert_eq!(quote_ident_mysql("a`b`c"), "`a``b``c`");
    }

    #[test]
    fn test_valid_identifiers() {
        assert!(is_valid_identifier("pk_d"));
        assert!(is_valid_identifier("_private"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("users; DROP TABLE x"));
        assert!(!is_valid_identifier("a.b"));
    }
}
