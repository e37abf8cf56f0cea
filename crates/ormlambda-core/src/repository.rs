//! The repository contract.
//!
//! A repository is the thin driver wrapper an engine hands finished SQL to.
//! The core never opens connections itself; callers supply an implementation
//! of [`Repository`] for their driver of choice.

use std::fmt;
use std::str::FromStr;

use crate::Result;
use crate::error::{Error, ValueErrorKind};
use crate::row::Row;
use crate::value::Value;

/// What to do when a table or database being created already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IfExists {
    /// Report an error.
    #[default]
    Fail,
    /// Drop the existing object and create it again.
    Replace,
    /// Create under the first free suffixed name (`name_1`, `name_2`, ...).
    Append,
}

impl IfExists {
    pub const fn as_str(self) -> &'static str {
        match self {
            IfExists::Fail => "fail",
            IfExists::Replace => "replace",
            IfExists::Append => "append",
        }
    }
}

impl fmt::Display for IfExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IfExists {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(IfExists::Fail),
            "replace" => Ok(IfExists::Replace),
            "append" => Ok(IfExists::Append),
            other => Err(Error::value(
                ValueErrorKind::Conversion,
                format!("'{}' is not one of fail, replace, append", other),
            )),
        }
    }
}

/// A database driver wrapper that executes finished statements.
///
/// Implementations must be `Send + Sync`; an engine may be shared across
/// threads even though each statement is compiled on one thread.
pub trait Repository: Send + Sync {
    /// Execute a statement without parameters.
    #[allow(clippy::result_large_err)]
    fn execute(&self, sql: &str) -> Result<()>;

    /// Execute a statement with one parameter list.
    #[allow(clippy::result_large_err)]
    fn execute_with_values(&self, sql: &str, params: &[Value]) -> Result<()>;

    /// Execute one statement once per parameter list.
    #[allow(clippy::result_large_err)]
    fn executemany_with_values(&self, sql: &str, params: &[Vec<Value>]) -> Result<()>;

    /// Run a query and return its raw rows, named by select alias.
    #[allow(clippy::result_large_err)]
    fn read_sql(&self, sql: &str) -> Result<Vec<Row>>;

    #[allow(clippy::result_large_err)]
    fn table_exists(&self, name: &str) -> Result<bool>;

    #[allow(clippy::result_large_err)]
    fn database_exists(&self, name: &str) -> Result<bool>;

    #[allow(clippy::result_large_err)]
    fn drop_table(&self, name: &str) -> Result<()>;

    #[allow(clippy::result_large_err)]
    fn create_database(&self, name: &str, if_exists: IfExists) -> Result<()>;

    #[allow(clippy::result_large_err)]
    fn drop_database(&self, name: &str) -> Result<()>;
}
