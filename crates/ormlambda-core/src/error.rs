//! Error types for ormlambda operations.

use std::fmt;

/// The primary error type for all ormlambda operations.
#[derive(Debug)]
pub enum Error {
    /// A table declaration is malformed (raised when the schema is registered)
    Declaration(DeclarationError),
    /// An expression could not be turned into a clause
    Expression(ExpressionError),
    /// A column reference or alias could not be resolved while compiling
    Resolution(ResolutionError),
    /// A value supplied by the caller is unusable
    Value(ValueError),
    /// Type conversion errors while reading rows back
    Type(TypeError),
    /// Errors surfaced by the repository collaborator
    Repository(RepositoryError),
    /// Configuration errors (connection URL, dialect selection)
    Config(ConfigError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug)]
pub struct DeclarationError {
    pub kind: DeclarationErrorKind,
    pub table: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationErrorKind {
    /// Table name is empty or not a valid identifier
    TableName,
    /// Two columns share a name
    DuplicateColumn,
    /// More than one column is flagged as primary key
    MultiplePrimaryKeys,
    /// A foreign key references a column that does not exist
    ForeignKey,
}

#[derive(Debug)]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpressionErrorKind {
    /// A comparison chain holds a number of operators other than 1 or 2
    OperatorCount,
    /// A comparison turned up where only column references were expected
    UnexpectedComparison,
    /// The number of selected groups does not match the requested output
    Arity,
    /// A selection item is not allowed in this clause
    InvalidItem,
}

#[derive(Debug)]
pub struct ResolutionError {
    pub kind: ResolutionErrorKind,
    /// Path key of the offending reference, when known
    pub path: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// A path walks a relationship that was never declared
    UnknownRelationship,
    /// A column belongs to a table that cannot be reached from the statement
    UnreachableTable,
    /// Two different tables were given the same alias
    AliasCollision,
    /// Joins reference each other in a way that cannot be ordered
    JoinCycle,
}

#[derive(Debug)]
pub struct ValueError {
    pub kind: ValueErrorKind,
    pub table: Option<String>,
    pub column: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueErrorKind {
    /// Delete requested on an instance without a primary key value
    MissingPrimaryKey,
    /// The column is not owned by the model
    UnknownColumn,
    /// No caster is registered for the value and no default exists
    UnsupportedType,
    /// Limit or offset is negative or not an integer
    InvalidLimit,
    /// Order direction token is not ASC or DESC
    InvalidOrder,
    /// A textual value could not be converted to the declared type
    Conversion,
    /// Table already exists and the create policy forbids it
    TableExists,
    /// An upsert has no column it may overwrite on conflict
    NothingToAssign,
    /// The dialect cannot express the requested statement
    UnsupportedStatement,
}

#[derive(Debug)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
    pub rust_type: Option<&'static str>,
}

#[derive(Debug)]
pub struct RepositoryError {
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub(crate) fn declaration(
        kind: DeclarationErrorKind,
        table: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Declaration(DeclarationError {
            kind,
            table: table.into(),
            message: message.into(),
        })
    }

    /// Build an expression error.
    pub fn expression(kind: ExpressionErrorKind, message: impl Into<String>) -> Self {
        Error::Expression(ExpressionError {
            kind,
            message: message.into(),
        })
    }

    /// Build a resolution error, optionally naming the offending path key.
    pub fn resolution(
        kind: ResolutionErrorKind,
        path: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Error::Resolution(ResolutionError {
            kind,
            path,
            message: message.into(),
        })
    }

    /// Build a value error without table/column context.
    pub fn value(kind: ValueErrorKind, message: impl Into<String>) -> Self {
        Error::Value(ValueError {
            kind,
            table: None,
            column: None,
            message: message.into(),
        })
    }

    /// Wrap a failure reported by a repository implementation.
    pub fn repository(
        sql: Option<&str>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Repository(RepositoryError {
            sql: sql.map(str::to_string),
            message: source.to_string(),
            source: Some(Box::new(source)),
        })
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Repository(e) => e.sql.as_deref(),
            _ => None,
        }
    }

    /// Is this a declaration-time error?
    pub fn is_declaration(&self) -> bool {
        matches!(self, Error::Declaration(_))
    }

    /// Kind of the value error, if this is one.
    pub fn value_kind(&self) -> Option<ValueErrorKind> {
        match self {
            Error::Value(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Kind of the resolution error, if this is one.
    pub fn resolution_kind(&self) -> Option<ResolutionErrorKind> {
        match self {
            Error::Resolution(e) => Some(e.kind),
            _ => None,
        }
    }

    /// Kind of the expression error, if this is one.
    pub fn expression_kind(&self) -> Option<ExpressionErrorKind> {
        match self {
            Error::Expression(e) => Some(e.kind),
            _ => None,
        }
    }
}

impl ValueError {
    /// Attach the owning table.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Attach the offending column.
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Declaration(e) => write!(f, "Declaration error: {}", e),
            Error::Expression(e) => write!(f, "Expression error: {}", e),
            Error::Resolution(e) => write!(f, "Resolution error: {}", e),
            Error::Value(e) => write!(f, "Value error: {}", e),
            Error::Type(e) => {
                if let Some(col) = &e.column {
                    write!(
                        f,
                        "Type error in column '{}': expected {}, found {}",
                        col, e.expected, e.actual
                    )
                } else {
                    write!(f, "Type error: expected {}, found {}", e.expected, e.actual)
                }
            }
            Error::Repository(e) => write!(f, "Repository error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Repository(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Config(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.table.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "table '{}': {}", self.table, self.message)
        }
    }
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{} (path '{}')", self.message, path)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.table, &self.column) {
            (Some(table), Some(column)) => write!(f, "{}.{}: {}", table, column, self.message),
            (Some(table), None) => write!(f, "{}: {}", table, self.message),
            (None, Some(column)) => write!(f, "{}: {}", column, self.message),
            (None, None) => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sql) = &self.sql {
            write!(f, "{} (while executing: {})", self.message, sql)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<DeclarationError> for Error {
    fn from(err: DeclarationError) -> Self {
        Error::Declaration(err)
    }
}

impl From<ExpressionError> for Error {
    fn from(err: ExpressionError) -> Self {
        Error::Expression(err)
    }
}

impl From<ResolutionError> for Error {
    fn from(err: ResolutionError) -> Self {
        Error::Resolution(err)
    }
}

impl From<ValueError> for Error {
    fn from(err: ValueError) -> Self {
        Error::Value(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        Error::Repository(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for ormlambda operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_error_display_carries_context() {
        let err: Error = ValueError {
            kind: ValueErrorKind::MissingPrimaryKey,
            table: None,
            column: None,
            message: "primary key is not set".to_string(),
        }
        .with_table("d")
        .with_column("pk_d")
        .into();

        assert_eq!(err.value_kind(), Some(ValueErrorKind::MissingPrimaryKey));
        assert_eq!(err.to_string(), "Value error: d.pk_d: primary key is not set");
    }

    #[test]
    fn test_resolution_error_names_path() {
        let err = Error::resolution(
            ResolutionErrorKind::UnknownRelationship,
            Some("d.c.x".to_string()),
            "relationship 'x' is not declared on 'c'",
        );
        assert_eq!(
            err.resolution_kind(),
            Some(ResolutionErrorKind::UnknownRelationship)
        );
        assert!(err.to_string().contains("path 'd.c.x'"));
    }

    #[test]
    fn test_repository_error_keeps_source_and_sql() {
        use std::error::Error as _;

        let io = std::io::Error::other("connection reset");
        let err = Error::repository(Some("SELECT 1"), io);

        assert_eq!(err.sql(), Some("SELECT 1"));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_declaration_flag() {
        let err = Error::declaration(DeclarationErrorKind::TableName, "", "table name is empty");
        assert!(err.is_declaration());
        assert_eq!(err.to_string(), "Declaration error: table name is empty");
    }
}
