//! Aggregate and scalar SQL functions.

use std::fmt;

use ormlambda_core::{CompareOp, Value};

use crate::expr::{Column, ColumnRef, Comparer, IntoOperand};
use crate::order::{Order, OrderItem};

/// Supported functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Count,
    Max,
    Min,
    Sum,
    Avg,
    Concat,
    Abs,
    Ceil,
    Floor,
    Round,
    Pow,
    Sqrt,
    Mod,
    Rand,
    Truncate,
}

impl FunctionKind {
    pub const fn sql_name(self) -> &'static str {
        match self {
            FunctionKind::Count => "COUNT",
            FunctionKind::Max => "MAX",
            FunctionKind::Min => "MIN",
            FunctionKind::Sum => "SUM",
            FunctionKind::Avg => "AVG",
            FunctionKind::Concat => "CONCAT",
            FunctionKind::Abs => "ABS",
            FunctionKind::Ceil => "CEIL",
            FunctionKind::Floor => "FLOOR",
            FunctionKind::Round => "ROUND",
            FunctionKind::Pow => "POW",
            FunctionKind::Sqrt => "SQRT",
            FunctionKind::Mod => "MOD",
            FunctionKind::Rand => "RAND",
            FunctionKind::Truncate => "TRUNCATE",
        }
    }

    /// Output alias used when the caller gives none.
    pub const fn default_alias(self) -> &'static str {
        match self {
            FunctionKind::Count => "count",
            FunctionKind::Max => "max",
            FunctionKind::Min => "min",
            FunctionKind::Sum => "sum",
            FunctionKind::Avg => "avg",
            FunctionKind::Concat => "concat",
            FunctionKind::Abs => "abs",
            FunctionKind::Ceil => "ceil",
            FunctionKind::Floor => "floor",
            FunctionKind::Round => "round",
            FunctionKind::Pow => "pow",
            FunctionKind::Sqrt => "sqrt",
            FunctionKind::Mod => "mod",
            FunctionKind::Rand => "rand",
            FunctionKind::Truncate => "truncate",
        }
    }

    pub const fn is_aggregate(self) -> bool {
        matches!(
            self,
            FunctionKind::Count
                | FunctionKind::Max
                | FunctionKind::Min
                | FunctionKind::Sum
                | FunctionKind::Avg
        )
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// One function argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FnArg {
    /// `*`, only meaningful for COUNT
    Star,
    Column(ColumnRef),
    Value(Value),
}

impl<T> From<Column<T>> for FnArg {
    fn from(column: Column<T>) -> Self {
        FnArg::Column(column.into_column_ref())
    }
}

impl From<ColumnRef> for FnArg {
    fn from(column: ColumnRef) -> Self {
        FnArg::Column(column)
    }
}

impl From<&str> for FnArg {
    fn from(s: &str) -> Self {
        FnArg::Value(Value::from(s))
    }
}

impl From<String> for FnArg {
    fn from(s: String) -> Self {
        FnArg::Value(Value::Text(s))
    }
}

impl From<Value> for FnArg {
    fn from(v: Value) -> Self {
        FnArg::Value(v)
    }
}

/// A function call over columns and literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub kind: FunctionKind,
    pub args: Vec<FnArg>,
    pub alias: Option<String>,
}

impl Function {
    pub fn new(kind: FunctionKind, args: Vec<FnArg>) -> Self {
        Self {
            kind,
            args,
            alias: None,
        }
    }

    /// Name the function's output column.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Every column used as an argument.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        self.args
            .iter()
            .filter_map(|arg| match arg {
                FnArg::Column(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn compare(self, op: CompareOp, rhs: impl IntoOperand) -> Comparer {
        Comparer::new(self, op, rhs)
    }

    pub fn eq(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn ne(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn lt(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn le(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Le, rhs)
    }

    pub fn gt(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn ge(self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Ge, rhs)
    }

    pub fn asc(self) -> OrderItem {
        OrderItem::function(self, Order::Asc)
    }

    pub fn desc(self) -> OrderItem {
        OrderItem::function(self, Order::Desc)
    }
}

/// `COUNT(*)`
pub fn count() -> Function {
    Function::new(FunctionKind::Count, vec![FnArg::Star])
}

/// `COUNT(column)`
pub fn count_of(column: impl Into<FnArg>) -> Function {
    Function::new(FunctionKind::Count, vec![column.into()])
}

macro_rules! unary_functions {
    ($($fn_name:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $fn_name(column: impl Into<FnArg>) -> Function {
                Function::new(FunctionKind::$kind, vec![column.into()])
            }
        )*
    };
}

unary_functions!(
    max => Max,
    min => Min,
    sum => Sum,
    avg => Avg,
    abs => Abs,
    ceil => Ceil,
    floor => Floor,
    sqrt => Sqrt,
);

/// `ROUND(column, decimals)`
pub fn round(column: impl Into<FnArg>, decimals: i32) -> Function {
    Function::new(
        FunctionKind::Round,
        vec![column.into(), FnArg::Value(Value::Int(decimals))],
    )
}

/// `TRUNCATE(column, decimals)`
pub fn truncate(column: impl Into<FnArg>, decimals: i32) -> Function {
    Function::new(
        FunctionKind::Truncate,
        vec![column.into(), FnArg::Value(Value::Int(decimals))],
    )
}

/// `POW(column, exponent)`
pub fn pow(column: impl Into<FnArg>, exponent: impl Into<Value>) -> Function {
    Function::new(
        FunctionKind::Pow,
        vec![column.into(), FnArg::Value(exponent.into())],
    )
}

/// `MOD(column, divisor)`
pub fn modulo(column: impl Into<FnArg>, divisor: impl Into<Value>) -> Function {
    Function::new(
        FunctionKind::Mod,
        vec![column.into(), FnArg::Value(divisor.into())],
    )
}

/// `RAND()`
pub fn rand() -> Function {
    Function::new(FunctionKind::Rand, Vec::new())
}

/// `CONCAT(...)` over a mix of string literals and columns.
///
/// ```ignore
/// concat(vec!["id: ".into(), d.pk_d().into()])
/// ```
pub fn concat(args: Vec<FnArg>) -> Function {
    Function::new(FunctionKind::Concat, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::D;
    use ormlambda_core::Table;

    #[test]
    fn test_count_defaults_to_star() {
        let f = count();
        assert_eq!(f.args, vec![FnArg::Star]);
        assert!(f.kind.is_aggregate());
        assert!(f.columns().is_empty());
    }

    #[test]
    fn test_concat_mixes_literals_and_columns() {
        let d = D::proxy();
        let f = concat(vec!["pk=".into(), d.pk_d().into()]).alias("label");
        assert_eq!(f.alias.as_deref(), Some("label"));
        assert_eq!(f.columns().len(), 1);
        assert!(matches!(f.args[0], FnArg::Value(Value::Text(_))));
    }

    #[test]
    fn test_functions_compare() {
        let c = count().gt(1i64);
        assert_eq!(c.op(), CompareOp::Gt);
        assert_eq!(round(D::proxy().pk_d(), 2).args.len(), 2);
    }
}
