//! Typed column handles and the condition tree.
//!
//! Conditions are built directly in Rust: a [`Column`] handle obtained from a
//! table proxy exposes comparison methods that return an immutable
//! [`Comparer`], and comparers combine with `&` (AND) and `|` (OR) into a
//! [`Condition`] tree.
//!
//! ```ignore
//! let d = D::proxy();
//! let cond = d.c().b().a().data_a().eq("x") & d.pk_d().gt(10);
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::ops::{BitAnd, BitOr};

use ormlambda_core::{ColumnInfo, CompareOp, TablePath, TableRef, Value};

use crate::function::Function;
use crate::order::{Order, OrderItem};

/// A column reached through a concrete relationship path.
#[derive(Clone)]
pub struct ColumnRef {
    pub path: TablePath,
    pub info: &'static ColumnInfo,
}

impl ColumnRef {
    pub fn new(path: TablePath, info: &'static ColumnInfo) -> Self {
        Self { path, info }
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }

    /// The table owning this column.
    pub fn table(&self) -> TableRef {
        self.path.table()
    }
}

impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.info.name == other.info.name
    }
}

impl fmt::Debug for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.path.key(), self.info.name)
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Value(Value),
    Function(Box<Function>),
}

/// Anything usable as a comparison operand.
///
/// Plain values become literals; column handles and functions stay symbolic.
pub trait IntoOperand {
    fn into_operand(self) -> Operand;
}

impl<V: Into<Value>> IntoOperand for V {
    fn into_operand(self) -> Operand {
        Operand::Value(self.into())
    }
}

impl<T> IntoOperand for Column<T> {
    fn into_operand(self) -> Operand {
        Operand::Column(self.column)
    }
}

impl IntoOperand for ColumnRef {
    fn into_operand(self) -> Operand {
        Operand::Column(self)
    }
}

impl IntoOperand for Function {
    fn into_operand(self) -> Operand {
        Operand::Function(Box::new(self))
    }
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

/// An immutable binary predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparer {
    left: Operand,
    op: CompareOp,
    right: Operand,
    flags: Option<String>,
}

impl Comparer {
    pub fn new(left: impl IntoOperand, op: CompareOp, right: impl IntoOperand) -> Self {
        Self {
            left: left.into_operand(),
            op,
            right: right.into_operand(),
            flags: None,
        }
    }

    pub fn left(&self) -> &Operand {
        &self.left
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// Regular-expression flags, for REGEXP comparisons.
    pub fn flags(&self) -> Option<&str> {
        self.flags.as_deref()
    }

    /// The comparison with its operands swapped and the operator mirrored.
    ///
    /// Returns `None` for operators without a mirror (IN, LIKE, ...).
    pub fn flipped(&self) -> Option<Comparer> {
        Some(Self {
            left: self.right.clone(),
            op: self.op.mirrored()?,
            right: self.left.clone(),
            flags: None,
        })
    }

    /// Every column this comparison touches, left to right.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        [&self.left, &self.right]
            .into_iter()
            .flat_map(operand_columns)
            .collect()
    }
}

fn operand_columns(operand: &Operand) -> Vec<&ColumnRef> {
    match operand {
        Operand::Column(c) => vec![c],
        Operand::Function(f) => f.columns(),
        Operand::Value(_) => Vec::new(),
    }
}

/// AND/OR tree of comparisons.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare(Comparer),
    And(Vec<Condition>),
    Or(Vec<Condition>),
}

impl Condition {
    /// Every column referenced anywhere in the tree.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        match self {
            Condition::Compare(c) => c.columns(),
            Condition::And(items) | Condition::Or(items) => {
                items.iter().flat_map(Condition::columns).collect()
            }
        }
    }

    /// Number of comparisons in the tree.
    pub fn len(&self) -> usize {
        match self {
            Condition::Compare(_) => 1,
            Condition::And(items) | Condition::Or(items) => items.iter().map(Condition::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn combine(self, other: Condition, and: bool) -> Condition {
        match (self, and) {
            (Condition::And(mut items), true) => {
                items.push(other);
                Condition::And(items)
            }
            (Condition::Or(mut items), false) => {
                items.push(other);
                Condition::Or(items)
            }
            (this, true) => Condition::And(vec![this, other]),
            (this, false) => Condition::Or(vec![this, other]),
        }
    }
}

impl From<Comparer> for Condition {
    fn from(c: Comparer) -> Self {
        Condition::Compare(c)
    }
}

impl<R: Into<Condition>> BitAnd<R> for Condition {
    type Output = Condition;

    fn bitand(self, rhs: R) -> Condition {
        self.combine(rhs.into(), true)
    }
}

impl<R: Into<Condition>> BitOr<R> for Condition {
    type Output = Condition;

    fn bitor(self, rhs: R) -> Condition {
        self.combine(rhs.into(), false)
    }
}

impl<R: Into<Condition>> BitAnd<R> for Comparer {
    type Output = Condition;

    fn bitand(self, rhs: R) -> Condition {
        Condition::from(self) & rhs
    }
}

impl<R: Into<Condition>> BitOr<R> for Comparer {
    type Output = Condition;

    fn bitor(self, rhs: R) -> Condition {
        Condition::from(self) | rhs
    }
}

/// Typed handle to a column of a table reached through a path.
///
/// `T` is the Rust type of the mapped field; it only documents intent; any
/// value convertible into [`Value`] can be compared against the column.
pub struct Column<T> {
    column: ColumnRef,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            _ty: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column({:?})", self.column)
    }
}

impl<T> Column<T> {
    pub fn new(path: TablePath, info: &'static ColumnInfo) -> Self {
        Self {
            column: ColumnRef::new(path, info),
            _ty: PhantomData,
        }
    }

    pub fn column_ref(&self) -> &ColumnRef {
        &self.column
    }

    pub fn into_column_ref(self) -> ColumnRef {
        self.column
    }

    pub fn info(&self) -> &'static ColumnInfo {
        self.column.info
    }

    pub fn name(&self) -> &'static str {
        self.column.info.name
    }

    pub fn path(&self) -> &TablePath {
        &self.column.path
    }

    fn compare(&self, op: CompareOp, rhs: impl IntoOperand) -> Comparer {
        Comparer::new(self.column.clone(), op, rhs)
    }

    pub fn eq(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Eq, rhs)
    }

    pub fn ne(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Ne, rhs)
    }

    pub fn lt(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Lt, rhs)
    }

    pub fn le(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Le, rhs)
    }

    pub fn gt(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Gt, rhs)
    }

    pub fn ge(&self, rhs: impl IntoOperand) -> Comparer {
        self.compare(CompareOp::Ge, rhs)
    }

    /// `column IN (...)`
    pub fn contains<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Comparer {
        let list = Value::Array(values.into_iter().map(Into::into).collect());
        self.compare(CompareOp::In, list)
    }

    /// `column NOT IN (...)`
    pub fn not_contains<V: Into<Value>>(&self, values: impl IntoIterator<Item = V>) -> Comparer {
        let list = Value::Array(values.into_iter().map(Into::into).collect());
        self.compare(CompareOp::NotIn, list)
    }

    pub fn regex(&self, pattern: impl Into<String>) -> Comparer {
        self.compare(CompareOp::Regexp, pattern.into())
    }

    /// Regular-expression match with match-type flags (`"i"`, `"c"`, ...).
    pub fn regex_with_flags(&self, pattern: impl Into<String>, flags: impl Into<String>) -> Comparer {
        let mut comparer = self.regex(pattern);
        comparer.flags = Some(flags.into());
        comparer
    }

    pub fn like(&self, pattern: impl Into<String>) -> Comparer {
        self.compare(CompareOp::Like, pattern.into())
    }

    pub fn is_null(&self) -> Comparer {
        self.compare(CompareOp::Is, Value::Null)
    }

    pub fn is_not_null(&self) -> Comparer {
        self.compare(CompareOp::IsNot, Value::Null)
    }

    /// `low <= column <= high`, expanded into two AND-joined comparisons.
    pub fn between(&self, low: impl IntoOperand, high: impl IntoOperand) -> Condition {
        Condition::And(vec![
            self.compare(CompareOp::Ge, low).into(),
            self.compare(CompareOp::Le, high).into(),
        ])
    }

    pub fn asc(&self) -> OrderItem {
        OrderItem::column(self.column.clone(), Order::Asc)
    }

    pub fn desc(&self) -> OrderItem {
        OrderItem::column(self.column.clone(), Order::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{D, DProxy};
    use ormlambda_core::Table;

    fn d() -> DProxy {
        D::proxy()
    }

    #[test]
    fn test_comparer_is_immutable_value() {
        let c = d().data_d().eq("x");
        let flipped = c.flipped().unwrap();
        assert_eq!(c.op(), CompareOp::Eq);
        assert_eq!(flipped.right(), c.left());
    }

    #[test]
    fn test_and_or_flatten_same_kind() {
        let cond = d().pk_d().gt(1) & d().pk_d().lt(9) & d().data_d().eq("x");
        match &cond {
            Condition::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected AND, got {:?}", other),
        }

        let mixed = (d().pk_d().gt(1) & d().pk_d().lt(9)) | d().data_d().is_null();
        match &mixed {
            Condition::Or(items) => {
                assert_eq!(items.len(), 2);
                assert!(matches!(items[0], Condition::And(_)));
            }
            other => panic!("expected OR, got {:?}", other),
        }
        assert_eq!(mixed.len(), 3);
    }

    #[test]
    fn test_contains_builds_array() {
        let c = d().pk_d().contains([1i64, 2, 3]);
        assert_eq!(c.op(), CompareOp::In);
        assert_eq!(
            c.right(),
            &Operand::Value(Value::Array(vec![
                Value::BigInt(1),
                Value::BigInt(2),
                Value::BigInt(3)
            ]))
        );
    }

    #[test]
    fn test_between_is_two_comparisons() {
        let cond = d().pk_d().between(100i64, 500i64);
        let Condition::And(items) = cond else {
            panic!("between must be an AND");
        };
        assert_eq!(items.len(), 2);
        let Condition::Compare(first) = &items[0] else {
            panic!()
        };
        assert_eq!(first.op(), CompareOp::Ge);
        assert!(matches!(first.left(), Operand::Column(_)));
    }

    #[test]
    fn test_columns_are_collected_through_paths() {
        let cond = d().c().b().data_b().eq("x") & d().pk_d().eq(d().c().pk_c());
        let keys: Vec<_> = cond.columns().iter().map(|c| c.path.key()).collect();
        assert_eq!(keys, vec!["d.c.b", "d", "d.c"]);
    }
}
