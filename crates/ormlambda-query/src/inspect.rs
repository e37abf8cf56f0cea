//! Inspection of built expressions.
//!
//! Conditions and selections are plain data, so recovering their symbolic
//! structure (which attribute chain a column was reached through, which
//! operator a comparison uses) is a walk over that data rather than any
//! form of code introspection.

use std::fmt;

use indexmap::IndexMap;
use ormlambda_core::{CompareOp, Error, ExpressionErrorKind, Result};

use crate::expr::{ColumnRef, Comparer, Condition, IntoOperand, Operand};
use crate::function::FnArg;
use crate::selection::SelectItem;

/// One name in an attribute-access chain, linked to the name before it.
///
/// `d.c.b.data_b` is the leaf `data_b` whose parents are `b`, `c`, `d`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedElement {
    pub name: String,
    pub parent: Option<Box<NestedElement>>,
}

impl NestedElement {
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// A child element hanging off `self`.
    pub fn child(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(Box::new(self)),
        }
    }

    /// Chain for a column: base table, each relationship, the column.
    pub fn from_column(column: &ColumnRef) -> Self {
        let mut element = NestedElement::root(column.path.base().name());
        for name in column.path.relationship_names() {
            element = element.child(name);
        }
        element.child(column.name())
    }

    /// Chain for a table path: base table then each relationship.
    pub fn from_path(path: &ormlambda_core::TablePath) -> Self {
        let mut element = NestedElement::root(path.base().name());
        for name in path.relationship_names() {
            element = element.child(name);
        }
        element
    }

    pub fn from_operand(operand: &Operand) -> Self {
        match operand {
            Operand::Column(c) => Self::from_column(c),
            Operand::Value(v) => Self::root(v.to_string()),
            Operand::Function(f) => {
                let args: Vec<String> = f
                    .args
                    .iter()
                    .map(|arg| match arg {
                        FnArg::Star => "*".to_string(),
                        FnArg::Column(c) => Self::from_column(c).to_string(),
                        FnArg::Value(v) => v.to_string(),
                    })
                    .collect();
                Self::root(format!("{}({})", f.kind, args.join(", ")))
            }
        }
    }

    /// The first element of the chain.
    pub fn root_element(&self) -> &NestedElement {
        let mut current = self;
        while let Some(parent) = &current.parent {
            current = parent;
        }
        current
    }

    /// Names from the root to this element.
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        let mut current = self;
        while let Some(parent) = &current.parent {
            names.push(parent.name.as_str());
            current = parent;
        }
        names.reverse();
        names
    }
}

impl fmt::Display for NestedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join("."))
    }
}

impl Comparer {
    /// Split into `(left, right, operator)`.
    pub fn disassemble(&self) -> (NestedElement, NestedElement, &'static str) {
        (
            NestedElement::from_operand(self.left()),
            NestedElement::from_operand(self.right()),
            self.op().as_str(),
        )
    }
}

/// Group the attribute chains of a selection by their root name.
///
/// Fails when the selection contains a comparison, which has no place in a
/// column list.
pub fn decompose(items: &[SelectItem]) -> Result<IndexMap<String, Vec<NestedElement>>> {
    let mut groups: IndexMap<String, Vec<NestedElement>> = IndexMap::new();
    for item in items {
        let elements = match item {
            SelectItem::Table(path) => vec![NestedElement::from_path(path)],
            SelectItem::Column(column) => vec![NestedElement::from_column(column)],
            SelectItem::Function(function) => function
                .columns()
                .into_iter()
                .map(NestedElement::from_column)
                .collect(),
            SelectItem::Condition(_) => {
                return Err(Error::expression(
                    ExpressionErrorKind::UnexpectedComparison,
                    "a comparison appeared where only columns and tables are expected",
                ));
            }
        };
        for element in elements {
            let root = element.root_element().name.clone();
            groups.entry(root).or_default().push(element);
        }
    }
    Ok(groups)
}

/// A chained comparison `a OP b [OP c]`.
///
/// One operator is a plain comparison. Two operators read like
/// `100 <= x <= 500` and expand to `(x >= 100) AND (x <= 500)`. Any other
/// operator count is rejected.
#[derive(Debug, Clone)]
pub struct ComparisonChain {
    operands: Vec<Operand>,
    ops: Vec<CompareOp>,
}

impl ComparisonChain {
    pub fn new(first: impl IntoOperand) -> Self {
        Self {
            operands: vec![first.into_operand()],
            ops: Vec::new(),
        }
    }

    pub fn then(mut self, op: CompareOp, operand: impl IntoOperand) -> Self {
        self.ops.push(op);
        self.operands.push(operand.into_operand());
        self
    }

    pub fn operator_count(&self) -> usize {
        self.ops.len()
    }

    pub fn into_condition(self) -> Result<Condition> {
        let mut operands = self.operands.into_iter();
        match (self.ops.as_slice(), operands.next(), operands.next(), operands.next()) {
            ([op], Some(left), Some(right), None) => {
                Ok(Condition::Compare(Comparer::new(left, *op, right)))
            }
            ([first, second], Some(low), Some(middle), Some(high)) => {
                let lower = Comparer::new(low, *first, middle.clone())
                    .flipped()
                    .ok_or_else(|| {
                        Error::expression(
                            ExpressionErrorKind::OperatorCount,
                            format!("'{}' cannot start a chained comparison", first),
                        )
                    })?;
                Ok(Condition::And(vec![
                    lower.into(),
                    Comparer::new(middle, *second, high).into(),
                ]))
            }
            (ops, ..) => Err(Error::expression(
                ExpressionErrorKind::OperatorCount,
                format!(
                    "a chained comparison needs one or two operators, found {}",
                    ops.len()
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::D;
    use ormlambda_core::{Table, TableProxy};

    #[test]
    fn test_disassemble_nested_column() {
        let d = D::proxy();
        let (left, right, op) = d.c().b().data_b().eq("asdf").disassemble();

        assert_eq!(left.name, "data_b");
        let root = left
            .parent
            .as_ref()
            .and_then(|p| p.parent.as_ref())
            .and_then(|p| p.parent.as_ref())
            .unwrap();
        assert_eq!(root.name, "d");
        assert_eq!(right.name, "asdf");
        assert_eq!(op, "=");
        assert_eq!(left.to_string(), "d.c.b.data_b");
    }

    #[test]
    fn test_disassemble_every_operator() {
        let d = D::proxy();
        let cases = [
            (d.pk_d().eq(5i64), "="),
            (d.pk_d().ne(5i64), "!="),
            (d.pk_d().lt(5i64), "<"),
            (d.pk_d().le(5i64), "<="),
            (d.pk_d().gt(5i64), ">"),
            (d.pk_d().ge(5i64), ">="),
            (d.data_d().is_null(), "IS"),
            (d.data_d().is_not_null(), "IS NOT"),
        ];
        for (comparer, expected) in cases {
            let (left, right, op) = comparer.disassemble();
            assert_eq!(op, expected);
            assert_eq!(left.parent.as_ref().unwrap().name, "d");
            assert!(right.parent.is_none());
        }
    }

    #[test]
    fn test_decompose_groups_by_root() {
        let d = D::proxy();
        let items = vec![
            SelectItem::Table(d.c().b().path().clone()),
            SelectItem::Column(d.c().b().a().data_a().into_column_ref()),
        ];
        let groups = decompose(&items).unwrap();
        assert_eq!(groups.len(), 1);
        let names: Vec<_> = groups["d"].iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["d.c.b", "d.c.b.a.data_a"]);
    }

    #[test]
    fn test_decompose_rejects_comparison() {
        let d = D::proxy();
        let items = vec![SelectItem::Condition(d.pk_d().eq(1i64).into())];
        let err = decompose(&items).unwrap_err();
        assert_eq!(
            err.expression_kind(),
            Some(ExpressionErrorKind::UnexpectedComparison)
        );
    }

    #[test]
    fn test_two_operator_chain_flips_first() {
        let d = D::proxy();
        let cond = ComparisonChain::new(100i64)
            .then(CompareOp::Le, d.pk_d())
            .then(CompareOp::Le, 500i64)
            .into_condition()
            .unwrap();
        let Condition::And(items) = cond else {
            panic!("expected AND")
        };
        let Condition::Compare(lower) = &items[0] else {
            panic!()
        };
        assert_eq!(lower.op(), CompareOp::Ge);
        assert!(matches!(lower.left(), Operand::Column(_)));
    }

    #[test]
    fn test_operator_count_enforced() {
        let d = D::proxy();
        let none = ComparisonChain::new(d.pk_d()).into_condition();
        assert_eq!(
            none.unwrap_err().expression_kind(),
            Some(ExpressionErrorKind::OperatorCount)
        );

        let three = ComparisonChain::new(1i64)
            .then(CompareOp::Lt, d.pk_d())
            .then(CompareOp::Lt, 5i64)
            .then(CompareOp::Lt, 9i64)
            .into_condition();
        assert!(three.is_err());
    }
}
