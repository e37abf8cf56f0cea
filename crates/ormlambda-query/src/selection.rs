//! Items of a SELECT list.

use ormlambda_core::TablePath;

use crate::expr::{Column, ColumnRef, Comparer, Condition};
use crate::function::Function;

/// One entry of a selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// Every column of the table at the end of the path
    Table(TablePath),
    Column(ColumnRef),
    Function(Function),
    /// Never valid in a column list; kept so the mistake is reported
    /// instead of silently dropped
    Condition(Condition),
}

impl SelectItem {
    /// The table path this item reads from, if it reads from exactly one.
    pub fn path(&self) -> Option<&TablePath> {
        match self {
            SelectItem::Table(path) => Some(path),
            SelectItem::Column(column) => Some(&column.path),
            SelectItem::Function(_) | SelectItem::Condition(_) => None,
        }
    }
}

/// Conversion of one selector element into a [`SelectItem`].
///
/// Implemented for column handles, functions, conditions and (by
/// `#[derive(Table)]`) every table proxy.
pub trait IntoSelectItem {
    fn into_select_item(self) -> SelectItem;
}

impl IntoSelectItem for SelectItem {
    fn into_select_item(self) -> SelectItem {
        self
    }
}

impl<T> IntoSelectItem for Column<T> {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Column(self.into_column_ref())
    }
}

impl IntoSelectItem for ColumnRef {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Column(self)
    }
}

impl IntoSelectItem for Function {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Function(self)
    }
}

impl IntoSelectItem for Condition {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Condition(self)
    }
}

impl IntoSelectItem for Comparer {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Condition(self.into())
    }
}

impl IntoSelectItem for TablePath {
    fn into_select_item(self) -> SelectItem {
        SelectItem::Table(self)
    }
}

/// A whole selector: one item, a tuple of items, or a list.
pub trait IntoSelection {
    fn into_selection(self) -> Vec<SelectItem>;
}

impl<T: IntoSelectItem> IntoSelection for T {
    fn into_selection(self) -> Vec<SelectItem> {
        vec![self.into_select_item()]
    }
}

impl<T: IntoSelectItem> IntoSelection for Vec<T> {
    fn into_selection(self) -> Vec<SelectItem> {
        self.into_iter().map(IntoSelectItem::into_select_item).collect()
    }
}

macro_rules! selection_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoSelectItem),+> IntoSelection for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_selection(self) -> Vec<SelectItem> {
                let ($($name,)+) = self;
                vec![$($name.into_select_item()),+]
            }
        }
    };
}

selection_tuple!(A);
selection_tuple!(A, B);
selection_tuple!(A, B, C);
selection_tuple!(A, B, C, D);
selection_tuple!(A, B, C, D, E);
selection_tuple!(A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::count;
    use crate::testing::D;
    use ormlambda_core::Table;

    #[test]
    fn test_tuple_selection_keeps_order() {
        let d = D::proxy();
        let items = (d.c().b(), d.data_d(), count()).into_selection();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].path().map(TablePath::key).as_deref(), Some("d.c.b"));
        assert!(matches!(items[1], SelectItem::Column(_)));
        assert!(matches!(items[2], SelectItem::Function(_)));
    }

    #[test]
    fn test_single_item_and_list() {
        let d = D::proxy();
        assert_eq!(d.clone().into_selection().len(), 1);
        assert_eq!(vec![d.pk_d(), d.fk_d()].into_selection().len(), 2);
    }
}
