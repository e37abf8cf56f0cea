//! Sort directions and ORDER BY items.

use std::fmt;
use std::str::FromStr;

use ormlambda_core::{Error, Result, ValueErrorKind};

use crate::expr::{ColumnRef, Column, Operand};
use crate::function::Function;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub const fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = Error;

    /// Only the two canonical directions are accepted, in any case.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            other => Err(Error::value(
                ValueErrorKind::InvalidOrder,
                format!("'{}' is not a sort direction, expected ASC or DESC", other),
            )),
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderItem {
    pub target: Operand,
    pub order: Order,
}

impl OrderItem {
    pub fn column(column: ColumnRef, order: Order) -> Self {
        Self {
            target: Operand::Column(column),
            order,
        }
    }

    pub fn function(function: Function, order: Order) -> Self {
        Self {
            target: Operand::Function(Box::new(function)),
            order,
        }
    }
}

/// Things that can be sorted on, with an explicit direction.
pub trait IntoOrderItems {
    fn into_order_items(self, order: Order) -> Vec<OrderItem>;
}

impl<T> IntoOrderItems for Column<T> {
    fn into_order_items(self, order: Order) -> Vec<OrderItem> {
        vec![OrderItem::column(self.into_column_ref(), order)]
    }
}

impl IntoOrderItems for Function {
    fn into_order_items(self, order: Order) -> Vec<OrderItem> {
        vec![OrderItem::function(self, order)]
    }
}

impl IntoOrderItems for OrderItem {
    /// An item already carries its own direction; `order` is ignored.
    fn into_order_items(self, _order: Order) -> Vec<OrderItem> {
        vec![self]
    }
}

impl<I: IntoOrderItems> IntoOrderItems for Vec<I> {
    fn into_order_items(self, order: Order) -> Vec<OrderItem> {
        self.into_iter()
            .flat_map(|item| item.into_order_items(order))
            .collect()
    }
}

macro_rules! order_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoOrderItems),+> IntoOrderItems for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_order_items(self, order: Order) -> Vec<OrderItem> {
                let ($($name,)+) = self;
                let mut items = Vec::new();
                $(items.extend($name.into_order_items(order));)+
                items
            }
        }
    };
}

order_tuple!(A);
order_tuple!(A, B);
order_tuple!(A, B, C);
order_tuple!(A, B, C, D);

/// Per-item directions for a multi-column ORDER BY.
///
/// A single direction applies to every item; a list must match the items
/// one for one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directions {
    All(Order),
    Each(Vec<Order>),
}

impl From<Order> for Directions {
    fn from(order: Order) -> Self {
        Directions::All(order)
    }
}

impl From<Vec<Order>> for Directions {
    fn from(orders: Vec<Order>) -> Self {
        Directions::Each(orders)
    }
}

impl<const N: usize> From<[Order; N]> for Directions {
    fn from(orders: [Order; N]) -> Self {
        Directions::Each(orders.to_vec())
    }
}

impl Directions {
    /// Apply the directions to `items`.
    pub fn apply(self, mut items: Vec<OrderItem>) -> Result<Vec<OrderItem>> {
        match self {
            Directions::All(order) => {
                for item in &mut items {
                    item.order = order;
                }
                Ok(items)
            }
            Directions::Each(orders) => {
                if orders.len() != items.len() {
                    return Err(Error::value(
                        ValueErrorKind::InvalidOrder,
                        format!(
                            "{} sort directions given for {} order items",
                            orders.len(),
                            items.len()
                        ),
                    ));
                }
                for (item, order) in items.iter_mut().zip(orders) {
                    item.order = order;
                }
                Ok(items)
            }
        }
    }
}
