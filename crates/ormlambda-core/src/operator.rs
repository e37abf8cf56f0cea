//! Comparison operators shared by conditions and foreign-key predicates.

use std::fmt;

/// A binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    Regexp,
    Like,
    Is,
    IsNot,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub const fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "IN",
            CompareOp::NotIn => "NOT IN",
            CompareOp::Regexp => "REGEXP",
            CompareOp::Like => "LIKE",
            CompareOp::Is => "IS",
            CompareOp::IsNot => "IS NOT",
        }
    }

    /// Parse an operator symbol.
    ///
    /// Accepts host-language spellings too: `==` is `=`, `<>` is `!=`, and
    /// `is`/`is not` map to IS / IS NOT.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => CompareOp::Eq,
            "!=" | "<>" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            "IN" => CompareOp::In,
            "NOT IN" => CompareOp::NotIn,
            "REGEXP" => CompareOp::Regexp,
            "LIKE" => CompareOp::Like,
            "IS" => CompareOp::Is,
            "IS NOT" => CompareOp::IsNot,
            _ => return None,
        };
        Some(op)
    }

    /// The operator that keeps the meaning when both operands swap sides.
    ///
    /// Only ordering and equality operators are symmetric in this sense.
    pub const fn mirrored(self) -> Option<Self> {
        match self {
            CompareOp::Eq => Some(CompareOp::Eq),
            CompareOp::Ne => Some(CompareOp::Ne),
            CompareOp::Lt => Some(CompareOp::Gt),
            CompareOp::Le => Some(CompareOp::Ge),
            CompareOp::Gt => Some(CompareOp::Lt),
            CompareOp::Ge => Some(CompareOp::Le),
            _ => None,
        }
    }

    /// Whether the operator may appear in a foreign-key join predicate.
    pub const fn is_join_operator(self) -> bool {
        self.mirrored().is_some()
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_symbol_translates_host_spellings() {
        assert_eq!(CompareOp::from_symbol("=="), Some(CompareOp::Eq));
        assert_eq!(CompareOp::from_symbol("is not"), Some(CompareOp::IsNot));
        assert_eq!(CompareOp::from_symbol("<>"), Some(CompareOp::Ne));
        assert_eq!(CompareOp::from_symbol("between"), None);
    }

    #[test]
    fn test_mirrored() {
        assert_eq!(CompareOp::Le.mirrored(), Some(CompareOp::Ge));
        assert_eq!(CompareOp::In.mirrored(), None);
        assert!(!CompareOp::Like.is_join_operator());
    }
}
