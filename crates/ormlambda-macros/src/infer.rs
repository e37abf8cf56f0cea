//! SQL type and operator tokens for generated metadata.
//!
//! A column's type comes from `TypeInfo` on its field type unless an explicit
//! `sql_type = "..."` attribute overrides it.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{LitStr, Type};

/// Tokens for a column's `SqlType`.
pub fn column_sql_type(ty: &Type, explicit: Option<&LitStr>) -> TokenStream {
    match explicit {
        Some(lit) => parse_sql_type_attr(lit),
        None => quote! { <#ty as ::ormlambda_core::TypeInfo>::SQL_TYPE },
    }
}

fn sized(rest: &str) -> Option<u32> {
    rest.strip_suffix(')')?.trim().parse().ok()
}

fn precision_scale(rest: &str) -> Option<(u8, u8)> {
    let (p, s) = rest.strip_suffix(')')?.split_once(',')?;
    Some((p.trim().parse().ok()?, s.trim().parse().ok()?))
}

/// Parse an explicit sql_type attribute into a `SqlType` constructor.
///
/// Supports the common names (`INTEGER`, `BIGINT`, `VARCHAR(n)`,
/// `DECIMAL(p, s)`, `DATETIME`, `POINT`, ...). Anything else becomes
/// `SqlType::Custom` and is rendered verbatim in DDL.
pub fn parse_sql_type_attr(lit: &LitStr) -> TokenStream {
    let sql_type = lit.value();
    let upper = sql_type.to_uppercase();
    let trimmed = upper.trim();

    if let Some(len) = trimmed.strip_prefix("VARCHAR(").and_then(sized) {
        return quote! { ::ormlambda_core::SqlType::VarChar(#len) };
    }
    if let Some(len) = trimmed.strip_prefix("CHAR(").and_then(sized) {
        return quote! { ::ormlambda_core::SqlType::Char(#len) };
    }
    if let Some((p, s)) = trimmed
        .strip_prefix("DECIMAL(")
        .or_else(|| trimmed.strip_prefix("NUMERIC("))
        .and_then(precision_scale)
    {
        return quote! { ::ormlambda_core::SqlType::Decimal { precision: #p, scale: #s } };
    }

    match trimmed {
        "TINYINT" => quote! { ::ormlambda_core::SqlType::TinyInt },
        "SMALLINT" => quote! { ::ormlambda_core::SqlType::SmallInt },
        "INTEGER" | "INT" => quote! { ::ormlambda_core::SqlType::Integer },
        "BIGINT" => quote! { ::ormlambda_core::SqlType::BigInt },
        "REAL" | "FLOAT" => quote! { ::ormlambda_core::SqlType::Real },
        "DOUBLE" | "DOUBLE PRECISION" => quote! { ::ormlambda_core::SqlType::Double },
        "BOOLEAN" | "BOOL" => quote! { ::ormlambda_core::SqlType::Boolean },
        "TEXT" => quote! { ::ormlambda_core::SqlType::Text },
        "VARCHAR" => quote! { ::ormlambda_core::SqlType::VarChar(255) },
        "CHAR" => quote! { ::ormlambda_core::SqlType::Char(1) },
        "BLOB" => quote! { ::ormlambda_core::SqlType::Blob },
        "DATE" => quote! { ::ormlambda_core::SqlType::Date },
        "TIME" => quote! { ::ormlambda_core::SqlType::Time },
        "DATETIME" => quote! { ::ormlambda_core::SqlType::DateTime },
        "TIMESTAMP" => quote! { ::ormlambda_core::SqlType::Timestamp },
        "POINT" => quote! { ::ormlambda_core::SqlType::Point },
        "JSON" => quote! { ::ormlambda_core::SqlType::Json },
        _ => quote! { ::ormlambda_core::SqlType::Custom(#lit) },
    }
}

/// `CompareOp` tokens for a relationship's join operator.
///
/// Only plain comparisons can join two tables.
pub fn join_operator(symbol: &str) -> Option<TokenStream> {
    let variant = match symbol.trim() {
        "=" | "==" => quote! { Eq },
        "!=" | "<>" => quote! { Ne },
        "<" => quote! { Lt },
        "<=" => quote! { Le },
        ">" => quote! { Gt },
        ">=" => quote! { Ge },
        _ => return None,
    };
    Some(quote! { ::ormlambda_core::CompareOp::#variant })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proc_macro2::Span;
    use syn::parse_quote;

    fn lit(s: &str) -> LitStr {
        LitStr::new(s, Span::call_site())
    }

    #[test]
    fn test_inferred_type_goes_through_type_info() {
        let ty: Type = parse_quote!(Option<i64>);
        let result = column_sql_type(&ty, None).to_string();
        assert!(result.contains("TypeInfo"));
        assert!(result.contains("SQL_TYPE"));
    }

    #[test]
    fn test_parse_sql_type_varchar() {
        let result = parse_sql_type_attr(&lit("varchar(100)")).to_string();
        assert!(result.contains("VarChar"));
        assert!(result.contains("100"));
    }

    #[test]
    fn test_parse_sql_type_decimal() {
        let result = parse_sql_type_attr(&lit("NUMERIC(10, 2)")).to_string();
        assert!(result.contains("Decimal"));
        assert!(result.contains("10"));
        assert!(result.contains('2'));
    }

    #[test]
    fn test_unknown_type_is_custom() {
        let result = parse_sql_type_attr(&lit("MEDIUMTEXT")).to_string();
        assert!(result.contains("Custom"));
    }

    #[test]
    fn test_join_operators() {
        assert!(join_operator("=").is_some());
        assert!(join_operator(">=").is_some());
        assert!(join_operator("LIKE").is_none());
        assert!(join_operator("IN").is_none());
    }
}
